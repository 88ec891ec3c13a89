//! Lazily computed values with a time-to-live, kept in memory or persisted to disk.
//!
//! An [`ExpiringValue`] holds one async lock around the whole check, refresh, and return
//! sequence, so concurrent callers of the same instance never race two producer calls. Backends
//! decide how expiry is judged and where the value lives.

pub mod clock;
pub mod file;
pub mod memory;

pub use clock::*;
pub use file::FileBackend;
pub use memory::MemoryBackend;

// self
use crate::{_prelude::*, error::CacheError};

/// Boxed future returned by cache producers.
pub type ProducerFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
/// Zero-argument producer invoked whenever the cached value must be refreshed.
pub type Producer<T> = Arc<dyn Fn() -> ProducerFuture<T> + Send + Sync>;

/// An expiring value persisted as a JSON document on disk.
pub type PersistentExpiringValue<T> = ExpiringValue<T, FileBackend<T>>;

/// Storage strategy behind an [`ExpiringValue`].
pub trait CacheBackend<T>
where
	Self: Send,
{
	/// Returns `true` when the value must be refreshed before it is served.
	fn is_expired(&self, now: OffsetDateTime, ttl: Duration) -> bool;

	/// Returns the cached value; only called when [`CacheBackend::is_expired`] said no.
	fn load(&self) -> Result<T, CacheError>;

	/// Stores a freshly produced value, arming its expiry relative to `now`.
	fn save(&mut self, value: &T, now: OffsetDateTime, ttl: Duration) -> Result<(), CacheError>;
}

/// Lazily computed value that is cached until its TTL elapses.
///
/// Nothing is produced at construction time; the producer runs on the first
/// [`ExpiringValue::value`] call and again whenever the backend reports expiry. Producer
/// failures propagate to the caller and leave the previous cache state untouched.
pub struct ExpiringValue<T, B = MemoryBackend<T>> {
	producer: Producer<T>,
	ttl: Duration,
	clock: Arc<dyn Clock>,
	backend: AsyncMutex<B>,
}
impl<T> ExpiringValue<T>
where
	T: 'static + Clone + Send,
{
	/// Creates an in-memory value that is refreshed every `ttl`.
	pub fn new<F, Fut>(ttl: Duration, producer: F) -> Self
	where
		F: 'static + Send + Sync + Fn() -> Fut,
		Fut: 'static + Send + Future<Output = Result<T>>,
	{
		Self::with_backend(MemoryBackend::default(), ttl, producer)
	}
}
impl<T> ExpiringValue<T, FileBackend<T>>
where
	T: 'static + Send + Serialize + DeserializeOwned,
{
	/// Creates a value persisted to `path` that survives process restarts while fresh.
	///
	/// A zero TTL disables persistence: the file is never written.
	pub fn persistent<F, Fut>(path: impl Into<PathBuf>, ttl: Duration, producer: F) -> Self
	where
		F: 'static + Send + Sync + Fn() -> Fut,
		Fut: 'static + Send + Future<Output = Result<T>>,
	{
		Self::with_backend(FileBackend::new(path), ttl, producer)
	}
}
impl<T, B> ExpiringValue<T, B>
where
	T: 'static,
	B: CacheBackend<T>,
{
	/// Creates a value stored through a custom backend.
	pub fn with_backend<F, Fut>(backend: B, ttl: Duration, producer: F) -> Self
	where
		F: 'static + Send + Sync + Fn() -> Fut,
		Fut: 'static + Send + Future<Output = Result<T>>,
	{
		Self {
			producer: Arc::new(move || Box::pin(producer()) as ProducerFuture<T>),
			ttl,
			clock: Arc::new(SystemClock),
			backend: AsyncMutex::new(backend),
		}
	}

	/// Replaces the clock used to evaluate expiry.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the configured time-to-live.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the cached value, refreshing it when expired or when `force_refresh` is set.
	pub async fn value(&self, force_refresh: bool) -> Result<T> {
		let mut backend = self.backend.lock().await;

		if !force_refresh && !backend.is_expired(self.clock.now(), self.ttl) {
			tracing::debug!("loading value from cache");

			return Ok(backend.load()?);
		}

		let value = (self.producer)().await?;

		backend.save(&value, self.clock.now(), self.ttl)?;
		tracing::info!(ttl = self.ttl.whole_seconds(), "refreshed value and saved it in the cache");

		Ok(value)
	}
}
impl<T, B> Debug for ExpiringValue<T, B> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExpiringValue").field("ttl", &self.ttl).finish_non_exhaustive()
	}
}

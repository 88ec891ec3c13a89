//! Half-TTL credential cache shared by the federated and cross-account providers.

// self
use crate::{
	_prelude::*,
	account::AccountId,
	cache::{Clock, ExpiringValue, SystemClock},
	credential::{CredentialKey, Credentials},
	session::{Session, SessionFuture, SessionProvider},
};

/// Boxed future returned by [`CredentialSource::credentials`].
pub type CredentialFuture<'a> = Pin<Box<dyn Future<Output = Result<Credentials>> + 'a + Send>>;

/// Slow, fallible exchange that mints credentials for one account.
pub trait CredentialSource
where
	Self: 'static + Send + Sync,
{
	/// Role name (not ARN) the credentials are minted for.
	fn role(&self) -> &str;

	/// Nominal lifetime of the minted credentials.
	fn duration(&self) -> Duration;

	/// Mints fresh credentials for `account_id`.
	fn credentials<'a>(&'a self, account_id: &'a AccountId) -> CredentialFuture<'a>;
}

/// Caches credentials per `(account, role)` and refreshes them at half their lifetime.
///
/// Refreshing at half the nominal duration guarantees that any credentials handed out still
/// have at least half their validity left. The outer map lock only covers the get-or-create
/// step; the exchange itself runs under the per-key [`ExpiringValue`] lock, so different
/// accounts refresh in parallel while concurrent requests for the same key share one exchange.
pub struct CredentialCache<S> {
	source: Arc<S>,
	clock: Arc<dyn Clock>,
	entries: Mutex<HashMap<CredentialKey, Arc<ExpiringValue<Credentials>>>>,
}
impl<S> CredentialCache<S>
where
	S: CredentialSource,
{
	/// Wraps `source` with an empty cache.
	pub fn new(source: S) -> Self {
		Self { source: Arc::new(source), clock: Arc::new(SystemClock), entries: Default::default() }
	}

	/// Replaces the clock used by entries created from now on.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the wrapped credential source.
	pub fn source(&self) -> &S {
		&self.source
	}

	/// Time-to-live applied to cached credentials: half the source's duration.
	pub fn ttl(&self) -> Duration {
		self.source.duration() / 2
	}

	/// Number of `(account, role)` entries created so far.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` if no entry has been created yet.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	/// Drops every cached entry; the next request per key runs a fresh exchange.
	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	/// Returns cached credentials for `account_id`, minting them if absent or stale.
	pub async fn credentials(&self, account_id: &AccountId) -> Result<Credentials> {
		self.entry(account_id).value(false).await
	}

	fn entry(&self, account_id: &AccountId) -> Arc<ExpiringValue<Credentials>> {
		let key = CredentialKey::new(account_id, self.source.role());
		let mut entries = self.entries.lock();

		entries
			.entry(key)
			.or_insert_with(|| {
				let source = self.source.clone();
				let account_id = account_id.clone();
				let value = ExpiringValue::new(self.ttl(), move || {
					let source = source.clone();
					let account_id = account_id.clone();

					async move { source.credentials(&account_id).await }
				});

				Arc::new(value.with_clock(self.clock.clone()))
			})
			.clone()
	}
}
impl<S> SessionProvider for CredentialCache<S>
where
	S: CredentialSource,
{
	fn session<'a>(&'a self, account_id: &'a AccountId) -> SessionFuture<'a> {
		Box::pin(async move {
			let credentials = self.credentials(account_id).await?;

			Ok(Session::temporary(account_id.clone(), credentials))
		})
	}
}
impl<S> Debug for CredentialCache<S>
where
	S: Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCache")
			.field("source", &self.source)
			.field("entries", &self.entries.lock().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{_preludet, cache::ManualClock};

	#[derive(Debug, Default)]
	struct CountingSource {
		calls: AtomicUsize,
	}
	impl CredentialSource for CountingSource {
		fn role(&self) -> &str {
			"Admin"
		}

		fn duration(&self) -> Duration {
			Duration::hours(1)
		}

		fn credentials<'a>(&'a self, account_id: &'a AccountId) -> CredentialFuture<'a> {
			Box::pin(async move {
				let call = self.calls.fetch_add(1, Ordering::SeqCst);

				Ok(_preludet::credentials(&format!("ASIA{account_id}{call}")))
			})
		}
	}

	#[tokio::test]
	async fn refreshes_at_half_duration() {
		let clock = Arc::new(ManualClock::default());
		let cache = CredentialCache::new(CountingSource::default()).with_clock(clock.clone());
		let account = _preludet::account("100");

		assert_eq!(cache.ttl(), Duration::minutes(30));

		let first = cache.credentials(&account).await.expect("First exchange should succeed.");

		clock.advance(Duration::minutes(29));

		assert_eq!(cache.credentials(&account).await.expect("Cached lookup should succeed."), first);
		assert_eq!(cache.source().calls.load(Ordering::SeqCst), 1);

		clock.advance(Duration::minutes(1));

		let second = cache.credentials(&account).await.expect("Refresh should succeed.");

		assert_ne!(second, first);
		assert_eq!(cache.source().calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn entries_are_keyed_per_account_and_cleared_on_demand() {
		let cache = CredentialCache::new(CountingSource::default());

		cache.credentials(&_preludet::account("100")).await.expect("Exchange should succeed.");
		cache.credentials(&_preludet::account("200")).await.expect("Exchange should succeed.");
		cache.credentials(&_preludet::account("100")).await.expect("Exchange should succeed.");

		assert_eq!(cache.len(), 2);
		assert_eq!(cache.source().calls.load(Ordering::SeqCst), 2);

		cache.clear();

		assert!(cache.is_empty());

		let session = cache
			.session(&_preludet::account("100"))
			.await
			.expect("Session should be minted again.");

		assert!(session.credentials().is_some());
		assert_eq!(cache.source().calls.load(Ordering::SeqCst), 3);
	}
}

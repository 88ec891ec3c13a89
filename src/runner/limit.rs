//! Caps concurrent calls of one operation below the worker pool size.

// self
use crate::{_prelude::*, error::ConfigError};

/// Counting-semaphore guard for an expensive operation.
///
/// The limit is independent of the runner's pool size: with ten workers and a limit of two,
/// at most two guarded calls are in flight while the other workers keep progressing up to
/// their next guarded call.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimit {
	semaphore: Arc<Semaphore>,
	capacity: usize,
}
impl ConcurrencyLimit {
	/// Creates a limit admitting `capacity` concurrent calls.
	pub fn new(capacity: usize) -> Result<Self, ConfigError> {
		if capacity == 0 {
			return Err(ConfigError::ZeroConcurrencyLimit);
		}

		Ok(Self { semaphore: Arc::new(Semaphore::new(capacity)), capacity })
	}

	/// Maximum number of concurrent calls.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Runs `f` once a slot is free, holding the slot until its future completes.
	pub async fn run<F, Fut>(&self, f: F) -> Fut::Output
	where
		F: FnOnce() -> Fut,
		Fut: Future,
	{
		let _permit = self.semaphore.acquire().await;

		f().await
	}
}

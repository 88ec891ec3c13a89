//! Time sources used to evaluate cache expiry.

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for deterministic expiry checks.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<OffsetDateTime>,
}
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self { now: Mutex::new(start) }
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.now.lock() += delta;
	}

	/// Jumps the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.now.lock() = instant;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(OffsetDateTime::now_utc())
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock()
	}
}

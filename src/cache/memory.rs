//! In-memory cache backend.

// self
use crate::{_prelude::*, cache::CacheBackend, error::CacheError};

/// Keeps the value and its expiry instant in memory.
#[derive(Clone, Debug)]
pub struct MemoryBackend<T> {
	entry: Option<(T, OffsetDateTime)>,
}
impl<T> MemoryBackend<T> {
	/// Returns the expiry instant of the stored value, if any.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.entry.as_ref().map(|(_, expires_at)| *expires_at)
	}
}
impl<T> Default for MemoryBackend<T> {
	fn default() -> Self {
		Self { entry: None }
	}
}
impl<T> CacheBackend<T> for MemoryBackend<T>
where
	T: Clone + Send,
{
	fn is_expired(&self, now: OffsetDateTime, _ttl: Duration) -> bool {
		self.expires_at().is_none_or(|expires_at| now >= expires_at)
	}

	fn load(&self) -> Result<T, CacheError> {
		self.entry
			.as_ref()
			.map(|(value, _)| value.clone())
			.ok_or_else(|| CacheError::Backend { message: "No value has been cached yet".into() })
	}

	fn save(&mut self, value: &T, now: OffsetDateTime, ttl: Duration) -> Result<(), CacheError> {
		self.entry = Some((value.clone(), now + ttl));

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiry_is_armed_on_save() {
		let now = macros::datetime!(2025-03-01 08:00 UTC);
		let mut backend = MemoryBackend::default();

		assert!(backend.is_expired(now, Duration::minutes(1)));
		assert!(backend.load().is_err());

		backend.save(&"token", now, Duration::minutes(1)).expect("Memory save cannot fail.");

		assert_eq!(backend.expires_at(), Some(now + Duration::minutes(1)));
		assert!(!backend.is_expired(now + Duration::seconds(59), Duration::minutes(1)));
		assert!(backend.is_expired(now + Duration::minutes(1), Duration::minutes(1)));
		assert_eq!(backend.load().expect("Saved value should load."), "token");
	}
}

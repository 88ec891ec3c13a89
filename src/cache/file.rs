//! JSON file cache backend with atomic replacement.

// std
use std::{
	fs::{self, File},
	io::Write,
	marker::PhantomData,
};
// self
use crate::{_prelude::*, cache::CacheBackend, error::CacheError};

/// Persists the value as a JSON document and derives expiry from the file's modification time.
///
/// A process restart reuses an unexpired file. Writes go to a sibling `.tmp` file that is then
/// renamed over the destination, so readers never observe a partial document.
#[derive(Debug)]
pub struct FileBackend<T> {
	path: PathBuf,
	_value: PhantomData<fn() -> T>,
}
impl<T> FileBackend<T> {
	/// Creates a backend rooted at `path`. Nothing is read or written until first use.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), _value: PhantomData }
	}

	/// Returns the cache file location.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn modified_at(&self) -> Option<OffsetDateTime> {
		let modified = self.path.metadata().and_then(|metadata| metadata.modified()).ok()?;

		Some(OffsetDateTime::from(modified))
	}

	fn ensure_parent_exists(&self) -> Result<(), CacheError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| CacheError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, serialized: &[u8]) -> Result<(), CacheError> {
		self.ensure_parent_exists()?;

		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| CacheError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(serialized).map_err(|e| CacheError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| CacheError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| CacheError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl<T> CacheBackend<T> for FileBackend<T>
where
	T: Serialize + DeserializeOwned,
{
	fn is_expired(&self, now: OffsetDateTime, ttl: Duration) -> bool {
		self.modified_at().is_none_or(|modified_at| now > modified_at + ttl)
	}

	fn load(&self) -> Result<T, CacheError> {
		tracing::debug!(path = %self.path.display(), "loading cached value from file");

		let bytes = fs::read(&self.path).map_err(|e| CacheError::Backend {
			message: format!("Failed to read {}: {e}", self.path.display()),
		})?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
			CacheError::Serialization {
				message: format!(
					"Failed to parse {} at `{}`: {}",
					self.path.display(),
					e.path(),
					e.inner()
				),
			}
		})
	}

	fn save(&mut self, value: &T, _now: OffsetDateTime, ttl: Duration) -> Result<(), CacheError> {
		if ttl <= Duration::ZERO {
			return Ok(());
		}

		tracing::debug!(path = %self.path.display(), "saving value to cache file");

		let serialized = serde_json::to_vec(value).map_err(|e| CacheError::Serialization {
			message: format!("Failed to serialize cache value: {e}"),
		})?;

		self.persist(&serialized)
	}
}

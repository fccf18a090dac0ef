//! JSON file-backed [`TableStore`] shared by every process on the machine.

// std
use std::{
	env,
	fs::{self, File},
	io::{ErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	session::TokenTable,
	store::{StoreError, TableStore},
};

/// Reads and rewrites the whole token table as one JSON document.
///
/// The table is never cached: every [`load`](TableStore::load) reads the file again so writes
/// from sibling processes are observed.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
}
impl FileStore {
	/// File name used under the default directory.
	pub const DEFAULT_FILE_NAME: &'static str = "tokens.json";

	/// Creates a store backed by `path`. The file is created on first save.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Well-known location shared by every broker on the machine.
	pub fn default_path() -> PathBuf {
		env::temp_dir().join("session-lease-broker").join(Self::DEFAULT_FILE_NAME)
	}

	/// Backing file path.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn decode(&self, bytes: &[u8]) -> Result<TokenTable, StoreError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let table: TokenTable = serde_path_to_error::deserialize(&mut de).map_err(|e| {
			StoreError::Decode {
				message: format!(
					"Failed to parse {} at `{}`: {}",
					self.path.display(),
					e.path(),
					e.inner()
				),
			}
		})?;

		de.end().map_err(|e| StoreError::Decode {
			message: format!("Trailing data in {}: {e}", self.path.display()),
		})?;

		if let Some(host) = table.duplicate_host() {
			return Err(StoreError::Decode {
				message: format!("{} lists host {host} more than once", self.path.display()),
			});
		}

		Ok(table)
	}

	fn ensure_parent_exists(&self) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Io {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}
}
impl Default for FileStore {
	fn default() -> Self {
		Self::new(Self::default_path())
	}
}
impl TableStore for FileStore {
	fn load(&self) -> Result<Option<TokenTable>, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => {
				return Err(StoreError::Io {
					message: format!("Failed to read {}: {e}", self.path.display()),
				});
			},
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Err(StoreError::Decode {
				message: format!("{} exists but is empty", self.path.display()),
			});
		}

		self.decode(&bytes).map(Some)
	}

	fn save(&self, table: &TokenTable) -> Result<(), StoreError> {
		self.ensure_parent_exists()?;

		let serialized = serde_json::to_vec_pretty(table).map_err(|e| StoreError::Encode {
			message: format!("Failed to serialize token table: {e}"),
		})?;
		let mut tmp_path = self.path.clone().into_os_string();

		tmp_path.push(".tmp");

		let tmp_path = PathBuf::from(tmp_path);

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Io {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Io {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Io {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Io {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}

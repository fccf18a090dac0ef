//! Whole-table persistence contract and built-in store implementations.
//!
//! Stores perform no locking of their own; the broker only calls them while it holds the
//! [`ProcessLock`](crate::lock::ProcessLock).

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, session::TokenTable};

/// Storage backend contract for the token table.
pub trait TableStore
where
	Self: Send + Sync,
{
	/// Reads the full table. `Ok(None)` means no table has been written yet.
	fn load(&self) -> Result<Option<TokenTable>, StoreError>;

	/// Replaces the persisted table in full.
	fn save(&self, table: &TokenTable) -> Result<(), StoreError>;
}
impl<T> TableStore for Arc<T>
where
	T: ?Sized + TableStore,
{
	fn load(&self) -> Result<Option<TokenTable>, StoreError> {
		(**self).load()
	}

	fn save(&self, table: &TokenTable) -> Result<(), StoreError> {
		(**self).save(table)
	}
}

/// Error type produced by [`TableStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Reading or writing the backing medium failed.
	#[error("Store I/O failure: {message}.")]
	Io {
		/// Human-readable error payload.
		message: String,
	},
	/// The persisted table could not be decoded.
	#[error("Store decode failure: {message}.")]
	Decode {
		/// Human-readable error payload, including the failing JSON path.
		message: String,
	},
	/// The table could not be encoded.
	#[error("Store encode failure: {message}.")]
	Encode {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_can_be_serialized() {
		let payload = serde_json::to_string(&StoreError::Io { message: "denied".into() })
			.expect("StoreError should serialize to JSON.");

		assert_eq!(payload, "{\"Io\":{\"message\":\"denied\"}}");
	}

	#[test]
	fn arc_store_delegates() {
		let store: Arc<dyn TableStore> = Arc::new(MemoryStore::default());

		assert_eq!(store.load().expect("Empty memory store should load."), None);

		store.save(&TokenTable::default()).expect("Saving through an Arc should succeed.");

		assert_eq!(store.load().expect("Memory store should load."), Some(TokenTable::default()));
	}
}

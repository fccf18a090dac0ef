//! Thread-safe in-memory [`TableStore`] for tests and single-process embedding.

// self
use crate::{
	_prelude::*,
	session::TokenTable,
	store::{StoreError, TableStore},
};

/// Keeps the table in-process; clones share the same table.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<TokenTable>>>);
impl MemoryStore {
	/// Seeds a store with an existing table.
	pub fn with_table(table: TokenTable) -> Self {
		Self(Arc::new(RwLock::new(Some(table))))
	}
}
impl TableStore for MemoryStore {
	fn load(&self) -> Result<Option<TokenTable>, StoreError> {
		Ok(self.0.read().clone())
	}

	fn save(&self, table: &TokenTable) -> Result<(), StoreError> {
		*self.0.write() = Some(table.clone());

		Ok(())
	}
}

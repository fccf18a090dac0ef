//! Share a single appliance login across threads and processes: lease-counted sessions,
//! cross-process exclusion, and a persisted token table in one crate.
//!
//! The [`broker::Broker`] is the entry point. Every call enters a two-layer
//! [`lock::ProcessLock`], reloads the [`session::TokenTable`] from a [`store::TableStore`],
//! applies the lease policy, persists the table, and leaves the lock again.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod broker;
pub mod error;
pub mod ext;
pub mod lock;
pub mod obs;
pub mod session;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		path::{Path, PathBuf},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use {color_eyre as _, tracing_subscriber as _};

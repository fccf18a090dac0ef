//! Session-domain identifiers, the per-host session record, and the token table.

pub mod id;
pub mod record;
pub mod secret;
pub mod table;

pub use id::*;
pub use record::*;
pub use secret::*;
pub use table::*;

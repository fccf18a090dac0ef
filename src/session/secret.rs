//! Redacting wrapper for appliance session strings.

// self
use crate::_prelude::*;

/// Session string returned by a login callback; formatting never reveals the value.
///
/// Serialization writes the raw value so sibling processes can read it back from the table.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionSecret(String);
impl SessionSecret {
	/// Wraps a new session string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner session value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when no session has been issued.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for SessionSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.is_empty() {
			f.write_str("SessionSecret(<empty>)")
		} else {
			f.debug_tuple("SessionSecret").field(&"<redacted>").finish()
		}
	}
}
impl Display for SessionSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

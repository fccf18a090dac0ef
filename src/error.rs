//! Broker-level error types shared across the lock, store, and lease layers.

// self
use crate::{
	_prelude::*,
	session::{HolderId, HostId, IdentifierError},
};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Process-exclusion lock failure.
	#[error(transparent)]
	Lock(#[from] crate::lock::LockError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Host or holder identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),

	/// The most recent login for the host failed; the next acquire retries it.
	#[error("Login to {host} failed: {message}.")]
	Login {
		/// Host whose login failed.
		host: HostId,
		/// Cached failure description from the login callback.
		message: String,
	},
	/// Release was requested for a host that has never been acquired.
	#[error("No session record exists for host {host}.")]
	UnknownHost {
		/// Host named in the release.
		host: HostId,
	},
	/// Release was requested by a holder without an outstanding lease.
	#[error("Holder {holder} holds no lease on host {host}.")]
	NotHeld {
		/// Host named in the release.
		host: HostId,
		/// Holder named in the release.
		holder: HolderId,
	},
}

/// Configuration and validation failures raised while building a broker.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// A policy window must be strictly positive.
	#[error("The {name} window must be positive.")]
	NonPositiveWindow {
		/// Name of the offending setting.
		name: &'static str,
	},
	/// The lock poll interval must be strictly positive.
	#[error("The lock poll interval must be positive.")]
	NonPositivePollInterval,
	/// A history limit of zero would discard every entry.
	#[error("The history limit must keep at least one entry.")]
	EmptyHistoryLimit,
	/// Store and lock must not share a path.
	#[error("Store and lock paths must differ: {path}.")]
	SharedPath {
		/// Path used for both.
		path: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{lock::LockError, store::StoreError};

	#[test]
	fn store_error_converts_into_broker_error_with_source() {
		let store_error = StoreError::Io { message: "disk unplugged".into() };
		let broker_error: Error = store_error.clone().into();

		assert!(matches!(broker_error, Error::Storage(_)));
		assert!(broker_error.to_string().contains("disk unplugged"));

		let source = StdError::source(&broker_error)
			.expect("Broker error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn login_error_names_host_and_cached_message() {
		let host = HostId::new("fw1").expect("Host fixture should be valid.");
		let err = Error::Login { host, message: "invalid credentials".into() };

		assert_eq!(err.to_string(), "Login to fw1 failed: invalid credentials.");
	}

	#[test]
	fn lock_errors_stay_transparent() {
		let err: Error = LockError::Busy.into();

		assert_eq!(err.to_string(), LockError::Busy.to_string());
	}
}

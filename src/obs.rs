//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - `tracing` (default) wraps each broker operation in a span named `session_broker.lease` with
//!   `op` and `host` fields, and emits events for logins, logouts, and lock contention.
//! - `metrics` increments the `session_broker_lease_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod counter;
mod span;

pub use self::{counter::*, span::*};

pub(crate) use self::span::event;

// self
use crate::_prelude::*;

/// Broker operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeaseOp {
	/// Acquiring a session lease.
	Acquire,
	/// Releasing a session lease.
	Release,
	/// Manually invalidating a session.
	Invalidate,
	/// Reading the table for diagnostics.
	Inspect,
}
impl LeaseOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LeaseOp::Acquire => "acquire",
			LeaseOp::Release => "release",
			LeaseOp::Invalidate => "invalidate",
			LeaseOp::Inspect => "inspect",
		}
	}
}
impl Display for LeaseOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeaseOutcome {
	/// Entry to a broker operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl LeaseOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LeaseOutcome::Attempt => "attempt",
			LeaseOutcome::Success => "success",
			LeaseOutcome::Failure => "failure",
		}
	}
}
impl Display for LeaseOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

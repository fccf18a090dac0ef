// self
use crate::obs::{LeaseOp, LeaseOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_lease_outcome(op: LeaseOp, outcome: LeaseOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"session_broker_lease_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

// self
use crate::{_prelude::*, obs::LeaseOp};

/// Emits a `tracing` event when the `tracing` feature is enabled; expands to nothing otherwise.
macro_rules! event {
	($level:ident, $($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	};
}
pub(crate) use event;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct LeaseSpan {
	#[cfg(feature = "tracing")]
	span: ::tracing::Span,
}
impl LeaseSpan {
	/// Creates a new span tagged with the provided operation + host.
	pub fn new(op: LeaseOp, host: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = ::tracing::info_span!("session_broker.lease", op = op.as_str(), host);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, host);

			Self {}
		}
	}

	/// Enters the span for the rest of the operation.
	pub fn entered(self) -> LeaseSpanGuard {
		#[cfg(feature = "tracing")]
		{
			LeaseSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			LeaseSpanGuard {}
		}
	}
}

/// RAII guard returned by [`LeaseSpan::entered`].
pub struct LeaseSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: ::tracing::span::EnteredSpan,
}
impl Debug for LeaseSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("LeaseSpanGuard(..)")
	}
}

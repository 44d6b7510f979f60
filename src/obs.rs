//! Observability for the request pipeline and auth strategies.
//!
//! Every call produces a [`CallTrace`] handed to the client's [`TelemetrySink`]; credential-bearing
//! headers are scrubbed before the trace is built, so sinks never see secrets.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `openworld_sdk.operation` with the
//!   `operation` and `stage` fields, and to route [`TracingTelemetry`] through `tracing` events.
//! - Enable `metrics` to increment the `openworld_sdk_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod telemetry;
mod tracing;

pub use metrics::*;
pub use telemetry::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Pipeline call against the product API.
	Call,
	/// OAuth 2.0 client-credentials grant.
	Grant,
	/// Follow-up request issued by the pagination driver.
	Page,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Call => "call",
			OperationKind::Grant => "grant",
			OperationKind::Page => "page",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an SDK operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}

	/// Maps a finished result onto its outcome label.
	pub fn of<T>(result: &Result<T>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

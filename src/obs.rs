//! Optional observability helpers for authorization flows and credit acquisition.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_gate.flow` with the `flow` (grant)
//!   and `stage` (call site) fields, plus `debug` events whenever a credit has to be waited for.
//! - Enable `metrics` to increment `oauth2_gate_flow_total` (labeled by `flow` + `outcome`) for
//!   every authorization attempt/success/failure and `oauth2_gate_credit_total` (labeled by
//!   `outcome`) for every completed or abandoned credit acquisition.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each authorization attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an authorization helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a credit acquisition ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireOutcome {
	/// Every credit was on hand.
	Immediate,
	/// At least one refill deadline had to be waited for.
	Delayed,
	/// The caller's timeout expired first.
	TimedOut,
}
impl AcquireOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireOutcome::Immediate => "immediate",
			AcquireOutcome::Delayed => "delayed",
			AcquireOutcome::TimedOut => "timed_out",
		}
	}
}
impl Display for AcquireOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

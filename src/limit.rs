//! Token-bucket rate limiting and call gating.
//!
//! [`TokenBucket`] hands out call credits under a bursty or smooth [`Policy`], and
//! [`Gate`] wraps any target so a chosen set of its members withdraws one credit before
//! running. The gate talks to the limiter through the [`Throttle`] trait, which lets
//! callers substitute their own budgeting strategy.

pub mod bucket;
pub mod clock;
pub mod gate;
pub mod policy;

pub use bucket::*;
pub use clock::*;
pub use gate::*;
pub use policy::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::_prelude::*;

/// Boxed future returned by [`Throttle::acquire`].
pub type AcquireFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Source of call credits consulted by a [`Gate`] before a gated member runs.
pub trait Throttle
where
	Self: Send + Sync,
{
	/// Waits (as a suspension point) until `credits` credits have been withdrawn.
	fn acquire(&self, credits: u32) -> AcquireFuture<'_>;

	/// Blocks the calling thread until `credits` credits have been withdrawn.
	fn acquire_blocking(&self, credits: u32);
}

/// Outcome of a single non-blocking credit withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// A credit was withdrawn; the call may proceed immediately.
	Allow,
	/// The bucket is empty until the next refill deadline.
	Delay {
		/// Time remaining until the refill deadline.
		wait: StdDuration,
	},
}
impl RateLimitDecision {
	/// Returns `true` when the decision grants the call.
	pub const fn is_allowed(self) -> bool {
		matches!(self, Self::Allow)
	}
}

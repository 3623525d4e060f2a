//! Bucket policies and their serializable configuration.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Refill policy of a [`TokenBucket`](crate::limit::TokenBucket).
///
/// Both variants keep the configured `(rate, period)` pair so switching back and forth never
/// loses the burst parameters.
#[derive(Clone, Copy, Debug)]
pub enum Policy {
	/// Up to `rate` calls at once, refilled in full every `period`.
	Bursty {
		/// Credits restored on every refill.
		rate: u32,
		/// Time between refills.
		period: StdDuration,
	},
	/// One call per `period / rate`.
	Smooth {
		/// Burst rate the smooth interval is derived from.
		rate: u32,
		/// Burst period the smooth interval is derived from.
		period: StdDuration,
	},
}
impl Policy {
	/// Validates `(rate, period)` and selects the policy matching `bursty`.
	pub fn new(rate: u32, period: StdDuration, bursty: bool) -> Result<Self, ConfigError> {
		if rate == 0 {
			return Err(ConfigError::InvalidRate);
		}
		// The smooth interval must stay positive in both modes.
		if period.is_zero() || (period / rate).is_zero() {
			return Err(ConfigError::InvalidPeriod);
		}

		Ok(if bursty { Self::Bursty { rate, period } } else { Self::Smooth { rate, period } })
	}

	/// Returns `true` for [`Policy::Bursty`].
	pub const fn is_bursty(self) -> bool {
		matches!(self, Self::Bursty { .. })
	}

	/// Maximum number of credits the bucket holds.
	pub const fn capacity(self) -> u32 {
		match self {
			Self::Bursty { rate, .. } => rate,
			Self::Smooth { .. } => 1,
		}
	}

	/// Time between refills.
	pub fn refill_period(self) -> StdDuration {
		match self {
			Self::Bursty { period, .. } => period,
			Self::Smooth { rate, period } => period / rate,
		}
	}

	/// Returns the same `(rate, period)` pair under the requested mode.
	pub const fn with_bursty(self, bursty: bool) -> Self {
		match (self, bursty) {
			(Self::Smooth { rate, period }, true) => Self::Bursty { rate, period },
			(Self::Bursty { rate, period }, false) => Self::Smooth { rate, period },
			(unchanged, _) => unchanged,
		}
	}
}
impl PartialEq for Policy {
	fn eq(&self, other: &Self) -> bool {
		self.capacity() == other.capacity()
			&& self.refill_period() == other.refill_period()
			&& self.is_bursty() == other.is_bursty()
	}
}
impl Eq for Policy {}

/// Serializable rate limit settings.
///
/// `period` is expressed in seconds and may be fractional.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
	/// Calls allowed per period.
	pub rate: u32,
	/// Period length in seconds.
	pub period: f64,
	/// Selects the bursty policy instead of the smooth one.
	pub bursty: bool,
}
impl LimitConfig {
	/// Creates a configuration from a rate and a [`StdDuration`] period.
	pub fn new(rate: u32, period: StdDuration, bursty: bool) -> Self {
		Self { rate, period: period.as_secs_f64(), bursty }
	}

	/// Validates the settings and converts them into a [`Policy`].
	pub fn policy(&self) -> Result<Policy, ConfigError> {
		let period =
			StdDuration::try_from_secs_f64(self.period).map_err(|_| ConfigError::InvalidPeriod)?;

		Policy::new(self.rate, period, self.bursty)
	}
}
impl Default for LimitConfig {
	fn default() -> Self {
		Self { rate: 60, period: 60., bursty: false }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn smooth_policy_rescales_burst_pair() {
		let policy = Policy::new(5, StdDuration::from_secs(1), false)
			.expect("Smooth policy should accept a positive rate and period.");

		assert!(!policy.is_bursty());
		assert_eq!(policy.capacity(), 1);
		assert_eq!(policy.refill_period(), StdDuration::from_millis(200));

		let bursty = policy.with_bursty(true);

		assert_eq!(bursty.capacity(), 5);
		assert_eq!(bursty.refill_period(), StdDuration::from_secs(1));
		assert_eq!(bursty.with_bursty(true), bursty);
	}

	#[test]
	fn rejects_non_positive_inputs() {
		assert!(matches!(
			Policy::new(0, StdDuration::from_secs(1), true),
			Err(ConfigError::InvalidRate)
		));
		assert!(matches!(Policy::new(3, StdDuration::ZERO, true), Err(ConfigError::InvalidPeriod)));
		assert!(matches!(
			Policy::new(10, StdDuration::from_nanos(5), true),
			Err(ConfigError::InvalidPeriod)
		));

		for period in [-1., 0., f64::NAN, f64::INFINITY] {
			let config = LimitConfig { rate: 1, period, bursty: true };

			assert!(matches!(config.policy(), Err(ConfigError::InvalidPeriod)), "{period}");
		}
	}

	#[test]
	fn equality_compares_observable_configuration() {
		let smooth_a = Policy::new(60, StdDuration::from_secs(60), false)
			.expect("Smooth fixture should be valid.");
		let smooth_b = Policy::new(30, StdDuration::from_secs(30), false)
			.expect("Smooth fixture should be valid.");
		let bursty = Policy::new(60, StdDuration::from_secs(60), true)
			.expect("Bursty fixture should be valid.");

		assert_eq!(smooth_a, smooth_b);
		assert_ne!(smooth_a, bursty);
	}

	#[test]
	fn config_deserializes_with_defaults() {
		let config: LimitConfig = serde_json::from_str(r#"{"period":0.5}"#)
			.expect("Partial limit config should deserialize.");

		assert_eq!(config, LimitConfig { rate: 60, period: 0.5, bursty: false });
		assert_eq!(
			config.policy().expect("Deserialized config should be valid.").refill_period(),
			StdDuration::from_secs_f64(0.5) / 60
		);
	}
}

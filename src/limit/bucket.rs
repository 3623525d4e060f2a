//! Token bucket state machine with hard-reset refills.
//!
//! Credits are consumed one at a time. When the bucket is empty and the refill deadline
//! (`last_refill + refill_period`) has passed, the bucket is reset to full capacity in the
//! same critical section that hands out the credit; otherwise the caller waits for the
//! deadline outside the lock and tries again. A refill never accrues more than one
//! bucket's worth of credits, however long the bucket sat idle.

// std
use std::time::{Duration as StdDuration, Instant};
// self
use crate::{
	_prelude::*,
	error::RateLimitError,
	limit::{
		AcquireFuture, Clock, Gate, LimitConfig, Policy, RateLimitDecision, SystemClock, Throttle,
	},
	obs::{self, AcquireOutcome},
};

/// Mutable bucket fields, always replaced or updated under one lock.
#[derive(Clone, Copy, Debug)]
struct BucketState {
	policy: Policy,
	available: u32,
	last_refill: Instant,
}
impl BucketState {
	fn full(policy: Policy, now: Instant) -> Self {
		Self { policy, available: policy.capacity(), last_refill: now }
	}

	fn with_bursty(self, bursty: bool) -> Self {
		let policy = self.policy.with_bursty(bursty);

		Self { policy, available: self.available.min(policy.capacity()), ..self }
	}

	fn withdraw(&mut self, clock: &impl Clock) -> RateLimitDecision {
		if self.available == 0 {
			let now = clock.now();
			let deadline = self.last_refill + self.policy.refill_period();

			if now < deadline {
				return RateLimitDecision::Delay { wait: deadline - now };
			}

			self.last_refill = now;
			self.available = self.policy.capacity();
		}

		self.available -= 1;

		RateLimitDecision::Allow
	}
}

/// Thread-safe token bucket shared by every gated call.
pub struct TokenBucket<C = SystemClock>
where
	C: Clock,
{
	state: Mutex<BucketState>,
	clock: C,
}
impl TokenBucket {
	/// Creates a bucket allowing `rate` calls per `period` on the system clock.
	///
	/// With `bursty` the full `rate` is available at once and restored every `period`;
	/// otherwise credits arrive one at a time every `period / rate`.
	pub fn new(rate: u32, period: StdDuration, bursty: bool) -> Result<Self> {
		Self::with_clock(rate, period, bursty, SystemClock)
	}

	/// Creates a system-clock bucket from serialized settings.
	pub fn from_config(config: &LimitConfig) -> Result<Self> {
		Ok(Self::with_policy(config.policy()?, SystemClock))
	}
}
impl<C> TokenBucket<C>
where
	C: Clock,
{
	/// Creates a bucket driven by a custom [`Clock`].
	pub fn with_clock(rate: u32, period: StdDuration, bursty: bool, clock: C) -> Result<Self> {
		Ok(Self::with_policy(Policy::new(rate, period, bursty)?, clock))
	}

	/// Creates a full bucket for an already validated policy.
	pub fn with_policy(policy: Policy, clock: C) -> Self {
		let state = BucketState::full(policy, clock.now());

		Self { state: Mutex::new(state), clock }
	}

	/// Converts a signed credit count into the unsigned form [`TokenBucket::take`] expects.
	pub fn credits(value: i64) -> Result<u32, RateLimitError> {
		u32::try_from(value).map_err(|_| RateLimitError::InvalidArgument { value })
	}

	/// Current policy.
	pub fn policy(&self) -> Policy {
		self.state.lock().policy
	}

	/// Maximum credits the bucket holds under the current policy.
	pub fn capacity(&self) -> u32 {
		self.policy().capacity()
	}

	/// Time between refills under the current policy.
	pub fn refill_period(&self) -> StdDuration {
		self.policy().refill_period()
	}

	/// Credits available right now, without triggering a refill.
	pub fn available(&self) -> u32 {
		self.state.lock().available
	}

	/// Returns `true` when the bursty policy is active.
	pub fn is_bursty(&self) -> bool {
		self.policy().is_bursty()
	}

	/// Switches between the bursty and smooth policies.
	///
	/// Available credits are clamped to the new capacity and never raised. Setting the
	/// current mode again is a no-op.
	pub fn set_bursty(&self, bursty: bool) {
		let mut state = self.state.lock();

		*state = state.with_bursty(bursty);
	}

	/// Withdraws one credit if possible, without waiting.
	pub fn try_take(&self) -> RateLimitDecision {
		self.state.lock().withdraw(&self.clock)
	}

	/// Withdraws `credits` credits, suspending the task until each one is available.
	///
	/// Dropping the future abandons the remaining credits; the ones already withdrawn stay
	/// spent.
	pub async fn take(&self, credits: u32) {
		let mut outcome = AcquireOutcome::Immediate;

		for taken in 0..credits {
			while let RateLimitDecision::Delay { wait } = self.try_take() {
				outcome = AcquireOutcome::Delayed;

				obs::trace_credit_wait(credits - taken, wait);
				self.clock.sleep(wait).await;
			}
		}

		obs::record_acquire_outcome(outcome);
	}

	/// Withdraws `credits` credits, blocking the thread until each one is available.
	pub fn take_blocking(&self, credits: u32) {
		let mut outcome = AcquireOutcome::Immediate;

		for taken in 0..credits {
			while let RateLimitDecision::Delay { wait } = self.try_take() {
				outcome = AcquireOutcome::Delayed;

				obs::trace_credit_wait(credits - taken, wait);
				self.clock.sleep_blocking(wait);
			}
		}

		obs::record_acquire_outcome(outcome);
	}

	/// Like [`TokenBucket::take`], but gives up once `timeout` has elapsed.
	///
	/// Waits are capped at the remaining timeout, so a policy switch made meanwhile is picked
	/// up on the next attempt.
	pub async fn take_timeout(&self, credits: u32, timeout: StdDuration) -> Result<()> {
		let give_up = self.clock.now().checked_add(timeout);
		let mut outcome = AcquireOutcome::Immediate;

		for taken in 0..credits {
			while let RateLimitDecision::Delay { wait } = self.try_take() {
				let pause = self.pause_before(give_up, wait, credits - taken)?;

				outcome = AcquireOutcome::Delayed;

				self.clock.sleep(pause).await;
			}
		}

		obs::record_acquire_outcome(outcome);

		Ok(())
	}

	/// Like [`TokenBucket::take_blocking`], but gives up once `timeout` has elapsed.
	pub fn take_blocking_timeout(&self, credits: u32, timeout: StdDuration) -> Result<()> {
		let give_up = self.clock.now().checked_add(timeout);
		let mut outcome = AcquireOutcome::Immediate;

		for taken in 0..credits {
			while let RateLimitDecision::Delay { wait } = self.try_take() {
				let pause = self.pause_before(give_up, wait, credits - taken)?;

				outcome = AcquireOutcome::Delayed;

				self.clock.sleep_blocking(pause);
			}
		}

		obs::record_acquire_outcome(outcome);

		Ok(())
	}

	/// Wraps `target` so that every listed member withdraws one credit per use.
	pub fn gate<T, I>(self: &Arc<Self>, target: T, members: I) -> Gate<T, Self>
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		Gate::new(target, Arc::clone(self), members)
	}

	// A deadline past the clock's range never expires.
	fn pause_before(
		&self,
		give_up: Option<Instant>,
		wait: StdDuration,
		missing: u32,
	) -> Result<StdDuration, RateLimitError> {
		let pause = match give_up {
			Some(give_up) => {
				let now = self.clock.now();

				if now >= give_up {
					obs::record_acquire_outcome(AcquireOutcome::TimedOut);

					return Err(RateLimitError::TimedOut { credits: missing });
				}

				wait.min(give_up - now)
			},
			None => wait,
		};

		obs::trace_credit_wait(missing, wait);

		Ok(pause)
	}
}
impl<C> Throttle for TokenBucket<C>
where
	C: Clock,
{
	fn acquire(&self, credits: u32) -> AcquireFuture<'_> {
		Box::pin(self.take(credits))
	}

	fn acquire_blocking(&self, credits: u32) {
		self.take_blocking(credits);
	}
}
impl<C> PartialEq for TokenBucket<C>
where
	C: Clock,
{
	fn eq(&self, other: &Self) -> bool {
		self.policy() == other.policy()
	}
}
impl<C> Debug for TokenBucket<C>
where
	C: Clock,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = *self.state.lock();

		f.debug_struct("TokenBucket")
			.field("capacity", &state.policy.capacity())
			.field("refill_period", &state.policy.refill_period())
			.field("bursty", &state.policy.is_bursty())
			.field("available", &state.available)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{collections::VecDeque, thread};
	// self
	use super::*;
	use crate::{_preludet::manual_bucket, limit::SleepFuture};

	/// Clock replaying fixed readings (in milliseconds) and recording sleeps without moving.
	#[derive(Clone)]
	struct ScriptedClock(Arc<Mutex<Script>>);
	struct Script {
		origin: Instant,
		readings: VecDeque<u64>,
		reads: usize,
		sleeps: Vec<StdDuration>,
	}
	impl ScriptedClock {
		fn new(readings: impl IntoIterator<Item = u64>) -> Self {
			Self(Arc::new(Mutex::new(Script {
				origin: Instant::now(),
				readings: readings.into_iter().collect(),
				reads: 0,
				sleeps: Vec::new(),
			})))
		}

		fn reads(&self) -> usize {
			self.0.lock().reads
		}

		fn sleeps(&self) -> Vec<StdDuration> {
			self.0.lock().sleeps.clone()
		}
	}
	impl Clock for ScriptedClock {
		fn now(&self) -> Instant {
			let mut script = self.0.lock();
			let millis =
				script.readings.pop_front().expect("Scripted clock ran out of readings.");

			script.reads += 1;

			script.origin + StdDuration::from_millis(millis)
		}

		fn sleep(&self, duration: StdDuration) -> SleepFuture<'_> {
			self.sleep_blocking(duration);

			Box::pin(std::future::ready(()))
		}

		fn sleep_blocking(&self, duration: StdDuration) {
			self.0.lock().sleeps.push(duration);
		}
	}

	#[test]
	fn smooth_bucket_rescales_capacity_and_period() {
		let (bucket, clock) = manual_bucket(5, StdDuration::from_millis(1_000), false);

		assert_eq!(bucket.capacity(), 1);
		assert_eq!(bucket.available(), 1);
		assert_eq!(bucket.refill_period(), StdDuration::from_millis(200));

		bucket.take_blocking(1);

		assert_eq!(bucket.available(), 0);
		assert!(clock.sleeps().is_empty());

		bucket.take_blocking(1);

		assert_eq!(clock.sleeps(), vec![StdDuration::from_millis(200)]);
	}

	#[test]
	fn bursty_toggle_clamps_and_restores() {
		let (bucket, _clock) = manual_bucket(5, StdDuration::from_millis(1_000), true);

		assert_eq!(bucket.available(), 5);
		assert_eq!(bucket.refill_period(), StdDuration::from_secs(1));

		bucket.set_bursty(false);
		bucket.set_bursty(false);

		assert_eq!(bucket.capacity(), 1);
		assert_eq!(bucket.available(), 1);
		assert_eq!(bucket.refill_period(), StdDuration::from_millis(200));

		bucket.take_blocking(1);
		bucket.set_bursty(true);
		bucket.set_bursty(true);

		assert_eq!(bucket.capacity(), 5);
		assert_eq!(bucket.available(), 0);
		assert_eq!(bucket.refill_period(), StdDuration::from_secs(1));
	}

	#[test]
	fn toggling_round_trip_restores_state() {
		let (bucket, _clock) = manual_bucket(4, StdDuration::from_millis(2_000), false);
		let before = (bucket.capacity(), bucket.refill_period(), bucket.available());

		bucket.set_bursty(true);

		assert_eq!((bucket.capacity(), bucket.available()), (4, 1));

		bucket.set_bursty(false);

		assert_eq!((bucket.capacity(), bucket.refill_period(), bucket.available()), before);
	}

	#[test]
	fn full_bucket_never_sleeps() {
		let (bucket, clock) = manual_bucket(5, StdDuration::from_millis(1_000), true);

		bucket.take_blocking(1);

		assert_eq!(bucket.available(), 4);

		bucket.take_blocking(4);

		assert_eq!(bucket.available(), 0);
		assert!(clock.sleeps().is_empty());

		bucket.take_blocking(0);

		assert!(clock.sleeps().is_empty());
	}

	#[test]
	fn sleeps_until_refill_deadline() {
		let clock = ScriptedClock::new([0, 100, 200, 1_000]);
		let bucket = TokenBucket::with_clock(1, StdDuration::from_secs(1), true, clock.clone())
			.expect("Scripted bucket should be valid.");

		bucket.take_blocking(1);

		assert_eq!(bucket.available(), 0);
		assert!(clock.sleeps().is_empty());

		bucket.take_blocking(1);

		assert_eq!(bucket.available(), 0);
		assert_eq!(clock.sleeps(), vec![StdDuration::from_millis(900), StdDuration::from_millis(800)]);
		assert_eq!(clock.reads(), 4);
	}

	#[test]
	fn many_credits_from_small_bucket_refill_each_time() {
		let clock = ScriptedClock::new((0..100).map(|secs| secs * 1_000));
		let bucket = TokenBucket::with_clock(1, StdDuration::from_secs(1), true, clock.clone())
			.expect("Scripted bucket should be valid.");

		bucket.take_blocking(1);
		bucket.take_blocking(8);

		assert_eq!(bucket.available(), 0);
		assert_eq!(clock.reads(), 9);
		assert!(clock.sleeps().is_empty());
	}

	#[test]
	fn many_credits_from_big_bucket_read_clock_per_refill() {
		let clock = ScriptedClock::new((0..100).map(|secs| secs * 1_000));
		let bucket = TokenBucket::with_clock(3, StdDuration::from_secs(1), true, clock.clone())
			.expect("Scripted bucket should be valid.");

		bucket.take_blocking(1);

		assert_eq!(bucket.available(), 2);

		bucket.take_blocking(8);

		assert_eq!(bucket.available(), 0);
		assert_eq!(clock.reads(), 3);
	}

	#[test]
	fn refill_does_not_accrue_beyond_capacity() {
		let (bucket, clock) = manual_bucket(3, StdDuration::from_millis(1_000), true);

		bucket.take_blocking(3);
		clock.advance(StdDuration::from_secs(60));

		assert_eq!(bucket.try_take(), RateLimitDecision::Allow);
		assert_eq!(bucket.available(), 2);

		bucket.take_blocking(2);

		assert_eq!(
			bucket.try_take(),
			RateLimitDecision::Delay { wait: StdDuration::from_secs(1) }
		);
	}

	#[test]
	fn fresh_bursty_bucket_allows_rate_then_waits_a_period() {
		let (bucket, clock) = manual_bucket(4, StdDuration::from_millis(500), true);

		bucket.take_blocking(4);

		assert!(clock.sleeps().is_empty());

		bucket.take_blocking(1);

		assert_eq!(clock.sleeps(), vec![StdDuration::from_millis(500)]);
		assert_eq!(bucket.available(), 3);
	}

	#[tokio::test]
	async fn async_take_suspends_until_deadline() {
		let (bucket, clock) = manual_bucket(1, StdDuration::from_millis(1_000), true);

		bucket.take(1).await;
		clock.advance(StdDuration::from_millis(250));
		bucket.take(1).await;

		assert_eq!(clock.sleeps(), vec![StdDuration::from_millis(750)]);
	}

	#[tokio::test]
	async fn take_timeout_reports_missing_credits() {
		let (bucket, clock) = manual_bucket(1, StdDuration::from_millis(1_000), true);

		bucket.take(1).await;

		let err = bucket
			.take_timeout(2, StdDuration::from_millis(300))
			.await
			.expect_err("A 300ms timeout should expire before the 1s refill.");

		assert!(matches!(err, Error::RateLimit(RateLimitError::TimedOut { credits: 2 })));
		assert_eq!(clock.sleeps(), vec![StdDuration::from_millis(300)]);

		bucket
			.take_timeout(1, StdDuration::from_secs(2))
			.await
			.expect("A 2s timeout should cover the remaining 700ms.");

		assert_eq!(bucket.available(), 0);
	}

	#[test]
	fn blocking_timeout_succeeds_when_credit_is_available() {
		let (bucket, clock) = manual_bucket(2, StdDuration::from_millis(1_000), true);

		bucket
			.take_blocking_timeout(2, StdDuration::ZERO)
			.expect("Credits on hand should not need any waiting.");

		let err = bucket
			.take_blocking_timeout(1, StdDuration::ZERO)
			.expect_err("An empty bucket cannot satisfy a zero timeout.");

		assert!(matches!(err, Error::RateLimit(RateLimitError::TimedOut { credits: 1 })));
		assert!(clock.sleeps().is_empty());
	}

	#[tokio::test]
	async fn unbounded_timeout_waits_like_plain_take() {
		let (bucket, clock) = manual_bucket(1, StdDuration::from_millis(1_000), true);

		bucket
			.take_blocking_timeout(1, StdDuration::MAX)
			.expect("Credits on hand should be taken without a deadline.");
		bucket
			.take_blocking_timeout(1, StdDuration::MAX)
			.expect("A deadline past the clock's range should never expire.");
		bucket
			.take_timeout(1, StdDuration::MAX)
			.await
			.expect("A deadline past the clock's range should never expire.");

		assert_eq!(clock.sleeps(), vec![StdDuration::from_secs(1), StdDuration::from_secs(1)]);
	}

	#[test]
	fn signed_credit_counts_are_validated() {
		assert_eq!(TokenBucket::<SystemClock>::credits(3), Ok(3));
		assert_eq!(
			TokenBucket::<SystemClock>::credits(-1),
			Err(RateLimitError::InvalidArgument { value: -1 })
		);
	}

	#[test]
	fn equality_ignores_available_credits() {
		let limit1 = TokenBucket::new(60, StdDuration::from_secs(60), false)
			.expect("Fixture bucket should be valid.");
		let limit2 = TokenBucket::new(60, StdDuration::from_secs(60), true)
			.expect("Fixture bucket should be valid.");
		let limit3 = TokenBucket::new(25, StdDuration::from_secs(50), true)
			.expect("Fixture bucket should be valid.");
		let limit4 = TokenBucket::new(60, StdDuration::from_secs(60), false)
			.expect("Fixture bucket should be valid.");

		limit4.take_blocking(1);

		assert_eq!(limit1, limit4);
		assert_eq!(limit4, limit1);
		assert_ne!(limit1, limit2);
		assert_ne!(limit1, limit3);
	}

	#[test]
	fn concurrent_takers_never_double_refill() {
		let bucket = Arc::new(
			TokenBucket::new(3, StdDuration::from_millis(100), true)
				.expect("Concurrent bucket should be valid."),
		);
		let start = Instant::now();
		let workers = (0..4)
			.map(|_| {
				let bucket = Arc::clone(&bucket);

				thread::spawn(move || bucket.take_blocking(3))
			})
			.collect::<Vec<_>>();

		for worker in workers {
			worker.join().expect("Worker thread should not panic.");
		}

		// 12 credits from a bucket of 3 need three refills.
		assert!(start.elapsed() >= StdDuration::from_millis(300));
	}
}

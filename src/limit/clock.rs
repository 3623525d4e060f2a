//! Monotonic time sources driving bucket refills and waits.

// std
use std::time::{Duration as StdDuration, Instant};
// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Monotonic clock plus the two ways of waiting on it.
pub trait Clock
where
	Self: 'static + Send + Sync,
{
	/// Returns the current monotonic instant.
	fn now(&self) -> Instant;

	/// Suspends the current task for `duration`.
	fn sleep(&self, duration: StdDuration) -> SleepFuture<'_>;

	/// Blocks the current thread for `duration`.
	fn sleep_blocking(&self, duration: StdDuration);
}

/// Wall clock backed by [`Instant`] and the tokio timer.
///
/// [`Clock::sleep`] requires a tokio runtime with the time driver enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}

	fn sleep(&self, duration: StdDuration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(duration))
	}

	fn sleep_blocking(&self, duration: StdDuration) {
		std::thread::sleep(duration);
	}
}

/// Deterministic clock whose time only moves when advanced or slept on.
///
/// Sleeping advances the clock by the requested duration and completes immediately, so
/// limiter waits resolve without real delays. Every sleep is recorded for assertions.
/// Clones share the same timeline.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<ManualTimeline>>);
#[derive(Debug)]
struct ManualTimeline {
	origin: Instant,
	elapsed: StdDuration,
	sleeps: Vec<StdDuration>,
}
impl ManualClock {
	/// Creates a clock anchored at the current instant.
	pub fn new() -> Self {
		Self(Arc::new(Mutex::new(ManualTimeline {
			origin: Instant::now(),
			elapsed: StdDuration::ZERO,
			sleeps: Vec::new(),
		})))
	}

	/// Moves the clock forward without recording a sleep.
	pub fn advance(&self, duration: StdDuration) {
		self.0.lock().elapsed += duration;
	}

	/// Time elapsed since the clock was created.
	pub fn elapsed(&self) -> StdDuration {
		self.0.lock().elapsed
	}

	/// Sleeps requested so far, in order.
	pub fn sleeps(&self) -> Vec<StdDuration> {
		self.0.lock().sleeps.clone()
	}

	fn record_sleep(&self, duration: StdDuration) {
		let mut timeline = self.0.lock();

		timeline.sleeps.push(duration);
		timeline.elapsed += duration;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Instant {
		let timeline = self.0.lock();

		timeline.origin + timeline.elapsed
	}

	fn sleep(&self, duration: StdDuration) -> SleepFuture<'_> {
		self.record_sleep(duration);

		Box::pin(std::future::ready(()))
	}

	fn sleep_blocking(&self, duration: StdDuration) {
		self.record_sleep(duration);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn manual_clock_advances_on_sleep() {
		let clock = ManualClock::new();
		let start = clock.now();

		clock.sleep_blocking(StdDuration::from_millis(250));
		clock.advance(StdDuration::from_millis(50));

		assert_eq!(clock.now() - start, StdDuration::from_millis(300));
		assert_eq!(clock.sleeps(), vec![StdDuration::from_millis(250)]);
	}

	#[tokio::test]
	async fn system_clock_sleep_waits() {
		let clock = SystemClock;
		let start = clock.now();

		clock.sleep(StdDuration::from_millis(20)).await;

		assert!(clock.now() - start >= StdDuration::from_millis(20));
	}
}

use std::time::Duration;

/// Capped exponential back-off: `initial`, doubling per consecutive failure,
/// never above `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
	initial: Duration,
	max: Duration,
	failures: u32,
}

impl Backoff {
	#[must_use]
	pub const fn new(initial: Duration, max: Duration) -> Self {
		Self { initial, max, failures: 0 }
	}

	/// Delay before attempt number `attempt` (1-based)
	#[must_use]
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
		self.initial.saturating_mul(factor).min(self.max)
	}

	/// Record a failure and return how long to wait before the next try
	pub fn next_delay(&mut self) -> Duration {
		self.failures = self.failures.saturating_add(1);
		self.delay_for(self.failures)
	}

	pub fn reset(&mut self) {
		self.failures = 0;
	}

	#[must_use]
	pub const fn failures(&self) -> u32 {
		self.failures
	}
}

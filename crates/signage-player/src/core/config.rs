use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
	/// Failures tolerated before the machine gives up and stops
	pub retry_budget: u32,
	/// Number of recent message ids remembered for duplicate detection
	pub dedupe_window: usize,
	pub initial_volume: u8,
}

impl Default for PlayerConfig {
	fn default() -> Self {
		Self {
			retry_budget: 3,
			dedupe_window: 256,
			initial_volume: 100,
		}
	}
}

impl PlayerConfig {
	#[must_use]
	pub const fn with_retry_budget(mut self, budget: u32) -> Self {
		self.retry_budget = budget;
		self
	}
}

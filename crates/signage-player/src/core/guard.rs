use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

use super::error::{PlayerError, Result};
use super::CommandFamily;

/// Admission control for commands delivered at-least-once and possibly out
/// of order.
///
/// A command is dropped when its id was seen recently, when it predates the
/// last emergency stop, or when it is older than the last admitted command of
/// the same family. Equal timestamps are admitted.
#[derive(Debug)]
pub struct CommandGuard {
	capacity: usize,
	recent: VecDeque<Uuid>,
	seen: HashSet<Uuid>,
	last_admitted: HashMap<CommandFamily, DateTime<Utc>>,
}

impl CommandGuard {
	#[must_use]
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			capacity,
			recent: VecDeque::with_capacity(capacity),
			seen: HashSet::with_capacity(capacity),
			last_admitted: HashMap::new(),
		}
	}

	/// # Errors
	/// The reason the command must not be applied.
	pub fn check(&self, id: Uuid, issued_at: DateTime<Utc>, family: CommandFamily) -> Result<()> {
		if self.seen.contains(&id) {
			return Err(PlayerError::Duplicate(id));
		}

		if family != CommandFamily::EmergencyStop && self.last_emergency_stop().is_some_and(|stop| issued_at < stop) {
			return Err(PlayerError::PrecedesEmergencyStop);
		}

		if self.last_admitted.get(&family).is_some_and(|last| issued_at < *last) {
			return Err(PlayerError::OutOfOrder(family.as_str()));
		}

		Ok(())
	}

	/// Check and, on success, remember the command
	///
	/// # Errors
	/// See [`CommandGuard::check`].
	pub fn admit(&mut self, id: Uuid, issued_at: DateTime<Utc>, family: CommandFamily) -> Result<()> {
		self.check(id, issued_at, family)?;

		if self.recent.len() == self.capacity {
			if let Some(oldest) = self.recent.pop_front() {
				self.seen.remove(&oldest);
			}
		}
		self.recent.push_back(id);
		self.seen.insert(id);
		self.last_admitted.insert(family, issued_at);

		Ok(())
	}

	#[must_use]
	pub fn last_emergency_stop(&self) -> Option<DateTime<Utc>> {
		self.last_admitted.get(&CommandFamily::EmergencyStop).copied()
	}
}

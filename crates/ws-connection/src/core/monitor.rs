use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use std::{fmt, sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::errors::ConnectionError;
use crate::types::EntityId;

#[derive(Clone, Debug)]
pub struct LivenessPolicy {
	/// No heartbeat for longer than this => offline
	pub heartbeat_timeout: Duration,
	/// Scanning interval
	pub sweep_interval: Duration,
}

impl Default for LivenessPolicy {
	fn default() -> Self {
		Self {
			heartbeat_timeout: Duration::from_secs(180),
			sweep_interval: Duration::from_secs(15),
		}
	}
}

impl LivenessPolicy {
	#[must_use]
	pub const fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
		self.heartbeat_timeout = timeout;
		self
	}

	#[must_use]
	pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
		self.sweep_interval = interval;
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
	Online,
	Offline,
}

impl Liveness {
	#[must_use]
	pub const fn is_online(self) -> bool {
		matches!(self, Self::Online)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
	Registered,
	Heartbeat,
	TimedOut,
	Disconnected,
}

impl fmt::Display for TransitionCause {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let cause = match self {
			Self::Registered => "registered",
			Self::Heartbeat => "heartbeat",
			Self::TimedOut => "timed_out",
			Self::Disconnected => "disconnected",
		};
		write!(f, "{cause}")
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessTransition {
	pub entity_id: EntityId,
	pub liveness: Liveness,
	pub cause: TransitionCause,
	pub at: DateTime<Utc>,
}

impl LivenessTransition {
	fn new(entity_id: EntityId, liveness: Liveness, cause: TransitionCause) -> Self {
		Self {
			entity_id,
			liveness,
			cause,
			at: Utc::now(),
		}
	}
}

/// Reachability of one display as the hub sees it
#[derive(Debug, Clone)]
pub struct DisplayRuntimeStatus {
	pub display_id: EntityId,
	pub online: bool,
	pub last_heartbeat_at: Instant,
	pub last_seen: DateTime<Utc>,
}

impl DisplayRuntimeStatus {
	fn online_at(display_id: EntityId, now: Instant) -> Self {
		Self {
			display_id,
			online: true,
			last_heartbeat_at: now,
			last_seen: Utc::now(),
		}
	}

	fn touch(&mut self, now: Instant) {
		self.last_heartbeat_at = now;
		self.last_seen = Utc::now();
	}

	#[must_use]
	pub fn silent_for(&self, now: Instant) -> Duration {
		now.saturating_duration_since(self.last_heartbeat_at)
	}
}

/// Receives every transition while the display's entry is still locked, so
/// observers see the transitions of one display in the order they happened.
///
/// Implementations must not call back into the tracker.
pub trait LivenessObserver: Send + Sync {
	fn on_transition(&self, transition: &LivenessTransition);
}

/// Derives online/offline from registration, heartbeats and disconnects.
///
/// Every method takes `now` explicitly and returns the transitions it caused.
/// A display flips to offline at most once per continuous period of silence,
/// and back to online only on a heartbeat or a fresh registration.
pub struct LivenessTracker {
	policy: LivenessPolicy,
	statuses: DashMap<EntityId, DisplayRuntimeStatus>,
	observer: Option<Arc<dyn LivenessObserver>>,
}

impl LivenessTracker {
	#[must_use]
	pub fn new(policy: LivenessPolicy) -> Self {
		Self {
			policy,
			statuses: DashMap::new(),
			observer: None,
		}
	}

	#[must_use]
	pub fn with_observer(mut self, observer: Arc<dyn LivenessObserver>) -> Self {
		self.observer = Some(observer);
		self
	}

	#[must_use]
	pub const fn policy(&self) -> &LivenessPolicy {
		&self.policy
	}

	fn emit(&self, transition: LivenessTransition) -> LivenessTransition {
		if let Some(observer) = &self.observer {
			observer.on_transition(&transition);
		}
		transition
	}

	/// Start (or restart) tracking after a successful registration
	pub fn track(&self, display_id: &EntityId, now: Instant) -> Option<LivenessTransition> {
		match self.statuses.entry(display_id.clone()) {
			Entry::Occupied(mut occupied) => {
				let status = occupied.get_mut();
				let was_online = status.online;
				status.online = true;
				status.touch(now);

				(!was_online).then(|| self.emit(LivenessTransition::new(display_id.clone(), Liveness::Online, TransitionCause::Registered)))
			}
			Entry::Vacant(vacant) => {
				let _status = vacant.insert(DisplayRuntimeStatus::online_at(display_id.clone(), now));
				Some(self.emit(LivenessTransition::new(display_id.clone(), Liveness::Online, TransitionCause::Registered)))
			}
		}
	}

	/// Record a heartbeat.
	///
	/// # Errors
	/// `NotTracked` if the display has not registered.
	pub fn heartbeat(&self, display_id: &EntityId, now: Instant) -> Result<Option<LivenessTransition>, ConnectionError> {
		let mut status = self.statuses.get_mut(display_id).ok_or_else(|| ConnectionError::NotTracked(display_id.clone()))?;

		status.touch(now);
		if status.online {
			return Ok(None);
		}

		status.online = true;
		info!(display = %display_id, "display reachable again after heartbeat");
		let transition = self.emit(LivenessTransition::new(display_id.clone(), Liveness::Online, TransitionCause::Heartbeat));
		drop(status);

		Ok(Some(transition))
	}

	/// Stop tracking once `released` confirms no newer channel speaks for
	/// the display; offline immediately unless already offline.
	///
	/// `released` runs while the display's entry is locked, so a
	/// registration racing this call either lands before it (and the display
	/// stays tracked) or after it (and tracks the display afresh).
	pub fn disconnect(&self, display_id: &EntityId, released: impl FnOnce() -> bool) -> Option<LivenessTransition> {
		let Entry::Occupied(occupied) = self.statuses.entry(display_id.clone()) else {
			return None;
		};

		if !released() {
			debug!(display = %display_id, "display rebound before its old channel closed, still tracked");
			return None;
		}

		let transition = occupied
			.get()
			.online
			.then(|| self.emit(LivenessTransition::new(display_id.clone(), Liveness::Offline, TransitionCause::Disconnected)));
		occupied.remove();

		transition
	}

	/// Flip every silent display to offline
	pub fn sweep(&self, now: Instant) -> Vec<LivenessTransition> {
		let timeout = self.policy.heartbeat_timeout;
		let mut transitions = Vec::new();

		for mut status in self.statuses.iter_mut() {
			if status.online && status.silent_for(now) > timeout {
				status.online = false;
				debug!(display = %status.display_id, silent_for = ?status.silent_for(now), "heartbeat window exceeded");
				transitions.push(self.emit(LivenessTransition::new(status.display_id.clone(), Liveness::Offline, TransitionCause::TimedOut)));
			}
		}

		transitions
	}

	pub fn is_online(&self, display_id: &EntityId) -> bool {
		self.statuses.get(display_id).is_some_and(|status| status.online)
	}

	pub fn status(&self, display_id: &EntityId) -> Option<DisplayRuntimeStatus> {
		self.statuses.get(display_id).map(|status| status.value().clone())
	}

	pub fn snapshot(&self) -> Vec<DisplayRuntimeStatus> {
		let mut statuses: Vec<_> = self.statuses.iter().map(|status| status.value().clone()).collect();
		statuses.sort_by(|a, b| a.display_id.cmp(&b.display_id));
		statuses
	}

	pub fn online_count(&self) -> usize {
		self.statuses.iter().filter(|status| status.online).count()
	}

	pub fn tracked_count(&self) -> usize {
		self.statuses.len()
	}
}

impl fmt::Debug for LivenessTracker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LivenessTracker")
			.field("policy", &self.policy)
			.field("tracked", &self.statuses.len())
			.field("observed", &self.observer.is_some())
			.finish()
	}
}

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ws_connection::{ConnectionError, EntityId, LivenessObserver, LivenessPolicy, LivenessTracker, LivenessTransition};
use ws_events::DisplaySummary;

use crate::directory::Directory;
use crate::fanout::AdminFanout;
use crate::metrics::{HUB_DIRECTORY_WRITES, HUB_DISPLAYS_ONLINE, HUB_LIVENESS_TRANSITIONS};
use crate::Registry;

#[derive(Debug)]
struct OnlineWrite {
	display_id: EntityId,
	online: bool,
}

/// Carries out each transition while the tracker still holds the display's
/// entry: one admin fan-out and one queued directory write, in the order the
/// transitions happened.
struct TransitionPublisher {
	fanout: AdminFanout,
	writes: mpsc::UnboundedSender<OnlineWrite>,
}

impl LivenessObserver for TransitionPublisher {
	fn on_transition(&self, transition: &LivenessTransition) {
		let online = transition.liveness.is_online();
		let label = if online { "online" } else { "offline" };

		info!(display = %transition.entity_id, cause = %transition.cause, "display {label}");
		HUB_LIVENESS_TRANSITIONS.with_label_values(&[label, &transition.cause.to_string()]).inc();
		if online {
			HUB_DISPLAYS_ONLINE.inc();
		} else {
			HUB_DISPLAYS_ONLINE.dec();
		}

		self.fanout.liveness(transition);

		let write = OnlineWrite {
			display_id: transition.entity_id.clone(),
			online,
		};
		if self.writes.send(write).is_err() {
			HUB_DIRECTORY_WRITES.with_label_values(&["dropped"]).inc();
			warn!(display = %transition.entity_id, "directory writer stopped; online flag not recorded");
		}
	}
}

/// Runs the liveness tracker against the wall clock.
pub struct LivenessMonitor {
	tracker: LivenessTracker,
	registry: Arc<Registry>,
}

impl LivenessMonitor {
	/// Must be called inside a runtime; spawns the directory writer
	#[must_use]
	pub fn new(policy: LivenessPolicy, registry: Arc<Registry>, fanout: AdminFanout, directory: Arc<dyn Directory>, parent_token: &CancellationToken) -> Self {
		let (writes, queue) = mpsc::unbounded_channel();
		tokio::spawn(run_directory_writer(directory, queue, parent_token.child_token()));

		Self {
			tracker: LivenessTracker::new(policy).with_observer(Arc::new(TransitionPublisher { fanout, writes })),
			registry,
		}
	}

	pub fn registered(&self, display_id: &EntityId) {
		self.tracker.track(display_id, Instant::now());
	}

	/// Heartbeat from a channel known to be bound to `display_id`. A display
	/// whose tracking was released by an older channel's disconnect is
	/// tracked again here.
	pub fn heartbeat(&self, display_id: &EntityId) {
		let now = Instant::now();
		if let Err(ConnectionError::NotTracked(_)) = self.tracker.heartbeat(display_id, now) {
			debug!(display = %display_id, "heartbeat from untracked display, tracking again");
			self.tracker.track(display_id, now);
		}
	}

	/// Offline unless a newer channel already holds the display's binding
	pub fn disconnected(&self, display_id: &EntityId) {
		self.tracker.disconnect(display_id, || self.registry.lookup(display_id).is_none());
	}

	/// One detection pass; returns the number of displays that went offline
	pub fn sweep(&self) -> usize {
		self.tracker.sweep(Instant::now()).len()
	}

	/// Spawn the periodic sweep
	pub fn spawn_sweeper(self: &Arc<Self>, parent_token: &CancellationToken) -> JoinHandle<()> {
		let monitor = Arc::clone(self);
		let token = parent_token.child_token();
		let period = self.tracker.policy().sweep_interval;

		tokio::spawn(async move {
			let mut interval = tokio::time::interval(period);
			interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
			info!(?period, timeout = ?monitor.tracker.policy().heartbeat_timeout, "liveness sweeper started");

			loop {
				tokio::select! {
					() = token.cancelled() => {
						info!("liveness sweeper shutting down via cancellation token");
						break;
					}
					_ = interval.tick() => {
						let offline = monitor.sweep();
						if offline > 0 {
							debug!(offline, "sweep marked displays offline");
						}
					}
				}
			}
		})
	}

	pub fn is_online(&self, display_id: &EntityId) -> bool {
		self.tracker.is_online(display_id)
	}

	pub fn online_count(&self) -> usize {
		self.tracker.online_count()
	}

	/// Current liveness of every tracked display, for a fresh admin console
	pub fn snapshot(&self) -> Vec<DisplaySummary> {
		self
			.tracker
			.snapshot()
			.into_iter()
			.map(|status| DisplaySummary {
				display_id: status.display_id.to_string(),
				online: status.online,
				last_seen: status.last_seen,
			})
			.collect()
	}
}

/// Applies online flags in the order transitions happened; failures are
/// logged and left for the next transition to overwrite.
async fn run_directory_writer(directory: Arc<dyn Directory>, mut queue: mpsc::UnboundedReceiver<OnlineWrite>, token: CancellationToken) {
	loop {
		tokio::select! {
			() = token.cancelled() => break,
			next = queue.recv() => {
				let Some(write) = next else { break };

				match directory.set_online(write.display_id.as_str(), write.online).await {
					Ok(()) => HUB_DIRECTORY_WRITES.with_label_values(&["ok"]).inc(),
					Err(e) => {
						HUB_DIRECTORY_WRITES.with_label_values(&["failed"]).inc();
						warn!(display = %write.display_id, online = write.online, "directory update failed: {e}");
					}
				}
			}
		}
	}

	debug!("directory writer stopped");
}

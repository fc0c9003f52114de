use signage_player::{Effect, MediaEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use ws_events::{PlaylistItem, StatusReport};

use crate::backoff::Backoff;

const PLAYABLE_SCHEMES: [&str; 3] = ["http://", "https://", "file://"];

/// A media event tagged with the timer generation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
	pub generation: u64,
	pub event: MediaEvent,
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
	pub load_delay: Duration,
	pub retry: Backoff,
}

impl Default for MediaSettings {
	fn default() -> Self {
		Self {
			load_delay: Duration::from_millis(250),
			retry: Backoff::new(Duration::from_secs(1), Duration::from_secs(30)),
		}
	}
}

/// Simulated media pipeline executing player effects.
///
/// At most one timer is pending. Every new timer, and every clear or suspend,
/// bumps the generation so events already queued by an older timer are
/// recognised as stale and dropped.
pub struct MediaClock {
	settings: MediaSettings,
	events: mpsc::UnboundedSender<TimedEvent>,
	generation: u64,
	pending: Option<CancellationToken>,
	remaining: Duration,
	started_at: Option<Instant>,
	volume: Option<u8>,
}

impl MediaClock {
	#[must_use]
	pub const fn new(settings: MediaSettings, events: mpsc::UnboundedSender<TimedEvent>) -> Self {
		Self {
			settings,
			events,
			generation: 0,
			pending: None,
			remaining: Duration::ZERO,
			started_at: None,
			volume: None,
		}
	}

	/// Carry out one effect. Status reports are handed back for the caller
	/// to send.
	pub fn run(&mut self, effect: Effect) -> Option<StatusReport> {
		match effect {
			Effect::Load(item) => self.load(&item),
			Effect::Resume => {
				self.started_at = Some(Instant::now());
				self.schedule(self.remaining, MediaEvent::Ended);
			}
			Effect::Suspend => {
				self.invalidate();
				if let Some(started_at) = self.started_at.take() {
					self.remaining = self.remaining.saturating_sub(started_at.elapsed());
				}
			}
			Effect::Clear => {
				self.invalidate();
				self.started_at = None;
				self.remaining = Duration::ZERO;
			}
			Effect::ScheduleRetry { attempt } => {
				let delay = self.settings.retry.delay_for(attempt);
				debug!(attempt, ?delay, "retry scheduled");
				self.schedule(delay, MediaEvent::Retry);
			}
			Effect::SetVolume(volume) => {
				info!(volume, "volume set");
				self.volume = Some(volume);
			}
			Effect::Report(report) => return Some(report),
		}
		None
	}

	fn load(&mut self, item: &PlaylistItem) {
		self.started_at = None;
		self.remaining = Duration::from_secs(u64::from(item.duration_secs));

		if PLAYABLE_SCHEMES.iter().any(|scheme| item.url.starts_with(scheme)) {
			debug!(item = %item.id, url = %item.url, "loading media");
			self.schedule(self.settings.load_delay, MediaEvent::Ready);
		} else {
			self.schedule(Duration::ZERO, MediaEvent::Failed(format!("unsupported media url {}", item.url)));
		}
	}

	fn invalidate(&mut self) {
		self.generation = self.generation.wrapping_add(1);
		if let Some(pending) = self.pending.take() {
			pending.cancel();
		}
	}

	fn schedule(&mut self, after: Duration, event: MediaEvent) {
		self.invalidate();

		let token = CancellationToken::new();
		let timed = TimedEvent { generation: self.generation, event };
		let events = self.events.clone();
		let cancelled = token.clone();

		tokio::spawn(async move {
			tokio::select! {
				() = cancelled.cancelled() => {}
				() = tokio::time::sleep(after) => {
					let _ = events.send(timed);
				}
			}
		});

		self.pending = Some(token);
	}

	/// Returns `true` if `timed` came from the current timer
	#[must_use]
	pub const fn accepts(&self, timed: &TimedEvent) -> bool {
		timed.generation == self.generation
	}

	#[must_use]
	pub const fn has_pending(&self) -> bool {
		self.pending.is_some()
	}

	#[must_use]
	pub const fn volume(&self) -> Option<u8> {
		self.volume
	}
}

impl Drop for MediaClock {
	fn drop(&mut self) {
		self.invalidate();
	}
}

use chrono::{DateTime, Utc};
use uuid::Uuid;
use ws_events::{ControlAction, Envelope, OutboundMessage, PlaylistRecord};

/// Command a display accepts from the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
	LoadPlaylist(PlaylistRecord),
	Control { action: ControlAction, value: Option<i64> },
	EmergencyStop { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFamily {
	Playlist,
	Control,
	EmergencyStop,
}

impl CommandFamily {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Playlist => "playlist",
			Self::Control => "control",
			Self::EmergencyStop => "emergency_stop",
		}
	}
}

impl PlayerCommand {
	#[must_use]
	pub const fn family(&self) -> CommandFamily {
		match self {
			Self::LoadPlaylist(_) => CommandFamily::Playlist,
			Self::Control { .. } => CommandFamily::Control,
			Self::EmergencyStop { .. } => CommandFamily::EmergencyStop,
		}
	}
}

/// A command with the identity and logical time of the envelope it came in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped {
	pub id: Uuid,
	pub issued_at: DateTime<Utc>,
	pub command: PlayerCommand,
}

impl Stamped {
	#[must_use]
	pub fn new(command: PlayerCommand, issued_at: DateTime<Utc>) -> Self {
		Self {
			id: Uuid::new_v4(),
			issued_at,
			command,
		}
	}

	/// Extract the command `display_id` should apply, if any.
	///
	/// Returns `None` for non-command frames and for commands addressed
	/// elsewhere.
	#[must_use]
	pub fn from_envelope(envelope: &Envelope, display_id: &str) -> Option<Self> {
		if envelope.target_display_id.as_deref().is_some_and(|target| target != display_id) {
			return None;
		}

		let command = match &envelope.message {
			OutboundMessage::PlaylistUpdate(update) => {
				if !update.display_ids.iter().any(|id| id == display_id) {
					return None;
				}
				PlayerCommand::LoadPlaylist(update.playlist.clone())
			}
			OutboundMessage::DisplayControl(control) => {
				if control.display_id != display_id {
					return None;
				}
				PlayerCommand::Control {
					action: control.action,
					value: control.value,
				}
			}
			OutboundMessage::EmergencyStop(stop) => {
				let addressed = match &stop.display_ids {
					ws_events::DisplaySelector::All(_) => true,
					ws_events::DisplaySelector::Ids(ids) => ids.iter().any(|id| id == display_id),
				};
				if !addressed {
					return None;
				}
				PlayerCommand::EmergencyStop { reason: stop.reason.clone() }
			}
			_ => return None,
		};

		Some(Self {
			id: envelope.id,
			issued_at: envelope.timestamp,
			command,
		})
	}
}

/// Local signals from the media pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
	Ready,
	Stalled,
	Ended,
	Failed(String),
	/// The back-off after a failure elapsed
	Retry,
}

impl MediaEvent {
	#[must_use]
	pub const fn name(&self) -> &'static str {
		match self {
			Self::Ready => "ready",
			Self::Stalled => "stalled",
			Self::Ended => "ended",
			Self::Failed(_) => "failed",
			Self::Retry => "retry",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
	Command(PlayerCommand),
	Media(MediaEvent),
}

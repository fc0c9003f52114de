use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::control::{DisplayControlRequest, EmergencyStopRequest};
use super::playlist::PlaylistRecord;
use super::status::{DisplayStatus, StatusReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
	pub entity_id: String,
	pub status: DisplayStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatAck {
	#[serde(with = "chrono::serde::ts_milliseconds")]
	pub timestamp: DateTime<Utc>,
}

/// A resolved playlist on its way to displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCommand {
	pub playlist: PlaylistRecord,
	pub display_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySummary {
	pub display_id: String,
	pub online: bool,
	#[serde(with = "chrono::serde::ts_milliseconds")]
	pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FleetSnapshot {
	pub displays: Vec<DisplaySummary>,
}

/// Frames the hub sends; always wrapped in an [`crate::Envelope`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
	Registered(Registered),
	Error(ErrorPayload),
	HeartbeatAck(HeartbeatAck),
	StatusUpdate(StatusReport),
	PlaylistUpdate(PlaylistCommand),
	DisplayControl(DisplayControlRequest),
	EmergencyStop(EmergencyStopRequest),
	FleetSnapshot(FleetSnapshot),
}

impl OutboundMessage {
	#[must_use]
	pub fn error(message: impl Into<String>) -> Self {
		Self::Error(ErrorPayload { message: message.into() })
	}

	#[must_use]
	pub fn registered(entity_id: impl Into<String>) -> Self {
		Self::Registered(Registered {
			entity_id: entity_id.into(),
			status: DisplayStatus::Online,
		})
	}

	#[must_use]
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Registered(_) => "registered",
			Self::Error(_) => "error",
			Self::HeartbeatAck(_) => "heartbeat_ack",
			Self::StatusUpdate(_) => "status_update",
			Self::PlaylistUpdate(_) => "playlist_update",
			Self::DisplayControl(_) => "display_control",
			Self::EmergencyStop(_) => "emergency_stop",
			Self::FleetSnapshot(_) => "fleet_snapshot",
		}
	}

	/// Messages a display's playback machine consumes
	#[must_use]
	pub const fn is_command(&self) -> bool {
		matches!(self, Self::PlaylistUpdate(_) | Self::DisplayControl(_) | Self::EmergencyStop(_))
	}
}

use serde::{Deserialize, Serialize};

use super::control::{DisplayControlRequest, EmergencyStopRequest};
use super::status::StatusReport;
use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDisplay {
	pub display_id: String,
	/// Slug the display was provisioned with
	pub display_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterAdmin {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatPayload {
	pub display_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistUpdateRequest {
	pub playlist_id: String,
	pub display_ids: Vec<String>,
}

/// Frames a client sends to the hub: `{"type": ..., "data": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InboundMessage {
	RegisterDisplay(RegisterDisplay),
	RegisterAdmin(RegisterAdmin),
	Heartbeat(HeartbeatPayload),
	StatusUpdate(StatusReport),
	PlaylistUpdate(PlaylistUpdateRequest),
	DisplayControl(DisplayControlRequest),
	EmergencyStop(EmergencyStopRequest),
}

impl InboundMessage {
	#[must_use]
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::RegisterDisplay(_) => "register_display",
			Self::RegisterAdmin(_) => "register_admin",
			Self::Heartbeat(_) => "heartbeat",
			Self::StatusUpdate(_) => "status_update",
			Self::PlaylistUpdate(_) => "playlist_update",
			Self::DisplayControl(_) => "display_control",
			Self::EmergencyStop(_) => "emergency_stop",
		}
	}

	/// Commands are admin-only
	#[must_use]
	pub const fn is_command(&self) -> bool {
		matches!(self, Self::PlaylistUpdate(_) | Self::DisplayControl(_) | Self::EmergencyStop(_))
	}

	/// Parse one text frame.
	///
	/// # Errors
	/// `Malformed` when the frame is not a known `{type, data}` message.
	/// A missing `data` reads as `{}`.
	pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
		let mut frame: serde_json::Value = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
		if let Some(object) = frame.as_object_mut() {
			object.entry("data").or_insert_with(|| serde_json::json!({}));
		}

		serde_json::from_value(frame).map_err(ProtocolError::Malformed)
	}

	/// # Errors
	/// `Encode` if serialization fails.
	pub fn to_json(&self) -> Result<String, ProtocolError> {
		serde_json::to_string(self).map_err(|source| ProtocolError::Encode { kind: self.kind(), source })
	}
}

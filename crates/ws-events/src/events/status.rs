use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything an admin console can be told about one display.
///
/// `Online`/`Offline` come from the hub's liveness tracking, the rest from the
/// display's own playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
	Online,
	Offline,
	Idle,
	Loading,
	Playing,
	Paused,
	Buffering,
	Error,
	Stopped,
}

impl DisplayStatus {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Online => "online",
			Self::Offline => "offline",
			Self::Idle => "idle",
			Self::Loading => "loading",
			Self::Playing => "playing",
			Self::Paused => "paused",
			Self::Buffering => "buffering",
			Self::Error => "error",
			Self::Stopped => "stopped",
		}
	}

	#[must_use]
	pub const fn from_liveness(online: bool) -> Self {
		if online {
			Self::Online
		} else {
			Self::Offline
		}
	}
}

impl fmt::Display for DisplayStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackReport {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub playlist_id: Option<String>,
	pub current_index: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub current_item_id: Option<String>,
	pub volume: u8,
	pub error_count: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_error: Option<String>,
}

/// `status_update` payload, both directions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
	pub display_id: String,
	pub status: DisplayStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub playback: Option<PlaybackReport>,
}

impl StatusReport {
	#[must_use]
	pub fn liveness(display_id: impl Into<String>, online: bool) -> Self {
		Self {
			display_id: display_id.into(),
			status: DisplayStatus::from_liveness(online),
			playback: None,
		}
	}
}

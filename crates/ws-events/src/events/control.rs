use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
	Play,
	Pause,
	Stop,
	Next,
	Previous,
	/// `value` is the target item index
	Seek,
	/// `value` is the target volume, clamped to 0..=100
	Volume,
}

impl fmt::Display for ControlAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let action = match self {
			Self::Play => "play",
			Self::Pause => "pause",
			Self::Stop => "stop",
			Self::Next => "next",
			Self::Previous => "previous",
			Self::Seek => "seek",
			Self::Volume => "volume",
		};
		f.write_str(action)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayControlRequest {
	pub display_id: String,
	pub action: ControlAction,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<i64>,
}

/// The literal `"all"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllDisplays {
	All,
}

/// `displayIds` of an emergency stop: an explicit list or `"all"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplaySelector {
	All(AllDisplays),
	Ids(Vec<String>),
}

impl DisplaySelector {
	#[must_use]
	pub const fn all() -> Self {
		Self::All(AllDisplays::All)
	}

	#[must_use]
	pub const fn is_all(&self) -> bool {
		matches!(self, Self::All(_))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStopRequest {
	pub display_ids: DisplaySelector,
	#[serde(default)]
	pub reason: String,
}

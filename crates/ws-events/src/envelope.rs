use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::events::OutboundMessage;

/// Outbound wire frame: `{id, type, data, timestamp, targetDisplayId?}`.
///
/// `id` is unique per logical message; every delivery of the same dispatch
/// carries the same id so receivers can drop duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
	pub id: Uuid,
	#[serde(flatten)]
	pub message: OutboundMessage,
	#[serde(with = "chrono::serde::ts_milliseconds")]
	pub timestamp: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_display_id: Option<String>,
}

impl Envelope {
	#[must_use]
	pub fn new(message: OutboundMessage) -> Self {
		Self {
			id: Uuid::new_v4(),
			message,
			timestamp: Utc::now(),
			target_display_id: None,
		}
	}

	#[must_use]
	pub fn targeted(message: OutboundMessage, display_id: impl Into<String>) -> Self {
		Self::new(message).with_target(display_id)
	}

	#[must_use]
	pub fn with_target(mut self, display_id: impl Into<String>) -> Self {
		self.target_display_id = Some(display_id.into());
		self
	}

	#[must_use]
	pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = timestamp;
		self
	}

	#[must_use]
	pub const fn kind(&self) -> &'static str {
		self.message.kind()
	}

	/// # Errors
	/// `Encode` if serialization fails.
	pub fn to_json(&self) -> Result<String, ProtocolError> {
		serde_json::to_string(self).map_err(|source| ProtocolError::Encode { kind: self.kind(), source })
	}

	/// # Errors
	/// `Malformed` if the text is not an envelope.
	pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
		serde_json::from_str(text).map_err(ProtocolError::Malformed)
	}
}

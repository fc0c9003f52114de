mod envelope;
mod error;
pub mod events;

pub use envelope::Envelope;
pub use error::ProtocolError;
pub use events::{
	AllDisplays, ControlAction, DisplayControlRequest, DisplayStatus, DisplaySelector, DisplaySummary, EmergencyStopRequest, ErrorPayload, FleetSnapshot, HeartbeatAck,
	HeartbeatPayload, InboundMessage, MediaKind, OutboundMessage, PlaybackReport, PlaylistCommand, PlaylistItem, PlaylistRecord, PlaylistUpdateRequest, RegisterAdmin,
	RegisterDisplay, Registered, RepeatMode, StatusReport,
};

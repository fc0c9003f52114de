mod control;
mod inbound;
mod outbound;
mod playlist;
mod status;

pub use control::{AllDisplays, ControlAction, DisplayControlRequest, DisplaySelector, EmergencyStopRequest};
pub use inbound::{HeartbeatPayload, InboundMessage, PlaylistUpdateRequest, RegisterAdmin, RegisterDisplay};
pub use outbound::{DisplaySummary, ErrorPayload, FleetSnapshot, HeartbeatAck, OutboundMessage, PlaylistCommand, Registered};
pub use playlist::{MediaKind, PlaylistItem, PlaylistRecord, RepeatMode};
pub use status::{DisplayStatus, PlaybackReport, StatusReport};

use thiserror::Error;
use uuid::Uuid;
use ws_events::ControlAction;

use super::PlayStatus;

pub type Result<T> = std::result::Result<T, PlayerError>;

/// Why an input left the machine untouched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
	#[error("Duplicate delivery of message {0}")]
	Duplicate(Uuid),

	#[error("Command predates the last emergency stop")]
	PrecedesEmergencyStop,

	#[error("Command is older than the last applied {0} command")]
	OutOfOrder(&'static str),

	#[error("Command addressed to another display")]
	NotAddressed,

	#[error("Playlist {0} is already loaded")]
	SamePlaylist(String),

	#[error("No playlist loaded")]
	NoPlaylist,

	#[error("Seek target {target:?} outside 0..{len}")]
	SeekOutOfRange { target: Option<i64>, len: usize },

	#[error("Already at the {0} of the playlist")]
	AtEdge(&'static str),

	#[error("Missing value for {0}")]
	MissingValue(ControlAction),

	#[error("Cannot {action} while {from}")]
	InvalidTransition { from: PlayStatus, action: ControlAction },

	#[error("Media event {event} does not apply while {from}")]
	StaleMediaEvent { from: PlayStatus, event: &'static str },
}

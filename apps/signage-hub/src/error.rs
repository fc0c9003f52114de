use thiserror::Error;
use ws_events::ProtocolError;

#[derive(Error, Debug)]
pub enum DirectoryError {
	#[error("Unknown display slug: {0}")]
	UnknownDisplay(String),

	#[error("Unknown playlist: {0}")]
	UnknownPlaylist(String),

	#[error("Directory unavailable: {0}")]
	Unavailable(String),

	#[error("Failed to read directory seed {path}: {source}")]
	Seed {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid directory seed: {0}")]
	Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum HubError {
	#[error("Registration rejected: {0}")]
	Registration(String),

	#[error("Display {0} is not registered on this channel")]
	NotRegistered(String),

	#[error("Only admin channels may send {0}")]
	Forbidden(&'static str),

	#[error(transparent)]
	Directory(#[from] DirectoryError),

	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	#[error("Failed to bind {addr}: {source}")]
	Bind {
		addr: String,
		#[source]
		source: std::io::Error,
	},
}

impl HubError {
	/// Label for metrics
	#[must_use]
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Registration(_) => "registration",
			Self::NotRegistered(_) => "not_registered",
			Self::Forbidden(_) => "forbidden",
			Self::Directory(_) => "directory",
			Self::Protocol(_) => "protocol",
			Self::Bind { .. } => "bind",
		}
	}
}

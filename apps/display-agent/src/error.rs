use thiserror::Error;
use ws_events::ProtocolError;

#[derive(Error, Debug)]
pub enum AgentError {
	#[error("Failed to connect to WebSocket: {0}")]
	WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	#[error("Hub rejected registration: {0}")]
	Rejected(String),
}

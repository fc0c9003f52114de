use crate::types::{ConnectionId, EntityId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
	#[error("channel {0} is closed")]
	Closed(ConnectionId),

	#[error("outbound queue for channel {0} is full")]
	QueueFull(ConnectionId),

	#[error("entity {0} is not tracked")]
	NotTracked(EntityId),
}

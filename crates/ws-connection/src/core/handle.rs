use std::{fmt, net::SocketAddr};
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::ConnectionError;
use crate::types::ConnectionId;

/// Sending half of one live channel.
///
/// Every clone feeds the same FIFO queue, which is drained by a single writer
/// task, so messages handed to one channel are never reordered.
pub struct ChannelHandle<M> {
	id: ConnectionId,
	sender: mpsc::Sender<M>,
	opened_at: Instant,
	source_addr: Option<SocketAddr>,
	cancel_token: CancellationToken,
}

impl<M> ChannelHandle<M> {
	/// Create a handle and the receiver its writer task should drain
	#[must_use]
	pub fn new(buffer_size: usize, parent_token: &CancellationToken) -> (Self, mpsc::Receiver<M>) {
		let (sender, receiver) = mpsc::channel(buffer_size.max(1));

		let handle = Self {
			id: ConnectionId::new(),
			sender,
			opened_at: Instant::now(),
			source_addr: None,
			cancel_token: parent_token.child_token(),
		};

		(handle, receiver)
	}

	#[must_use]
	pub fn with_source_addr(mut self, addr: SocketAddr) -> Self {
		self.source_addr = Some(addr);
		self
	}

	#[must_use]
	pub const fn id(&self) -> &ConnectionId {
		&self.id
	}

	#[must_use]
	pub const fn opened_at(&self) -> Instant {
		self.opened_at
	}

	#[must_use]
	pub const fn source_addr(&self) -> Option<SocketAddr> {
		self.source_addr
	}

	/// Token cancelled when the channel is closed; writer tasks select on it
	#[must_use]
	pub fn cancel_token(&self) -> CancellationToken {
		self.cancel_token.clone()
	}

	#[must_use]
	pub fn is_closed(&self) -> bool {
		self.cancel_token.is_cancelled() || self.sender.is_closed()
	}

	/// Hand a message to the transport without waiting.
	///
	/// # Errors
	/// `Closed` once the channel is closed or its writer is gone, `QueueFull`
	/// when the peer is not draining fast enough.
	pub fn deliver(&self, message: M) -> Result<(), ConnectionError> {
		if self.cancel_token.is_cancelled() {
			return Err(ConnectionError::Closed(self.id.clone()));
		}

		self.sender.try_send(message).map_err(|e| match e {
			mpsc::error::TrySendError::Full(_) => ConnectionError::QueueFull(self.id.clone()),
			mpsc::error::TrySendError::Closed(_) => ConnectionError::Closed(self.id.clone()),
		})
	}

	/// Stop accepting deliveries. Messages already queued may still be written.
	pub fn close(&self) {
		self.cancel_token.cancel();
	}
}

impl<M> Clone for ChannelHandle<M> {
	fn clone(&self) -> Self {
		Self {
			id: self.id.clone(),
			sender: self.sender.clone(),
			opened_at: self.opened_at,
			source_addr: self.source_addr,
			cancel_token: self.cancel_token.clone(),
		}
	}
}

impl<M> fmt::Debug for ChannelHandle<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChannelHandle")
			.field("id", &self.id)
			.field("source_addr", &self.source_addr)
			.field("closed", &self.is_closed())
			.finish_non_exhaustive()
	}
}

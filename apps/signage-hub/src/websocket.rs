use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
	extract::{
		ws::{Message, WebSocket, WebSocketUpgrade},
		ConnectInfo, State,
	},
	response::IntoResponse,
};
use futures::{
	sink::SinkExt,
	stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use ws_events::{Envelope, ProtocolError};

use crate::hub::Hub;
use crate::AppState;

// WebSocket connection handler
pub async fn websocket_handler(ws: WebSocketUpgrade, ConnectInfo(addr): ConnectInfo<SocketAddr>, State(state): State<AppState>) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle_socket(socket, addr, state.hub))
}

async fn handle_socket(socket: WebSocket, addr: SocketAddr, hub: Arc<Hub>) {
	let (channel, outbound) = hub.open_channel(Some(addr));
	let cancel_token = channel.cancel_token();
	info!(channel = %channel.id(), %addr, "client connected");

	let (sender, mut receiver) = socket.split();
	let forward_task = spawn_forwarder(sender, outbound, cancel_token.clone());

	// Frames from this peer are handled strictly in arrival order
	loop {
		tokio::select! {
			() = cancel_token.cancelled() => {
				debug!(channel = %channel.id(), "channel cancelled");
				break;
			}
			frame = receiver.next() => match frame {
				Some(Ok(Message::Text(text))) => hub.handle_frame(&channel, &text).await,
				Some(Ok(Message::Binary(data))) => {
					debug!(channel = %channel.id(), bytes = data.len(), "binary frame rejected");
					hub.reject_frame(&channel, &ProtocolError::Unsupported("binary frames"));
				}
				Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
				Some(Ok(Message::Close(_))) | None => {
					debug!(channel = %channel.id(), "client closed the connection");
					break;
				}
				Some(Err(e)) => {
					warn!(channel = %channel.id(), "websocket error: {e}");
					break;
				}
			}
		}
	}

	hub.handle_disconnect(&channel);
	if let Err(e) = forward_task.await {
		error!(channel = %channel.id(), "forward task failed: {e}");
	}

	info!(channel = %channel.id(), lifetime = ?channel.opened_at().elapsed(), "client disconnected");
}

/// Drain the channel queue into the socket until the channel closes
fn spawn_forwarder(mut sender: SplitSink<WebSocket, Message>, mut outbound: mpsc::Receiver<Envelope>, cancel_token: CancellationToken) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			let envelope = tokio::select! {
				() = cancel_token.cancelled() => break,
				next = outbound.recv() => match next {
					Some(envelope) => envelope,
					None => break,
				},
			};

			let text = match envelope.to_json() {
				Ok(text) => text,
				Err(e) => {
					error!("Failed to serialize outbound message: {e}");
					continue;
				}
			};

			if let Err(e) = sender.send(Message::Text(text)).await {
				debug!("Failed to forward message to WebSocket: {e}");
				break;
			}
		}

		let _ = sender.close().await;
	})
}

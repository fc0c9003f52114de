use futures::{Sink, SinkExt, StreamExt};
use signage_player::{Effects, PlaybackMachine, PlayerConfig, PlayerError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use ws_events::{Envelope, HeartbeatPayload, InboundMessage, OutboundMessage, RegisterDisplay};

use crate::backoff::Backoff;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::media::{MediaClock, MediaSettings, TimedEvent};

const RECONNECT_INITIAL: Duration = Duration::from_millis(500);

/// How a session with the hub ended
#[derive(Debug)]
pub enum SessionEnd {
	Cancelled,
	Closed,
}

/// One display: its playback machine, the simulated media pipeline, and the
/// hub link. Playback state survives reconnects.
pub struct Agent {
	config: AgentConfig,
	machine: PlaybackMachine,
	clock: MediaClock,
	media_events: mpsc::UnboundedReceiver<TimedEvent>,
	registered: bool,
}

impl Agent {
	#[must_use]
	pub fn new(config: AgentConfig) -> Self {
		let (events, media_events) = mpsc::unbounded_channel();
		let settings = MediaSettings {
			load_delay: config.load_delay(),
			..MediaSettings::default()
		};
		let machine = PlaybackMachine::new(config.display_id.clone(), PlayerConfig::default().with_retry_budget(config.retry_budget));

		Self {
			clock: MediaClock::new(settings, events),
			machine,
			media_events,
			registered: false,
			config,
		}
	}

	#[must_use]
	pub const fn machine(&self) -> &PlaybackMachine {
		&self.machine
	}

	#[must_use]
	pub const fn clock(&self) -> &MediaClock {
		&self.clock
	}

	#[must_use]
	pub const fn is_registered(&self) -> bool {
		self.registered
	}

	#[must_use]
	pub fn register_message(&self) -> InboundMessage {
		InboundMessage::RegisterDisplay(RegisterDisplay {
			display_id: self.config.display_id.clone(),
			display_url: self.config.slug().to_string(),
		})
	}

	#[must_use]
	pub fn heartbeat_message(&self) -> InboundMessage {
		InboundMessage::Heartbeat(HeartbeatPayload {
			display_id: self.config.display_id.clone(),
		})
	}

	/// Connect, serve, and reconnect with back-off until cancelled
	pub async fn run(mut self, cancel_token: CancellationToken) {
		let mut backoff = Backoff::new(RECONNECT_INITIAL, self.config.reconnect_max());

		loop {
			match self.connect_and_serve(&cancel_token, &mut backoff).await {
				Ok(SessionEnd::Cancelled) => break,
				Ok(SessionEnd::Closed) => info!("hub closed the connection"),
				Err(e) => warn!("session ended: {e}"),
			}
			self.registered = false;

			let delay = backoff.next_delay();
			info!(?delay, attempt = backoff.failures(), "reconnecting");
			if !self.idle_for(delay, &cancel_token).await {
				break;
			}
		}

		info!(display = %self.config.display_id, "agent stopped");
	}

	/// Keep playback running while disconnected; `false` once cancelled
	async fn idle_for(&mut self, delay: Duration, cancel_token: &CancellationToken) -> bool {
		let sleep = tokio::time::sleep(delay);
		tokio::pin!(sleep);

		loop {
			tokio::select! {
				() = cancel_token.cancelled() => return false,
				() = &mut sleep => return true,
				Some(timed) = self.media_events.recv() => {
					// reports are dropped; the hub gets a fresh one after registering
					let _ = self.handle_media(timed);
				}
			}
		}
	}

	async fn connect_and_serve(&mut self, cancel_token: &CancellationToken, backoff: &mut Backoff) -> Result<SessionEnd, AgentError> {
		info!(url = %self.config.hub_url, "connecting to hub");
		let (ws_stream, _) = connect_async(self.config.hub_url.as_str()).await?;
		let (mut sink, mut stream) = ws_stream.split();
		info!("connected to hub");

		send(&mut sink, &self.register_message()).await?;

		let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + self.config.heartbeat_interval(), self.config.heartbeat_interval());
		heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			let outgoing = tokio::select! {
				() = cancel_token.cancelled() => {
					let _ = sink.send(Message::Close(None)).await;
					return Ok(SessionEnd::Cancelled);
				}
				_ = heartbeat.tick() => {
					if self.registered { vec![self.heartbeat_message()] } else { Vec::new() }
				}
				Some(timed) = self.media_events.recv() => self.handle_media(timed),
				frame = stream.next() => match frame {
					Some(Ok(Message::Text(text))) => {
						let outgoing = self.handle_hub_frame(text.as_str())?;
						if self.registered {
							backoff.reset();
						}
						outgoing
					}
					Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Closed),
					Some(Ok(_)) => Vec::new(),
					Some(Err(e)) => return Err(AgentError::WebSocket(e)),
				},
			};

			for message in &outgoing {
				send(&mut sink, message).await?;
			}
		}
	}

	/// React to one hub frame; returns what to send back.
	///
	/// # Errors
	/// `Rejected` when the hub refuses the registration.
	pub fn handle_hub_frame(&mut self, text: &str) -> Result<Vec<InboundMessage>, AgentError> {
		let envelope = match Envelope::from_json(text) {
			Ok(envelope) => envelope,
			Err(e) => {
				warn!("ignoring unreadable hub frame: {e}");
				return Ok(Vec::new());
			}
		};

		match &envelope.message {
			OutboundMessage::Registered(registered) => {
				info!(entity = %registered.entity_id, "registered with hub");
				self.registered = true;
				Ok(vec![InboundMessage::StatusUpdate(self.machine.status_report())])
			}
			OutboundMessage::Error(payload) if !self.registered => Err(AgentError::Rejected(payload.message.clone())),
			OutboundMessage::Error(payload) => {
				warn!(message = %payload.message, "hub reported an error");
				Ok(Vec::new())
			}
			OutboundMessage::HeartbeatAck(_) => {
				debug!("heartbeat acknowledged");
				Ok(Vec::new())
			}
			OutboundMessage::PlaylistUpdate(_) | OutboundMessage::DisplayControl(_) | OutboundMessage::EmergencyStop(_) => {
				let outcome = self.machine.handle_envelope(&envelope);
				Ok(self.settle(outcome, envelope.kind()))
			}
			OutboundMessage::StatusUpdate(_) | OutboundMessage::FleetSnapshot(_) => Ok(Vec::new()),
		}
	}

	/// Feed one media event to the machine unless it is stale
	pub fn handle_media(&mut self, timed: TimedEvent) -> Vec<InboundMessage> {
		if !self.clock.accepts(&timed) {
			debug!(event = timed.event.name(), "dropping media event from a cancelled timer");
			return Vec::new();
		}

		let name = timed.event.name();
		let outcome = self.machine.handle_media(timed.event);
		self.settle(outcome, name)
	}

	/// Wait for the next media event
	pub async fn next_media_event(&mut self) -> Option<TimedEvent> {
		self.media_events.recv().await
	}

	fn settle(&mut self, outcome: Result<Effects, PlayerError>, input: &str) -> Vec<InboundMessage> {
		match outcome {
			Ok(effects) => effects
				.into_iter()
				.filter_map(|effect| self.clock.run(effect))
				.map(InboundMessage::StatusUpdate)
				.filter(|_| self.registered)
				.collect(),
			Err(PlayerError::NotAddressed) => Vec::new(),
			Err(e) => {
				debug!(input, "ignored: {e}");
				Vec::new()
			}
		}
	}
}

async fn send<S>(sink: &mut S, message: &InboundMessage) -> Result<(), AgentError>
where
	S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
	let json = message.to_json()?;
	sink.send(Message::text(json)).await.map_err(|e| {
		error!(kind = message.kind(), "failed to send: {e}");
		AgentError::WebSocket(e)
	})
}

use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ws_connection::{EntityId, EntityKind, LivenessPolicy};
use ws_events::{Envelope, FleetSnapshot, HeartbeatAck, HeartbeatPayload, InboundMessage, OutboundMessage, PlaylistCommand, ProtocolError, RegisterDisplay, StatusReport};

use crate::config::Config;
use crate::directory::Directory;
use crate::dispatch::Dispatcher;
use crate::error::{DirectoryError, HubError};
use crate::fanout::AdminFanout;
use crate::liveness::LivenessMonitor;
use crate::metrics::{HUB_CHANNELS_ACTIVE, HUB_CONNECTIONS_TOTAL, HUB_INBOUND_MESSAGES};
use crate::{Channel, Registry};

#[derive(Debug, Clone)]
pub struct HubSettings {
	pub liveness: LivenessPolicy,
	pub channel_buffer: usize,
}

impl Default for HubSettings {
	fn default() -> Self {
		Self {
			liveness: LivenessPolicy::default(),
			channel_buffer: 256,
		}
	}
}

impl From<&Config> for HubSettings {
	fn from(config: &Config) -> Self {
		Self {
			liveness: config.liveness_policy(),
			channel_buffer: config.channel_buffer,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
	pub status: &'static str,
	pub displays_registered: usize,
	pub displays_online: usize,
	pub admins: usize,
}

/// Owns every live channel and routes frames between displays and admins.
///
/// Frames from one channel are handled in arrival order by that channel's
/// reader; different channels run concurrently and only meet in the
/// registry.
pub struct Hub {
	settings: HubSettings,
	registry: Arc<Registry>,
	directory: Arc<dyn Directory>,
	fanout: AdminFanout,
	liveness: Arc<LivenessMonitor>,
	dispatcher: Dispatcher,
	cancel_token: CancellationToken,
}

impl Hub {
	/// Must be called inside a runtime
	#[must_use]
	pub fn new(directory: Arc<dyn Directory>, settings: HubSettings, parent_token: &CancellationToken) -> Arc<Self> {
		let cancel_token = parent_token.child_token();
		let registry = Arc::new(Registry::new());
		let fanout = AdminFanout::new(Arc::clone(&registry));
		let liveness = Arc::new(LivenessMonitor::new(settings.liveness.clone(), Arc::clone(&registry), fanout.clone(), Arc::clone(&directory), &cancel_token));
		let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&directory), fanout.clone());

		Arc::new(Self {
			settings,
			registry,
			directory,
			fanout,
			liveness,
			dispatcher,
			cancel_token,
		})
	}

	pub fn spawn_sweeper(&self) -> JoinHandle<()> {
		self.liveness.spawn_sweeper(&self.cancel_token)
	}

	/// Allocate a channel for a freshly accepted connection. The receiver
	/// belongs to the transport's writer task.
	pub fn open_channel(&self, addr: Option<SocketAddr>) -> (Channel, mpsc::Receiver<Envelope>) {
		let (channel, outbound) = Channel::new(self.settings.channel_buffer, &self.cancel_token);
		let channel = match addr {
			Some(addr) => channel.with_source_addr(addr),
			None => channel,
		};

		HUB_CONNECTIONS_TOTAL.with_label_values(&["opened"]).inc();
		debug!(channel = %channel.id(), ?addr, "channel opened");
		(channel, outbound)
	}

	/// Handle one text frame. Failures are answered with an `error` frame on
	/// the same channel and never reach anyone else.
	pub async fn handle_frame(&self, channel: &Channel, text: &str) {
		let message = match InboundMessage::from_json(text) {
			Ok(message) => message,
			Err(e) => {
				self.reject_frame(channel, &e);
				return;
			}
		};

		let kind = message.kind();
		match self.handle_inbound(channel, message).await {
			Ok(()) => HUB_INBOUND_MESSAGES.with_label_values(&[kind, "ok"]).inc(),
			Err(e) => {
				HUB_INBOUND_MESSAGES.with_label_values(&[kind, e.kind()]).inc();
				warn!(channel = %channel.id(), kind, "inbound message rejected: {e}");
				self.send(channel, Envelope::new(OutboundMessage::error(e.to_string())));
			}
		}
	}

	pub fn reject_frame(&self, channel: &Channel, error: &ProtocolError) {
		HUB_INBOUND_MESSAGES.with_label_values(&["unknown", "protocol"]).inc();
		debug!(channel = %channel.id(), "unparseable frame: {error}");
		self.send(channel, Envelope::new(OutboundMessage::error(format!("Invalid message: {error}"))));
	}

	/// # Errors
	/// Whatever made the message unacceptable; the caller reports it back.
	pub async fn handle_inbound(&self, channel: &Channel, message: InboundMessage) -> Result<(), HubError> {
		match message {
			InboundMessage::RegisterDisplay(request) => self.register_display(channel, request).await,
			InboundMessage::RegisterAdmin(_) => {
				self.register_admin(channel);
				Ok(())
			}
			InboundMessage::Heartbeat(payload) => self.heartbeat(channel, payload),
			InboundMessage::StatusUpdate(report) => self.status_update(channel, report),
			InboundMessage::PlaylistUpdate(request) => {
				self.require_admin(channel, "playlist_update")?;
				self.dispatcher.playlist_update(request, channel.id()).await?;
				Ok(())
			}
			InboundMessage::DisplayControl(request) => {
				self.require_admin(channel, "display_control")?;
				self.dispatcher.display_control(request, channel.id());
				Ok(())
			}
			InboundMessage::EmergencyStop(request) => {
				self.require_admin(channel, "emergency_stop")?;
				self.dispatcher.emergency_stop(request, channel.id());
				Ok(())
			}
		}
	}

	async fn register_display(&self, channel: &Channel, request: RegisterDisplay) -> Result<(), HubError> {
		let record = self.directory.resolve_display(&request.display_url).await.map_err(|e| match e {
			DirectoryError::UnknownDisplay(slug) => HubError::Registration(format!("unknown display {slug}")),
			other => HubError::Directory(other),
		})?;

		if record.id != request.display_id {
			return Err(HubError::Registration(format!("display id {} does not match {}", request.display_id, request.display_url)));
		}

		let display_id = EntityId::from(record.id);
		self.bind(channel, display_id.clone(), EntityKind::Display);
		self.send(channel, Envelope::new(OutboundMessage::registered(display_id.as_str())));
		self.liveness.registered(&display_id);
		info!(display = %display_id, channel = %channel.id(), "display registered");

		if let Some(playlist_id) = record.playlist_id {
			self.push_assigned_playlist(channel, &display_id, &playlist_id).await;
		}
		Ok(())
	}

	/// Best effort: a display that cannot get its playlist still stays registered
	async fn push_assigned_playlist(&self, channel: &Channel, display_id: &EntityId, playlist_id: &str) {
		match self.directory.get_playlist(playlist_id).await {
			Ok(playlist) => {
				let command = PlaylistCommand {
					playlist,
					display_ids: vec![display_id.to_string()],
				};
				self.send(channel, Envelope::targeted(OutboundMessage::PlaylistUpdate(command), display_id.as_str()));
			}
			Err(e) => warn!(display = %display_id, playlist = playlist_id, "assigned playlist not pushed: {e}"),
		}
	}

	fn register_admin(&self, channel: &Channel) {
		let admin_id = EntityId::admin_for(channel.id());
		self.bind(channel, admin_id.clone(), EntityKind::Admin);
		self.send(channel, Envelope::new(OutboundMessage::registered(admin_id.as_str())));
		self.send(
			channel,
			Envelope::new(OutboundMessage::FleetSnapshot(FleetSnapshot {
				displays: self.liveness.snapshot(),
			})),
		);
		info!(admin = %admin_id, "admin registered");
	}

	fn bind(&self, channel: &Channel, entity_id: EntityId, kind: EntityKind) {
		let previous = self.registry.owner_of(channel.id());

		if let Some(superseded) = self.registry.register(entity_id.clone(), kind, channel.clone()) {
			if superseded.channel.id() != channel.id() {
				info!(entity = %entity_id, old_channel = %superseded.channel.id(), new_channel = %channel.id(), "registration superseded an older channel");
			}
		}

		if let Some((previous, EntityKind::Display)) = previous {
			if previous != entity_id {
				self.liveness.disconnected(&previous);
			}
		}
		self.refresh_gauges();
	}

	fn heartbeat(&self, channel: &Channel, payload: HeartbeatPayload) -> Result<(), HubError> {
		let display_id = EntityId::from(payload.display_id.as_str());
		if !self.registry.is_bound(&display_id, channel.id()) {
			return Err(HubError::NotRegistered(payload.display_id));
		}

		self.liveness.heartbeat(&display_id);
		self.send(channel, Envelope::new(OutboundMessage::HeartbeatAck(HeartbeatAck { timestamp: Utc::now() })));
		Ok(())
	}

	fn status_update(&self, channel: &Channel, report: StatusReport) -> Result<(), HubError> {
		let display_id = EntityId::from(report.display_id.as_str());
		if !self.registry.is_bound(&display_id, channel.id()) {
			return Err(HubError::NotRegistered(report.display_id));
		}

		debug!(display = %display_id, status = %report.status, "status update");
		self.fanout.status_update(report);
		Ok(())
	}

	fn require_admin(&self, channel: &Channel, kind: &'static str) -> Result<(), HubError> {
		match self.registry.owner_of(channel.id()) {
			Some((_, EntityKind::Admin)) => Ok(()),
			_ => Err(HubError::Forbidden(kind)),
		}
	}

	/// Transport is gone: stop deliveries, release the binding if this
	/// channel still holds it, and mark its display offline.
	pub fn handle_disconnect(&self, channel: &Channel) {
		let owner = self.registry.owner_of(channel.id());
		channel.close();

		if let Some(entity_id) = self.registry.unregister(channel.id()) {
			if matches!(owner, Some((_, EntityKind::Display))) {
				self.liveness.disconnected(&entity_id);
			}
			info!(entity = %entity_id, channel = %channel.id(), "channel released");
		}

		HUB_CONNECTIONS_TOTAL.with_label_values(&["closed"]).inc();
		self.refresh_gauges();
	}

	fn send(&self, channel: &Channel, envelope: Envelope) {
		let kind = envelope.kind();
		if let Err(e) = channel.deliver(envelope) {
			debug!(channel = %channel.id(), kind, "reply not delivered: {e}");
		}
	}

	fn refresh_gauges(&self) {
		let stats = self.registry.stats();
		HUB_CHANNELS_ACTIVE.with_label_values(&["display"]).set(i64::try_from(stats.displays).unwrap_or(i64::MAX));
		HUB_CHANNELS_ACTIVE.with_label_values(&["admin"]).set(i64::try_from(stats.admins).unwrap_or(i64::MAX));
	}

	pub fn health(&self) -> HealthReport {
		let stats = self.registry.stats();
		HealthReport {
			status: "ok",
			displays_registered: stats.displays,
			displays_online: self.liveness.online_count(),
			admins: stats.admins,
		}
	}

	#[must_use]
	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	#[must_use]
	pub fn liveness(&self) -> &LivenessMonitor {
		&self.liveness
	}

	#[must_use]
	pub const fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// Close every channel and stop background tasks
	pub fn shutdown(&self) {
		info!("hub shutting down");
		self.cancel_token.cancel();
	}
}

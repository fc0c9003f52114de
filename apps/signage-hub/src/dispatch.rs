use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ws_connection::{ConnectionId, EntityId, EntityKind};
use ws_events::{DisplayControlRequest, DisplaySelector, EmergencyStopRequest, Envelope, OutboundMessage, PlaylistCommand, PlaylistUpdateRequest};

use crate::directory::Directory;
use crate::error::DirectoryError;
use crate::fanout::AdminFanout;
use crate::metrics::record_deliveries;
use crate::{Channel, Registry};

/// Logical addressee of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
	One(EntityId),
	Many(Vec<EntityId>),
	/// Every display registered when the dispatch starts
	All,
}

impl DispatchTarget {
	#[must_use]
	pub fn from_ids(ids: &[String]) -> Self {
		match ids {
			[only] => Self::One(EntityId::from(only.as_str())),
			_ => Self::Many(ids.iter().map(|id| EntityId::from(id.as_str())).collect()),
		}
	}

	/// Tag single-display commands with `targetDisplayId`
	#[must_use]
	pub fn stamp(&self, envelope: Envelope) -> Envelope {
		match self {
			Self::One(display_id) => envelope.with_target(display_id.as_str()),
			Self::Many(_) | Self::All => envelope,
		}
	}
}

/// Per-dispatch outcome. Misses are expected and are not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
	pub delivered: usize,
	pub missed: usize,
	pub failed: usize,
	pub mirrored: usize,
}

/// The only place an entity id is turned into a channel
#[derive(Clone)]
pub struct Dispatcher {
	registry: Arc<Registry>,
	directory: Arc<dyn Directory>,
	fanout: AdminFanout,
}

impl Dispatcher {
	#[must_use]
	pub fn new(registry: Arc<Registry>, directory: Arc<dyn Directory>, fanout: AdminFanout) -> Self {
		Self { registry, directory, fanout }
	}

	/// Hand `envelope` to every resolved display, then mirror it once to
	/// every admin except `origin`. Never waits on a peer.
	pub fn dispatch(&self, envelope: &Envelope, target: &DispatchTarget, origin: Option<&ConnectionId>) -> DeliveryReport {
		let kind = envelope.kind();
		let mut report = DeliveryReport::default();

		for (display_id, channel) in self.resolve(target) {
			let Some(channel) = channel else {
				report.missed += 1;
				debug!(display = %display_id, kind, "target not registered, dropping");
				continue;
			};

			match channel.deliver(envelope.clone()) {
				Ok(()) => report.delivered += 1,
				Err(e) => {
					report.failed += 1;
					warn!(display = %display_id, kind, "delivery failed: {e}");
				}
			}
		}

		report.mirrored = self.fanout.publish_except(envelope, origin);
		record_deliveries(kind, report.delivered, report.missed, report.failed);

		info!(
			kind,
			id = %envelope.id,
			delivered = report.delivered,
			missed = report.missed,
			failed = report.failed,
			mirrored = report.mirrored,
			"command dispatched"
		);
		report
	}

	fn resolve(&self, target: &DispatchTarget) -> Vec<(EntityId, Option<Channel>)> {
		match target {
			DispatchTarget::One(display_id) => vec![(display_id.clone(), self.display_channel(display_id))],
			DispatchTarget::Many(display_ids) => {
				let mut seen = HashSet::new();
				display_ids
					.iter()
					.filter(|display_id| seen.insert((*display_id).clone()))
					.map(|display_id| (display_id.clone(), self.display_channel(display_id)))
					.collect()
			}
			DispatchTarget::All => self.registry.entries_of_kind(EntityKind::Display).into_iter().map(|(display_id, channel)| (display_id, Some(channel))).collect(),
		}
	}

	/// Only display bindings receive display commands; an admin id named as a
	/// target counts as missed.
	fn display_channel(&self, display_id: &EntityId) -> Option<Channel> {
		self.registry.get(display_id).filter(|entry| entry.kind == EntityKind::Display).map(|entry| entry.channel)
	}

	/// Resolve the playlist, then dispatch it.
	///
	/// # Errors
	/// The directory error when the playlist cannot be resolved; nothing is
	/// sent in that case.
	pub async fn playlist_update(&self, request: PlaylistUpdateRequest, origin: &ConnectionId) -> Result<DeliveryReport, DirectoryError> {
		let playlist = self
			.directory
			.get_playlist(&request.playlist_id)
			.await
			.inspect_err(|e| warn!(playlist = %request.playlist_id, "playlist_update not sent: {e}"))?;

		let target = DispatchTarget::from_ids(&request.display_ids);
		let envelope = target.stamp(Envelope::new(OutboundMessage::PlaylistUpdate(PlaylistCommand {
			playlist,
			display_ids: request.display_ids,
		})));

		Ok(self.dispatch(&envelope, &target, Some(origin)))
	}

	pub fn display_control(&self, request: DisplayControlRequest, origin: &ConnectionId) -> DeliveryReport {
		let target = DispatchTarget::One(EntityId::from(request.display_id.as_str()));
		let envelope = target.stamp(Envelope::new(OutboundMessage::DisplayControl(request)));

		self.dispatch(&envelope, &target, Some(origin))
	}

	pub fn emergency_stop(&self, request: EmergencyStopRequest, origin: &ConnectionId) -> DeliveryReport {
		let target = match &request.display_ids {
			DisplaySelector::All(_) => DispatchTarget::All,
			DisplaySelector::Ids(ids) => DispatchTarget::from_ids(ids),
		};
		warn!(reason = %request.reason, all = request.display_ids.is_all(), "emergency stop requested");

		let envelope = target.stamp(Envelope::new(OutboundMessage::EmergencyStop(request)));
		self.dispatch(&envelope, &target, Some(origin))
	}
}

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::handle::ChannelHandle;
use crate::types::{ConnectionId, EntityId, EntityKind};

/// One registered channel, keyed by the entity it speaks for
#[derive(Debug)]
pub struct ChannelEntry<M> {
	pub entity_id: EntityId,
	pub kind: EntityKind,
	pub channel: ChannelHandle<M>,
	pub registered_at: DateTime<Utc>,
}

impl<M> Clone for ChannelEntry<M> {
	fn clone(&self) -> Self {
		Self {
			entity_id: self.entity_id.clone(),
			kind: self.kind,
			channel: self.channel.clone(),
			registered_at: self.registered_at,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
	pub displays: usize,
	pub admins: usize,
}

/// At most one channel per entity.
///
/// `entries` is the authoritative map. `owners` is the reverse index used to
/// find the entity a closing channel spoke for; a superseded channel loses its
/// `owners` slot, so closing it later frees nothing.
pub struct ChannelRegistry<M> {
	entries: DashMap<EntityId, ChannelEntry<M>>,
	owners: DashMap<ConnectionId, EntityId>,
}

impl<M> ChannelRegistry<M> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			entries: DashMap::new(),
			owners: DashMap::new(),
		}
	}

	/// Bind `entity_id` to `channel`, replacing any previous binding.
	///
	/// Returns the superseded entry. The superseded channel is not closed here.
	pub fn register(&self, entity_id: EntityId, kind: EntityKind, channel: ChannelHandle<M>) -> Option<ChannelEntry<M>> {
		let channel_id = channel.id().clone();

		// A channel speaks for one entity; drop a binding it held under another id.
		if let Some(previous_owner) = self.owners.insert(channel_id.clone(), entity_id.clone()) {
			if previous_owner != entity_id {
				self.entries.remove_if(&previous_owner, |_, entry| entry.channel.id() == &channel_id);
				debug!(channel = %channel_id, from = %previous_owner, to = %entity_id, "channel re-registered under a new entity");
			}
		}

		let entry = ChannelEntry {
			entity_id: entity_id.clone(),
			kind,
			channel,
			registered_at: Utc::now(),
		};

		let superseded = self.entries.insert(entity_id.clone(), entry);

		if let Some(old) = &superseded {
			let old_id = old.channel.id();
			if old_id != &channel_id {
				self.owners.remove_if(old_id, |_, owner| owner == &entity_id);
				debug!(entity = %entity_id, old_channel = %old_id, new_channel = %channel_id, "channel superseded");
			}
		}

		superseded
	}

	/// Remove the entry owned by `channel_id`.
	///
	/// Returns `None` when the channel never registered or was superseded.
	pub fn unregister(&self, channel_id: &ConnectionId) -> Option<EntityId> {
		let (_, entity_id) = self.owners.remove(channel_id)?;

		self.entries.remove_if(&entity_id, |_, entry| entry.channel.id() == channel_id).map(|(id, _)| id)
	}

	pub fn lookup(&self, entity_id: &EntityId) -> Option<ChannelHandle<M>> {
		self.entries.get(entity_id).map(|entry| entry.channel.clone())
	}

	pub fn get(&self, entity_id: &EntityId) -> Option<ChannelEntry<M>> {
		self.entries.get(entity_id).map(|entry| entry.value().clone())
	}

	/// The entity `channel_id` currently speaks for, with its kind
	pub fn owner_of(&self, channel_id: &ConnectionId) -> Option<(EntityId, EntityKind)> {
		let entity_id = self.owners.get(channel_id).map(|owner| owner.value().clone())?;

		self
			.entries
			.get(&entity_id)
			.filter(|entry| entry.channel.id() == channel_id)
			.map(|entry| (entry.entity_id.clone(), entry.kind))
	}

	/// Returns `true` if `channel_id` is the live channel for `entity_id`
	pub fn is_bound(&self, entity_id: &EntityId, channel_id: &ConnectionId) -> bool {
		self.entries.get(entity_id).is_some_and(|entry| entry.channel.id() == channel_id)
	}

	/// Snapshot of every channel of `kind` registered right now
	pub fn all_of_kind(&self, kind: EntityKind) -> Vec<ChannelHandle<M>> {
		self
			.entries
			.iter()
			.filter(|entry| entry.kind == kind)
			.map(|entry| entry.channel.clone())
			.collect()
	}

	pub fn entries_of_kind(&self, kind: EntityKind) -> Vec<(EntityId, ChannelHandle<M>)> {
		self
			.entries
			.iter()
			.filter(|entry| entry.kind == kind)
			.map(|entry| (entry.entity_id.clone(), entry.channel.clone()))
			.collect()
	}

	pub fn count_of_kind(&self, kind: EntityKind) -> usize {
		self.entries.iter().filter(|entry| entry.kind == kind).count()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn stats(&self) -> RegistryStats {
		self.entries.iter().fold(RegistryStats::default(), |mut stats, entry| {
			match entry.kind {
				EntityKind::Display => stats.displays += 1,
				EntityKind::Admin => stats.admins += 1,
			}
			stats
		})
	}
}

impl<M> Default for ChannelRegistry<M> {
	fn default() -> Self {
		Self::new()
	}
}

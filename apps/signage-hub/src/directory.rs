use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use ws_events::PlaylistRecord;

use crate::error::DirectoryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
	pub id: String,
	/// URL slug a display is provisioned with
	pub slug: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub playlist_id: Option<String>,
	#[serde(default)]
	pub online: bool,
}

/// Lookup-and-update view of the display and playlist store
#[async_trait]
pub trait Directory: Send + Sync + 'static {
	async fn resolve_display(&self, slug: &str) -> Result<DisplayRecord, DirectoryError>;

	async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistRecord, DirectoryError>;

	async fn set_online(&self, display_id: &str, online: bool) -> Result<(), DirectoryError>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DirectorySeed {
	#[serde(default)]
	pub displays: Vec<DisplayRecord>,
	#[serde(default)]
	pub playlists: Vec<PlaylistRecord>,
}

/// Directory kept in memory, optionally seeded from a JSON file
#[derive(Debug)]
pub struct InMemoryDirectory {
	displays: DashMap<String, DisplayRecord>,
	slugs: DashMap<String, String>,
	playlists: DashMap<String, PlaylistRecord>,
	available: AtomicBool,
}

impl Default for InMemoryDirectory {
	fn default() -> Self {
		Self::from_seed(DirectorySeed::default())
	}
}

impl InMemoryDirectory {
	#[must_use]
	pub fn from_seed(seed: DirectorySeed) -> Self {
		let directory = Self {
			displays: DashMap::new(),
			slugs: DashMap::new(),
			playlists: DashMap::new(),
			available: AtomicBool::new(true),
		};

		for display in seed.displays {
			directory.upsert_display(display);
		}
		for playlist in seed.playlists {
			directory.upsert_playlist(playlist);
		}

		directory
	}

	/// # Errors
	/// `Seed` if the file cannot be read, `Parse` if it is not a seed document.
	pub async fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
		let path = path.as_ref();
		let raw = tokio::fs::read_to_string(path).await.map_err(|source| DirectoryError::Seed {
			path: path.display().to_string(),
			source,
		})?;
		let seed: DirectorySeed = serde_json::from_str(&raw)?;

		info!(path = %path.display(), displays = seed.displays.len(), playlists = seed.playlists.len(), "directory seed loaded");
		Ok(Self::from_seed(seed))
	}

	pub fn upsert_display(&self, display: DisplayRecord) {
		self.slugs.insert(display.id.clone(), display.slug.clone());
		self.displays.insert(display.slug.clone(), display);
	}

	pub fn upsert_playlist(&self, playlist: PlaylistRecord) {
		self.playlists.insert(playlist.id.clone(), playlist);
	}

	/// Simulate an outage; every call fails with `Unavailable` while false
	pub fn set_available(&self, available: bool) {
		self.available.store(available, Ordering::SeqCst);
	}

	#[must_use]
	pub fn is_online(&self, display_id: &str) -> Option<bool> {
		let slug = self.slugs.get(display_id)?;
		self.displays.get(slug.value()).map(|display| display.online)
	}

	fn ensure_available(&self) -> Result<(), DirectoryError> {
		if self.available.load(Ordering::SeqCst) {
			Ok(())
		} else {
			Err(DirectoryError::Unavailable("in-memory directory switched off".into()))
		}
	}
}

#[async_trait]
impl Directory for InMemoryDirectory {
	async fn resolve_display(&self, slug: &str) -> Result<DisplayRecord, DirectoryError> {
		self.ensure_available()?;
		self.displays.get(slug).map(|display| display.value().clone()).ok_or_else(|| DirectoryError::UnknownDisplay(slug.to_string()))
	}

	async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistRecord, DirectoryError> {
		self.ensure_available()?;
		self
			.playlists
			.get(playlist_id)
			.map(|playlist| playlist.value().clone())
			.ok_or_else(|| DirectoryError::UnknownPlaylist(playlist_id.to_string()))
	}

	async fn set_online(&self, display_id: &str, online: bool) -> Result<(), DirectoryError> {
		self.ensure_available()?;
		let slug = self.slugs.get(display_id).map(|slug| slug.value().clone()).ok_or_else(|| DirectoryError::UnknownDisplay(display_id.to_string()))?;

		if let Some(mut display) = self.displays.get_mut(&slug) {
			display.online = online;
			debug!(display = display_id, online, "directory online flag updated");
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn lobby() -> DisplayRecord {
		DisplayRecord {
			id: "lobby-1".into(),
			slug: "lobby-1".into(),
			name: "Lobby".into(),
			playlist_id: Some("p1".into()),
			online: false,
		}
	}

	#[tokio::test]
	async fn test_resolve_and_flag_online() {
		let directory = InMemoryDirectory::default();
		directory.upsert_display(lobby());

		assert_eq!(directory.resolve_display("lobby-1").await.unwrap().id, "lobby-1");
		directory.set_online("lobby-1", true).await.unwrap();
		assert_eq!(directory.is_online("lobby-1"), Some(true));
	}

	#[tokio::test]
	async fn test_unknown_entries() {
		let directory = InMemoryDirectory::default();

		assert!(matches!(directory.resolve_display("nope").await, Err(DirectoryError::UnknownDisplay(_))));
		assert!(matches!(directory.get_playlist("nope").await, Err(DirectoryError::UnknownPlaylist(_))));
		assert!(matches!(directory.set_online("nope", true).await, Err(DirectoryError::UnknownDisplay(_))));
	}

	#[tokio::test]
	async fn test_outage_fails_every_call() {
		let directory = InMemoryDirectory::default();
		directory.upsert_display(lobby());
		directory.set_available(false);

		assert!(matches!(directory.resolve_display("lobby-1").await, Err(DirectoryError::Unavailable(_))));
		assert!(matches!(directory.set_online("lobby-1", true).await, Err(DirectoryError::Unavailable(_))));
	}

	#[tokio::test]
	async fn test_load_seed_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"{{
				"displays": [{{"id": "d1", "slug": "front-door", "playlistId": "p1"}}],
				"playlists": [{{"id": "p1", "items": [{{"id": "a", "url": "https://cdn.test/a.png", "durationSecs": 8}}]}}]
			}}"#
		)
		.unwrap();

		let directory = InMemoryDirectory::load(file.path()).await.unwrap();

		let display = directory.resolve_display("front-door").await.unwrap();
		assert_eq!(display.id, "d1");
		assert_eq!(directory.get_playlist("p1").await.unwrap().items.len(), 1);
	}

	#[tokio::test]
	async fn test_load_rejects_bad_seed() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "[1, 2, 3]").unwrap();

		assert!(matches!(InMemoryDirectory::load(file.path()).await, Err(DirectoryError::Parse(_))));
		assert!(matches!(InMemoryDirectory::load("/definitely/not/here.json").await, Err(DirectoryError::Seed { .. })));
	}
}

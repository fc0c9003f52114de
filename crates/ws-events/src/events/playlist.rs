use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
	/// Wrap around at both ends
	#[default]
	All,
	/// Loop the current item; explicit navigation still wraps
	One,
	/// Stop at the ends
	Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
	#[default]
	Image,
	Video,
	Web,
	Pdf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
	pub id: String,
	pub url: String,
	#[serde(default)]
	pub kind: MediaKind,
	/// How long the item stays on screen
	pub duration_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRecord {
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub items: Vec<PlaylistItem>,
	#[serde(default)]
	pub repeat_mode: RepeatMode,
}

impl PlaylistRecord {
	#[must_use]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	#[must_use]
	pub fn item(&self, index: usize) -> Option<&PlaylistItem> {
		self.items.get(index)
	}

	/// Same id, same items, same repeat mode
	#[must_use]
	pub fn same_content(&self, other: &Self) -> bool {
		self.id == other.id && self.repeat_mode == other.repeat_mode && self.items == other.items
	}
}

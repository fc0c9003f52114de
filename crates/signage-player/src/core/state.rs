use std::fmt;
use ws_events::{DisplayStatus, PlaybackReport, PlaylistItem, PlaylistRecord, StatusReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayStatus {
	#[default]
	Idle,
	Loading,
	Playing,
	Paused,
	Buffering,
	Error,
	Stopped,
}

impl From<PlayStatus> for DisplayStatus {
	fn from(status: PlayStatus) -> Self {
		match status {
			PlayStatus::Idle => Self::Idle,
			PlayStatus::Loading => Self::Loading,
			PlayStatus::Playing => Self::Playing,
			PlayStatus::Paused => Self::Paused,
			PlayStatus::Buffering => Self::Buffering,
			PlayStatus::Error => Self::Error,
			PlayStatus::Stopped => Self::Stopped,
		}
	}
}

impl fmt::Display for PlayStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(DisplayStatus::from(*self).as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
	pub status: PlayStatus,
	pub playlist: Option<PlaylistRecord>,
	pub current_index: usize,
	pub volume: u8,
	pub error_count: u32,
	pub last_error: Option<String>,
}

impl PlaybackState {
	#[must_use]
	pub const fn new(volume: u8) -> Self {
		Self {
			status: PlayStatus::Idle,
			playlist: None,
			current_index: 0,
			volume,
			error_count: 0,
			last_error: None,
		}
	}

	#[must_use]
	pub fn current_item(&self) -> Option<&PlaylistItem> {
		self.playlist.as_ref().and_then(|playlist| playlist.item(self.current_index))
	}

	#[must_use]
	pub fn current_item_id(&self) -> Option<&str> {
		self.current_item().map(|item| item.id.as_str())
	}

	#[must_use]
	pub fn playlist_len(&self) -> usize {
		self.playlist.as_ref().map_or(0, PlaylistRecord::len)
	}

	#[must_use]
	pub fn report(&self) -> PlaybackReport {
		PlaybackReport {
			playlist_id: self.playlist.as_ref().map(|playlist| playlist.id.clone()),
			current_index: self.current_index,
			current_item_id: self.current_item_id().map(String::from),
			volume: self.volume,
			error_count: self.error_count,
			last_error: self.last_error.clone(),
		}
	}

	#[must_use]
	pub fn status_report(&self, display_id: &str) -> StatusReport {
		StatusReport {
			display_id: display_id.to_string(),
			status: self.status.into(),
			playback: Some(self.report()),
		}
	}
}

impl Default for PlaybackState {
	fn default() -> Self {
		Self::new(100)
	}
}

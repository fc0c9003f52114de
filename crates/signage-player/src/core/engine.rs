use smallvec::SmallVec;
use tracing::{debug, info, warn};
use ws_events::{ControlAction, Envelope, PlaylistItem, PlaylistRecord, RepeatMode, StatusReport};

use super::error::{PlayerError, Result};
use super::{CommandGuard, MediaEvent, PlayStatus, PlaybackState, PlayerCommand, PlayerConfig, PlayerInput, Stamped};

/// Work the runtime performs on behalf of the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
	/// Fetch and prepare the item; answer with `Ready` or `Failed`
	Load(PlaylistItem),
	/// Start or resume the current item's clock
	Resume,
	/// Freeze the current item's clock
	Suspend,
	/// Abandon any pending load, clock or retry
	Clear,
	ScheduleRetry { attempt: u32 },
	SetVolume(u8),
	/// Observable state changed; tell the hub
	Report(StatusReport),
}

pub type Effects = SmallVec<[Effect; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
	pub state: PlaybackState,
	pub effects: Effects,
}

impl Step {
	fn to(state: PlaybackState) -> Self {
		Self { state, effects: SmallVec::new() }
	}

	fn with(mut self, effect: Effect) -> Self {
		self.effects.push(effect);
		self
	}
}

// ============================================================================
// Pure FSM
// ============================================================================

/// Pure transition function: the next state and the effects to run.
///
/// `Err` means the input is ignored and the state is unchanged.
///
/// # Errors
/// The reason the input does not apply in `state`.
pub fn transition(state: &PlaybackState, input: PlayerInput, retry_budget: u32) -> Result<Step> {
	match input {
		PlayerInput::Command(PlayerCommand::LoadPlaylist(playlist)) => load_playlist(state, playlist),
		PlayerInput::Command(PlayerCommand::Control { action, value }) => control(state, action, value),
		PlayerInput::Command(PlayerCommand::EmergencyStop { .. }) => {
			let mut next = state.clone();
			next.status = PlayStatus::Stopped;
			Ok(Step::to(next).with(Effect::Clear))
		}
		PlayerInput::Media(event) => media(state, event, retry_budget),
	}
}

fn load_playlist(state: &PlaybackState, playlist: PlaylistRecord) -> Result<Step> {
	if state.playlist.as_ref().is_some_and(|current| current.same_content(&playlist)) {
		return Err(PlayerError::SamePlaylist(playlist.id));
	}

	let mut next = state.clone();
	next.current_index = 0;
	next.error_count = 0;
	next.last_error = None;
	next.playlist = Some(playlist);

	if next.playlist_len() == 0 {
		next.status = PlayStatus::Idle;
		return Ok(Step::to(next).with(Effect::Clear));
	}

	load_current(next)
}

fn load_current(mut next: PlaybackState) -> Result<Step> {
	let item = next.current_item().cloned().ok_or(PlayerError::NoPlaylist)?;
	next.status = PlayStatus::Loading;
	Ok(Step::to(next).with(Effect::Clear).with(Effect::Load(item)))
}

fn control(state: &PlaybackState, action: ControlAction, value: Option<i64>) -> Result<Step> {
	use PlayStatus::{Buffering, Error, Idle, Loading, Paused, Playing, Stopped};

	match action {
		ControlAction::Play => match state.status {
			Paused => {
				let mut next = state.clone();
				next.status = Playing;
				Ok(Step::to(next).with(Effect::Resume))
			}
			Loading | Playing | Buffering => Ok(Step::to(state.clone())),
			Idle | Stopped | Error => {
				let mut next = state.clone();
				next.error_count = 0;
				next.last_error = None;
				load_current(next)
			}
		},

		ControlAction::Pause => match state.status {
			Playing | Buffering => {
				let mut next = state.clone();
				next.status = Paused;
				Ok(Step::to(next).with(Effect::Suspend))
			}
			Paused => Ok(Step::to(state.clone())),
			from => Err(PlayerError::InvalidTransition { from, action }),
		},

		ControlAction::Stop => {
			let mut next = state.clone();
			next.status = Stopped;
			Ok(Step::to(next).with(Effect::Clear))
		}

		ControlAction::Next | ControlAction::Previous => {
			let forward = action == ControlAction::Next;
			let playlist = state.playlist.as_ref().filter(|playlist| !playlist.is_empty()).ok_or(PlayerError::NoPlaylist)?;
			let target = neighbour(state.current_index, playlist.len(), playlist.repeat_mode, forward).ok_or(PlayerError::AtEdge(if forward { "end" } else { "start" }))?;
			move_to(state, target)
		}

		ControlAction::Seek => {
			let len = state.playlist_len();
			if len == 0 {
				return Err(PlayerError::NoPlaylist);
			}
			let target = value
				.and_then(|v| usize::try_from(v).ok())
				.filter(|index| *index < len)
				.ok_or(PlayerError::SeekOutOfRange { target: value, len })?;
			move_to(state, target)
		}

		ControlAction::Volume => {
			let requested = value.ok_or(PlayerError::MissingValue(action))?;
			let volume = u8::try_from(requested.clamp(0, 100)).unwrap_or(100);
			let mut next = state.clone();
			if volume == state.volume {
				return Ok(Step::to(next));
			}
			next.volume = volume;
			Ok(Step::to(next).with(Effect::SetVolume(volume)))
		}
	}
}

/// Index reached by one explicit step; `Off` refuses to wrap
const fn neighbour(index: usize, len: usize, mode: RepeatMode, forward: bool) -> Option<usize> {
	let wraps = !matches!(mode, RepeatMode::Off);
	if forward {
		if index + 1 < len {
			Some(index + 1)
		} else if wraps {
			Some(0)
		} else {
			None
		}
	} else if index > 0 {
		Some(index - 1)
	} else if wraps {
		Some(len - 1)
	} else {
		None
	}
}

fn move_to(state: &PlaybackState, index: usize) -> Result<Step> {
	let mut next = state.clone();
	next.current_index = index;

	// a stopped display only moves its cursor
	if state.status == PlayStatus::Stopped {
		return Ok(Step::to(next));
	}

	load_current(next)
}

fn media(state: &PlaybackState, event: MediaEvent, retry_budget: u32) -> Result<Step> {
	use PlayStatus::{Buffering, Error, Idle, Loading, Playing, Stopped};

	match (state.status, event) {
		(Loading | Buffering, MediaEvent::Ready) => {
			let mut next = state.clone();
			next.status = Playing;
			Ok(Step::to(next).with(Effect::Resume))
		}

		(Loading | Playing, MediaEvent::Stalled) => {
			let mut next = state.clone();
			next.status = Buffering;
			Ok(Step::to(next).with(Effect::Suspend))
		}

		(Playing, MediaEvent::Ended) => {
			let mut next = state.clone();
			next.error_count = 0;
			next.last_error = None;

			let (len, mode) = state.playlist.as_ref().map_or((0, RepeatMode::Off), |playlist| (playlist.len(), playlist.repeat_mode));
			let upcoming = match mode {
				RepeatMode::One => Some(state.current_index),
				RepeatMode::All | RepeatMode::Off => neighbour(state.current_index, len, mode, true),
			};

			match upcoming {
				Some(index) => {
					next.current_index = index;
					load_current(next)
				}
				None => {
					next.current_index = 0;
					next.status = Idle;
					Ok(Step::to(next).with(Effect::Clear))
				}
			}
		}

		(Loading | Playing | Buffering, MediaEvent::Failed(message)) => {
			let mut next = state.clone();
			next.error_count = next.error_count.saturating_add(1);
			next.last_error = Some(message);

			if next.error_count > retry_budget {
				next.status = Stopped;
				return Ok(Step::to(next).with(Effect::Clear));
			}

			next.status = Error;
			let attempt = next.error_count;
			Ok(Step::to(next).with(Effect::Clear).with(Effect::ScheduleRetry { attempt }))
		}

		(Error, MediaEvent::Retry) => load_current(state.clone()),

		(from, event) => Err(PlayerError::StaleMediaEvent { from, event: event.name() }),
	}
}

// ============================================================================
// PlaybackMachine
// ============================================================================

/// Playback state of one display plus the guard in front of it
#[derive(Debug)]
pub struct PlaybackMachine {
	display_id: String,
	config: PlayerConfig,
	state: PlaybackState,
	guard: CommandGuard,
}

impl PlaybackMachine {
	#[must_use]
	pub fn new(display_id: impl Into<String>, config: PlayerConfig) -> Self {
		Self {
			display_id: display_id.into(),
			state: PlaybackState::new(config.initial_volume.min(100)),
			guard: CommandGuard::new(config.dedupe_window),
			config,
		}
	}

	#[must_use]
	pub fn display_id(&self) -> &str {
		&self.display_id
	}

	#[must_use]
	pub const fn state(&self) -> &PlaybackState {
		&self.state
	}

	#[must_use]
	pub const fn status(&self) -> PlayStatus {
		self.state.status
	}

	#[must_use]
	pub fn status_report(&self) -> StatusReport {
		self.state.status_report(&self.display_id)
	}

	/// Apply a hub frame.
	///
	/// # Errors
	/// `NotAddressed` for frames that carry no command for this display, or
	/// any reason from [`PlaybackMachine::handle_command`].
	pub fn handle_envelope(&mut self, envelope: &Envelope) -> Result<Effects> {
		let stamped = Stamped::from_envelope(envelope, &self.display_id).ok_or(PlayerError::NotAddressed)?;
		self.handle_command(stamped)
	}

	/// # Errors
	/// Duplicate or stale commands, and commands that do not apply in the
	/// current state.
	pub fn handle_command(&mut self, stamped: Stamped) -> Result<Effects> {
		let family = stamped.command.family();
		self
			.guard
			.admit(stamped.id, stamped.issued_at, family)
			.inspect_err(|e| debug!(display = %self.display_id, id = %stamped.id, "dropping {} command: {e}", family.as_str()))?;

		self.apply(PlayerInput::Command(stamped.command))
	}

	/// # Errors
	/// `StaleMediaEvent` when the event no longer matches the state.
	pub fn handle_media(&mut self, event: MediaEvent) -> Result<Effects> {
		self.apply(PlayerInput::Media(event))
	}

	fn apply(&mut self, input: PlayerInput) -> Result<Effects> {
		let Step { state, mut effects } = transition(&self.state, input, self.config.retry_budget)?;

		let from = self.state.status;
		let changed = state.status != from || state.report() != self.state.report();

		if state.status != from {
			info!(display = %self.display_id, %from, to = %state.status, index = state.current_index, "playback status changed");
		}
		if state.status == PlayStatus::Stopped && state.error_count > self.config.retry_budget && from != PlayStatus::Stopped {
			warn!(display = %self.display_id, errors = state.error_count, last_error = ?state.last_error, "retry budget exhausted, stopping");
		}

		self.state = state;
		if changed {
			effects.push(Effect::Report(self.status_report()));
		}

		Ok(effects)
	}
}

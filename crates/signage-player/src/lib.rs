mod core;

pub use crate::core::{CommandFamily, CommandGuard, Effect, Effects, MediaEvent, PlayStatus, PlaybackMachine, PlaybackState, PlayerCommand, PlayerConfig, PlayerError, PlayerInput, Stamped};
pub use crate::core::{transition, Step};

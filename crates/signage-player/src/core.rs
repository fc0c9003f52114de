mod command;
mod config;
mod engine;
mod error;
mod guard;
mod state;

pub use command::{CommandFamily, MediaEvent, PlayerCommand, PlayerInput, Stamped};
pub use config::PlayerConfig;
pub use engine::{transition, Effect, Effects, PlaybackMachine, Step};
pub use error::PlayerError;
pub use guard::CommandGuard;
pub use state::{PlayStatus, PlaybackState};

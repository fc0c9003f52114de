pub mod agent;
pub mod backoff;
pub mod config;
pub mod error;
pub mod media;
pub mod telemetry;

pub use agent::{Agent, SessionEnd};
pub use backoff::Backoff;
pub use config::AgentConfig;
pub use error::AgentError;
pub use media::{MediaClock, MediaSettings, TimedEvent};
pub use telemetry::init_tracing;

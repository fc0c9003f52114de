pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod hub;
pub mod liveness;
pub mod metrics;
pub mod routes;
pub mod telemetry;
pub mod websocket;

use std::sync::Arc;

pub use config::Config;
pub use directory::{Directory, DirectorySeed, DisplayRecord, InMemoryDirectory};
pub use dispatch::{DeliveryReport, DispatchTarget, Dispatcher};
pub use error::{DirectoryError, HubError};
pub use hub::{HealthReport, Hub, HubSettings};
pub use telemetry::init_tracing;

/// Outbound side of one connection
pub type Channel = ws_connection::ChannelHandle<ws_events::Envelope>;
pub type Registry = ws_connection::ChannelRegistry<ws_events::Envelope>;

#[derive(Clone)]
pub struct AppState {
	pub hub: Arc<Hub>,
}

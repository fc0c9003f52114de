pub mod core;
pub mod errors;
pub mod types;

pub use core::handle::ChannelHandle;
pub use core::monitor::{DisplayRuntimeStatus, Liveness, LivenessObserver, LivenessPolicy, LivenessTracker, LivenessTransition, TransitionCause};
pub use core::store::{ChannelEntry, ChannelRegistry, RegistryStats};
pub use errors::ConnectionError;
pub use types::{ConnectionId, EntityId, EntityKind};

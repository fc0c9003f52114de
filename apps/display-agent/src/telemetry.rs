use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use crate::config::AgentConfig;

const DEFAULT_FILTER: &str = "info,display_agent=debug,signage_player=debug";

pub fn init_tracing(config: &AgentConfig) {
	let filter = config
		.rust_log
		.as_deref()
		.and_then(|directives| EnvFilter::try_new(directives).ok())
		.unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

	let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.log_json {
		Box::new(tracing_subscriber::fmt::layer().json().flatten_event(true).with_filter(filter))
	} else {
		Box::new(tracing_subscriber::fmt::layer().with_target(true).with_line_number(true).with_filter(filter))
	};

	if tracing_subscriber::registry().with(layer).try_init().is_err() {
		tracing::warn!("tracing subscriber already installed");
	}
}

use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use crate::config::Config;

const DEFAULT_FILTER: &str = "info,signage_hub=debug,tower_http=info";

/// Install the global subscriber: pretty by default, flattened JSON with `--log-json`
pub fn init_tracing(config: &Config) {
	let filter = config
		.rust_log
		.as_deref()
		.and_then(|directives| EnvFilter::try_new(directives).ok())
		.unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

	let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.log_json {
		Box::new(
			tracing_subscriber::fmt::layer()
				.fmt_fields(JsonFields::default())
				.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
				.with_filter(filter),
		)
	} else {
		Box::new(tracing_subscriber::fmt::layer().pretty().with_filter(filter))
	};

	if tracing_subscriber::registry().with(layer).try_init().is_err() {
		tracing::warn!("tracing subscriber already installed");
	}
}

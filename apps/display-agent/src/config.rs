use clap::Parser;
use std::time::Duration;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct AgentConfig {
	/// Websocket endpoint of the hub
	#[arg(long, env = "HUB_URL", default_value = "ws://127.0.0.1:8080/ws")]
	pub hub_url: String,

	/// Id the directory knows this display by
	#[arg(long, env = "DISPLAY_ID")]
	pub display_id: String,

	/// Provisioning slug; defaults to the display id
	#[arg(long, env = "DISPLAY_URL")]
	pub display_url: Option<String>,

	#[arg(long, env = "HEARTBEAT_INTERVAL_SECS", default_value = "30")]
	pub heartbeat_interval_secs: u64,

	/// Consecutive media failures tolerated before playback stops
	#[arg(long, env = "RETRY_BUDGET", default_value = "3")]
	pub retry_budget: u32,

	/// Upper bound for the reconnect back-off
	#[arg(long, env = "RECONNECT_MAX_SECS", default_value = "60")]
	pub reconnect_max_secs: u64,

	/// Simulated time to fetch one media item
	#[arg(long, env = "LOAD_DELAY_MS", default_value = "250")]
	pub load_delay_ms: u64,

	/// Use JSON formatting for tracing
	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	/// Log filter directives
	#[arg(long, env = "RUST_LOG")]
	pub rust_log: Option<String>,
}

impl AgentConfig {
	/// Minimal config for a display, everything else at its default
	#[must_use]
	pub fn for_display(display_id: impl Into<String>) -> Self {
		Self {
			hub_url: "ws://127.0.0.1:8080/ws".into(),
			display_id: display_id.into(),
			display_url: None,
			heartbeat_interval_secs: 30,
			retry_budget: 3,
			reconnect_max_secs: 60,
			load_delay_ms: 250,
			log_json: false,
			rust_log: None,
		}
	}

	#[must_use]
	pub fn slug(&self) -> &str {
		self.display_url.as_deref().unwrap_or(&self.display_id)
	}

	#[must_use]
	pub const fn heartbeat_interval(&self) -> Duration {
		Duration::from_secs(self.heartbeat_interval_secs)
	}

	#[must_use]
	pub const fn reconnect_max(&self) -> Duration {
		Duration::from_secs(self.reconnect_max_secs)
	}

	#[must_use]
	pub const fn load_delay(&self) -> Duration {
		Duration::from_millis(self.load_delay_ms)
	}
}

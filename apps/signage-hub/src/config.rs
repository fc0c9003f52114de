use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use ws_connection::LivenessPolicy;

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// Use JSON formatting for tracing
	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	/// Log filter directives
	#[arg(long, env = "RUST_LOG")]
	pub rust_log: Option<String>,

	/// Server host
	#[arg(long, env = "HOST", default_value = "127.0.0.1")]
	pub host: String,

	/// Server port
	#[arg(long, env = "PORT", default_value = "8080")]
	pub port: u16,

	/// Silence after which a display is considered offline
	#[arg(long, env = "HEARTBEAT_TIMEOUT_SECS", default_value = "180")]
	pub heartbeat_timeout_secs: u64,

	/// How often displays are checked for heartbeat silence
	#[arg(long, env = "SWEEP_INTERVAL_SECS", default_value = "15")]
	pub sweep_interval_secs: u64,

	/// Outbound queue length per channel
	#[arg(long, env = "CHANNEL_BUFFER", default_value = "256")]
	pub channel_buffer: usize,

	/// JSON file seeding the in-memory display/playlist directory
	#[arg(long, env = "DIRECTORY_FILE")]
	pub directory_file: Option<PathBuf>,
}

impl Config {
	#[must_use]
	pub fn bind_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	#[must_use]
	pub const fn liveness_policy(&self) -> LivenessPolicy {
		LivenessPolicy {
			heartbeat_timeout: Duration::from_secs(self.heartbeat_timeout_secs),
			sweep_interval: Duration::from_secs(self.sweep_interval_secs),
		}
	}
}

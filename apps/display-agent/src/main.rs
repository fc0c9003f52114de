use anyhow::Result;
use clap::Parser;
use display_agent::{init_tracing, Agent, AgentConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();
	let config = AgentConfig::parse();
	init_tracing(&config);

	tracing::info!("📺 Starting display agent {} ({})", config.display_id, config.slug());

	let shutdown_token = CancellationToken::new();
	let signal_token = shutdown_token.clone();
	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => tracing::info!("🛑 Received shutdown signal (Ctrl+C)"),
			Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
		}
		signal_token.cancel();
	});

	Agent::new(config).run(shutdown_token).await;

	tracing::info!("👋 Display agent stopped gracefully");
	Ok(())
}

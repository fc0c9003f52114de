use anyhow::Result;
use clap::Parser;
use signage_hub::{init_tracing, routes, AppState, Config, Directory, Hub, HubError, HubSettings, InMemoryDirectory};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();
	let config = Config::parse();
	init_tracing(&config);

	tracing::info!("🎬 Starting signage hub");

	let directory: Arc<dyn Directory> = match &config.directory_file {
		Some(path) => {
			tracing::info!("📂 Seeding directory from {}", path.display());
			Arc::new(InMemoryDirectory::load(path).await?)
		}
		None => {
			tracing::warn!("No DIRECTORY_FILE given; starting with an empty directory");
			Arc::new(InMemoryDirectory::default())
		}
	};

	let shutdown_token = CancellationToken::new();
	let hub = Hub::new(directory, HubSettings::from(&config), &shutdown_token);
	let sweeper = hub.spawn_sweeper();

	let config = Arc::new(config);
	let app = routes::router(AppState { hub: Arc::clone(&hub) }, Arc::clone(&config));

	let addr = config.bind_addr();
	let listener = TcpListener::bind(&addr).await.map_err(|source| HubError::Bind { addr: addr.clone(), source })?;
	tracing::info!("🚀 Listening on {}", listener.local_addr()?);

	let signal_token = shutdown_token.clone();
	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => tracing::info!("🛑 Received shutdown signal (Ctrl+C)"),
			Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
		}
		signal_token.cancel();
	});

	axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(shutdown_token.clone().cancelled_owned())
		.await?;

	hub.shutdown();
	if let Err(e) = sweeper.await {
		tracing::warn!("Liveness sweeper ended abnormally: {}", e);
	}

	tracing::info!("👋 Signage hub stopped gracefully");
	Ok(())
}

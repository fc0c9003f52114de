use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::add_extension::AddExtensionLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::hub::HealthReport;
use crate::metrics::metrics_handler;
use crate::websocket::websocket_handler;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
	#[serde(flatten)]
	pub hub: HealthReport,
	pub heartbeat_timeout_secs: u64,
}

pub fn router(state: AppState, config: Arc<Config>) -> Router {
	Router::new()
		.route("/ws", get(websocket_handler))
		.route("/health", get(health_handler))
		.route("/metrics", get(metrics_handler))
		.with_state(state)
		.layer(ServiceBuilder::new().layer(AddExtensionLayer::new(config)).layer(TraceLayer::new_for_http()))
}

async fn health_handler(State(state): State<AppState>, Extension(config): Extension<Arc<Config>>) -> Json<HealthResponse> {
	Json(HealthResponse {
		hub: state.hub.health(),
		heartbeat_timeout_secs: config.heartbeat_timeout_secs,
	})
}

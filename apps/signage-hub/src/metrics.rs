use axum::http::StatusCode;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, register_int_gauge, register_int_gauge_vec, Encoder, IntCounterVec, IntGauge, IntGaugeVec, TextEncoder};

lazy_static! {
	pub static ref HUB_CHANNELS_ACTIVE: IntGaugeVec = register_int_gauge_vec!(
		"hub_channels_active",
		"Registered channels by entity kind",
		&["kind"] // "display", "admin"
	)
	.expect("Failed to register HUB_CHANNELS_ACTIVE");

	pub static ref HUB_CONNECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
		"hub_connections_total",
		"Websocket connections opened and closed",
		&["outcome"] // "opened", "closed"
	)
	.expect("Failed to register HUB_CONNECTIONS_TOTAL");

	pub static ref HUB_DISPLAYS_ONLINE: IntGauge =
		register_int_gauge!("hub_displays_online", "Displays currently considered reachable").expect("Failed to register HUB_DISPLAYS_ONLINE");

	pub static ref HUB_LIVENESS_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
		"hub_liveness_transitions_total",
		"Online/offline transitions",
		&["liveness", "cause"]
	)
	.expect("Failed to register HUB_LIVENESS_TRANSITIONS");

	pub static ref HUB_DISPATCH_DELIVERIES: IntCounterVec = register_int_counter_vec!(
		"hub_dispatch_deliveries_total",
		"Per-channel outcomes of dispatched commands",
		&["type", "outcome"] // outcome: "delivered", "missed", "failed"
	)
	.expect("Failed to register HUB_DISPATCH_DELIVERIES");

	pub static ref HUB_DIRECTORY_WRITES: IntCounterVec = register_int_counter_vec!(
		"hub_directory_writes_total",
		"Best-effort online flag writes to the directory",
		&["result"] // "ok", "failed", "dropped"
	)
	.expect("Failed to register HUB_DIRECTORY_WRITES");

	pub static ref HUB_INBOUND_MESSAGES: IntCounterVec = register_int_counter_vec!(
		"hub_inbound_messages_total",
		"Inbound frames by type and result",
		&["type", "result"]
	)
	.expect("Failed to register HUB_INBOUND_MESSAGES");
}

pub fn record_deliveries(kind: &str, delivered: usize, missed: usize, failed: usize) {
	for (outcome, count) in [("delivered", delivered), ("missed", missed), ("failed", failed)] {
		if count > 0 {
			HUB_DISPATCH_DELIVERIES.with_label_values(&[kind, outcome]).inc_by(count as u64);
		}
	}
}

/// Prometheus metrics handler
pub async fn metrics_handler() -> Result<String, StatusCode> {
	let encoder = TextEncoder::new();
	let metric_families = prometheus::gather();
	let mut buffer = Vec::new();

	if encoder.encode(&metric_families, &mut buffer).is_err() {
		return Err(StatusCode::INTERNAL_SERVER_ERROR);
	}

	String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

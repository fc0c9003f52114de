use std::sync::Arc;
use tracing::debug;
use ws_connection::{ConnectionId, EntityKind, LivenessTransition};
use ws_events::{Envelope, OutboundMessage, StatusReport};

use crate::Registry;

/// Single funnel for everything admin consoles are told.
///
/// Each call snapshots the admin channels registered at that moment and
/// hands every one of them its own copy; no filtering, no retries.
#[derive(Clone)]
pub struct AdminFanout {
	registry: Arc<Registry>,
}

impl AdminFanout {
	#[must_use]
	pub const fn new(registry: Arc<Registry>) -> Self {
		Self { registry }
	}

	pub fn publish(&self, envelope: &Envelope) -> usize {
		self.publish_except(envelope, None)
	}

	/// Publish to every admin except `origin`; returns how many accepted it
	pub fn publish_except(&self, envelope: &Envelope, origin: Option<&ConnectionId>) -> usize {
		let mut delivered = 0;

		for admin in self.registry.all_of_kind(EntityKind::Admin) {
			if origin.is_some_and(|origin| admin.id() == origin) {
				continue;
			}
			match admin.deliver(envelope.clone()) {
				Ok(()) => delivered += 1,
				Err(e) => debug!(admin = %admin.id(), kind = envelope.kind(), "fan-out delivery failed: {e}"),
			}
		}

		delivered
	}

	pub fn liveness(&self, transition: &LivenessTransition) -> usize {
		let report = StatusReport::liveness(transition.entity_id.as_str(), transition.liveness.is_online());
		let envelope = Envelope::targeted(OutboundMessage::StatusUpdate(report), transition.entity_id.as_str()).with_timestamp(transition.at);

		self.publish(&envelope)
	}

	/// Relay a display's own status report
	pub fn status_update(&self, report: StatusReport) -> usize {
		let display_id = report.display_id.clone();
		self.publish(&Envelope::targeted(OutboundMessage::StatusUpdate(report), display_id))
	}
}

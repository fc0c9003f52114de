#[cfg(test)]
mod tests {
	use signage_hub::{Channel, Directory, DisplayRecord, Hub, HubSettings, InMemoryDirectory};
	use std::sync::Arc;
	use std::time::Duration;
	use tokio::sync::mpsc;
	use tokio_util::sync::CancellationToken;
	use ws_connection::{EntityId, LivenessPolicy};
	use ws_events::{ControlAction, DisplayControlRequest, DisplayStatus, Envelope, MediaKind, OutboundMessage, PlaylistItem, PlaylistRecord, RepeatMode};

	const TIMEOUT: Duration = Duration::from_secs(180);

	struct Peer {
		channel: Channel,
		rx: mpsc::Receiver<Envelope>,
	}

	impl Peer {
		fn open(hub: &Hub) -> Self {
			let (channel, rx) = hub.open_channel(None);
			Self { channel, rx }
		}

		async fn send(&self, hub: &Hub, frame: &str) {
			hub.handle_frame(&self.channel, frame).await;
		}

		fn drain(&mut self) -> Vec<Envelope> {
			let mut received = Vec::new();
			while let Ok(envelope) = self.rx.try_recv() {
				received.push(envelope);
			}
			received
		}
	}

	fn display(id: &str, playlist_id: Option<&str>) -> DisplayRecord {
		DisplayRecord {
			id: id.into(),
			slug: id.into(),
			name: id.into(),
			playlist_id: playlist_id.map(Into::into),
			online: false,
		}
	}

	fn playlist(id: &str) -> PlaylistRecord {
		PlaylistRecord {
			id: id.into(),
			name: format!("playlist {id}"),
			items: vec![PlaylistItem {
				id: format!("{id}-a"),
				url: format!("https://cdn.test/{id}/a.png"),
				kind: MediaKind::Image,
				duration_secs: 10,
			}],
			repeat_mode: RepeatMode::All,
		}
	}

	fn setup() -> (Arc<Hub>, Arc<InMemoryDirectory>) {
		let directory = Arc::new(InMemoryDirectory::default());
		for id in ["lobby-1", "lobby-2", "cafe-1"] {
			directory.upsert_display(display(id, None));
		}
		directory.upsert_display(display("kiosk-1", Some("p1")));
		directory.upsert_playlist(playlist("p1"));
		directory.upsert_playlist(playlist("p2"));

		let settings = HubSettings {
			liveness: LivenessPolicy::default().with_heartbeat_timeout(TIMEOUT),
			channel_buffer: 32,
		};
		let hub = Hub::new(Arc::clone(&directory) as Arc<dyn Directory>, settings, &CancellationToken::new());
		(hub, directory)
	}

	fn register_display_frame(id: &str) -> String {
		format!(r#"{{"type":"register_display","data":{{"displayId":"{id}","displayUrl":"{id}"}}}}"#)
	}

	const REGISTER_ADMIN: &str = r#"{"type":"register_admin","data":{}}"#;

	async fn register_display(hub: &Hub, id: &str) -> Peer {
		let mut peer = Peer::open(hub);
		peer.send(hub, &register_display_frame(id)).await;
		peer.drain();
		peer
	}

	async fn register_admin(hub: &Hub) -> Peer {
		let mut peer = Peer::open(hub);
		peer.send(hub, REGISTER_ADMIN).await;
		peer.drain();
		peer
	}

	fn kinds(envelopes: &[Envelope]) -> Vec<&'static str> {
		envelopes.iter().map(Envelope::kind).collect()
	}

	fn liveness_updates(envelopes: &[Envelope]) -> Vec<(String, DisplayStatus)> {
		envelopes
			.iter()
			.filter_map(|envelope| match &envelope.message {
				OutboundMessage::StatusUpdate(report) => Some((report.display_id.clone(), report.status)),
				_ => None,
			})
			.collect()
	}

	fn error_message(envelope: &Envelope) -> &str {
		match &envelope.message {
			OutboundMessage::Error(payload) => &payload.message,
			other => panic!("expected error, got {other:?}"),
		}
	}

	async fn settle() {
		tokio::time::sleep(Duration::from_millis(20)).await;
	}

	// ============================================================================
	// REGISTRATION
	// ============================================================================

	#[tokio::test]
	async fn test_register_display_acknowledged_and_announced() {
		let (hub, directory) = setup();
		let mut admin = register_admin(&hub).await;
		let mut lobby = Peer::open(&hub);

		lobby.send(&hub, &register_display_frame("lobby-1")).await;

		let replies = lobby.drain();
		assert_eq!(kinds(&replies), vec!["registered"]);
		match &replies[0].message {
			OutboundMessage::Registered(registered) => {
				assert_eq!(registered.entity_id, "lobby-1");
				assert_eq!(registered.status, DisplayStatus::Online);
			}
			other => panic!("unexpected {other:?}"),
		}

		let updates = admin.drain();
		assert_eq!(liveness_updates(&updates), vec![("lobby-1".to_string(), DisplayStatus::Online)]);
		assert_eq!(updates[0].target_display_id.as_deref(), Some("lobby-1"));

		settle().await;
		assert_eq!(directory.is_online("lobby-1"), Some(true));
	}

	#[tokio::test]
	async fn test_unknown_slug_rejected() {
		let (hub, _) = setup();
		let mut peer = Peer::open(&hub);

		peer.send(&hub, &register_display_frame("ghost")).await;

		let replies = peer.drain();
		assert_eq!(kinds(&replies), vec!["error"]);
		assert!(error_message(&replies[0]).contains("ghost"));
		assert!(hub.registry().is_empty());
	}

	#[tokio::test]
	async fn test_mismatched_display_id_rejected() {
		let (hub, _) = setup();
		let mut peer = Peer::open(&hub);

		peer.send(&hub, r#"{"type":"register_display","data":{"displayId":"lobby-2","displayUrl":"lobby-1"}}"#).await;

		assert_eq!(kinds(&peer.drain()), vec!["error"]);
		assert!(hub.registry().lookup(&EntityId::from("lobby-1")).is_none());
		assert!(hub.registry().lookup(&EntityId::from("lobby-2")).is_none());
	}

	#[tokio::test]
	async fn test_malformed_frame_answers_error() {
		let (hub, _) = setup();
		let mut peer = Peer::open(&hub);

		peer.send(&hub, "not json").await;
		peer.send(&hub, r#"{"type":"self_destruct","data":{}}"#).await;

		assert_eq!(kinds(&peer.drain()), vec!["error", "error"]);
	}

	#[tokio::test]
	async fn test_admin_receives_fleet_snapshot() {
		let (hub, _) = setup();
		let _lobby = register_display(&hub, "lobby-1").await;
		let _cafe = register_display(&hub, "cafe-1").await;
		let mut admin = Peer::open(&hub);

		admin.send(&hub, REGISTER_ADMIN).await;

		let replies = admin.drain();
		assert_eq!(kinds(&replies), vec!["registered", "fleet_snapshot"]);
		match &replies[1].message {
			OutboundMessage::FleetSnapshot(snapshot) => {
				let ids: Vec<_> = snapshot.displays.iter().map(|d| d.display_id.as_str()).collect();
				assert_eq!(ids, vec!["cafe-1", "lobby-1"]);
				assert!(snapshot.displays.iter().all(|d| d.online));
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_assigned_playlist_pushed_after_registration() {
		let (hub, _) = setup();
		let mut kiosk = Peer::open(&hub);

		kiosk.send(&hub, &register_display_frame("kiosk-1")).await;

		let replies = kiosk.drain();
		assert_eq!(kinds(&replies), vec!["registered", "playlist_update"]);
		assert_eq!(replies[1].target_display_id.as_deref(), Some("kiosk-1"));
		match &replies[1].message {
			OutboundMessage::PlaylistUpdate(command) => assert_eq!(command.playlist.id, "p1"),
			other => panic!("unexpected {other:?}"),
		}
	}

	// ============================================================================
	// SUPERSESSION
	// ============================================================================

	#[tokio::test]
	async fn test_newer_channel_supersedes_older() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let old = register_display(&hub, "lobby-1").await;
		let mut new = register_display(&hub, "lobby-1").await;
		admin.drain();

		let bound = hub.registry().lookup(&EntityId::from("lobby-1")).expect("bound");
		assert_eq!(bound.id(), new.channel.id());

		// The superseded channel closing must not take the display offline
		hub.handle_disconnect(&old.channel);

		assert!(hub.liveness().is_online(&EntityId::from("lobby-1")));
		assert!(liveness_updates(&admin.drain()).is_empty());
		assert_eq!(hub.registry().lookup(&EntityId::from("lobby-1")).map(|c| c.id().clone()), Some(new.channel.id().clone()));

		admin.send(&hub, r#"{"type":"display_control","data":{"displayId":"lobby-1","action":"pause"}}"#).await;
		assert_eq!(kinds(&new.drain()), vec!["display_control"]);
	}

	#[tokio::test]
	async fn test_disconnect_of_bound_channel_goes_offline_once() {
		let (hub, directory) = setup();
		let mut admin = register_admin(&hub).await;
		let lobby = register_display(&hub, "lobby-1").await;
		admin.drain();

		hub.handle_disconnect(&lobby.channel);
		hub.handle_disconnect(&lobby.channel);

		assert_eq!(liveness_updates(&admin.drain()), vec![("lobby-1".to_string(), DisplayStatus::Offline)]);
		assert!(hub.registry().lookup(&EntityId::from("lobby-1")).is_none());

		settle().await;
		assert_eq!(directory.is_online("lobby-1"), Some(false));
	}

	#[tokio::test]
	async fn test_late_release_of_superseded_channel_keeps_display_tracked() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let _old = register_display(&hub, "lobby-1").await;
		let mut new = register_display(&hub, "lobby-1").await;
		admin.drain();

		// The old channel's disconnect reaches liveness only after the rebind
		hub.liveness().disconnected(&EntityId::from("lobby-1"));

		assert!(hub.liveness().is_online(&EntityId::from("lobby-1")));
		assert!(liveness_updates(&admin.drain()).is_empty());

		new.send(&hub, r#"{"type":"heartbeat","data":{"displayId":"lobby-1"}}"#).await;
		assert_eq!(kinds(&new.drain()), vec!["heartbeat_ack"]);
	}

	#[tokio::test]
	async fn test_release_before_rebind_goes_offline_then_online() {
		let (hub, directory) = setup();
		let mut admin = register_admin(&hub).await;
		let old = register_display(&hub, "lobby-1").await;
		admin.drain();

		// Old channel freed the binding, new one registers before liveness hears of it
		hub.registry().unregister(old.channel.id());
		hub.liveness().disconnected(&EntityId::from("lobby-1"));
		let mut new = register_display(&hub, "lobby-1").await;

		assert_eq!(
			liveness_updates(&admin.drain()),
			vec![("lobby-1".to_string(), DisplayStatus::Offline), ("lobby-1".to_string(), DisplayStatus::Online)]
		);
		new.send(&hub, r#"{"type":"heartbeat","data":{"displayId":"lobby-1"}}"#).await;
		assert_eq!(kinds(&new.drain()), vec!["heartbeat_ack"]);

		settle().await;
		assert_eq!(directory.is_online("lobby-1"), Some(true));
	}

	// ============================================================================
	// HEARTBEAT AND LIVENESS
	// ============================================================================

	#[tokio::test]
	async fn test_heartbeat_from_untracked_display_tracks_it_again() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let id = EntityId::from("lobby-1");

		hub.liveness().heartbeat(&id);

		assert!(hub.liveness().is_online(&id));
		assert_eq!(liveness_updates(&admin.drain()), vec![("lobby-1".to_string(), DisplayStatus::Online)]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_sweep_then_heartbeat_ends_online_everywhere() {
		let (hub, directory) = setup();
		let mut admin = register_admin(&hub).await;
		let lobby = register_display(&hub, "lobby-1").await;
		admin.drain();

		tokio::time::advance(TIMEOUT * 2).await;
		assert_eq!(hub.liveness().sweep(), 1);
		lobby.send(&hub, r#"{"type":"heartbeat","data":{"displayId":"lobby-1"}}"#).await;

		assert_eq!(
			liveness_updates(&admin.drain()),
			vec![("lobby-1".to_string(), DisplayStatus::Offline), ("lobby-1".to_string(), DisplayStatus::Online)]
		);

		settle().await;
		assert_eq!(directory.is_online("lobby-1"), Some(true));
		assert!(hub.liveness().is_online(&EntityId::from("lobby-1")));
	}

	#[tokio::test]
	async fn test_heartbeat_is_acknowledged() {
		let (hub, _) = setup();
		let mut lobby = register_display(&hub, "lobby-1").await;

		lobby.send(&hub, r#"{"type":"heartbeat","data":{"displayId":"lobby-1"}}"#).await;

		assert_eq!(kinds(&lobby.drain()), vec!["heartbeat_ack"]);
	}

	#[tokio::test]
	async fn test_heartbeat_for_unbound_display_rejected() {
		let (hub, _) = setup();
		let mut lobby = register_display(&hub, "lobby-1").await;

		lobby.send(&hub, r#"{"type":"heartbeat","data":{"displayId":"lobby-2"}}"#).await;

		assert_eq!(kinds(&lobby.drain()), vec!["error"]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_silent_display_goes_offline_exactly_once() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let mut other_admin = register_admin(&hub).await;
		let mut lobby = register_display(&hub, "lobby-1").await;
		admin.drain();
		other_admin.drain();

		tokio::time::advance(TIMEOUT * 3).await;

		assert_eq!(hub.liveness().sweep(), 1);
		assert_eq!(hub.liveness().sweep(), 0);

		let expected = vec![("lobby-1".to_string(), DisplayStatus::Offline)];
		assert_eq!(liveness_updates(&admin.drain()), expected);
		assert_eq!(liveness_updates(&other_admin.drain()), expected);

		// A late heartbeat brings it back
		lobby.send(&hub, r#"{"type":"heartbeat","data":{"displayId":"lobby-1"}}"#).await;
		assert_eq!(kinds(&lobby.drain()), vec!["heartbeat_ack"]);
		assert_eq!(liveness_updates(&admin.drain()), vec![("lobby-1".to_string(), DisplayStatus::Online)]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_heartbeats_within_window_keep_display_online() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let lobby = register_display(&hub, "lobby-1").await;
		admin.drain();

		for _ in 0..5 {
			tokio::time::advance(TIMEOUT / 2).await;
			lobby.send(&hub, r#"{"type":"heartbeat","data":{"displayId":"lobby-1"}}"#).await;
			assert_eq!(hub.liveness().sweep(), 0);
		}

		assert!(liveness_updates(&admin.drain()).is_empty());
	}

	#[tokio::test]
	async fn test_directory_outage_does_not_block_liveness() {
		let (hub, directory) = setup();
		let mut admin = register_admin(&hub).await;
		let lobby = register_display(&hub, "lobby-1").await;
		admin.drain();

		directory.set_available(false);
		hub.handle_disconnect(&lobby.channel);

		assert_eq!(liveness_updates(&admin.drain()), vec![("lobby-1".to_string(), DisplayStatus::Offline)]);
		assert!(!hub.liveness().is_online(&EntityId::from("lobby-1")));
	}

	#[tokio::test]
	async fn test_status_update_relayed_to_admins() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let lobby = register_display(&hub, "lobby-1").await;
		admin.drain();

		lobby.send(&hub, r#"{"type":"status_update","data":{"displayId":"lobby-1","status":"playing"}}"#).await;

		let updates = admin.drain();
		assert_eq!(liveness_updates(&updates), vec![("lobby-1".to_string(), DisplayStatus::Playing)]);
		assert_eq!(updates[0].target_display_id.as_deref(), Some("lobby-1"));
	}

	// ============================================================================
	// COMMAND DISPATCH
	// ============================================================================

	#[tokio::test]
	async fn test_partial_playlist_delivery_is_not_an_error() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let mut lobby = register_display(&hub, "lobby-1").await;
		admin.drain();

		admin.send(&hub, r#"{"type":"playlist_update","data":{"playlistId":"p2","displayIds":["lobby-1","lobby-2"]}}"#).await;

		let received = lobby.drain();
		assert_eq!(kinds(&received), vec!["playlist_update"]);
		assert_eq!(received[0].target_display_id, None);
		assert!(admin.drain().is_empty());
	}

	#[tokio::test]
	async fn test_unknown_playlist_errors_origin_only() {
		let (hub, _) = setup();
		let mut admin = register_admin(&hub).await;
		let mut watcher = register_admin(&hub).await;
		let mut lobby = register_display(&hub, "lobby-1").await;
		admin.drain();
		watcher.drain();

		admin.send(&hub, r#"{"type":"playlist_update","data":{"playlistId":"p9","displayIds":["lobby-1"]}}"#).await;

		let replies = admin.drain();
		assert_eq!(kinds(&replies), vec!["error"]);
		assert!(error_message(&replies[0]).contains("p9"));
		assert!(lobby.drain().is_empty());
		assert!(watcher.drain().is_empty());
	}

	#[tokio::test]
	async fn test_command_mirrored_once_to_other_admins() {
		let (hub, _) = setup();
		let mut origin = register_admin(&hub).await;
		let mut watcher = register_admin(&hub).await;
		let mut lobby = register_display(&hub, "lobby-1").await;
		origin.drain();
		watcher.drain();

		origin.send(&hub, r#"{"type":"display_control","data":{"displayId":"lobby-1","action":"seek","value":2}}"#).await;

		let delivered = lobby.drain();
		let mirrored = watcher.drain();
		assert_eq!(kinds(&delivered), vec!["display_control"]);
		assert_eq!(kinds(&mirrored), vec!["display_control"]);
		assert_eq!(delivered[0].id, mirrored[0].id);
		assert_eq!(delivered[0].target_display_id.as_deref(), Some("lobby-1"));
		assert!(origin.drain().is_empty());
	}

	#[tokio::test]
	async fn test_admin_id_is_not_a_display_target() {
		let (hub, _) = setup();
		let mut origin = register_admin(&hub).await;
		let mut watcher = register_admin(&hub).await;
		origin.drain();
		watcher.drain();
		let (watcher_id, _) = hub.registry().owner_of(watcher.channel.id()).expect("admin bound");

		origin
			.send(&hub, &format!(r#"{{"type":"display_control","data":{{"displayId":"{watcher_id}","action":"stop"}}}}"#))
			.await;

		// Only the mirror copy, never a delivery
		assert_eq!(kinds(&watcher.drain()), vec!["display_control"]);

		let report = hub.dispatcher().display_control(
			DisplayControlRequest {
				display_id: watcher_id.to_string(),
				action: ControlAction::Pause,
				value: None,
			},
			origin.channel.id(),
		);
		assert_eq!(report.delivered, 0);
		assert_eq!(report.missed, 1);
		assert_eq!(report.mirrored, 1);
	}

	#[tokio::test]
	async fn test_emergency_stop_all_reaches_every_registered_display() {
		let (hub, _) = setup();
		let admin = register_admin(&hub).await;
		let mut lobby = register_display(&hub, "lobby-1").await;
		let mut cafe = register_display(&hub, "cafe-1").await;

		admin.send(&hub, r#"{"type":"emergency_stop","data":{"displayIds":"all","reason":"fire drill"}}"#).await;

		// Registered after the dispatch: not part of the snapshot
		let mut late = register_display(&hub, "lobby-2").await;

		let lobby_got = lobby.drain();
		let cafe_got = cafe.drain();
		assert_eq!(kinds(&lobby_got), vec!["emergency_stop"]);
		assert_eq!(kinds(&cafe_got), vec!["emergency_stop"]);
		assert_eq!(lobby_got[0].id, cafe_got[0].id);
		assert_eq!(lobby_got[0].target_display_id, None);
		assert!(late.drain().is_empty());
	}

	#[tokio::test]
	async fn test_displays_cannot_send_commands() {
		let (hub, _) = setup();
		let mut lobby = register_display(&hub, "lobby-1").await;
		let mut cafe = register_display(&hub, "cafe-1").await;

		lobby.send(&hub, r#"{"type":"emergency_stop","data":{"displayIds":"all","reason":"prank"}}"#).await;

		assert_eq!(kinds(&lobby.drain()), vec!["error"]);
		assert!(cafe.drain().is_empty());
	}

	#[tokio::test]
	async fn test_unregistered_channel_cannot_send_commands() {
		let (hub, _) = setup();
		let mut stranger = Peer::open(&hub);
		let mut lobby = register_display(&hub, "lobby-1").await;

		stranger.send(&hub, r#"{"type":"display_control","data":{"displayId":"lobby-1","action":"stop"}}"#).await;

		assert_eq!(kinds(&stranger.drain()), vec!["error"]);
		assert!(lobby.drain().is_empty());
	}

	#[tokio::test]
	async fn test_health_counts() {
		let (hub, _) = setup();
		let _admin = register_admin(&hub).await;
		let _lobby = register_display(&hub, "lobby-1").await;

		let health = hub.health();
		assert_eq!(health.displays_registered, 1);
		assert_eq!(health.displays_online, 1);
		assert_eq!(health.admins, 1);
	}
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Utc};
	use serde_json::{json, Value};
	use ws_events::{
		ControlAction, DisplayControlRequest, DisplaySelector, DisplayStatus, EmergencyStopRequest, Envelope, HeartbeatAck, MediaKind, OutboundMessage, PlaylistCommand,
		PlaylistItem, PlaylistRecord, RepeatMode, StatusReport,
	};

	fn playlist() -> PlaylistRecord {
		PlaylistRecord {
			id: "p1".into(),
			name: "Lobby loop".into(),
			items: vec![
				PlaylistItem {
					id: "i1".into(),
					url: "https://cdn.example/a.png".into(),
					kind: MediaKind::Image,
					duration_secs: 10,
				},
				PlaylistItem {
					id: "i2".into(),
					url: "https://cdn.example/b.mp4".into(),
					kind: MediaKind::Video,
					duration_secs: 30,
				},
			],
			repeat_mode: RepeatMode::All,
		}
	}

	// ============================================================================
	// WIRE SHAPE
	// ============================================================================

	#[test]
	fn test_envelope_flattens_type_and_data() {
		let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
		let envelope = Envelope::new(OutboundMessage::HeartbeatAck(HeartbeatAck { timestamp: at })).with_timestamp(at);

		let value: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

		assert_eq!(value["type"], "heartbeat_ack");
		assert_eq!(value["data"]["timestamp"], 1_700_000_000_123_i64);
		assert_eq!(value["timestamp"], 1_700_000_000_123_i64);
		assert_eq!(value["id"], envelope.id.to_string());
		assert!(value.get("targetDisplayId").is_none());
	}

	#[test]
	fn test_targeted_envelope_carries_display_id() {
		let control = DisplayControlRequest {
			display_id: "d1".into(),
			action: ControlAction::Pause,
			value: None,
		};
		let envelope = Envelope::targeted(OutboundMessage::DisplayControl(control), "d1");

		let value: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

		assert_eq!(value["targetDisplayId"], "d1");
		assert_eq!(value["data"], json!({"displayId": "d1", "action": "pause"}));
	}

	#[test]
	fn test_liveness_status_update_shape() {
		let envelope = Envelope::new(OutboundMessage::StatusUpdate(StatusReport::liveness("d1", false)));

		let value: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

		assert_eq!(value["type"], "status_update");
		assert_eq!(value["data"], json!({"displayId": "d1", "status": "offline"}));
	}

	#[test]
	fn test_emergency_stop_all_serializes_keyword() {
		let stop = EmergencyStopRequest {
			display_ids: DisplaySelector::all(),
			reason: "evacuation".into(),
		};
		let value = serde_json::to_value(OutboundMessage::EmergencyStop(stop)).unwrap();

		assert_eq!(value, json!({"type": "emergency_stop", "data": {"displayIds": "all", "reason": "evacuation"}}));
	}

	// ============================================================================
	// DECODING ON THE DISPLAY SIDE
	// ============================================================================

	#[test]
	fn test_playlist_update_survives_the_wire() {
		let original = Envelope::new(OutboundMessage::PlaylistUpdate(PlaylistCommand {
			playlist: playlist(),
			display_ids: vec!["d1".into(), "d2".into()],
		}));

		let decoded = Envelope::from_json(&original.to_json().unwrap()).unwrap();

		assert_eq!(decoded.id, original.id);
		assert_eq!(decoded.timestamp.timestamp_millis(), original.timestamp.timestamp_millis());
		assert!(decoded.message.is_command());
		let OutboundMessage::PlaylistUpdate(command) = decoded.message else {
			panic!("expected playlist_update");
		};
		assert!(command.playlist.same_content(&playlist()));
	}

	#[test]
	fn test_hand_written_frame_decodes() {
		let text = r#"{
			"id": "4f0b1c9e-8d7a-4c5e-9a51-1f3c2b6d7e80",
			"type": "playlist_update",
			"data": {
				"playlist": {"id": "p9", "items": [{"id": "x", "url": "u", "durationSecs": 5}], "repeatMode": "off"},
				"displayIds": ["d1"]
			},
			"timestamp": 1700000000000,
			"targetDisplayId": "d1"
		}"#;

		let envelope = Envelope::from_json(text).unwrap();

		assert_eq!(envelope.target_display_id.as_deref(), Some("d1"));
		let OutboundMessage::PlaylistUpdate(command) = envelope.message else {
			panic!("expected playlist_update");
		};
		assert_eq!(command.playlist.repeat_mode, RepeatMode::Off);
		assert_eq!(command.playlist.items[0].kind, MediaKind::Image);
		assert_eq!(command.playlist.name, "");
	}

	#[test]
	fn test_same_content_ignores_name() {
		let mut renamed = playlist();
		renamed.name = "Renamed".into();
		assert!(renamed.same_content(&playlist()));

		let mut reordered = playlist();
		reordered.items.reverse();
		assert!(!reordered.same_content(&playlist()));

		let mut looped = playlist();
		looped.repeat_mode = RepeatMode::One;
		assert!(!looped.same_content(&playlist()));
	}

	#[test]
	fn test_status_strings() {
		assert_eq!(DisplayStatus::Buffering.to_string(), "buffering");
		assert_eq!(serde_json::to_value(DisplayStatus::Stopped).unwrap(), json!("stopped"));
	}

	#[test]
	fn test_garbage_is_rejected() {
		assert!(Envelope::from_json("not json").is_err());
		assert!(Envelope::from_json(r#"{"type":"heartbeat_ack"}"#).is_err());
	}
}

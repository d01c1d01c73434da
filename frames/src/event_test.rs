use serde_json::json;

use super::*;
use crate::{decode_frame, encode_frame};

#[test]
fn syscall_names_are_namespaced() {
    let event = RoomEvent::Permission(PermissionUpdate { can_draw: false });
    assert_eq!(event.syscall(), "permission:update");
    let event = RoomEvent::Join(RoomRef { room_id: "r1".into() });
    assert_eq!(event.syscall(), "room:join");
}

#[test]
fn element_mutation_frame_carries_action_and_element() {
    let event = RoomEvent::Element(ElementMutation {
        element: json!({"id": "c:1", "type": "rectangle"}),
        action: MutationAction::Add,
    });
    let frame = event.to_frame().expect("to_frame");
    assert_eq!(frame.syscall, SYSCALL_ELEMENT);
    assert_eq!(frame.data_str("action"), Some("add"));
    assert_eq!(frame.data["element"]["type"], "rectangle");
}

#[test]
fn from_frame_parses_every_event_kind() {
    let events = vec![
        RoomEvent::Connected { client_id: "c1".into() },
        RoomEvent::Join(RoomRef { room_id: "r1".into() }),
        RoomEvent::Leave(RoomRef { room_id: "r1".into() }),
        RoomEvent::PeerLeft(PeerLeft { client_id: "c2".into() }),
        RoomEvent::Element(ElementMutation { element: json!({"type": "text"}), action: MutationAction::Update }),
        RoomEvent::Cursor(CursorMove {
            room_id: "r1".into(),
            client_id: "c1".into(),
            display_name: "Ada".into(),
            x: 1.5,
            y: -2.5,
        }),
        RoomEvent::History(HistoryEvent {
            room_id: "r1".into(),
            action: HistoryAction::Undo,
            element_id: Some("c1:4".into()),
            element: None,
        }),
        RoomEvent::Permission(PermissionUpdate { can_draw: true }),
    ];
    for event in events {
        let frame = event.to_frame().expect("to_frame");
        let parsed = RoomEvent::from_frame(&frame).expect("from_frame");
        assert_eq!(parsed, event);
    }
}

#[test]
fn cursor_survives_binary_codec() {
    let event = RoomEvent::Cursor(CursorMove {
        room_id: "r1".into(),
        client_id: String::new(),
        display_name: "Ada".into(),
        x: 10.0,
        y: 20.0,
    });
    let frame = event.to_frame().expect("to_frame");
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    assert_eq!(RoomEvent::from_frame(&decoded).expect("from_frame"), event);
}

#[test]
fn cursor_without_client_id_defaults_to_empty() {
    let frame = Frame::request(SYSCALL_CURSOR, json!({"room_id": "r1", "display_name": "A", "x": 1.0, "y": 2.0}));
    let RoomEvent::Cursor(cursor) = RoomEvent::from_frame(&frame).expect("from_frame") else {
        panic!("expected cursor event");
    };
    assert!(cursor.client_id.is_empty());
}

#[test]
fn history_without_ids_omits_optional_fields() {
    let event = RoomEvent::History(HistoryEvent {
        room_id: "r1".into(),
        action: HistoryAction::Clear,
        element_id: None,
        element: None,
    });
    let frame = event.to_frame().expect("to_frame");
    assert!(frame.data.get("element_id").is_none());
    assert!(frame.data.get("element").is_none());
    assert_eq!(frame.data_str("action"), Some("clear"));
}

#[test]
fn unknown_syscall_is_rejected() {
    let frame = Frame::request("chat:send", json!({}));
    let err = RoomEvent::from_frame(&frame).expect_err("should fail");
    assert!(matches!(err, EventError::UnknownSyscall(s) if s == "chat:send"));
}

#[test]
fn malformed_payload_is_rejected() {
    let frame = Frame::request(SYSCALL_HISTORY, json!({"room_id": "r1", "action": "rewind"}));
    let err = RoomEvent::from_frame(&frame).expect_err("should fail");
    assert!(matches!(err, EventError::Payload { .. }));
}

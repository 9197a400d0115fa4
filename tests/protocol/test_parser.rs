//! Tests for frame parsing and content normalization

use alma_realtime::protocol::{
    DEFAULT_NOTIFICATION_BODY, InboundFrame, OutboundFrame, encode_frame, parse_frame,
    parse_search_results, ping_timestamp,
};
use alma_realtime::types::normalize_content;
use alma_realtime::{Chat, ChatId, MessageId, UserId};

#[test]
fn test_parse_live_message() {
    let frame =
        parse_frame(r#"{"type":"message","id":5,"sender_id":2,"sender":"alice","content":"hi"}"#)
            .expect("valid frame");

    let InboundFrame::Message(message) = frame else {
        panic!("expected message frame, got {frame:?}");
    };
    assert_eq!(message.id, MessageId::new(5));
    assert_eq!(message.sender_id, UserId::new(2));
    assert_eq!(message.sender.as_deref(), Some("alice"));
    assert_eq!(message.content, "hi");
}

#[test]
fn test_parse_presence_frames() {
    let snapshot = parse_frame(r#"{"type":"online_list","ids":[1,2,3]}"#).expect("valid");
    assert_eq!(
        snapshot,
        InboundFrame::OnlineList {
            ids: vec![UserId::new(1), UserId::new(2), UserId::new(3)]
        }
    );

    let delta = parse_frame(r#"{"type":"presence","user_id":2,"is_online":false}"#).expect("valid");
    assert_eq!(
        delta,
        InboundFrame::Presence {
            user_id: UserId::new(2),
            is_online: false
        }
    );
}

#[test]
fn test_notification_defaults() {
    let InboundFrame::Notification(bare) = parse_frame(r#"{"type":"notification"}"#).expect("valid")
    else {
        panic!("expected notification");
    };
    assert_eq!(bare.body, DEFAULT_NOTIFICATION_BODY);
    assert_eq!(bare.chat_id, None);

    let InboundFrame::Notification(scoped) =
        parse_frame(r#"{"type":"notification","body":"ping from bob","chat_id":5}"#).expect("valid")
    else {
        panic!("expected notification");
    };
    assert_eq!(scoped.chat_id, Some(ChatId::new(5)));
}

#[test]
fn test_unknown_type_is_tolerated() {
    let frame = parse_frame(r#"{"type":"typing","user_id":3}"#).expect("unknown types parse");
    assert_eq!(frame, InboundFrame::Unknown);
}

#[test]
fn test_malformed_frames_are_protocol_errors() {
    for text in [
        "not json",
        r#"{"no_type":true}"#,
        r#"{"type":"message","content":"missing ids"}"#,
        r#"{"type":"presence","user_id":"x","is_online":true}"#,
    ] {
        let err = parse_frame(text).expect_err(text);
        assert!(err.is_protocol(), "{text}: {err}");
    }
}

#[test]
fn test_ping_timestamp() {
    assert_eq!(ping_timestamp(r#"{"type":"ping","ts":99}"#), Some(99));
    assert_eq!(ping_timestamp(r#"{"type":"ping"}"#), Some(0));
    assert_eq!(ping_timestamp(r#"{"type":"pong","ts":99}"#), None);
    assert_eq!(ping_timestamp("ping"), None);
    assert_eq!(ping_timestamp("[]"), None);
}

#[test]
fn test_encode_outbound_frames() {
    let pong: serde_json::Value =
        serde_json::from_str(&encode_frame(&OutboundFrame::pong(17)).expect("encodes")).expect("json");
    assert_eq!(pong, serde_json::json!({"type": "pong", "ts": 17}));

    let message: serde_json::Value =
        serde_json::from_str(&encode_frame(&OutboundFrame::message("hey")).expect("encodes"))
            .expect("json");
    assert_eq!(message, serde_json::json!({"type": "message", "content": "hey"}));
}

#[test]
fn test_search_results() {
    let users = parse_search_results(r#"[{"id":2,"username":"alice"},{"id":3,"username":"bob"}]"#)
        .expect("valid results");
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].username, "bob");

    assert!(tokio_test::assert_ok!(parse_search_results("[]")).is_empty());
    tokio_test::assert_err!(parse_search_results(r#"{"id":2}"#));
}

#[test]
fn test_normalize_content() {
    assert_eq!(normalize_content(r#"{"content":"hi"}"#), "hi");
    assert_eq!(normalize_content(r#"{"text":"hello there"}"#), "hello there");
    assert_eq!(normalize_content(r#"{"content":"a","text":"b"}"#), "a");
    assert_eq!(normalize_content("hello"), "hello");
    assert_eq!(normalize_content("  spaced  "), "  spaced  ");
    assert_eq!(normalize_content("{not json"), "{not json");
    assert_eq!(normalize_content(r#"{"other":1}"#), r#"{"other":1}"#);
    assert_eq!(normalize_content(r#"{"content":5}"#), r#"{"content":5}"#);
}

#[test]
fn test_chat_json_accepts_string_participant_ids() {
    let chat: Chat = serde_json::from_str(
        r#"{"id":10,"is_group":false,"name":null,
            "participants":[{"userId":"1","username":"me"},{"userId":2,"username":"alice"}]}"#,
    )
    .expect("chat parses");

    assert_eq!(chat.participants[0].user_id, UserId::new(1));
    assert_eq!(chat.other_user_id(UserId::new(1)), Some(UserId::new(2)));
    assert_eq!(chat.display_name(UserId::new(1)), "alice");
}

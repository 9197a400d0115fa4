//! Tests for `ChatSessionController`
//!
//! Drives the controller through its queue with scripted in-memory streams
//! and a scripted REST collaborator.

#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use alma_realtime::controller::{Command, ControllerState, UiUpdate};
use alma_realtime::{Channel, ChatId, ChatMarker, MessageId, UserId};

use common::{Harness, alerts, history, live_frame};

fn select(id: i64) -> Command {
    Command::SelectChat(ChatId::new(id))
}

// ============================================================================
// Chat switching
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_select_chat_loads_history_and_goes_online() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.api.set_history(10, history(&[1, 2]));
    let _peer = h.connector.script(Channel::Chat);

    h.send(select(10));
    h.settle().await;

    assert_eq!(h.controller.state(), ControllerState::Active);
    assert!(h.controller.is_online());
    assert_eq!(h.controller.active_chat().map(|c| c.id), Some(ChatId::new(10)));
    assert_eq!(h.message_ids(), vec![1, 2]);

    let requested = h.connector.requested();
    assert_eq!(requested.len(), 1);
    assert_eq!(requested[0].0, Channel::Chat);
    assert_eq!(requested[0].1.scheme(), "ws");
    assert_eq!(requested[0].1.query(), Some("chatId=10"));

    let updates = h.drain();
    assert!(updates.contains(&UiUpdate::ConnectionStatus { online: true }));
    assert!(updates.contains(&UiUpdate::MessagesChanged));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_switch_never_leaks_previous_chat() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let peer_a = h.connector.script(Channel::Chat);
    let peer_b = h.connector.script(Channel::Chat);

    h.send(select(10));
    h.send(select(20));
    h.settle().await;

    // A was superseded: either never connected or closed on arrival
    assert!(!peer_a.is_connected() || peer_a.is_closed());
    peer_a.push(live_frame(100, 2, "for chat 10"));
    peer_b.push(live_frame(200, 3, "for chat 20"));
    h.settle().await;

    assert_eq!(h.controller.active_chat().map(|c| c.id), Some(ChatId::new(20)));
    assert_eq!(h.message_ids(), vec![200]);
}

#[tokio::test(start_paused = true)]
async fn test_frames_in_flight_during_switch_are_dropped() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let peer_a = h.connector.script(Channel::Chat);
    let peer_b = h.connector.script(Channel::Chat);

    h.send(select(10));
    h.settle().await;
    assert!(h.controller.is_online());

    // A keeps talking while the user moves to B
    peer_a.push(live_frame(100, 2, "late from A"));
    h.send(select(20));
    peer_a.push(live_frame(101, 2, "later from A"));
    h.settle().await;

    peer_b.push(live_frame(200, 3, "from B"));
    h.settle().await;

    assert_eq!(h.message_ids(), vec![200]);
    assert!(peer_a.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_superseded_handshake_never_connects() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let (peer_a, gate_a) = h.connector.script_gated(Channel::Chat);
    let peer_b = h.connector.script(Channel::Chat);

    h.send(select(10));
    h.settle().await;
    assert_eq!(h.controller.state(), ControllerState::SwitchingChat);
    assert!(!peer_a.is_connected());

    h.send(select(20));
    h.settle().await;
    assert!(peer_b.is_connected());
    assert!(h.controller.is_online());

    // A's server answers only after B is live
    gate_a.open();
    h.settle().await;

    assert!(!peer_a.is_connected(), "only one chat stream may exist");
    assert!(!peer_a.push(live_frame(100, 2, "late from A")));
    peer_b.push(live_frame(200, 3, "from B"));
    h.settle().await;

    assert!(h.controller.is_online());
    assert_eq!(h.message_ids(), vec![200]);
}

#[tokio::test(start_paused = true)]
async fn test_leaving_chat_abandons_pending_handshake() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let (peer, gate) = h.connector.script_gated(Channel::Chat);

    h.send(select(10));
    h.settle().await;
    h.send(Command::DeleteActiveChat);
    h.settle().await;
    assert_eq!(h.controller.state(), ControllerState::Idle);

    gate.open();
    h.settle().await;

    assert!(!peer.is_connected());
    assert!(!h.controller.is_online());
}

#[tokio::test(start_paused = true)]
async fn test_live_messages_during_history_load_are_kept_in_order() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.api.set_history(10, history(&[1, 2, 3]));
    let release = h.api.hold_history(10);
    let peer = h.connector.script(Channel::Chat);

    h.send(select(10));
    h.settle().await;
    assert!(h.controller.is_online());

    peer.push(live_frame(3, 2, "dup of history"));
    peer.push(live_frame(4, 2, "new"));
    peer.push(live_frame(5, 1, "mine"));
    h.settle().await;
    assert!(h.message_ids().is_empty(), "nothing shows before history");

    release.send(()).expect("history task waiting");
    h.settle().await;

    assert_eq!(h.message_ids(), vec![1, 2, 3, 4, 5]);
    let lines = h.controller.messages();
    assert_eq!(lines[4].sender, "YOU");
    assert_eq!(lines[3].sender, "alice");
}

#[tokio::test(start_paused = true)]
async fn test_history_failure_raises_one_alert_and_keeps_live() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.api.fail_history(10);
    let release = h.api.hold_history(10);
    let peer = h.connector.script(Channel::Chat);

    h.send(select(10));
    h.settle().await;
    peer.push(live_frame(9, 2, "live"));
    h.settle().await;
    h.drain();

    release.send(()).expect("history task waiting");
    h.settle().await;

    assert_eq!(h.message_ids(), vec![9]);
    assert_eq!(alerts(&h.drain()).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_connect_goes_offline_without_retry() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.connector.script_refusal(Channel::Chat, "server down");

    h.send(select(10));
    h.settle().await;

    assert_eq!(h.controller.state(), ControllerState::Active);
    assert!(!h.controller.is_online());
    assert!(alerts(&h.drain()).is_empty(), "status only, no alert");

    tokio::time::sleep(Duration::from_secs(30)).await;
    h.settle().await;
    assert_eq!(h.connector.requested().len(), 1, "no automatic retry");
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reconnects_offline_chat() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.connector.script_refusal(Channel::Chat, "server down");
    h.send(select(10));
    h.settle().await;
    assert!(!h.controller.is_online());

    let _peer = h.connector.script(Channel::Chat);
    h.send(Command::Refresh);
    h.settle().await;

    assert!(h.controller.is_online());
    assert_eq!(h.connector.requested().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stream_drop_mid_session_marks_offline() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let mut peer = h.connector.script(Channel::Chat);
    h.send(select(10));
    h.settle().await;
    h.drain();

    peer.hang_up();
    h.settle().await;

    assert!(!h.controller.is_online());
    assert_eq!(h.drain(), vec![UiUpdate::ConnectionStatus { online: false }]);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_chat_alerts() {
    let mut h = Harness::new(None);
    h.load_chats().await;

    h.send(select(999));
    h.settle().await;

    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(alerts(&h.drain()).len(), 1);
}

// ============================================================================
// Sending
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_send_writes_message_frame_and_clears_compose() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let mut peer = h.connector.script(Channel::Chat);
    h.send(select(10));
    h.settle().await;

    h.send(Command::SetCompose("hello there".into()));
    h.send(Command::SendMessage);
    h.settle().await;

    assert_eq!(h.controller.compose(), "");
    let frame: serde_json::Value =
        serde_json::from_str(&peer.next_outbound().await.expect("frame")).expect("json");
    assert_eq!(frame, serde_json::json!({"type": "message", "content": "hello there"}));
}

#[tokio::test(start_paused = true)]
async fn test_offline_send_clears_compose_and_alerts_once() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let mut peer = h.connector.script(Channel::Chat);
    h.send(select(10));
    h.settle().await;
    peer.hang_up();
    h.settle().await;
    h.drain();

    h.send(Command::SetCompose("lost words".into()));
    h.send(Command::SendMessage);
    h.settle().await;

    assert_eq!(h.controller.compose(), "");
    assert_eq!(alerts(&h.drain()), vec!["WS Offline".to_string()]);
    assert!(peer.try_outbound().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_blank_send_is_a_no_op() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.send(select(10));
    h.settle().await;
    h.drain();

    h.send(Command::SetCompose("   ".into()));
    h.send(Command::SendMessage);
    h.settle().await;

    assert_eq!(h.controller.compose(), "   ");
    assert!(h.drain().is_empty());
}

// ============================================================================
// Notification stream
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_presence_drives_chat_list_markers() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let peer = h.connector.script(Channel::Notifications);

    h.send(Command::ConnectNotifications);
    h.settle().await;
    peer.push(r#"{"type":"online_list","ids":[2,3]}"#);
    peer.push(r#"{"type":"presence","user_id":2,"is_online":false}"#);
    h.settle().await;

    let markers: Vec<_> = h
        .controller
        .chat_list()
        .into_iter()
        .map(|entry| (entry.chat_id.get(), entry.label, entry.marker))
        .collect();
    assert_eq!(
        markers,
        vec![
            (10, "alice".to_string(), ChatMarker::Offline),
            (20, "bob".to_string(), ChatMarker::Online),
            (30, "team".to_string(), ChatMarker::Group),
        ]
    );
    assert!(h.drain().contains(&UiUpdate::ChatListChanged));
}

#[tokio::test(start_paused = true)]
async fn test_notifications_for_active_chat_are_suppressed() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let notif_peer = h.connector.script(Channel::Notifications);
    let _chat_peer = h.connector.script(Channel::Chat);

    h.send(Command::ConnectNotifications);
    h.send(select(10));
    h.settle().await;
    h.drain();

    notif_peer.push(r#"{"type":"notification","body":"alice wrote","chat_id":10}"#);
    h.settle().await;
    assert!(h.notifier.shown().is_empty());
    assert!(h.controller.banner().is_none());

    notif_peer.push(r#"{"type":"notification","body":"bob wrote","chat_id":20}"#);
    h.settle().await;
    assert_eq!(
        h.notifier.shown(),
        vec![("AlmaChat".to_string(), "bob wrote".to_string())]
    );
    assert_eq!(
        h.drain(),
        vec![UiUpdate::Banner(Some("bob wrote".to_string()))]
    );

    tokio::time::sleep(Duration::from_secs(6)).await;
    h.settle().await;
    assert!(h.controller.banner().is_none());
    assert_eq!(h.drain(), vec![UiUpdate::Banner(None)]);
}

#[tokio::test(start_paused = true)]
async fn test_notification_stream_answers_pings() {
    let mut h = Harness::new(None);
    let mut peer = h.connector.script(Channel::Notifications);
    h.send(Command::ConnectNotifications);
    h.settle().await;

    peer.push(r#"{"type":"ping","ts":42}"#);
    h.settle().await;

    let pong: serde_json::Value =
        serde_json::from_str(&peer.next_outbound().await.expect("pong")).expect("json");
    assert_eq!(pong, serde_json::json!({"type": "pong", "ts": 42}));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_search_without_debounce_sends_each_change() {
    let mut h = Harness::new(None);
    let mut peer = h.connector.script(Channel::Search);
    h.send(Command::OpenSearch);
    h.settle().await;

    h.send(Command::SetSearchQuery("a".into()));
    h.send(Command::SetSearchQuery("ab".into()));
    h.settle().await;

    assert_eq!(peer.try_outbound().as_deref(), Some("a"));
    assert_eq!(peer.try_outbound().as_deref(), Some("ab"));
    assert_eq!(peer.try_outbound(), None);
}

#[tokio::test(start_paused = true)]
async fn test_search_with_debounce_sends_once() {
    let mut h = Harness::new(Some(Duration::from_millis(150)));
    let mut peer = h.connector.script(Channel::Search);
    h.send(Command::OpenSearch);
    h.settle().await;

    h.send(Command::SetSearchQuery("a".into()));
    h.send(Command::SetSearchQuery("ab".into()));
    h.settle().await;
    assert_eq!(peer.try_outbound(), None, "still inside the window");

    tokio::time::sleep(Duration::from_millis(200)).await;
    h.settle().await;

    assert_eq!(peer.try_outbound().as_deref(), Some("ab"));
    assert_eq!(peer.try_outbound(), None);

    peer.push(r#"[{"id":2,"username":"alice"}]"#);
    h.settle().await;
    assert_eq!(h.controller.search_results().len(), 1);
    assert!(h.drain().contains(&UiUpdate::SearchResults));
}

#[tokio::test(start_paused = true)]
async fn test_debounced_query_after_close_is_not_sent() {
    let mut h = Harness::new(Some(Duration::from_millis(150)));
    let mut peer = h.connector.script(Channel::Search);
    h.send(Command::OpenSearch);
    h.settle().await;

    h.send(Command::SetSearchQuery("al".into()));
    h.send(Command::CloseSearch);
    h.settle().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    h.settle().await;

    assert_eq!(peer.try_outbound(), None);
    assert!(alerts(&h.drain()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_close_search_forgets_results() {
    let mut h = Harness::new(None);
    let peer = h.connector.script(Channel::Search);
    h.send(Command::OpenSearch);
    h.settle().await;
    peer.push(r#"[{"id":2,"username":"alice"}]"#);
    h.settle().await;
    assert_eq!(h.controller.search_results().len(), 1);

    h.send(Command::CloseSearch);
    h.settle().await;

    assert!(h.controller.search_results().is_empty());
    assert!(peer.is_closed());
}

// ============================================================================
// User actions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_delete_message_removes_it() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.api.set_history(10, history(&[1, 2]));
    let _peer = h.connector.script(Channel::Chat);
    h.send(select(10));
    h.settle().await;

    h.send(Command::DeleteMessage(MessageId::new(1)));
    h.settle().await;

    assert_eq!(h.message_ids(), vec![2]);
    assert!(h.api.calls().contains(&"delete_message 1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_failed_action_alerts_once_without_retry() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    h.api.set_history(10, history(&[1]));
    let _peer = h.connector.script(Channel::Chat);
    h.send(select(10));
    h.settle().await;
    h.drain();
    h.api.fail_actions();

    h.send(Command::DeleteMessage(MessageId::new(1)));
    h.settle().await;

    assert_eq!(alerts(&h.drain()).len(), 1);
    assert_eq!(h.message_ids(), vec![1]);
    let attempts = h
        .api
        .calls()
        .iter()
        .filter(|c| c.starts_with("delete_message"))
        .count();
    assert_eq!(attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_active_chat_returns_to_idle() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let peer = h.connector.script(Channel::Chat);
    h.send(select(10));
    h.settle().await;

    h.send(Command::DeleteActiveChat);
    h.settle().await;

    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert!(h.controller.active_chat().is_none());
    assert!(h.controller.messages().is_empty());
    assert!(!h.controller.is_online());
    assert!(peer.is_closed());
    assert!(h.controller.chats().iter().all(|c| c.id != ChatId::new(10)));
}

#[tokio::test(start_paused = true)]
async fn test_create_direct_chat_reports_and_refreshes() {
    let mut h = Harness::new(None);
    h.load_chats().await;

    h.send(Command::CreateDirectChat("carol".into()));
    h.settle().await;

    assert!(
        h.drain()
            .contains(&UiUpdate::Info("Chat with carol active".to_string()))
    );
    let calls = h.api.calls();
    assert!(calls.contains(&"create_direct_chat carol".to_string()));
    assert_eq!(calls.iter().filter(|c| *c == "list_chats").count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rename_only_applies_to_groups() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let _direct = h.connector.script(Channel::Chat);
    let _group = h.connector.script(Channel::Chat);

    h.send(select(10));
    h.send(Command::RenameActiveGroup("nope".into()));
    h.settle().await;
    assert!(!h.api.calls().iter().any(|c| c.starts_with("rename_group")));

    h.send(select(30));
    h.send(Command::RenameActiveGroup("crew".into()));
    h.settle().await;
    assert!(h.api.calls().contains(&"rename_group 30 crew".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_create_group_passes_members() {
    let mut h = Harness::new(None);
    h.load_chats().await;

    h.send(Command::CreateGroup {
        name: "ops".into(),
        member_ids: vec![UserId::new(2), UserId::new(3)],
    });
    h.settle().await;

    assert!(h.api.calls().contains(&"create_group ops 2".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_streams() {
    let mut h = Harness::new(None);
    h.load_chats().await;
    let chat = h.connector.script(Channel::Chat);
    let notif = h.connector.script(Channel::Notifications);
    h.send(Command::ConnectNotifications);
    h.send(select(10));
    h.settle().await;

    assert!(h.dispatcher.shutdown());
    assert!(!h.controller.process_next().await);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(chat.is_closed());
    assert!(notif.is_closed());
    assert!(!h.controller.is_online());
}

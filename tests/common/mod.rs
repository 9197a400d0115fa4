//! Shared fixtures for the integration tests
//!
//! A scripted in-memory `ChatApi`, a notifier that records calls, and a
//! controller harness driven through `MemoryConnector`.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alma_realtime::controller::{ChatSessionController, Command, Dispatcher, UiUpdate};
use alma_realtime::notifications::NotificationSink;
use alma_realtime::transport::MemoryConnector;
use alma_realtime::{
    Chat, ChatApi, ChatError, ChatId, Credential, Message, MessageId, Participant, Result,
    Session, SessionOptions, UserId,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

/// The user every test runs as
pub const ME: i64 = 1;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn session() -> Session {
    Session::new(UserId::new(ME), Credential::new("auth=test"))
}

/// Chat 10 with alice (2), chat 20 with bob (3), group 30 "team"
pub fn sample_chats() -> Vec<Chat> {
    let me = Participant::new(UserId::new(ME), "me");
    let alice = Participant::new(UserId::new(2), "alice");
    let bob = Participant::new(UserId::new(3), "bob");
    vec![
        Chat::direct(ChatId::new(10), vec![me.clone(), alice.clone()]),
        Chat::direct(ChatId::new(20), vec![me.clone(), bob.clone()]),
        Chat::group(ChatId::new(30), "team", vec![me, alice, bob]),
    ]
}

pub fn history(ids: &[i64]) -> Vec<Message> {
    ids.iter()
        .map(|&id| Message::history(MessageId::new(id), UserId::new(2), None, format!("h{id}")))
        .collect()
}

pub fn live_frame(id: i64, sender_id: i64, content: &str) -> String {
    serde_json::json!({
        "type": "message",
        "id": id,
        "sender_id": sender_id,
        "content": content,
    })
    .to_string()
}

// ============================================================================
// Scripted REST collaborator
// ============================================================================

#[derive(Default)]
struct ApiState {
    chats: Vec<Chat>,
    histories: HashMap<ChatId, Vec<Message>>,
    held: HashMap<ChatId, oneshot::Receiver<()>>,
    failing_history: HashSet<ChatId>,
    failing_actions: bool,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<ApiState>>,
}

impl MockApi {
    pub fn with_chats(chats: Vec<Chat>) -> Self {
        let api = Self::default();
        api.state.lock().chats = chats;
        api
    }

    pub fn set_history(&self, chat_id: i64, messages: Vec<Message>) {
        self.state
            .lock()
            .histories
            .insert(ChatId::new(chat_id), messages);
    }

    /// Hold the next history request for `chat_id` until the sender fires
    pub fn hold_history(&self, chat_id: i64) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().held.insert(ChatId::new(chat_id), rx);
        tx
    }

    pub fn fail_history(&self, chat_id: i64) {
        self.state.lock().failing_history.insert(ChatId::new(chat_id));
    }

    pub fn fail_actions(&self) {
        self.state.lock().failing_actions = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn action(&self, call: String) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failing_actions {
            Err(ChatError::api(403, "forbidden"))
        } else {
            Ok(())
        }
    }
}

impl ChatApi for MockApi {
    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let mut state = self.state.lock();
        state.calls.push("list_chats".to_string());
        Ok(state.chats.clone())
    }

    async fn get_history(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        let held = {
            let mut state = self.state.lock();
            state.calls.push(format!("get_history {chat_id}"));
            state.held.remove(&chat_id)
        };
        if let Some(release) = held {
            let _ = release.await;
        }

        let state = self.state.lock();
        if state.failing_history.contains(&chat_id) {
            return Err(ChatError::api(500, "history unavailable"));
        }
        Ok(state.histories.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn delete_message(&self, id: MessageId) -> Result<()> {
        self.action(format!("delete_message {id}"))
    }

    async fn delete_chat(&self, id: ChatId) -> Result<()> {
        let result = self.action(format!("delete_chat {id}"));
        if result.is_ok() {
            self.state.lock().chats.retain(|c| c.id != id);
        }
        result
    }

    async fn create_direct_chat(&self, username: &str) -> Result<()> {
        self.action(format!("create_direct_chat {username}"))
    }

    async fn create_group(&self, name: &str, member_ids: &[UserId]) -> Result<()> {
        self.action(format!("create_group {name} {}", member_ids.len()))
    }

    async fn rename_group(&self, id: ChatId, new_name: &str) -> Result<()> {
        self.action(format!("rename_group {id} {new_name}"))
    }
}

// ============================================================================
// Notification sink
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.shown.lock().push((title.to_string(), body.to_string()));
    }
}

// ============================================================================
// Controller harness
// ============================================================================

pub type TestController = ChatSessionController<MockApi, Arc<MemoryConnector>>;

pub struct Harness {
    pub controller: TestController,
    pub dispatcher: Dispatcher,
    pub updates: mpsc::UnboundedReceiver<UiUpdate>,
    pub api: MockApi,
    pub connector: Arc<MemoryConnector>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(search_debounce: Option<Duration>) -> Self {
        init_logger();

        let options = SessionOptions::builder()
            .search_debounce(search_debounce)
            .build();
        let api = MockApi::with_chats(sample_chats());
        let connector = Arc::new(MemoryConnector::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let (controller, dispatcher, updates) = ChatSessionController::new(
            session(),
            options,
            api.clone(),
            Arc::clone(&connector),
            notifier.clone(),
        );

        Self {
            controller,
            dispatcher,
            updates,
            api,
            connector,
            notifier,
        }
    }

    pub fn send(&self, command: Command) {
        assert!(self.dispatcher.send(command));
    }

    /// Process events until the queue stays empty for a moment
    pub async fn settle(&mut self) {
        while let Ok(true) =
            tokio::time::timeout(Duration::from_millis(20), self.controller.process_next()).await
        {}
    }

    /// Load the sample chat list
    pub async fn load_chats(&mut self) {
        self.send(Command::Refresh);
        self.settle().await;
        self.drain();
    }

    pub fn drain(&mut self) -> Vec<UiUpdate> {
        let mut seen = Vec::new();
        while let Ok(update) = self.updates.try_recv() {
            seen.push(update);
        }
        seen
    }

    pub fn message_ids(&self) -> Vec<i64> {
        self.controller
            .messages()
            .iter()
            .map(|line| line.id.get())
            .collect()
    }
}

pub fn alerts(updates: &[UiUpdate]) -> Vec<String> {
    updates
        .iter()
        .filter_map(|u| match u {
            UiUpdate::Alert(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

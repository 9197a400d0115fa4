//! `ChatSessionController`: the single owner of session state
//!
//! # Architecture
//!
//! ```text
//!  Dispatcher ──┐                                   ┌──▶ UiUpdate receiver
//!  (UI, tasks)  │     ┌──────────────────────────┐  │
//!               ├────▶│  SessionEvent queue      │──┤
//!  streams ─────┤     │  handled one at a time   │  │
//!  (EventSink)  │     └──────────────────────────┘  │
//!  timers ──────┘        owns: MessageLog,          │
//!                        PresenceTracker,           │
//!                        NotificationRouter,        │
//!                        SearchSession, streams ────┘
//! ```
//!
//! State is mutated only while handling a queue entry. Connects, history
//! requests, REST actions and timers run as spawned tasks and report back
//! through the queue. Chat stream events carry the [`PendingSwitch`] token
//! they were opened under and are dropped once a newer selection exists.
//! Superseding a switch also cancels its connect if the handshake is still
//! running, so at most one chat stream is ever open.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use alma_realtime::controller::{ChatSessionController, Command};
//! use alma_realtime::notifications::NullNotifier;
//! use alma_realtime::transport::MemoryConnector;
//! use alma_realtime::{Chat, ChatApi, ChatId, Credential, Message, MessageId, Result, Session, SessionOptions, UserId};
//!
//! struct NoApi;
//!
//! impl ChatApi for NoApi {
//!     async fn list_chats(&self) -> Result<Vec<Chat>> { Ok(Vec::new()) }
//!     async fn get_history(&self, _: ChatId) -> Result<Vec<Message>> { Ok(Vec::new()) }
//!     async fn delete_message(&self, _: MessageId) -> Result<()> { Ok(()) }
//!     async fn delete_chat(&self, _: ChatId) -> Result<()> { Ok(()) }
//!     async fn create_direct_chat(&self, _: &str) -> Result<()> { Ok(()) }
//!     async fn create_group(&self, _: &str, _: &[UserId]) -> Result<()> { Ok(()) }
//!     async fn rename_group(&self, _: ChatId, _: &str) -> Result<()> { Ok(()) }
//! }
//!
//! # async fn example() {
//! let session = Session::new(UserId::new(1), Credential::new("token"));
//! let (controller, dispatcher, _updates) = ChatSessionController::new(
//!     session,
//!     SessionOptions::default(),
//!     NoApi,
//!     MemoryConnector::new(),
//!     Arc::new(NullNotifier),
//! );
//!
//! dispatcher.send(Command::Refresh);
//! dispatcher.shutdown();
//! controller.run().await;
//! # }
//! ```

mod commands;
mod events;
mod handlers;
mod switch;
mod tasks;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::message_log::{DisplayContext, MessageLog};
use crate::monitor::{LatencyProbe, MonitorSample};
use crate::notifications::{Banner, NotificationRouter, NotificationSink};
use crate::presence::PresenceTracker;
use crate::rest::ChatApi;
use crate::search::SearchSession;
use crate::transport::{Connector, StreamConnection};
use crate::types::chat::{Chat, ChatListEntry, ChatMarker, User};
use crate::types::identifiers::ChatId;
use crate::types::message::DisplayLine;
use crate::types::options::SessionOptions;
use crate::types::session::Session;

pub use events::{Command, Dispatcher, SessionEvent, UiUpdate, UserAction};
pub use switch::{PendingSwitch, SwitchTokens};

/// Chat-switch state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No chat selected
    Idle,
    /// A chat was selected and its stream is not settled yet
    SwitchingChat,
    /// The chat stream connected, or failed and is shown offline
    Active,
}

/// Orchestrates the three streams and the state they feed
pub struct ChatSessionController<A: ChatApi, C: Connector> {
    session: Arc<Session>,
    options: Arc<SessionOptions>,
    api: Arc<A>,
    connector: Arc<C>,

    dispatcher: Dispatcher,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    updates: mpsc::UnboundedSender<UiUpdate>,
    cancel: CancellationToken,

    state: ControllerState,
    switches: SwitchTokens,
    chats: Vec<Chat>,
    active: Option<Chat>,
    chat_stream: Option<StreamConnection>,
    online: bool,
    log: MessageLog,
    compose: String,

    presence: PresenceTracker,
    notifications: NotificationRouter,
    notification_stream: Option<StreamConnection>,
    notification_generation: u64,
    notification_connect: CancellationToken,
    notifications_wanted: bool,

    search: SearchSession,
    search_connect: CancellationToken,
    last_sample: Option<MonitorSample>,
}

impl<A: ChatApi, C: Connector> ChatSessionController<A, C> {
    /// Create a controller.
    ///
    /// Returns the controller, the handle for posting commands, and the
    /// receiver of UI updates. Nothing connects until a command asks for it.
    pub fn new(
        session: Session,
        options: SessionOptions,
        api: A,
        connector: C,
        notifier: Arc<dyn NotificationSink>,
    ) -> (Self, Dispatcher, mpsc::UnboundedReceiver<UiUpdate>) {
        let (dispatcher, events) = Dispatcher::channel();
        let (updates, updates_rx) = mpsc::unbounded_channel();

        let notifications = NotificationRouter::new(
            notifier,
            options.app_name.clone(),
            options.banner_duration,
        );
        let search = SearchSession::new(options.search_debounce);
        let cancel = CancellationToken::new();

        let controller = Self {
            session: Arc::new(session),
            options: Arc::new(options),
            api: Arc::new(api),
            connector: Arc::new(connector),
            dispatcher: dispatcher.clone(),
            events,
            updates,
            notification_connect: cancel.child_token(),
            search_connect: cancel.child_token(),
            cancel,
            state: ControllerState::Idle,
            switches: SwitchTokens::default(),
            chats: Vec::new(),
            active: None,
            chat_stream: None,
            online: false,
            log: MessageLog::new(),
            compose: String::new(),
            presence: PresenceTracker::new(),
            notifications,
            notification_stream: None,
            notification_generation: 0,
            notifications_wanted: false,
            search,
            last_sample: None,
        };

        (controller, dispatcher, updates_rx)
    }

    // ========================================================================
    // Projection accessors
    // ========================================================================

    /// Session context
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Options in effect
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Switch state
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Active chat snapshot
    #[must_use]
    pub const fn active_chat(&self) -> Option<&Chat> {
        self.active.as_ref()
    }

    /// Whether the chat stream is open
    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.online
    }

    /// Compose field contents
    #[must_use]
    pub fn compose(&self) -> &str {
        &self.compose
    }

    /// Messages of the active chat, ready for display
    #[must_use]
    pub fn messages(&self) -> Vec<DisplayLine> {
        self.log.view(&DisplayContext {
            me: self.session.user_id(),
            self_label: &self.options.self_label,
            chat: self.active.as_ref(),
        })
    }

    /// Chat list with presence markers
    #[must_use]
    pub fn chat_list(&self) -> Vec<ChatListEntry> {
        let me = self.session.user_id();
        self.chats
            .iter()
            .map(|chat| {
                let marker = if chat.is_group {
                    ChatMarker::Group
                } else if chat
                    .other_user_id(me)
                    .is_some_and(|id| self.presence.is_online(id))
                {
                    ChatMarker::Online
                } else {
                    ChatMarker::Offline
                };
                ChatListEntry {
                    chat_id: chat.id,
                    label: chat.display_name(me),
                    marker,
                }
            })
            .collect()
    }

    /// Raw chat snapshots
    #[must_use]
    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    /// Latest search results
    #[must_use]
    pub fn search_results(&self) -> &[User] {
        self.search.results()
    }

    /// Current banner
    #[must_use]
    pub const fn banner(&self) -> Option<&Banner> {
        self.notifications.banner()
    }

    /// Presence set
    #[must_use]
    pub const fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Latest monitor reading
    #[must_use]
    pub const fn last_sample(&self) -> Option<&MonitorSample> {
        self.last_sample.as_ref()
    }

    /// Handle for posting into the queue
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Process events until shutdown
    pub async fn run(mut self) {
        while self.process_next().await {}
        log::debug!("session controller stopped");
    }

    /// Wait for and handle one event.
    ///
    /// Returns false once the controller has shut down.
    pub async fn process_next(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => self.handle(event),
            None => false,
        }
    }

    /// Handle every event already queued, without waiting.
    ///
    /// Returns false once the controller has shut down.
    pub fn process_pending(&mut self) -> bool {
        while let Ok(event) = self.events.try_recv() {
            if !self.handle(event) {
                return false;
            }
        }
        true
    }

    /// Start the background monitor; samples arrive as `UiUpdate::Monitor`
    pub fn start_monitor<P: LatencyProbe>(&self, probe: P) {
        self.spawn_monitor(probe);
    }

    /// Close every stream and stop timers. Idempotent.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.switches.invalidate();
        if let Some(mut stream) = self.chat_stream.take() {
            stream.close();
        }
        if let Some(mut stream) = self.notification_stream.take() {
            stream.close();
        }
        self.notifications_wanted = false;
        self.search.close();
        self.set_online(false);
    }

    fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Command(command) => self.on_command(command),
            SessionEvent::Stream(event) => self.on_stream_event(event),
            SessionEvent::Connected {
                channel,
                tag,
                result,
            } => self.on_connected(channel, tag, result),
            SessionEvent::HistoryLoaded {
                token,
                chat_id,
                result,
            } => self.on_history(token, chat_id, result),
            SessionEvent::ChatsLoaded(result) => self.on_chats(result),
            SessionEvent::ActionFinished { action, result } => self.on_action(action, result),
            SessionEvent::SearchFlush(seq) => self.on_search_flush(seq),
            SessionEvent::BannerExpired(seq) => {
                if self.notifications.expire(seq) {
                    self.emit(UiUpdate::Banner(None));
                }
            }
            SessionEvent::Monitor(sample) => {
                self.last_sample = Some(sample.clone());
                self.emit(UiUpdate::Monitor(sample));
            }
            SessionEvent::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    fn emit(&self, update: UiUpdate) {
        if self.updates.send(update).is_err() {
            log::trace!("ui update dropped: receiver gone");
        }
    }

    fn alert(&self, text: impl Into<String>) {
        self.emit(UiUpdate::Alert(text.into()));
    }

    fn set_online(&mut self, online: bool) {
        if self.online != online {
            self.online = online;
            self.emit(UiUpdate::ConnectionStatus { online });
        }
    }

    fn active_chat_id(&self) -> Option<ChatId> {
        self.active.as_ref().map(|c| c.id)
    }
}

/// Abandon the handshake armed in `slot`, if any, and arm a fresh token under `parent`
fn rearm(parent: &CancellationToken, slot: &mut CancellationToken) -> CancellationToken {
    slot.cancel();
    *slot = parent.child_token();
    slot.clone()
}

impl<A: ChatApi, C: Connector> Drop for ChatSessionController<A, C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

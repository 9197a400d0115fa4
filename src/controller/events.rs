//! Controller inputs and outputs
//!
//! Everything that touches session state arrives as a [`SessionEvent`] on one
//! ordered queue; everything the UI needs to know leaves as a [`UiUpdate`].

use std::fmt;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::monitor::MonitorSample;
use crate::transport::{ChannelEvent, EventSink, StreamConnection};
use crate::types::channel::Channel;
use crate::types::chat::Chat;
use crate::types::identifiers::{ChatId, MessageId, UserId};
use crate::types::message::Message;

/// User intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch the active chat
    SelectChat(ChatId),
    /// Replace the compose field
    SetCompose(String),
    /// Send the compose field on the chat stream
    SendMessage,
    /// Open the notification stream
    ConnectNotifications,
    /// Open the search stream
    OpenSearch,
    /// Close the search stream and forget results
    CloseSearch,
    /// Query text changed
    SetSearchQuery(String),
    /// Reload the chat list and reconnect whatever is offline
    Refresh,
    /// Delete a message in the active chat
    DeleteMessage(MessageId),
    /// Delete the active chat
    DeleteActiveChat,
    /// Open a direct chat with a user
    CreateDirectChat(String),
    /// Create a group chat
    CreateGroup {
        /// Group name
        name: String,
        /// Members besides the current user
        member_ids: Vec<UserId>,
    },
    /// Rename the active chat if it is a group
    RenameActiveGroup(String),
}

/// A REST user action whose outcome is reported back on the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Message deletion in `chat_id`
    DeleteMessage {
        /// Chat the message belonged to when deletion was requested
        chat_id: ChatId,
        /// Deleted message
        message_id: MessageId,
    },
    /// Chat deletion
    DeleteChat(ChatId),
    /// Direct chat creation
    CreateDirectChat(String),
    /// Group creation
    CreateGroup(String),
    /// Group rename
    RenameGroup(ChatId),
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteMessage { message_id, .. } => write!(f, "delete message {message_id}"),
            Self::DeleteChat(id) => write!(f, "delete chat {id}"),
            Self::CreateDirectChat(username) => write!(f, "create chat with {username}"),
            Self::CreateGroup(name) => write!(f, "create group {name}"),
            Self::RenameGroup(id) => write!(f, "rename group {id}"),
        }
    }
}

/// One entry on the controller's queue
#[derive(Debug)]
pub enum SessionEvent {
    /// User intent
    Command(Command),
    /// Event from one of the streams
    Stream(ChannelEvent),
    /// A stream connect attempt finished
    Connected {
        /// Channel connected
        channel: Channel,
        /// Generation the connect was started under
        tag: u64,
        /// The live connection, or why it failed
        result: Result<StreamConnection>,
    },
    /// History request finished
    HistoryLoaded {
        /// Switch token the request was made under
        token: u64,
        /// Chat requested
        chat_id: ChatId,
        /// History, oldest first
        result: Result<Vec<Message>>,
    },
    /// Chat list request finished
    ChatsLoaded(Result<Vec<Chat>>),
    /// A user action finished
    ActionFinished {
        /// The action
        action: UserAction,
        /// Its outcome
        result: Result<()>,
    },
    /// Debounce window for a search query elapsed
    SearchFlush(u64),
    /// Banner timer fired
    BannerExpired(u64),
    /// Monitor reading
    Monitor(MonitorSample),
    /// Stop processing
    Shutdown,
}

/// Projection change for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// Re-read [`messages`](super::ChatSessionController::messages)
    MessagesChanged,
    /// Re-read [`chat_list`](super::ChatSessionController::chat_list)
    ChatListChanged,
    /// Chat stream status
    ConnectionStatus {
        /// Whether the chat stream is open
        online: bool,
    },
    /// Compose field changed outside the UI's control
    ComposeChanged,
    /// Banner text, `None` once it cleared
    Banner(Option<String>),
    /// One-shot alert
    Alert(String),
    /// One-shot informational message
    Info(String),
    /// Re-read [`search_results`](super::ChatSessionController::search_results)
    SearchResults,
    /// Monitor reading
    Monitor(MonitorSample),
}

/// Cloneable handle that posts into the controller's queue
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Dispatcher {
    pub(super) fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post a user command. Returns false if the controller is gone.
    pub fn send(&self, command: Command) -> bool {
        self.post(SessionEvent::Command(command))
    }

    /// Post any event. Returns false if the controller is gone.
    pub fn post(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Ask the controller to stop
    pub fn shutdown(&self) -> bool {
        self.post(SessionEvent::Shutdown)
    }
}

impl EventSink for Dispatcher {
    fn emit(&self, event: ChannelEvent) -> bool {
        self.post(SessionEvent::Stream(event))
    }
}

//! Stream frame types
//!
//! Frames are JSON objects keyed by `type`. The search stream is the exception:
//! it sends raw query text out and receives a bare JSON array of users.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::{ChatId, MessageId, UserId};
use crate::types::message::Message;

/// Body used when a notification frame carries none
pub const DEFAULT_NOTIFICATION_BODY: &str = "New Notification";

/// Frame received on the chat or notification stream
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Server keepalive; must be answered with a pong echoing `ts`
    Ping {
        /// Server timestamp
        #[serde(default)]
        ts: i64,
    },
    /// Live chat message
    Message(LiveMessageFrame),
    /// Full presence snapshot
    OnlineList {
        /// Ids of every online user
        ids: Vec<UserId>,
    },
    /// Presence delta for one user
    Presence {
        /// User whose presence changed
        user_id: UserId,
        /// New presence
        is_online: bool,
    },
    /// Notification to route
    Notification(NotificationFrame),
    /// Any `type` this client does not know about
    #[serde(other)]
    Unknown,
}

/// Payload of an inbound `message` frame
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveMessageFrame {
    /// Message id
    pub id: MessageId,
    /// Sender id
    pub sender_id: UserId,
    /// Sender name, if the server included it
    #[serde(default)]
    pub sender: Option<String>,
    /// Raw content
    #[serde(default)]
    pub content: String,
}

impl From<LiveMessageFrame> for Message {
    fn from(frame: LiveMessageFrame) -> Self {
        Self::live(frame.id, frame.sender_id, frame.sender, frame.content)
    }
}

/// Payload of an inbound `notification` frame
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationFrame {
    /// Text to show
    #[serde(default = "default_body")]
    pub body: String,
    /// Chat the notification is about, if any
    #[serde(default)]
    pub chat_id: Option<ChatId>,
}

fn default_body() -> String {
    DEFAULT_NOTIFICATION_BODY.to_string()
}

/// Frame sent on the chat or notification stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Keepalive answer
    Pong {
        /// Timestamp copied from the ping
        ts: i64,
    },
    /// Chat message
    Message {
        /// Message text
        content: String,
    },
}

impl OutboundFrame {
    /// Pong answering a ping with timestamp `ts`
    #[must_use]
    pub const fn pong(ts: i64) -> Self {
        Self::Pong { ts }
    }

    /// Chat message frame
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }
}

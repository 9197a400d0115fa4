//! Chat message types

use serde::{Deserialize, Serialize};

use super::identifiers::{MessageId, UserId};

/// Where a message entered the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArrivalSource {
    /// Bulk history fetched from the REST collaborator
    #[default]
    History,
    /// Incremental delivery on the chat stream
    Live,
}

/// A chat message.
///
/// The owning chat is implicit: a message only ever lives in the log of the
/// chat it was loaded or received for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id, unique within its chat
    pub id: MessageId,
    /// Sender user id
    pub sender_id: UserId,
    /// Sender name, when the payload carried one
    #[serde(rename = "sender", default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Raw content as delivered
    #[serde(default)]
    pub content: String,
    /// Arrival source
    #[serde(skip)]
    pub source: ArrivalSource,
}

impl Message {
    /// Create a live message
    pub fn live(
        id: impl Into<MessageId>,
        sender_id: impl Into<UserId>,
        sender_name: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            sender_name,
            content: content.into(),
            source: ArrivalSource::Live,
        }
    }

    /// Create a history message
    pub fn history(
        id: impl Into<MessageId>,
        sender_id: impl Into<UserId>,
        sender_name: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source: ArrivalSource::History,
            ..Self::live(id, sender_id, sender_name, content)
        }
    }

    /// Text to display, with a JSON envelope unwrapped if present
    #[must_use]
    pub fn display_text(&self) -> String {
        normalize_content(&self.content)
    }
}

/// A message rendered for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    /// Message id, for follow-up actions such as delete
    pub id: MessageId,
    /// Resolved sender label
    pub sender: String,
    /// Normalized text
    pub text: String,
    /// Whether the current user sent this message
    pub is_own: bool,
}

impl std::fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.sender, self.text)
    }
}

/// Unwrap a JSON envelope around message text.
///
/// If `raw` is a JSON object with a string `content` field, that field is
/// returned; otherwise a string `text` field; otherwise `raw` unchanged.
/// Plain text never errors.
#[must_use]
pub fn normalize_content(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return raw.to_string();
    }

    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed)
    else {
        return raw.to_string();
    };

    ["content", "text"]
        .iter()
        .find_map(|key| map.get(*key).and_then(serde_json::Value::as_str))
        .map_or_else(|| raw.to_string(), str::to_string)
}

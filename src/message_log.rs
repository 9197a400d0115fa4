//! Message log of the active chat
//!
//! History arrives in bulk over REST while the chat stream may already be
//! delivering live messages for the same chat. While a history load is
//! outstanding, live messages are buffered; once history resolves they are
//! appended after it in arrival order. Ids are unique in the merged view.

use std::collections::HashSet;

use crate::types::chat::Chat;
use crate::types::identifiers::{ChatId, MessageId, UserId};
use crate::types::message::{DisplayLine, Message};

/// What the view needs to resolve sender labels
#[derive(Debug, Clone, Copy)]
pub struct DisplayContext<'a> {
    /// Current user
    pub me: UserId,
    /// Label for the current user's own messages
    pub self_label: &'a str,
    /// Active chat, for participant lookups
    pub chat: Option<&'a Chat>,
}

/// Resolve the sender label of `message`.
///
/// Own messages always get the self label. Otherwise the payload name wins,
/// then the chat's participant list, then `User<id>`.
#[must_use]
pub fn sender_label(message: &Message, ctx: &DisplayContext<'_>) -> String {
    if message.sender_id == ctx.me {
        return ctx.self_label.to_string();
    }

    if let Some(name) = message.sender_name.as_deref()
        && !name.is_empty()
    {
        return name.to_string();
    }

    ctx.chat
        .and_then(|chat| chat.participant(message.sender_id))
        .map_or_else(
            || format!("User{}", message.sender_id),
            |p| p.username.clone(),
        )
}

/// Ordered, duplicate-free message log for one chat at a time
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    chat_id: Option<ChatId>,
    entries: Vec<Message>,
    ids: HashSet<MessageId>,
    /// Live messages held back while history is loading
    pending: Option<Vec<Message>>,
}

impl MessageLog {
    /// Create an empty log bound to no chat
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the log to `chat_id`, clear the view and start buffering live
    /// messages until [`MessageLog::load_history`] is called.
    pub fn arm(&mut self, chat_id: ChatId) {
        self.chat_id = Some(chat_id);
        self.entries.clear();
        self.ids.clear();
        self.pending = Some(Vec::new());
    }

    /// Unbind the log and drop everything, buffered messages included
    pub fn clear(&mut self) {
        self.chat_id = None;
        self.entries.clear();
        self.ids.clear();
        self.pending = None;
    }

    /// Chat the log belongs to
    #[must_use]
    pub const fn chat_id(&self) -> Option<ChatId> {
        self.chat_id
    }

    /// Whether a history load is outstanding
    #[must_use]
    pub const fn is_history_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of buffered live messages
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.pending.as_ref().map_or(0, Vec::len)
    }

    /// Replace the log with `history` (oldest first), then append any
    /// buffered live messages not already present.
    pub fn load_history(&mut self, history: Vec<Message>) {
        self.entries.clear();
        self.ids.clear();

        for message in history {
            self.push_unique(message);
        }

        let buffered = self.pending.take().unwrap_or_default();
        if !buffered.is_empty() {
            log::debug!("flushing {} buffered live messages after history", buffered.len());
        }
        for message in buffered {
            self.push_unique(message);
        }
    }

    /// Add one live message at the tail, or to the buffer while history is
    /// loading.
    ///
    /// Returns false if the id is already known and the message was dropped.
    pub fn append_live(&mut self, message: Message) -> bool {
        if self.ids.contains(&message.id) {
            return false;
        }

        match self.pending.as_mut() {
            Some(buffer) => {
                if buffer.iter().any(|m| m.id == message.id) {
                    return false;
                }
                buffer.push(message);
                true
            }
            None => self.push_unique(message),
        }
    }

    /// Remove a message after the server confirmed its deletion.
    ///
    /// Returns whether the message was present.
    pub fn remove(&mut self, id: MessageId) -> bool {
        if let Some(buffer) = self.pending.as_mut() {
            buffer.retain(|m| m.id != id);
        }
        if !self.ids.remove(&id) {
            return false;
        }
        self.entries.retain(|m| m.id != id);
        true
    }

    /// Messages in display order, buffered messages excluded
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.entries
    }

    /// Display projection
    #[must_use]
    pub fn view(&self, ctx: &DisplayContext<'_>) -> Vec<DisplayLine> {
        self.entries
            .iter()
            .map(|m| DisplayLine {
                id: m.id,
                sender: sender_label(m, ctx),
                text: m.display_text(),
                is_own: m.sender_id == ctx.me,
            })
            .collect()
    }

    /// Number of visible messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no message is visible
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_unique(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id) {
            log::trace!("duplicate message {} dropped", message.id);
            return false;
        }
        self.entries.push(message);
        true
    }
}

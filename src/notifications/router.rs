//! Notification routing and the transient banner

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::protocol::NotificationFrame;
use crate::types::identifiers::ChatId;

use super::sink::NotificationSink;

/// A notification pushed by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text to show
    pub body: String,
    /// Chat it concerns, if any
    pub chat_id: Option<ChatId>,
}

impl From<NotificationFrame> for Notification {
    fn from(frame: NotificationFrame) -> Self {
        Self {
            body: frame.body,
            chat_id: frame.chat_id,
        }
    }
}

/// Routing outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The user is looking at the chat already
    Suppress,
    /// Alert the user
    Surface,
}

/// Banner currently shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// Banner text
    pub text: String,
    /// When it was shown
    pub shown_at: DateTime<Utc>,
    /// Arming sequence; only an expiry carrying this value clears the banner
    pub seq: u64,
}

/// Decide whether a notification reaches the user
#[must_use]
pub fn route(event: &Notification, active_chat: Option<ChatId>) -> Decision {
    match (active_chat, event.chat_id) {
        (Some(active), Some(chat)) if active == chat => Decision::Suppress,
        _ => Decision::Surface,
    }
}

/// Routes notifications and owns the self-clearing banner.
///
/// A new notification replaces the banner text and restarts its timer; there
/// is no queue.
pub struct NotificationRouter {
    sink: Arc<dyn NotificationSink>,
    title: String,
    duration: Duration,
    banner: Option<Banner>,
    next_seq: u64,
}

impl NotificationRouter {
    /// Create a router
    ///
    /// # Arguments
    /// * `sink` - Desktop notification side effect
    /// * `title` - Title passed to the sink
    /// * `duration` - Banner visibility
    pub fn new(sink: Arc<dyn NotificationSink>, title: impl Into<String>, duration: Duration) -> Self {
        Self {
            sink,
            title: title.into(),
            duration,
            banner: None,
            next_seq: 0,
        }
    }

    /// Banner visibility
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Current banner, if any
    #[must_use]
    pub const fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Route a notification and, when it surfaces, fire the desktop
    /// notification once and show the banner.
    ///
    /// Returns the banner's arming sequence when surfaced; the caller is
    /// expected to call [`NotificationRouter::expire`] with it after
    /// [`NotificationRouter::duration`].
    pub fn deliver(&mut self, event: &Notification, active_chat: Option<ChatId>) -> Option<u64> {
        match route(event, active_chat) {
            Decision::Suppress => {
                log::debug!("notification for active chat suppressed");
                None
            }
            Decision::Surface => {
                self.sink.notify(&self.title, &event.body);
                Some(self.show(event.body.clone()))
            }
        }
    }

    /// Show `text` in the banner, replacing whatever is there
    pub fn show(&mut self, text: String) -> u64 {
        self.next_seq += 1;
        self.banner = Some(Banner {
            text,
            shown_at: Utc::now(),
            seq: self.next_seq,
        });
        self.next_seq
    }

    /// Clear the banner if it is still the one armed with `seq`.
    ///
    /// Returns whether anything was cleared.
    pub fn expire(&mut self, seq: u64) -> bool {
        if self.banner.as_ref().is_some_and(|b| b.seq == seq) {
            self.banner = None;
            true
        } else {
            false
        }
    }
}

//! Logical stream channels

use std::fmt;

/// One of the three long-lived streams a session keeps open.
///
/// At most one `StreamConnection` exists per channel at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Messages of the active chat, scoped by chat id
    Chat,
    /// Presence and notification events, global per session
    Notifications,
    /// Live user search, global per session
    Search,
}

impl Channel {
    /// Channel name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Notifications => "notifications",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

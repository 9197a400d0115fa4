//! Type definitions for the session layer
//!
//! - [`identifiers`] - Type-safe ID wrappers (`UserId`, `ChatId`, `MessageId`, `ConnectionId`)
//! - [`channel`] - The three logical stream channels
//! - [`chat`] - Chat, participant and user snapshots
//! - [`message`] - Messages and display lines
//! - [`session`] - Authenticated session context
//! - [`options`] - Configuration options

pub mod channel;
pub mod chat;
pub mod identifiers;
pub mod message;
pub mod options;
pub mod session;

// Re-export commonly used types
pub use channel::Channel;
pub use chat::{Chat, ChatListEntry, ChatMarker, Participant, User};
pub use identifiers::{ChatId, ConnectionId, MessageId, UserId};
pub use message::{ArrivalSource, DisplayLine, Message, normalize_content};
pub use options::{SessionOptions, SessionOptionsBuilder};
pub use session::{Credential, Session};

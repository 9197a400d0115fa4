//! # AlmaChat realtime session layer
//!
//! Owns the three long-lived message streams of a chat client and keeps the
//! client-visible state consistent with what the server pushes:
//!
//! - **chat**: live messages for the chat being viewed, one stream per selection
//! - **notifications**: presence snapshots and deltas, plus notifications
//! - **search**: live user search, raw query text out and result sets in
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use alma_realtime::controller::{ChatSessionController, Command, UiUpdate};
//! use alma_realtime::notifications::DesktopNotifier;
//! use alma_realtime::rest::HttpChatApi;
//! use alma_realtime::transport::WebSocketConnector;
//! use alma_realtime::{ChatId, Credential, Session, SessionOptions, UserId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = SessionOptions::builder()
//!     .base_url("https://chat.example.org")?
//!     .build();
//! let session = Session::new(UserId::new(42), Credential::new("auth=..."));
//!
//! let api = HttpChatApi::new(&options, &session);
//! let connector = WebSocketConnector::new(options.credential_header.clone());
//! let (controller, dispatcher, mut updates) = ChatSessionController::new(
//!     session,
//!     options,
//!     api,
//!     connector,
//!     Arc::new(DesktopNotifier::detect()),
//! );
//! tokio::spawn(controller.run());
//!
//! dispatcher.send(Command::ConnectNotifications);
//! dispatcher.send(Command::Refresh);
//! dispatcher.send(Command::SelectChat(ChatId::new(7)));
//!
//! while let Some(update) = updates.recv().await {
//!     if let UiUpdate::Alert(text) = update {
//!         log::warn!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`types`]: ids, chats, messages, session context and options
//! - [`protocol`]: frame schema and parsing
//! - [`transport`]: transports and [`StreamConnection`] with keepalive
//! - [`presence`]: [`PresenceTracker`]
//! - [`notifications`]: [`NotificationRouter`] and desktop notification sinks
//! - [`message_log`]: [`MessageLog`], the merged history and live view
//! - [`search`]: [`SearchSession`]
//! - [`controller`]: [`ChatSessionController`], which composes all of the above
//! - [`rest`]: the [`ChatApi`] collaborator
//! - [`monitor`]: uptime and latency sampling
//! - [`error`]: error types
//!
//! ## Feature Flags
//!
//! - `http` - `HttpChatApi`, `HttpProbe` and the `alma-session` binary (requires `reqwest`)
//!
//! ## Error Handling
//!
//! Nothing in this crate terminates the process. Transport failures become an
//! offline status, malformed frames are discarded, stale events are dropped,
//! and failed user actions surface as one [`controller::UiUpdate::Alert`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod error;
pub mod message_log;
pub mod monitor;
pub mod notifications;
pub mod presence;
pub mod protocol;
pub mod rest;
pub mod search;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use controller::{ChatSessionController, Command, ControllerState, Dispatcher, UiUpdate};
pub use error::{ChatError, Result};
pub use message_log::MessageLog;
pub use notifications::NotificationRouter;
pub use presence::PresenceTracker;
pub use rest::ChatApi;
pub use search::SearchSession;
pub use transport::{StreamConnection, Transport};

// Re-export type submodules for flat public API
pub use types::channel::Channel;
pub use types::chat::{Chat, ChatListEntry, ChatMarker, Participant, User};
pub use types::identifiers::{ChatId, ConnectionId, MessageId, UserId};
pub use types::message::{ArrivalSource, DisplayLine, Message};
pub use types::options::{SessionOptions, SessionOptionsBuilder};
pub use types::session::{Credential, Session};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

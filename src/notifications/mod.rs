//! Notification routing
//!
//! Decides whether a server notification becomes a user-visible alert and
//! keeps the banner that shows it.
//!
//! # Example
//!
//! ```rust
//! use alma_realtime::ChatId;
//! use alma_realtime::notifications::{Decision, Notification, route};
//!
//! let event = Notification { body: "hi".into(), chat_id: Some(ChatId::new(5)) };
//! assert_eq!(route(&event, Some(ChatId::new(5))), Decision::Suppress);
//! assert_eq!(route(&event, Some(ChatId::new(7))), Decision::Surface);
//! assert_eq!(route(&event, None), Decision::Surface);
//! ```

mod router;
mod sink;

pub use router::{Banner, Decision, Notification, NotificationRouter, route};
pub use sink::{DesktopNotifier, NotificationSink, NullNotifier};

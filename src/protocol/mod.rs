//! Wire protocol shared by the three streams
//!
//! | type           | direction | fields                               |
//! |----------------|-----------|--------------------------------------|
//! | `ping`         | in        | `ts`                                 |
//! | `pong`         | out       | `ts`                                 |
//! | `message`      | in        | `id`, `sender_id`, `sender?`, `content` |
//! | `message`      | out       | `content`                            |
//! | `online_list`  | in        | `ids`                                |
//! | `presence`     | in        | `user_id`, `is_online`               |
//! | `notification` | in        | `body`, `chat_id?`                   |
//!
//! # Example
//!
//! ```rust
//! use alma_realtime::protocol::{InboundFrame, parse_frame};
//!
//! let frame = parse_frame(r#"{"type":"presence","user_id":2,"is_online":false}"#).unwrap();
//! assert!(matches!(frame, InboundFrame::Presence { is_online: false, .. }));
//! ```

mod frames;
mod parser;

pub use frames::{
    DEFAULT_NOTIFICATION_BODY, InboundFrame, LiveMessageFrame, NotificationFrame, OutboundFrame,
};
pub use parser::{encode_frame, parse_frame, parse_search_results, ping_timestamp};

//! Configuration constants for websocket transport

use std::time::Duration;

/// Upper bound on the opening handshake
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum size of one inbound frame (1MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

//! Websocket transport implementation using tokio-tungstenite
//!
//! This module provides a transport implementation that opens a websocket to
//! the chat server and exchanges text frames with it.

mod config;
mod lifecycle;
mod reader;
mod transport;

// Re-export public types
pub use config::{CONNECT_TIMEOUT, DEFAULT_MAX_FRAME_SIZE};
pub use transport::WebSocketTransport;

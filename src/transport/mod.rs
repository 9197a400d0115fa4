//! Transport layer for the message streams
//!
//! This module provides the transport abstraction, the connection wrapper
//! that adds keepalive and cancellation on top of it, and two transport
//! implementations: websockets for real servers and an in-process pair for
//! tests and demos.

mod connection;
mod connector;
pub mod memory;
pub mod websocket;

use tokio::sync::mpsc;

use crate::error::Result;

/// Transport trait for one persistent, message-framed connection
///
/// This trait defines the interface for sending and receiving text frames.
/// It knows nothing about frame contents; keepalive and application
/// semantics live above it.
pub trait Transport: Send {
    /// Connect to the peer
    ///
    /// # Errors
    /// Returns error if connection fails
    fn connect(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Write one frame
    ///
    /// # Arguments
    /// * `data` - Frame text (JSON, or raw query text on the search stream)
    ///
    /// # Errors
    /// Returns error if write fails or transport is not ready
    fn write(&mut self, data: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Read frames from the transport
    ///
    /// Returns a receiver that yields one item per inbound frame, in wire order.
    /// The receiver is closed when the peer closes the connection; an `Err`
    /// item is the last item before closure.
    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<String>>;

    /// Check if transport is ready for communication
    fn is_ready(&self) -> bool;

    /// Close the transport and clean up resources
    ///
    /// # Errors
    /// Returns error if cleanup fails
    fn close(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub use connection::{
    ChannelEvent, ConnectionState, EventSink, StreamConnection, StreamEvent,
};
pub use connector::{Connector, WebSocketConnector};
pub use memory::{ConnectGate, MemoryConnector, MemoryPeer, MemoryTransport};
pub use websocket::WebSocketTransport;

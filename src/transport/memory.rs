//! In-process transport
//!
//! A `MemoryTransport` is one end of a channel pair; the matching
//! `MemoryPeer` plays the server. Used to drive the session layer without a
//! network, in tests and in demos.
//!
//! # Example
//!
//! ```rust
//! use alma_realtime::transport::{MemoryTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut transport, mut peer) = MemoryTransport::pair();
//! transport.connect().await?;
//! let mut inbound = transport.read_messages();
//!
//! peer.push(r#"{"type":"ping","ts":1}"#);
//! assert!(inbound.recv().await.is_some());
//!
//! transport.write("hello").await?;
//! assert_eq!(peer.next_outbound().await.as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::error::{ChatError, Result};
use crate::types::channel::Channel;
use crate::types::session::Session;

use super::Transport;
use super::connector::Connector;

/// Client end of an in-process connection
pub struct MemoryTransport {
    inbound: Option<mpsc::UnboundedReceiver<Result<String>>>,
    outbound: mpsc::UnboundedSender<String>,
    refusal: Option<String>,
    gate: Option<oneshot::Receiver<()>>,
    ready: bool,
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// Server end of an in-process connection
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<Result<String>>>,
    outbound: mpsc::UnboundedReceiver<String>,
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// Holds a gated transport's `connect` until opened or dropped
pub struct ConnectGate(oneshot::Sender<()>);

impl ConnectGate {
    /// Let the pending `connect` finish
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

impl MemoryTransport {
    /// Create a connected pair
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(AtomicBool::new(false));

        let transport = Self {
            inbound: Some(in_rx),
            outbound: out_tx,
            refusal: None,
            gate: None,
            ready: false,
            connected: connected.clone(),
            closed: closed.clone(),
        };
        let peer = MemoryPeer {
            inbound: Some(in_tx),
            outbound: out_rx,
            connected,
            closed,
        };
        (transport, peer)
    }

    /// Create a pair whose `connect` waits for the returned gate
    #[must_use]
    pub fn gated_pair() -> (Self, MemoryPeer, ConnectGate) {
        let (mut transport, peer) = Self::pair();
        let (tx, rx) = oneshot::channel();
        transport.gate = Some(rx);
        (transport, peer, ConnectGate(tx))
    }

    /// Create a transport whose `connect` always fails with `reason`
    pub fn refusing(reason: impl Into<String>) -> Self {
        let (mut transport, _peer) = Self::pair();
        transport.refusal = Some(reason.into());
        transport
    }
}

impl Transport for MemoryTransport {
    async fn connect(&mut self) -> Result<()> {
        if let Some(gate) = self.gate.take() {
            // A dropped gate releases the connect as well
            let _ = gate.await;
        }
        if let Some(reason) = &self.refusal {
            return Err(ChatError::connection(reason.clone()));
        }
        self.ready = true;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.is_ready() {
            return Err(ChatError::transport("Transport is not ready for writing"));
        }
        self.outbound
            .send(data.to_string())
            .map_err(|_| ChatError::transport("peer has gone away"))
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<String>> {
        self.inbound.take().unwrap_or_else(|| {
            // Second call: hand out a receiver that is already closed
            let (_tx, rx) = mpsc::unbounded_channel();
            rx
        })
    }

    fn is_ready(&self) -> bool {
        self.ready && !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.ready = false;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MemoryPeer {
    /// Deliver one inbound frame. Returns false once hung up or the client
    /// stopped reading.
    pub fn push(&self, frame: impl Into<String>) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(frame.into())).is_ok())
    }

    /// Deliver one JSON frame
    pub fn push_json(&self, frame: &serde_json::Value) -> bool {
        self.push(frame.to_string())
    }

    /// Deliver a receive error; the client treats it as terminal
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(Err(ChatError::transport(reason))).is_ok())
    }

    /// Close the connection from the server side
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Next frame the client wrote, waiting for it
    pub async fn next_outbound(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Next frame the client wrote, if one is already queued
    pub fn try_outbound(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    /// Whether the client completed `connect`
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether the client closed the transport
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Scripted connector
// ============================================================================

/// Connector handing out pre-scripted memory transports per channel.
///
/// Each `transport` call pops the oldest scripted transport for the channel;
/// if none is left the returned transport refuses to connect.
#[derive(Default)]
pub struct MemoryConnector {
    scripted: Mutex<HashMap<Channel, VecDeque<MemoryTransport>>>,
    requested: Mutex<Vec<(Channel, Url)>>,
}

impl MemoryConnector {
    /// Create an empty connector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next connection on `channel`; returns its server end
    pub fn script(&self, channel: Channel) -> MemoryPeer {
        let (transport, peer) = MemoryTransport::pair();
        self.push(channel, transport);
        peer
    }

    /// Script the next connection on `channel` with a held handshake
    pub fn script_gated(&self, channel: Channel) -> (MemoryPeer, ConnectGate) {
        let (transport, peer, gate) = MemoryTransport::gated_pair();
        self.push(channel, transport);
        (peer, gate)
    }

    /// Script the next connection on `channel` to fail
    pub fn script_refusal(&self, channel: Channel, reason: impl Into<String>) {
        self.push(channel, MemoryTransport::refusing(reason));
    }

    /// Every endpoint requested so far, oldest first
    #[must_use]
    pub fn requested(&self) -> Vec<(Channel, Url)> {
        self.requested.lock().clone()
    }

    fn push(&self, channel: Channel, transport: MemoryTransport) {
        self.scripted
            .lock()
            .entry(channel)
            .or_default()
            .push_back(transport);
    }
}

impl Connector for MemoryConnector {
    type Transport = MemoryTransport;

    fn transport(&self, channel: Channel, endpoint: &Url, _session: &Session) -> MemoryTransport {
        self.requested.lock().push((channel, endpoint.clone()));
        self.scripted
            .lock()
            .get_mut(&channel)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                MemoryTransport::refusing(format!("no scripted transport for {channel}"))
            })
    }
}

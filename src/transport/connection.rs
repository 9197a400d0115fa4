//! `StreamConnection`: one live stream with keepalive and cancellation
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                   StreamConnection                     │
//! │                                                        │
//! │  ┌──────────────────┐        ┌──────────────────┐      │
//! │  │   Receive Task   │ pong   │   Writer Task    │      │
//! │  │                  │───────→│                  │      │
//! │  │ • answers ping   │  FIFO  │ • owns transport │      │
//! │  │ • emits Frame    │        │ • closes it on   │      │
//! │  └────────┬─────────┘        │   cancellation   │      │
//! │           │                  └────────▲─────────┘      │
//! │           │                           │ send()         │
//! │           ▼                           │                │
//! │      EventSink (single consumer)   caller              │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! The pong for a ping is enqueued on the same FIFO the caller's frames go
//! through, before the next inbound frame is read, so it is never reordered
//! behind anything queued after the ping arrived.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{ChatError, Result};
use crate::protocol::{OutboundFrame, encode_frame, ping_timestamp};
use crate::types::channel::Channel;
use crate::types::identifiers::ConnectionId;

use super::Transport;

/// Lifecycle state of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, or closed cleanly
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Frames can flow
    Open,
    /// Close requested locally, transport shutting down
    Closing,
    /// Connect, send or receive failed
    Failed,
}

/// Event emitted by a connection to its consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Connection established
    Opened,
    /// One inbound frame, pings excluded
    Frame(String),
    /// Peer closed the connection
    Closed(String),
    /// Transport failure; no further events follow
    Error(String),
}

/// A stream event tagged with the channel and generation it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    /// Channel the connection serves
    pub channel: Channel,
    /// Generation the caller opened the connection under
    pub tag: u64,
    /// The event
    pub event: StreamEvent,
}

/// The single registered consumer of a connection's events
///
/// `emit` runs while the connection holds its state lock, so it must not
/// block or call back into the connection.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver one event. Returns false if the consumer is gone.
    fn emit(&self, event: ChannelEvent) -> bool;
}

impl EventSink for mpsc::UnboundedSender<ChannelEvent> {
    fn emit(&self, event: ChannelEvent) -> bool {
        self.send(event).is_ok()
    }
}

/// Shared state cell; written by the connection and its tasks only
#[derive(Debug, Clone)]
struct StateCell(Arc<Mutex<ConnectionState>>);

impl StateCell {
    fn new(state: ConnectionState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    fn get(&self) -> ConnectionState {
        *self.0.lock()
    }

    fn set(&self, state: ConnectionState) {
        *self.0.lock() = state;
    }

    /// Run `f` on the state only if `cancel` has not fired. `close` cancels
    /// under the same lock, so nothing `f` does can happen after `close`
    /// returns. `f` must not touch the cell again.
    fn unless_cancelled(
        &self,
        cancel: &CancellationToken,
        f: impl FnOnce(&mut ConnectionState),
    ) -> bool {
        let mut guard = self.0.lock();
        if cancel.is_cancelled() {
            return false;
        }
        f(&mut guard);
        true
    }

    /// Request a local close: mark `Closing` and cancel, under the lock.
    /// Returns false if the connection had already ended.
    fn begin_close(&self, cancel: &CancellationToken) -> bool {
        let mut guard = self.0.lock();
        match *guard {
            ConnectionState::Disconnected | ConnectionState::Failed | ConnectionState::Closing => {
                false
            }
            ConnectionState::Connecting | ConnectionState::Open => {
                *guard = ConnectionState::Closing;
                cancel.cancel();
                true
            }
        }
    }

    /// Local teardown finished: anything not already failed ends up disconnected
    fn settle(&self) {
        let mut guard = self.0.lock();
        if *guard != ConnectionState::Failed {
            *guard = ConnectionState::Disconnected;
        }
    }
}

/// What both background tasks need to report back
#[derive(Clone)]
struct Link<S> {
    id: ConnectionId,
    channel: Channel,
    tag: u64,
    state: StateCell,
    cancel: CancellationToken,
    sink: S,
}

impl<S: EventSink> Link<S> {
    /// Deliver `event` unless the connection was closed. Returns false if
    /// it was suppressed.
    fn emit(&self, event: StreamEvent) -> bool {
        self.transition(None, event)
    }

    /// Move to `next`, if given, and deliver `event`, atomically with
    /// respect to `close`
    fn transition(&self, next: Option<ConnectionState>, event: StreamEvent) -> bool {
        self.state.unless_cancelled(&self.cancel, |state| {
            if let Some(next) = next {
                *state = next;
            }
            if !self.sink.emit(ChannelEvent {
                channel: self.channel,
                tag: self.tag,
                event,
            }) {
                log::trace!("{} stream {}: consumer gone", self.channel, self.id);
            }
        })
    }

    /// Terminal failure: mark failed, report once, stop the other task
    fn fail(&self, cause: &ChatError) {
        let event = StreamEvent::Error(cause.to_string());
        if self.transition(Some(ConnectionState::Failed), event) {
            log::warn!("{} stream {} failed: {cause}", self.channel, self.id);
            self.cancel.cancel();
        }
    }
}

/// One open stream on one channel.
///
/// Dropping the connection has the same effect as [`StreamConnection::close`].
pub struct StreamConnection {
    id: ConnectionId,
    channel: Channel,
    tag: u64,
    state: StateCell,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for StreamConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnection")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("tag", &self.tag)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl StreamConnection {
    /// Connect `transport` and start its receive and writer tasks.
    ///
    /// On failure the sink receives one `Error` event and the error is also
    /// returned; nothing is spawned.
    ///
    /// # Arguments
    /// * `channel` - Channel this connection serves
    /// * `tag` - Generation tag copied onto every emitted event
    /// * `transport` - Unconnected transport; the connection takes ownership
    /// * `sink` - Consumer of the connection's events
    ///
    /// # Errors
    /// Returns error if the transport fails to connect
    pub async fn connect<T, S>(channel: Channel, tag: u64, mut transport: T, sink: S) -> Result<Self>
    where
        T: Transport + 'static,
        S: EventSink + Clone,
    {
        let id = ConnectionId::new();
        let state = StateCell::new(ConnectionState::Connecting);
        let cancel = CancellationToken::new();
        let link = Link {
            id,
            channel,
            tag,
            state: state.clone(),
            cancel: cancel.clone(),
            sink,
        };

        log::debug!("{channel} stream {id}: connecting (tag {tag})");
        if let Err(e) = transport.connect().await {
            link.fail(&e);
            return Err(e);
        }

        let inbound = transport.read_messages();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        state.set(ConnectionState::Open);
        link.emit(StreamEvent::Opened);
        log::info!("{channel} stream {id}: open");

        tokio::spawn(receive_task(link.clone(), inbound, outbound_tx.clone()));
        tokio::spawn(writer_task(link, transport, outbound_rx));

        Ok(Self {
            id,
            channel,
            tag,
            state,
            outbound: outbound_tx,
            cancel,
        })
    }

    /// Connection id
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Channel this connection serves
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Generation tag
    #[must_use]
    pub const fn tag(&self) -> u64 {
        self.tag
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Whether frames can be sent
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Queue a protocol frame
    ///
    /// # Errors
    /// Returns `ChatError::Offline` if the connection is not open
    pub fn send(&self, frame: &OutboundFrame) -> Result<()> {
        self.send_text(encode_frame(frame)?)
    }

    /// Queue raw frame text
    ///
    /// # Errors
    /// Returns `ChatError::Offline` if the connection is not open
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        if !self.is_open() {
            return Err(ChatError::Offline);
        }
        self.outbound
            .send(text.into())
            .map_err(|_| ChatError::transport("writer task has stopped"))
    }

    /// Close the connection. Idempotent: closing a closed or failed
    /// connection does nothing. No events are emitted after this returns.
    pub fn close(&mut self) {
        if self.state.begin_close(&self.cancel) {
            log::debug!("{} stream {}: closing", self.channel, self.id);
        }
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Receive task: answers pings, forwards every other frame in wire order
async fn receive_task<S: EventSink>(
    link: Link<S>,
    mut inbound: mpsc::UnboundedReceiver<Result<String>>,
    outbound: mpsc::UnboundedSender<String>,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = link.cancel.cancelled() => return,
            next = inbound.recv() => next,
        };

        match next {
            Some(Ok(text)) => {
                if let Some(ts) = ping_timestamp(&text) {
                    log::trace!("{} stream {}: ping {ts}", link.channel, link.id);
                    match encode_frame(&OutboundFrame::pong(ts)) {
                        Ok(pong) => {
                            if outbound.send(pong).is_err() {
                                return;
                            }
                        }
                        Err(e) => log::error!("failed to encode pong: {e}"),
                    }
                    continue;
                }

                if !link.emit(StreamEvent::Frame(text)) {
                    return;
                }
            }
            Some(Err(e)) => {
                link.fail(&e);
                return;
            }
            None => {
                let closed = StreamEvent::Closed("connection closed by peer".to_string());
                if link.transition(Some(ConnectionState::Disconnected), closed) {
                    log::info!("{} stream {}: closed by peer", link.channel, link.id);
                    link.cancel.cancel();
                }
                return;
            }
        }
    }
}

/// Writer task: owns the transport, drains the outbound FIFO, closes on cancel
async fn writer_task<T: Transport, S: EventSink>(
    link: Link<S>,
    mut transport: T,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    loop {
        let frame = tokio::select! {
            biased;
            () = link.cancel.cancelled() => break,
            frame = outbound.recv() => frame,
        };

        let Some(frame) = frame else {
            break;
        };

        if let Err(e) = transport.write(&frame).await {
            link.fail(&e);
            break;
        }
    }

    if let Err(e) = transport.close().await {
        log::debug!("{} stream {}: close error: {e}", link.channel, link.id);
    }
    link.state.settle();
}

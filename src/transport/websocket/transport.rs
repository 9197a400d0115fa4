//! Websocket transport

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::SinkExt;
use futures::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{ChatError, Result};
use crate::transport::Transport;
use crate::types::session::Credential;

use super::config::DEFAULT_MAX_FRAME_SIZE;

pub(super) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket transport for one stream endpoint
pub struct WebSocketTransport {
    pub(super) endpoint: Url,
    pub(super) credential_header: String,
    pub(super) credential: Credential,
    pub(super) sink: Option<SplitSink<WsStream, WsMessage>>,
    pub(super) stream: Option<SplitStream<WsStream>>,
    pub(super) ready: Arc<AtomicBool>,
    pub(super) max_frame_size: usize,
    pub(super) reader_task: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    /// Create a new websocket transport
    ///
    /// # Arguments
    /// * `endpoint` - `ws://` or `wss://` URL, including any query parameters
    /// * `credential_header` - Header name the credential is sent under
    /// * `credential` - Credential value; empty credentials are not sent
    pub fn new(endpoint: Url, credential_header: impl Into<String>, credential: Credential) -> Self {
        Self {
            endpoint,
            credential_header: credential_header.into(),
            credential,
            sink: None,
            stream: None,
            ready: Arc::new(AtomicBool::new(false)),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            reader_task: None,
        }
    }

    /// Override the inbound frame size limit
    #[must_use]
    pub const fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }

    /// Endpoint this transport connects to
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for WebSocketTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connect_impl().await
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.is_ready() {
            return Err(ChatError::transport("Transport is not ready for writing"));
        }

        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| ChatError::transport("websocket sink not available"))?;

        sink.send(WsMessage::text(data.to_owned()))
            .await
            .map_err(|e| ChatError::transport(format!("Failed to write frame: {e}")))
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<String>> {
        self.read_messages_impl()
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.close_impl().await
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.drop_impl();
    }
}

//! Lifecycle management for websocket transport (connect, close)

use std::sync::atomic::Ordering;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};

use crate::error::{ChatError, Result};

use super::config::CONNECT_TIMEOUT;
use super::transport::WebSocketTransport;

impl WebSocketTransport {
    /// Open the websocket, sending the credential as a request header
    ///
    /// # Errors
    /// Returns error if the request cannot be built, the handshake fails, or
    /// it does not finish within `CONNECT_TIMEOUT`
    pub(super) async fn connect_impl(&mut self) -> Result<()> {
        if self.sink.is_some() {
            return Ok(());
        }

        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| ChatError::connection(format!("Invalid stream request: {e}")))?;

        if !self.credential.is_empty() {
            let name = HeaderName::from_bytes(self.credential_header.as_bytes()).map_err(|e| {
                ChatError::invalid_config(format!(
                    "Invalid credential header {}: {e}",
                    self.credential_header
                ))
            })?;
            let value = HeaderValue::from_str(self.credential.expose())
                .map_err(|_| ChatError::invalid_config("Credential is not a valid header value"))?;
            request.headers_mut().insert(name, value);
        }

        let (ws, _response) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(request))
            .await
            .map_err(|_| {
                ChatError::connection(format!("Timed out connecting to {}", self.endpoint.path()))
            })?
            .map_err(|e| {
                ChatError::connection(format!("Failed to open {}: {e}", self.endpoint.path()))
            })?;

        let (sink, stream) = ws.split();
        self.sink = Some(sink);
        self.stream = Some(stream);
        self.ready.store(true, Ordering::SeqCst);

        Ok(())
    }

    /// Send a close frame and release the socket
    ///
    /// # Errors
    /// Returns error if the close handshake cannot be written
    pub(super) async fn close_impl(&mut self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);

        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        self.stream = None;

        if let Some(mut sink) = self.sink.take() {
            // Peer may already be gone; a failed close frame is not an error
            let _ = sink.send(WsMessage::Close(None)).await;
            sink.close()
                .await
                .map_err(|e| ChatError::transport(format!("Failed to close websocket: {e}")))?;
        }

        Ok(())
    }

    /// Handle Drop cleanup
    pub(super) fn drop_impl(&mut self) {
        self.ready.store(false, Ordering::SeqCst);
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

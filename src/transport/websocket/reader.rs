//! Frame reading logic for websocket transport

use std::sync::atomic::Ordering;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::{ChatError, Result};

use super::transport::WebSocketTransport;

impl WebSocketTransport {
    /// Read frames from the websocket
    ///
    /// This method spawns a background task that turns websocket messages into
    /// text frames. Control frames are answered by tungstenite itself and are
    /// not forwarded.
    ///
    /// # Returns
    /// A receiver that yields frame text or a terminal error
    pub(super) fn read_messages_impl(&mut self) -> mpsc::UnboundedReceiver<Result<String>> {
        let (tx, rx) = mpsc::unbounded_channel();

        let stream = self.stream.take();
        let ready = self.ready.clone();
        let max_frame_size = self.max_frame_size;
        let path = self.endpoint.path().to_string();

        let task = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                let _ = tx.send(Err(ChatError::connection(
                    "Not connected - websocket stream not available",
                )));
                return;
            };

            while let Some(item) = stream.next().await {
                let text = match item {
                    Ok(WsMessage::Text(text)) => text.as_str().to_owned(),
                    Ok(WsMessage::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
                    Ok(WsMessage::Close(frame)) => {
                        log::debug!("{path}: close frame received: {frame:?}");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = tx.send(Err(ChatError::transport(format!(
                            "Failed to read frame: {e}"
                        ))));
                        break;
                    }
                };

                if text.len() > max_frame_size {
                    log::warn!(
                        "{path}: dropping {} byte frame, limit is {max_frame_size}",
                        text.len()
                    );
                    continue;
                }

                if tx.send(Ok(text)).is_err() {
                    // Receiver dropped, stop reading
                    break;
                }
            }

            ready.store(false, Ordering::SeqCst);
        });

        // Store task handle for cleanup
        self.reader_task = Some(task);

        rx
    }
}

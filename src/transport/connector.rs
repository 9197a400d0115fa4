//! Transport factories
//!
//! The controller never constructs transports itself; it asks a `Connector`
//! for a fresh one each time a stream is (re)opened.

use std::sync::Arc;

use url::Url;

use crate::types::channel::Channel;
use crate::types::session::Session;

use super::Transport;
use super::websocket::WebSocketTransport;

/// Builds an unconnected transport for a channel
pub trait Connector: Send + Sync + 'static {
    /// Transport type produced
    type Transport: Transport + 'static;

    /// Build a transport for `channel` at `endpoint`, carrying the session credential
    fn transport(&self, channel: Channel, endpoint: &Url, session: &Session) -> Self::Transport;
}

impl<C: Connector> Connector for Arc<C> {
    type Transport = C::Transport;

    fn transport(&self, channel: Channel, endpoint: &Url, session: &Session) -> Self::Transport {
        C::transport(self, channel, endpoint, session)
    }
}

/// Connector for real servers
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    credential_header: String,
}

impl WebSocketConnector {
    /// Create a connector sending the credential under `credential_header`
    pub fn new(credential_header: impl Into<String>) -> Self {
        Self {
            credential_header: credential_header.into(),
        }
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new("Cookie")
    }
}

impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    fn transport(&self, channel: Channel, endpoint: &Url, session: &Session) -> WebSocketTransport {
        log::debug!("{channel}: new websocket transport for {}", endpoint.path());
        WebSocketTransport::new(
            endpoint.clone(),
            self.credential_header.clone(),
            session.credential().clone(),
        )
    }
}

//! Error types for the realtime session layer

use thiserror::Error;

use crate::types::identifiers::ChatId;

/// Main error type for the realtime session layer
#[derive(Error, Debug)]
pub enum ChatError {
    /// Stream could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Send or receive failed on an established stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// The chat stream is not open, so the action cannot be carried out
    #[error("WS Offline")]
    Offline,

    /// Inbound frame had an unexpected shape
    #[error("Protocol violation: {message}")]
    Protocol {
        /// Error message
        message: String,
        /// Raw frame data that failed to parse
        data: Option<serde_json::Value>,
    },

    /// JSON decode error
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// The REST collaborator rejected a request
    #[error("Request rejected (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The REST collaborator could not be reached
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Chat id is not in the current chat list
    #[error("Chat not found: {0}")]
    ChatNotFound(ChatId),
}

/// Result type alias for session layer operations
pub type Result<T> = std::result::Result<T, ChatError>;

impl ChatError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol violation error
    pub fn protocol(msg: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::Protocol {
            message: msg.into(),
            data,
        }
    }

    /// Create an API rejection error
    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: msg.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error is a transport failure.
    ///
    /// Transport failures are recovered locally by marking the channel offline;
    /// everything else is either discarded (protocol) or surfaced to the user.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Transport(_) | Self::Offline | Self::Io(_)
        )
    }

    /// Whether this error describes a malformed inbound frame
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::JsonDecode(_))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::api(status.as_u16(), err.to_string()),
            None => Self::http(err.to_string()),
        }
    }
}

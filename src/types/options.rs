//! Session options and configuration
//!
//! This module contains the configuration for the session layer, including a
//! builder pattern for easy configuration.

use std::time::Duration;

use url::Url;

use super::channel::Channel;
use super::identifiers::ChatId;
use crate::error::{ChatError, Result};

/// Default REST base URL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1";

/// How long a surfaced notification banner stays visible
pub const DEFAULT_BANNER_DURATION: Duration = Duration::from_secs(5);

/// Coalescing window for search query changes
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(150);

/// Sampling period of the background monitor
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(3);

// ============================================================================
// Session Options
// ============================================================================

/// Main options for the session layer
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// REST base URL; stream URLs are derived from it
    pub base_url: Url,
    /// Path of the chat stream
    pub chat_path: String,
    /// Path of the notification stream
    pub notifications_path: String,
    /// Path of the search stream
    pub search_path: String,
    /// Header carrying the credential on every request
    pub credential_header: String,
    /// Visibility of a notification banner
    pub banner_duration: Duration,
    /// Search coalescing window; `None` sends every keystroke
    pub search_debounce: Option<Duration>,
    /// Monitor sampling period
    pub monitor_interval: Duration,
    /// Title used for desktop notifications
    pub app_name: String,
    /// Sender label for the user's own messages
    pub self_label: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            // Constant literal, always parses
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!()),
            chat_path: "/ws/chat".to_string(),
            notifications_path: "/ws/notifications".to_string(),
            search_path: "/ws/Search/users".to_string(),
            credential_header: "Cookie".to_string(),
            banner_duration: DEFAULT_BANNER_DURATION,
            search_debounce: Some(DEFAULT_SEARCH_DEBOUNCE),
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            app_name: "AlmaChat".to_string(),
            self_label: "YOU".to_string(),
        }
    }
}

impl SessionOptions {
    /// Create a new builder for `SessionOptions`
    #[must_use]
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::default()
    }

    /// Options from the environment.
    ///
    /// Reads `ALMA_BASE_URL`, `ALMA_SEARCH_DEBOUNCE_MS` (0 disables coalescing)
    /// and `ALMA_BANNER_SECS`; unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(base) = std::env::var("ALMA_BASE_URL") {
            builder = builder.base_url(&base)?;
        }

        if let Ok(raw) = std::env::var("ALMA_SEARCH_DEBOUNCE_MS") {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                ChatError::invalid_config(format!("ALMA_SEARCH_DEBOUNCE_MS is not a number: {raw}"))
            })?;
            builder = builder.search_debounce((ms > 0).then(|| Duration::from_millis(ms)));
        }

        if let Ok(raw) = std::env::var("ALMA_BANNER_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ChatError::invalid_config(format!("ALMA_BANNER_SECS is not a number: {raw}"))
            })?;
            builder = builder.banner_duration(Duration::from_secs(secs));
        }

        Ok(builder.build())
    }

    /// Stream URL for a channel. The chat stream additionally needs a chat id,
    /// see [`SessionOptions::chat_endpoint`].
    ///
    /// # Errors
    /// Returns error if the base URL cannot carry a websocket scheme
    pub fn stream_endpoint(&self, channel: Channel) -> Result<Url> {
        let path = match channel {
            Channel::Chat => &self.chat_path,
            Channel::Notifications => &self.notifications_path,
            Channel::Search => &self.search_path,
        };

        let mut url = self.base_url.join(path)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ChatError::invalid_config(format!(
                    "unsupported base URL scheme: {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| ChatError::invalid_config(format!("cannot use scheme {scheme}")))?;
        Ok(url)
    }

    /// Chat stream URL scoped to `chat_id`
    ///
    /// # Errors
    /// Returns error if the base URL cannot carry a websocket scheme
    pub fn chat_endpoint(&self, chat_id: ChatId) -> Result<Url> {
        let mut url = self.stream_endpoint(Channel::Chat)?;
        url.query_pairs_mut()
            .append_pair("chatId", &chat_id.to_string());
        Ok(url)
    }
}

// ============================================================================
// Builder for SessionOptions
// ============================================================================

/// Builder for `SessionOptions`
#[derive(Debug, Default)]
pub struct SessionOptionsBuilder {
    options: SessionOptions,
}

impl SessionOptionsBuilder {
    /// Set the REST base URL
    ///
    /// # Errors
    /// Returns error if `url` does not parse
    pub fn base_url(mut self, url: &str) -> Result<Self> {
        self.options.base_url = Url::parse(url)?;
        Ok(self)
    }

    /// Set the chat stream path
    #[must_use]
    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.options.chat_path = path.into();
        self
    }

    /// Set the notification stream path
    #[must_use]
    pub fn notifications_path(mut self, path: impl Into<String>) -> Self {
        self.options.notifications_path = path.into();
        self
    }

    /// Set the search stream path
    #[must_use]
    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.options.search_path = path.into();
        self
    }

    /// Set the credential header name
    #[must_use]
    pub fn credential_header(mut self, header: impl Into<String>) -> Self {
        self.options.credential_header = header.into();
        self
    }

    /// Set banner visibility
    #[must_use]
    pub const fn banner_duration(mut self, duration: Duration) -> Self {
        self.options.banner_duration = duration;
        self
    }

    /// Set the search coalescing window (`None` sends every change)
    #[must_use]
    pub const fn search_debounce(mut self, window: Option<Duration>) -> Self {
        self.options.search_debounce = window;
        self
    }

    /// Set the monitor sampling period
    ///
    /// # Panics
    /// Panics if `interval` is zero
    #[must_use]
    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "monitor interval must be non-zero");
        self.options.monitor_interval = interval;
        self
    }

    /// Set the desktop notification title
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.options.app_name = name.into();
        self
    }

    /// Set the label for the user's own messages
    #[must_use]
    pub fn self_label(mut self, label: impl Into<String>) -> Self {
        self.options.self_label = label.into();
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> SessionOptions {
        self.options
    }
}

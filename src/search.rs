//! Live user search
//!
//! Query text goes out raw on the search stream; every inbound frame is a
//! full result snapshot. With a debounce window configured, a burst of query
//! changes produces one outbound frame carrying the last text. Without one,
//! each change is sent immediately.

use std::time::Duration;

use crate::error::Result;
use crate::protocol::parse_search_results;
use crate::transport::StreamConnection;
use crate::types::chat::User;

/// What the owner must do after a query change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAction {
    /// The query was written to the stream
    Sent,
    /// Call [`SearchSession::flush`] with `seq` after `delay`
    Schedule {
        /// Query sequence to flush
        seq: u64,
        /// Debounce window
        delay: Duration,
    },
    /// No open search stream; the query was only recorded
    Dropped,
}

/// Search stream state: current query, latest results, the open connection
#[derive(Debug, Default)]
pub struct SearchSession {
    query: String,
    results: Vec<User>,
    debounce: Option<Duration>,
    seq: u64,
    generation: u64,
    connection: Option<StreamConnection>,
}

impl SearchSession {
    /// Create a session with the given debounce window
    #[must_use]
    pub fn new(debounce: Option<Duration>) -> Self {
        Self {
            debounce,
            ..Self::default()
        }
    }

    /// Current query text
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Latest result snapshot
    #[must_use]
    pub fn results(&self) -> &[User] {
        &self.results
    }

    /// Whether the search stream is open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.connection.as_ref().is_some_and(StreamConnection::is_open)
    }

    /// Whether a connection is attached or being opened
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.connection.is_some()
    }

    /// Start a new stream generation and return its tag.
    ///
    /// Any connection opened under an earlier tag is refused by
    /// [`SearchSession::attach`], and its events fail [`SearchSession::accepts`].
    pub fn begin_open(&mut self) -> u64 {
        self.close();
        self.generation += 1;
        self.generation
    }

    /// Adopt a freshly connected stream.
    ///
    /// Returns false, closing the connection, if it belongs to an earlier
    /// generation.
    pub fn attach(&mut self, mut connection: StreamConnection) -> bool {
        if connection.tag() != self.generation {
            log::debug!("search stream {} is stale; closing", connection.id());
            connection.close();
            return false;
        }
        self.connection = Some(connection);
        true
    }

    /// Whether events tagged `tag` belong to the current generation
    #[must_use]
    pub const fn accepts(&self, tag: u64) -> bool {
        tag == self.generation
    }

    /// Close the stream and forget the results. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        // Bumping the generation invalidates a connect still in flight
        self.generation += 1;
        self.results.clear();
        self.query.clear();
    }

    /// Drop the connection after the stream ended on its own
    pub fn detach(&mut self) {
        self.connection = None;
    }

    /// Record a query change
    pub fn set_query(&mut self, text: impl Into<String>) -> QueryAction {
        self.query = text.into();
        self.seq += 1;

        match self.debounce {
            Some(delay) => QueryAction::Schedule {
                seq: self.seq,
                delay,
            },
            None => self.send_query(),
        }
    }

    /// Send the query if `seq` is still the latest change.
    ///
    /// Returns `None` if a newer change superseded it.
    pub fn flush(&mut self, seq: u64) -> Option<QueryAction> {
        if seq != self.seq {
            log::trace!("search flush {seq} superseded by {}", self.seq);
            return None;
        }
        Some(self.send_query())
    }

    /// Replace the results with one inbound snapshot.
    ///
    /// # Errors
    /// Returns `ChatError::Protocol` if the frame is not a user array; the
    /// previous results are kept.
    pub fn apply_frame(&mut self, text: &str) -> Result<&[User]> {
        self.results = parse_search_results(text)?;
        Ok(&self.results)
    }

    fn send_query(&self) -> QueryAction {
        let Some(connection) = self.connection.as_ref().filter(|c| c.is_open()) else {
            log::debug!("search stream not open; query dropped");
            return QueryAction::Dropped;
        };

        match connection.send_text(self.query.clone()) {
            Ok(()) => QueryAction::Sent,
            Err(e) => {
                log::debug!("search query not sent: {e}");
                QueryAction::Dropped
            }
        }
    }
}

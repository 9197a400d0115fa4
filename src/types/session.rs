//! Authenticated session context
//!
//! Created on successful login and shared read-only with every component.

use std::fmt;

use super::identifiers::UserId;

/// Opaque credential attached to every stream and REST request.
///
/// The value is never printed; `Debug` shows a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a credential value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw header value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether there is anything to attach
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Session context: the authenticated user and their credential
#[derive(Debug, Clone)]
pub struct Session {
    user_id: UserId,
    credential: Credential,
}

impl Session {
    /// Create a session
    pub fn new(user_id: impl Into<UserId>, credential: Credential) -> Self {
        Self {
            user_id: user_id.into(),
            credential,
        }
    }

    /// Authenticated user id
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Credential for stream and REST requests
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }
}

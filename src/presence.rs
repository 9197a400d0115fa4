//! Online-presence tracking
//!
//! Fed by the notification stream: `online_list` frames are full snapshots,
//! `presence` frames are single-user deltas. Both arrive on one ordered
//! stream, so the last event for a user wins.

use std::collections::HashSet;

use crate::types::identifiers::UserId;

/// Set of user ids currently online
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    online: HashSet<UserId>,
}

impl PresenceTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set. Used on connect and reconnect resync.
    ///
    /// Returns whether the set changed.
    pub fn apply_snapshot(&mut self, ids: impl IntoIterator<Item = UserId>) -> bool {
        let next: HashSet<UserId> = ids.into_iter().collect();
        let changed = next != self.online;
        self.online = next;
        changed
    }

    /// Apply one user's presence change. Adding a present id or removing an
    /// absent one is a no-op.
    ///
    /// Returns whether the set changed.
    pub fn apply_delta(&mut self, user_id: UserId, is_online: bool) -> bool {
        if is_online {
            self.online.insert(user_id)
        } else {
            self.online.remove(&user_id)
        }
    }

    /// Whether `user_id` is online
    #[must_use]
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.online.contains(&user_id)
    }

    /// Number of online users
    #[must_use]
    pub fn len(&self) -> usize {
        self.online.len()
    }

    /// Whether nobody is online
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }

    /// Online ids in ascending order
    #[must_use]
    pub fn online_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<_> = self.online.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

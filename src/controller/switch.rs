//! Chat-switch generations
//!
//! Every chat selection mints a new [`PendingSwitch`]. The chat stream, the
//! history request and every event they produce carry the token they were
//! started under; anything carrying an older token is stale and dropped.
//!
//! Each switch also owns a cancellation token. Minting the next switch, or
//! invalidating, cancels it, so a handshake still in flight for a chat the
//! user already left is abandoned instead of opening a second chat stream.

use tokio_util::sync::CancellationToken;

/// Token of one chat-switch operation
#[derive(Debug, Clone)]
pub struct PendingSwitch {
    generation: u64,
    cancel: CancellationToken,
}

impl PendingSwitch {
    /// Raw generation value, used as the chat stream tag
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.generation
    }

    /// Cancelled once this switch is superseded
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether a newer switch, or an invalidation, has replaced this one
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Issues switch tokens and answers staleness checks
#[derive(Debug, Default)]
pub struct SwitchTokens {
    current: u64,
    cancel: Option<CancellationToken>,
}

impl SwitchTokens {
    /// Mint the next token; every earlier one becomes stale and its
    /// pending work is cancelled. The new token is a child of `parent`.
    pub fn next(&mut self, parent: &CancellationToken) -> PendingSwitch {
        self.invalidate();
        let cancel = parent.child_token();
        self.cancel = Some(cancel.clone());
        PendingSwitch {
            generation: self.current,
            cancel,
        }
    }

    /// Whether `tag` is the latest token
    #[must_use]
    pub fn is_current(&self, tag: u64) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|cancel| !cancel.is_cancelled())
            && tag == self.current
    }

    /// Make every issued token stale without starting a new switch
    pub fn invalidate(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.current += 1;
    }
}

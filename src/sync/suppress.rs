use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

/// Correlates one locally-initiated write with its change-feed echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MutationId(pub u64);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    id: MutationId,
    expires_at: Instant,
}

/// In-flight write tokens, oldest first, each alive for a grace window.
#[derive(Debug, Clone)]
pub struct SuppressionSet {
    grace: Duration,
    tokens: VecDeque<Token>,
    next_id: u64,
}

impl SuppressionSet {
    #[must_use]
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            tokens: VecDeque::new(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn issue(&mut self, now: Instant) -> MutationId {
        let id = MutationId(self.next_id);
        self.next_id += 1;
        self.tokens.push_back(Token {
            id,
            expires_at: now + self.grace,
        });
        trace!(mutation = %id, "issued suppression token");
        id
    }

    /// Restarts the grace window of `id`; false if it is no longer live.
    pub fn refresh(&mut self, id: MutationId, now: Instant) -> bool {
        match self.tokens.iter_mut().find(|token| token.id == id) {
            Some(token) => {
                token.expires_at = now + self.grace;
                true
            }
            None => false,
        }
    }

    pub fn release(&mut self, id: MutationId) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|token| token.id != id);
        before != self.tokens.len()
    }

    /// Drops expired tokens, returning their ids.
    pub fn prune(&mut self, now: Instant) -> Vec<MutationId> {
        let mut expired = Vec::new();
        self.tokens.retain(|token| {
            let live = token.expires_at > now;
            if !live {
                expired.push(token.id);
            }
            live
        });
        expired
    }

    /// Consumes the oldest live token, if any.
    pub fn consume(&mut self, now: Instant) -> Option<MutationId> {
        self.prune(now);
        self.tokens.pop_front().map(|token| token.id)
    }

    #[must_use]
    pub fn is_live(&self, id: MutationId) -> bool {
        self.tokens.iter().any(|token| token.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn next_expiry(&self) -> Option<Instant> {
        self.tokens.iter().map(|token| token.expires_at).min()
    }
}

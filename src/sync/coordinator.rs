use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::SyncConfig;

use super::suppress::{MutationId, SuppressionSet};

/// What the coordinator decided for one change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedDecision {
    /// Treated as the echo of a local write.
    Suppressed(MutationId),
    /// A refetch is due at the given instant.
    RefetchScheduled { due: Instant },
}

/// Decides refetch versus suppress for remote change notifications.
///
/// The coordinator never performs I/O; callers ask [`Self::take_due_refetch`]
/// when to run the fetch and feed the result into the store.
#[derive(Debug, Clone)]
pub struct ChangeFeedCoordinator {
    suppress: SuppressionSet,
    debounce: Duration,
    refetch_due: Option<Instant>,
    refetches: u64,
}

impl ChangeFeedCoordinator {
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            suppress: SuppressionSet::new(config.suppress_grace()),
            debounce: config.feed_debounce(),
            refetch_due: None,
            refetches: 0,
        }
    }

    /// Issues a correlation token; call before the write request is sent.
    pub fn begin_write(&mut self, now: Instant) -> MutationId {
        self.suppress.issue(now)
    }

    /// The grace window restarts when the remote acknowledges the write.
    pub fn write_succeeded(&mut self, mutation: MutationId, now: Instant) {
        if !self.suppress.refresh(mutation, now) {
            trace!(%mutation, "acknowledged write already lost its token");
        }
    }

    /// Drops the token of a write that was never sent.
    pub fn abandon_write(&mut self, mutation: MutationId) {
        self.suppress.release(mutation);
    }

    /// Drops the token and forces an immediate resynchronizing refetch.
    pub fn write_failed(&mut self, mutation: MutationId, now: Instant) {
        self.suppress.release(mutation);
        self.refetch_due = Some(self.refetch_due.map_or(now, |due| due.min(now)));
        debug!(%mutation, "write failed, forcing refetch");
    }

    pub fn on_notification(&mut self, now: Instant) -> FeedDecision {
        if let Some(mutation) = self.suppress.consume(now) {
            debug!(%mutation, "change notification suppressed as local echo");
            return FeedDecision::Suppressed(mutation);
        }
        let debounced = now + self.debounce;
        // A forced refetch that is already due is not pushed back.
        let due = match self.refetch_due {
            Some(existing) if existing <= now => existing,
            _ => debounced,
        };
        self.refetch_due = Some(due);
        trace!(debounce_ms = self.debounce.as_millis() as u64, "refetch scheduled");
        FeedDecision::RefetchScheduled { due }
    }

    /// Returns true once, when a scheduled refetch has come due.
    pub fn take_due_refetch(&mut self, now: Instant) -> bool {
        match self.refetch_due {
            Some(due) if due <= now => {
                self.refetch_due = None;
                self.refetches += 1;
                true
            }
            _ => false,
        }
    }

    /// Tokens whose grace window lapsed without an echo.
    pub fn expire(&mut self, now: Instant) -> Vec<MutationId> {
        self.suppress.prune(now)
    }

    #[must_use]
    pub fn refetch_due(&self) -> Option<Instant> {
        self.refetch_due
    }

    /// Earliest instant at which the coordinator has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.refetch_due, self.suppress.next_expiry()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    #[must_use]
    pub fn pending_tokens(&self) -> usize {
        self.suppress.len()
    }

    /// Refetches handed out by [`Self::take_due_refetch`] so far.
    #[must_use]
    pub fn refetch_count(&self) -> u64 {
        self.refetches
    }
}

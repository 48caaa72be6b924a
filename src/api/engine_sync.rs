use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::core::{Group, ScheduleItem};
use crate::error::TimelineResult;
use crate::extract::{ScheduleExtractor, board_groups};
use crate::remote::BoardApi;
use crate::sync::{FeedDecision, StoreMutation};

use super::{FeedEvent, LoadState, TimelineEngine};

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl<A: BoardApi> TimelineEngine<A> {
    /// Fetches board metadata and every item, then replaces the store.
    ///
    /// The store only changes when the whole read succeeded.
    pub async fn load(&mut self) -> TimelineResult<()> {
        self.load_state = LoadState::Loading;
        match self.fetch_snapshot().await {
            Ok((items, groups)) => {
                self.store
                    .apply(StoreMutation::ReplaceAll { items, groups })?;
                self.refresh_layout()?;
                self.load_state = LoadState::Ready;
                info!(
                    items = self.store.len(),
                    groups = self.store.groups().len(),
                    "timeline loaded"
                );
                Ok(())
            }
            Err(error) => {
                self.note_error(&error);
                self.load_state = if error.is_authorization() {
                    LoadState::Restricted
                } else {
                    LoadState::Failed {
                        error: error.clone(),
                    }
                };
                warn!(error = %error, "timeline load failed");
                Err(error)
            }
        }
    }

    async fn fetch_snapshot(&mut self) -> TimelineResult<(Vec<ScheduleItem>, Vec<Group>)> {
        let meta = self.client.fetch_board().await?;
        self.extractor = ScheduleExtractor::new(&meta, self.extraction.clone());
        let raw = self
            .client
            .fetch_all_with_progress(|progress| {
                debug!(
                    page = progress.page,
                    total = progress.total_items,
                    has_more = progress.has_more,
                    "load progress"
                );
            })
            .await?;
        Ok((self.extractor.extract(&raw), board_groups(&meta)))
    }

    /// Feeds one remote change notification to the coordinator.
    pub fn on_remote_change(&mut self, now: Instant) -> TimelineResult<FeedDecision> {
        let decision = self.coordinator.on_notification(now);
        if let FeedDecision::Suppressed(mutation) = decision {
            self.store.apply(StoreMutation::Settle { mutation })?;
        }
        Ok(decision)
    }

    /// Settles lapsed tokens and runs a refetch if one is due.
    ///
    /// Returns whether a refetch ran.
    pub async fn drive_feed(&mut self, now: Instant) -> TimelineResult<bool> {
        for mutation in self.coordinator.expire(now) {
            self.store.apply(StoreMutation::Settle { mutation })?;
        }
        if !self.coordinator.take_due_refetch(now) {
            return Ok(false);
        }
        debug!("running scheduled refetch");
        self.load().await?;
        Ok(true)
    }

    /// Processes queued events and feed deadlines until shutdown.
    ///
    /// Failures are logged and reflected in [`Self::load_state`]; the loop
    /// keeps running.
    pub async fn run(&mut self, mut events: mpsc::Receiver<FeedEvent>) -> TimelineResult<()> {
        loop {
            let deadline = self.coordinator.next_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    None | Some(FeedEvent::Shutdown) => break,
                    Some(FeedEvent::RemoteChange) => {
                        self.on_remote_change(Instant::now())?;
                    }
                    Some(FeedEvent::Update(update)) => {
                        if let Err(error) = self.commit_update(update).await {
                            warn!(error = %error, "queued update failed");
                        }
                    }
                    Some(FeedEvent::Reload) => {
                        if let Err(error) = self.load().await {
                            warn!(error = %error, "reload failed");
                        }
                    }
                },
                () = until(deadline) => {
                    if let Err(error) = self.drive_feed(Instant::now()).await {
                        warn!(error = %error, "refetch failed");
                    }
                }
            }
        }
        debug!("feed loop stopped");
        Ok(())
    }
}

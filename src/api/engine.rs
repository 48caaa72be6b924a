use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::TimelineConfig;
use crate::core::{GroupId, PartitionKey, PersonId, RowLayout, TimeScale};
use crate::error::{TimelineError, TimelineResult};
use crate::extract::{ExtractionSettings, GroupBy, ScheduleExtractor, YearFilter};
use crate::interaction::{DragGestureController, ItemUpdate};
use crate::remote::{BoardApi, RemoteClient};
use crate::sync::{ChangeFeedCoordinator, ItemStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// The last read failed; the previous consistent snapshot is kept.
    Failed { error: TimelineError },
    /// The caller lacks read access.
    Restricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    ReadWrite,
    /// Writes are rejected locally without a network call.
    ReadOnly,
}

/// Filters and grouping applied to the schedule view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub year: YearFilter,
    pub group: Option<GroupId>,
    pub assignee: Option<PersonId>,
    pub group_by: GroupBy,
    pub collapsed: HashSet<PartitionKey>,
}

/// Work queued for [`TimelineEngine::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    RemoteChange,
    Update(ItemUpdate),
    Reload,
    Shutdown,
}

/// Main facade consumed by host applications.
///
/// One engine owns one board: its remote client, the item store, the change
/// feed coordinator and the gesture controller. All state transitions run on
/// the caller's task.
pub struct TimelineEngine<A: BoardApi> {
    pub(super) client: RemoteClient<A>,
    pub(super) store: ItemStore,
    pub(super) coordinator: ChangeFeedCoordinator,
    pub(super) extractor: ScheduleExtractor,
    pub(super) extraction: ExtractionSettings,
    pub(super) gestures: DragGestureController,
    pub(super) config: TimelineConfig,
    pub(super) scale: TimeScale,
    pub(super) rows: RowLayout,
    pub(super) view: ViewOptions,
    pub(super) load_state: LoadState,
    pub(super) access: AccessMode,
}

impl<A: BoardApi> TimelineEngine<A> {
    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    #[must_use]
    pub fn access_mode(&self) -> AccessMode {
        self.access
    }

    /// Switches to read-only, as for a viewer session token.
    pub fn restrict_access(&mut self) {
        self.access = AccessMode::ReadOnly;
    }

    #[must_use]
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    #[must_use]
    pub fn coordinator(&self) -> &ChangeFeedCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn client(&self) -> &RemoteClient<A> {
        &self.client
    }

    #[must_use]
    pub fn gestures(&self) -> &DragGestureController {
        &self.gestures
    }

    pub(super) fn ensure_writable(&self) -> TimelineResult<()> {
        match self.access {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(TimelineError::Authorization(
                "board is in read-only mode".to_owned(),
            )),
        }
    }

    pub(super) fn note_error(&mut self, error: &TimelineError) {
        if error.is_authorization() && self.access != AccessMode::ReadOnly {
            tracing::warn!(error = %error, "authorization failure, switching to read-only");
            self.access = AccessMode::ReadOnly;
        }
    }
}

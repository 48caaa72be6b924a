use chrono::Utc;

use crate::config::TimelineConfig;
use crate::core::{RowLayout, TimeScale};
use crate::error::TimelineResult;
use crate::extract::{ExtractionSettings, ScheduleExtractor};
use crate::interaction::DragGestureController;
use crate::remote::{BoardApi, BoardId, RemoteClient, session};
use crate::sync::{ChangeFeedCoordinator, ItemStore};

use super::{AccessMode, LoadState, TimelineEngine, ViewOptions};

impl<A: BoardApi> TimelineEngine<A> {
    /// Creates an idle engine showing the current calendar year.
    pub fn new(api: A, board_id: BoardId, config: TimelineConfig) -> TimelineResult<Self> {
        let scale = TimeScale::around_today(Utc::now().date_naive(), config.time_scale)?;
        Self::with_time_scale(api, board_id, config, scale)
    }

    pub fn with_time_scale(
        api: A,
        board_id: BoardId,
        config: TimelineConfig,
        scale: TimeScale,
    ) -> TimelineResult<Self> {
        let config = config.validate()?;
        Ok(Self {
            client: RemoteClient::new(api, board_id, config.sync)?,
            store: ItemStore::new(),
            coordinator: ChangeFeedCoordinator::new(config.sync),
            extractor: ScheduleExtractor::default(),
            extraction: ExtractionSettings::default(),
            gestures: DragGestureController::new(config.gesture)?,
            rows: RowLayout::build(std::iter::empty(), config.rows)?,
            config,
            scale,
            view: ViewOptions::default(),
            load_state: LoadState::Idle,
            access: AccessMode::ReadWrite,
        })
    }

    /// Starts read-only when the host session token marks a viewer.
    #[must_use]
    pub fn with_session_token(mut self, token: &str) -> Self {
        if session::is_view_only(token) {
            tracing::info!("viewer session, starting read-only");
            self.access = AccessMode::ReadOnly;
        }
        self
    }

    /// Takes effect on the next load.
    #[must_use]
    pub fn with_extraction_settings(mut self, settings: ExtractionSettings) -> Self {
        self.extraction = settings;
        self
    }
}

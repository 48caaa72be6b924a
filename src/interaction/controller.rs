use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::config::GestureConfig;
use crate::core::{BarSpan, ItemId, RowLayout, ScheduleItem, TimeScale};
use crate::error::TimelineResult;

use super::preview::DragPreview;
use super::session::{DragResolution, DragSession, ItemUpdate};
use super::{DragMode, PointerId};

/// Bar under the pointer at pointer-down, as the view laid it out.
#[derive(Debug, Clone, Copy)]
pub struct BarHit<'a> {
    pub item: &'a ScheduleItem,
    pub span: BarSpan,
    pub bar_top: f64,
}

/// Layout the controller needs to turn pixels into dates and groups.
#[derive(Debug, Clone, Copy)]
pub struct DragContext<'a> {
    pub scale: &'a TimeScale,
    pub rows: &'a RowLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Started { item_id: ItemId, mode: DragMode },
    Preview(DragPreview),
    /// The frame produced no valid dates; the session is unchanged.
    FrameSkipped,
    Click(ItemId),
    Commit(ItemUpdate),
    NoChange,
    Cancelled,
    /// No session for the pointer, or one is already active.
    Ignored,
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    session: DragSession,
    bar_top: f64,
}

/// Routes pointer events to at most one [`DragSession`] per pointer.
#[derive(Debug, Clone, Default)]
pub struct DragGestureController {
    config: GestureConfig,
    active: HashMap<PointerId, ActiveDrag>,
}

impl DragGestureController {
    pub fn new(config: GestureConfig) -> TimelineResult<Self> {
        Ok(Self {
            config: config.validate()?,
            active: HashMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> GestureConfig {
        self.config
    }

    #[must_use]
    pub fn session(&self, pointer: PointerId) -> Option<&DragSession> {
        self.active.get(&pointer).map(|drag| &drag.session)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_dragging(&self, item_id: &ItemId) -> bool {
        self.active
            .values()
            .any(|drag| drag.session.item_id() == item_id)
    }

    pub fn pointer_down(&mut self, pointer: PointerId, hit: BarHit<'_>, x: f64, y: f64) -> DragOutcome {
        if self.active.contains_key(&pointer) {
            warn!(%pointer, "pointer down while a drag is active, ignoring");
            return DragOutcome::Ignored;
        }
        if !x.is_finite() || !y.is_finite() {
            return DragOutcome::Ignored;
        }
        let Some(mode) = DragMode::classify(x, hit.span.x, hit.span.width, self.config.edge_margin_px)
        else {
            trace!(%pointer, item = %hit.item.id, x, "pointer down outside the bar");
            return DragOutcome::Ignored;
        };
        let session = DragSession::begin(hit.item, mode, x, y);
        debug!(%pointer, item = %hit.item.id, ?mode, "drag started");
        self.active.insert(
            pointer,
            ActiveDrag {
                session,
                bar_top: hit.bar_top,
            },
        );
        DragOutcome::Started {
            item_id: hit.item.id.clone(),
            mode,
        }
    }

    pub fn pointer_move(&mut self, pointer: PointerId, x: f64, y: f64, ctx: DragContext<'_>) -> DragOutcome {
        let config = self.config;
        let Some(drag) = self.active.get_mut(&pointer) else {
            return DragOutcome::Ignored;
        };
        match drag.session.advance(x, y, ctx.scale, ctx.rows, &config) {
            Some(next) => {
                drag.session = next;
                DragOutcome::Preview(DragPreview::build(
                    &drag.session,
                    drag.bar_top,
                    ctx.scale,
                    ctx.rows,
                ))
            }
            None => {
                trace!(%pointer, "skipping frame without valid dates");
                DragOutcome::FrameSkipped
            }
        }
    }

    /// Ends the drag; the release position counts as a final frame when valid.
    pub fn pointer_up(&mut self, pointer: PointerId, x: f64, y: f64, ctx: DragContext<'_>) -> DragOutcome {
        let Some(drag) = self.active.remove(&pointer) else {
            return DragOutcome::Ignored;
        };
        let session = drag
            .session
            .advance(x, y, ctx.scale, ctx.rows, &self.config)
            .unwrap_or(drag.session);
        match session.resolve() {
            DragResolution::Click(item_id) => {
                debug!(%pointer, item = %item_id, "drag resolved as click");
                DragOutcome::Click(item_id)
            }
            DragResolution::NoChange => {
                debug!(%pointer, item = %session.item_id(), "drag ended without change");
                DragOutcome::NoChange
            }
            DragResolution::Commit(update) => {
                debug!(
                    %pointer,
                    item = %update.id,
                    start = %update.start_date,
                    end = %update.end_date,
                    group = ?update.group_id,
                    "drag committed"
                );
                DragOutcome::Commit(update)
            }
        }
    }

    /// Discards the pointer's session without side effects.
    pub fn cancel(&mut self, pointer: PointerId) -> DragOutcome {
        match self.active.remove(&pointer) {
            Some(drag) => {
                debug!(%pointer, item = %drag.session.item_id(), "drag cancelled");
                DragOutcome::Cancelled
            }
            None => DragOutcome::Ignored,
        }
    }

    /// Drops every session, as when the view goes away.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.active.len();
        self.active.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PartitionKey, RowLayoutConfig, TimeScaleConfig, ZoomLevel, parse_iso_date};

    fn fixtures() -> (TimeScale, RowLayout, ScheduleItem) {
        let scale = TimeScale::for_year(
            2025,
            TimeScaleConfig {
                zoom: ZoomLevel::Month,
                ..TimeScaleConfig::default()
            },
        )
        .expect("scale");
        let rows = RowLayout::build(
            [(PartitionKey::Group("g1".into()), 1, true)],
            RowLayoutConfig::default(),
        )
        .expect("rows");
        let item = ScheduleItem::new(
            "7".into(),
            "Launch",
            parse_iso_date("2025-03-01").expect("date"),
            parse_iso_date("2025-03-11"),
            "g1".into(),
        )
        .expect("item");
        (scale, rows, item)
    }

    #[test]
    fn one_session_per_pointer() {
        let (scale, _, item) = fixtures();
        let mut controller = DragGestureController::default();
        let span = scale.bar_span(item.start_date(), item.end_date());
        let hit = BarHit {
            item: &item,
            span,
            bar_top: 44.0,
        };
        let mid = span.x + span.width / 2.0;
        assert!(matches!(
            controller.pointer_down(PointerId(1), hit, mid, 50.0),
            DragOutcome::Started { mode: DragMode::Move, .. }
        ));
        assert_eq!(controller.pointer_down(PointerId(1), hit, mid, 50.0), DragOutcome::Ignored);
        assert!(matches!(
            controller.pointer_down(PointerId(2), hit, span.x + 2.0, 50.0),
            DragOutcome::Started { mode: DragMode::ResizeStart, .. }
        ));
        assert_eq!(controller.active_count(), 2);
        assert_eq!(controller.cancel_all(), 2);
    }

    #[test]
    fn skipped_frame_keeps_session_alive() {
        let (scale, rows, item) = fixtures();
        let mut controller = DragGestureController::default();
        let span = scale.bar_span(item.start_date(), item.end_date());
        let ctx = DragContext {
            scale: &scale,
            rows: &rows,
        };
        let mid = span.x + span.width / 2.0;
        controller.pointer_down(
            PointerId(1),
            BarHit {
                item: &item,
                span,
                bar_top: 44.0,
            },
            mid,
            50.0,
        );
        assert_eq!(
            controller.pointer_move(PointerId(1), f64::INFINITY, 50.0, ctx),
            DragOutcome::FrameSkipped
        );
        assert!(matches!(
            controller.pointer_move(PointerId(1), mid + 25.0, 50.0, ctx),
            DragOutcome::Preview(_)
        ));
        match controller.pointer_up(PointerId(1), f64::NAN, f64::NAN, ctx) {
            DragOutcome::Commit(update) => {
                assert_eq!(update.start_date, parse_iso_date("2025-03-06").expect("date"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(controller.cancel(PointerId(1)), DragOutcome::Ignored);
    }
}

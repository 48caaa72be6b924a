use tracing::debug;

use crate::core::ItemId;
use crate::error::TimelineResult;
use crate::interaction::{BarHit, DragContext, DragOutcome, ItemUpdate, PointerId};
use crate::remote::BoardApi;

use super::TimelineEngine;

/// Result of a pointer release as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Select the item; nothing was written.
    Selected(ItemId),
    Committed(ItemUpdate),
    Unchanged,
    Ignored,
}

impl<A: BoardApi> TimelineEngine<A> {
    /// Starts a drag on `item_id` if its bar is currently laid out.
    pub fn pointer_down(&mut self, pointer: PointerId, item_id: &ItemId, x: f64, y: f64) -> DragOutcome {
        let Some(bar_top) = self.bar_top(item_id) else {
            debug!(item = %item_id, "pointer down on an item without a visible bar");
            return DragOutcome::Ignored;
        };
        let Some(item) = self.store.get(item_id) else {
            return DragOutcome::Ignored;
        };
        let hit = BarHit {
            item,
            span: self.scale.bar_span(item.start_date(), item.end_date()),
            bar_top,
        };
        self.gestures.pointer_down(pointer, hit, x, y)
    }

    pub fn pointer_move(&mut self, pointer: PointerId, x: f64, y: f64) -> DragOutcome {
        let ctx = DragContext {
            scale: &self.scale,
            rows: &self.rows,
        };
        self.gestures.pointer_move(pointer, x, y, ctx)
    }

    /// Ends the drag and commits its update, if any.
    ///
    /// A failed commit has already been rolled back when the error returns.
    pub async fn pointer_up(&mut self, pointer: PointerId, x: f64, y: f64) -> TimelineResult<GestureOutcome> {
        let ctx = DragContext {
            scale: &self.scale,
            rows: &self.rows,
        };
        match self.gestures.pointer_up(pointer, x, y, ctx) {
            DragOutcome::Click(item_id) => Ok(GestureOutcome::Selected(item_id)),
            DragOutcome::Commit(update) => {
                self.commit_update(update.clone()).await?;
                Ok(GestureOutcome::Committed(update))
            }
            DragOutcome::NoChange => Ok(GestureOutcome::Unchanged),
            _ => Ok(GestureOutcome::Ignored),
        }
    }

    pub fn cancel_gesture(&mut self, pointer: PointerId) -> DragOutcome {
        self.gestures.cancel(pointer)
    }

    /// Drops every drag session, as when the view unmounts.
    pub fn cancel_all_gestures(&mut self) -> usize {
        self.gestures.cancel_all()
    }
}

//! Pointer gestures over schedule bars.

pub mod controller;
pub mod preview;
pub mod session;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use controller::{BarHit, DragContext, DragGestureController, DragOutcome};
pub use preview::{BarPreview, DragPreview, GHOST_OPACITY};
pub use session::{DragOrigin, DragResolution, DragSession, ItemUpdate, PlannedWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DragMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

impl DragMode {
    /// Zone under `x` for a bar spanning `[bar_x, bar_x + bar_width]`;
    /// `None` when `x` falls outside the bar.
    ///
    /// The left edge wins on bars narrower than two margins.
    #[must_use]
    pub fn classify(x: f64, bar_x: f64, bar_width: f64, edge_margin: f64) -> Option<Self> {
        let bar_end = bar_x + bar_width;
        if !(bar_x..=bar_end).contains(&x) {
            return None;
        }
        Some(if x - bar_x <= edge_margin {
            Self::ResizeStart
        } else if bar_end - x <= edge_margin {
            Self::ResizeEnd
        } else {
            Self::Move
        })
    }

    #[must_use]
    pub fn is_resize(self) -> bool {
        !matches!(self, Self::Move)
    }
}

/// Identity of one pointer device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub u64);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

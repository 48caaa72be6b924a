use serde::{Deserialize, Serialize};

use crate::core::row_layout::{BAR_HEIGHT_PX, BAR_INSET_PX};
use crate::core::{PartitionKey, RowLayout, TimeScale};

use super::session::DragSession;

pub const GHOST_OPACITY: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarPreview {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    pub outlined: bool,
}

/// Two-bar picture of an active drag: the original bar faded in place and
/// the outlined candidate at the live position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragPreview {
    pub ghost: BarPreview,
    pub candidate: BarPreview,
}

impl DragPreview {
    /// `origin_bar_top` is where the bar was drawn at pointer-down.
    ///
    /// A candidate in another group sits in the first row slot of the target
    /// band, or on its header when the band is collapsed.
    #[must_use]
    pub fn build(
        session: &DragSession,
        origin_bar_top: f64,
        scale: &TimeScale,
        rows: &RowLayout,
    ) -> Self {
        let origin = session.origin();
        let ghost_span = scale.bar_span(origin.start_date, origin.end_date);
        let (start, end) = session.dates();
        let candidate_span = scale.bar_span(start, end);

        let candidate_top = if session.group_changed() {
            rows.band_for(&PartitionKey::Group(session.group_id().clone()))
                .map_or(origin_bar_top, |band| {
                    if band.expanded {
                        band.rows_start + BAR_INSET_PX
                    } else {
                        band.y_start + BAR_INSET_PX
                    }
                })
        } else {
            origin_bar_top
        };

        Self {
            ghost: BarPreview {
                x: ghost_span.x,
                y: origin_bar_top,
                width: ghost_span.width,
                height: BAR_HEIGHT_PX,
                opacity: GHOST_OPACITY,
                outlined: false,
            },
            candidate: BarPreview {
                x: candidate_span.x,
                y: candidate_top,
                width: candidate_span.width,
                height: BAR_HEIGHT_PX,
                opacity: 1.0,
                outlined: true,
            },
        }
    }
}

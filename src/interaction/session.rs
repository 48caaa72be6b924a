//! Immutable drag state and its pure transitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::config::GestureConfig;
use crate::core::{GroupId, ItemId, RowLayout, ScheduleItem, TimeScale, shift_days};
use crate::sync::ItemPatch;

use super::DragMode;

/// Snapshot taken at pointer-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragOrigin {
    pub x: f64,
    pub y: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    item_id: ItemId,
    mode: DragMode,
    origin: DragOrigin,
    start_date: NaiveDate,
    end_date: NaiveDate,
    group_id: GroupId,
    last_x: f64,
    last_y: f64,
    travelled: f64,
    confirmed: bool,
}

/// One remote write, in the order it must be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedWrite {
    Dates { start: NaiveDate, end: NaiveDate },
    Group(GroupId),
}

/// Commit payload of a gesture; `group_id` is present only when it changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub id: ItemId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(skip, default = "dates_changed_default")]
    dates_changed: bool,
}

fn dates_changed_default() -> bool {
    true
}

impl ItemUpdate {
    #[must_use]
    pub fn new(
        id: ItemId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        group_id: Option<GroupId>,
    ) -> Self {
        Self {
            id,
            start_date,
            end_date,
            group_id,
            dates_changed: true,
        }
    }

    #[must_use]
    pub fn dates_changed(&self) -> bool {
        self.dates_changed
    }

    /// Dates first, then the group move.
    #[must_use]
    pub fn planned_writes(&self) -> SmallVec<[PlannedWrite; 2]> {
        let mut writes: SmallVec<[PlannedWrite; 2]> = smallvec![];
        if self.dates_changed {
            writes.push(PlannedWrite::Dates {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if let Some(group_id) = &self.group_id {
            writes.push(PlannedWrite::Group(group_id.clone()));
        }
        writes
    }

    #[must_use]
    pub fn to_patch(&self) -> ItemPatch {
        ItemPatch {
            start_date: Some(self.start_date),
            end_date: Some(self.end_date),
            group_id: self.group_id.clone(),
            ..ItemPatch::default()
        }
    }
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragResolution {
    Click(ItemId),
    NoChange,
    Commit(ItemUpdate),
}

impl DragSession {
    #[must_use]
    pub fn begin(item: &ScheduleItem, mode: DragMode, x: f64, y: f64) -> Self {
        Self {
            item_id: item.id.clone(),
            mode,
            origin: DragOrigin {
                x,
                y,
                start_date: item.start_date(),
                end_date: item.end_date(),
                group_id: item.group_id.clone(),
            },
            start_date: item.start_date(),
            end_date: item.end_date(),
            group_id: item.group_id.clone(),
            last_x: x,
            last_y: y,
            travelled: 0.0,
            confirmed: false,
        }
    }

    #[must_use]
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    #[must_use]
    pub fn mode(&self) -> DragMode {
        self.mode
    }

    #[must_use]
    pub fn origin(&self) -> &DragOrigin {
        &self.origin
    }

    #[must_use]
    pub fn dates(&self) -> (NaiveDate, NaiveDate) {
        (self.start_date, self.end_date)
    }

    #[must_use]
    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Cumulative pointer path length since pointer-down.
    #[must_use]
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    #[must_use]
    pub fn group_changed(&self) -> bool {
        self.group_id != self.origin.group_id
    }

    #[must_use]
    pub fn dates_changed(&self) -> bool {
        (self.start_date, self.end_date) != (self.origin.start_date, self.origin.end_date)
    }

    /// Next session for a pointer at `(x, y)`.
    ///
    /// `None` when the frame cannot produce valid dates; the caller keeps the
    /// current session and waits for the next frame.
    #[must_use]
    pub fn advance(
        &self,
        x: f64,
        y: f64,
        scale: &TimeScale,
        rows: &RowLayout,
        gesture: &GestureConfig,
    ) -> Option<Self> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let pixels_per_day = scale.pixels_per_day();
        if !pixels_per_day.is_finite() || pixels_per_day <= 0.0 {
            return None;
        }
        let delta_days = ((x - self.origin.x) / pixels_per_day).round();
        if !delta_days.is_finite() {
            return None;
        }
        let (start_date, end_date) = self.shifted(delta_days as i64, gesture.min_duration_days)?;

        let group_id = match self.mode {
            DragMode::Move => rows
                .band_at(y)
                .and_then(|band| band.key.group_id())
                .unwrap_or(&self.origin.group_id)
                .clone(),
            DragMode::ResizeStart | DragMode::ResizeEnd => self.origin.group_id.clone(),
        };

        let travelled = self.travelled + (x - self.last_x).hypot(y - self.last_y);
        Some(Self {
            start_date,
            end_date,
            group_id,
            last_x: x,
            last_y: y,
            travelled,
            confirmed: self.confirmed || travelled >= gesture.click_threshold_px,
            ..self.clone()
        })
    }

    /// Resize clamps keep at least `min_days` between start and end unless
    /// the origin was already shorter, in which case the origin is the bound.
    fn shifted(&self, delta_days: i64, min_days: i64) -> Option<(NaiveDate, NaiveDate)> {
        let DragOrigin {
            start_date: start,
            end_date: end,
            ..
        } = self.origin;
        match self.mode {
            DragMode::Move => Some((shift_days(start, delta_days)?, shift_days(end, delta_days)?)),
            DragMode::ResizeStart => {
                let latest = shift_days(end, -min_days)?.max(start);
                Some((shift_days(start, delta_days)?.min(latest), end))
            }
            DragMode::ResizeEnd => {
                let earliest = shift_days(start, min_days)?.min(end);
                Some((start, shift_days(end, delta_days)?.max(earliest)))
            }
        }
    }

    /// Outcome of releasing the pointer in this state.
    #[must_use]
    pub fn resolve(&self) -> DragResolution {
        if !self.confirmed {
            return match self.mode {
                DragMode::Move => DragResolution::Click(self.item_id.clone()),
                DragMode::ResizeStart | DragMode::ResizeEnd => DragResolution::NoChange,
            };
        }
        let dates_changed = self.dates_changed();
        let group_changed = self.group_changed();
        if !dates_changed && !group_changed {
            return DragResolution::NoChange;
        }
        DragResolution::Commit(ItemUpdate {
            id: self.item_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            group_id: group_changed.then(|| self.group_id.clone()),
            dates_changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PartitionKey, RowLayoutConfig, TimeScaleConfig, ZoomLevel, parse_iso_date};

    fn d(raw: &str) -> NaiveDate {
        parse_iso_date(raw).expect("date")
    }

    fn scale() -> TimeScale {
        TimeScale::for_year(
            2025,
            TimeScaleConfig {
                zoom: ZoomLevel::Month,
                ..TimeScaleConfig::default()
            },
        )
        .expect("scale")
    }

    fn rows() -> RowLayout {
        RowLayout::build(
            [
                (PartitionKey::Group("g1".into()), 1, true),
                (PartitionKey::Group("g2".into()), 1, true),
            ],
            RowLayoutConfig::default(),
        )
        .expect("rows")
    }

    fn item(start: &str, end: &str) -> ScheduleItem {
        ScheduleItem::new("7".into(), "Launch", d(start), Some(d(end)), "g1".into()).expect("item")
    }

    fn drag(session: &DragSession, x: f64, y: f64) -> DragSession {
        session
            .advance(x, y, &scale(), &rows(), &GestureConfig::default())
            .expect("valid frame")
    }

    #[test]
    fn move_shifts_both_dates() {
        let session = DragSession::begin(&item("2025-03-01", "2025-03-05"), DragMode::Move, 100.0, 50.0);
        let moved = drag(&session, 150.0, 50.0);
        assert_eq!(moved.dates(), (d("2025-03-11"), d("2025-03-15")));
        assert!(moved.is_confirmed());
        assert!(!moved.group_changed());
    }

    #[test]
    fn move_into_another_band_changes_group() {
        let session = DragSession::begin(&item("2025-03-01", "2025-03-05"), DragMode::Move, 100.0, 50.0);
        let moved = drag(&session, 100.0, 90.0);
        assert_eq!(moved.group_id(), &GroupId::new("g2"));
        match moved.resolve() {
            DragResolution::Commit(update) => {
                assert_eq!(update.group_id, Some(GroupId::new("g2")));
                assert!(!update.dates_changed());
                assert_eq!(update.planned_writes().len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resize_start_clamps_one_day_before_end() {
        let session =
            DragSession::begin(&item("2025-03-01", "2025-03-05"), DragMode::ResizeStart, 100.0, 50.0);
        let resized = drag(&session, 400.0, 50.0);
        assert_eq!(resized.dates(), (d("2025-03-04"), d("2025-03-05")));
    }

    #[test]
    fn resize_end_clamps_one_day_after_start() {
        let session =
            DragSession::begin(&item("2025-03-01", "2025-03-05"), DragMode::ResizeEnd, 100.0, 50.0);
        let resized = drag(&session, -300.0, 50.0);
        assert_eq!(resized.dates(), (d("2025-03-01"), d("2025-03-02")));
    }

    #[test]
    fn single_day_item_is_not_widened_by_the_clamp() {
        let session =
            DragSession::begin(&item("2025-03-01", "2025-03-01"), DragMode::ResizeStart, 100.0, 50.0);
        let resized = drag(&session, 120.0, 50.0);
        assert_eq!(resized.dates(), (d("2025-03-01"), d("2025-03-01")));
        assert_eq!(resized.resolve(), DragResolution::NoChange);
    }

    #[test]
    fn small_motion_is_a_click() {
        let session = DragSession::begin(&item("2025-03-01", "2025-03-05"), DragMode::Move, 100.0, 50.0);
        let nudged = drag(&session, 101.0, 51.0);
        assert!(!nudged.is_confirmed());
        assert_eq!(nudged.resolve(), DragResolution::Click(ItemId::new("7")));
    }

    #[test]
    fn drag_back_to_origin_is_no_change() {
        let session = DragSession::begin(&item("2025-03-01", "2025-03-05"), DragMode::Move, 100.0, 50.0);
        let away = drag(&session, 160.0, 50.0);
        let back = drag(&away, 100.0, 50.0);
        assert!(back.is_confirmed());
        assert_eq!(back.resolve(), DragResolution::NoChange);
    }

    #[test]
    fn non_finite_frame_is_skipped() {
        let session = DragSession::begin(&item("2025-03-01", "2025-03-05"), DragMode::Move, 100.0, 50.0);
        assert!(
            session
                .advance(f64::NAN, 50.0, &scale(), &rows(), &GestureConfig::default())
                .is_none()
        );
    }

    #[test]
    fn commit_payload_omits_unchanged_group() {
        let update = ItemUpdate::new("7".into(), d("2025-03-11"), d("2025-03-15"), None);
        let json = serde_json::to_value(&update).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "id": "7", "startDate": "2025-03-11", "endDate": "2025-03-15" })
        );
    }
}

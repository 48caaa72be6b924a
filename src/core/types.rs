use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{TimelineError, TimelineResult};

pub const DAY_MS: f64 = 86_400_000.0;

pub const DEFAULT_STATUS_LABEL: &str = "No Status";
pub const DEFAULT_STATUS_COLOR: &str = "#94A3B8";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

string_id!(ItemId);
string_id!(GroupId);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved status of an item: optional label index plus display label/color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub index: Option<u32>,
    pub label: String,
    pub color: String,
}

impl Default for StatusInfo {
    fn default() -> Self {
        Self {
            index: None,
            label: DEFAULT_STATUS_LABEL.to_owned(),
            color: DEFAULT_STATUS_COLOR.to_owned(),
        }
    }
}

/// Normalized schedule record rendered as one bar.
///
/// Dates are calendar dates, both inclusive, with `end_date >= start_date`.
/// Deserialization goes through [`ScheduleItem::new`], so an inverted record
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleItemRecord")]
pub struct ScheduleItem {
    pub id: ItemId,
    pub name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    pub group_id: GroupId,
    pub status: StatusInfo,
    pub assignee_ids: IndexSet<PersonId>,
}

impl ScheduleItem {
    /// Builds an item; an absent end date collapses to the start date.
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        group_id: GroupId,
    ) -> TimelineResult<Self> {
        let end_date = end_date.unwrap_or(start_date);
        validate_date_range(start_date, end_date)?;
        Ok(Self {
            id,
            name: name.into(),
            start_date,
            end_date,
            group_id,
            status: StatusInfo::default(),
            assignee_ids: IndexSet::new(),
        })
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusInfo) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = PersonId>) -> Self {
        self.assignee_ids = assignees.into_iter().collect();
        self
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn set_dates(&mut self, start_date: NaiveDate, end_date: NaiveDate) -> TimelineResult<()> {
        validate_date_range(start_date, end_date)?;
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(())
    }

    /// Inclusive length in days.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Deserialize)]
struct ScheduleItemRecord {
    id: ItemId,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    group_id: GroupId,
    #[serde(default)]
    status: StatusInfo,
    #[serde(default)]
    assignee_ids: IndexSet<PersonId>,
}

impl TryFrom<ScheduleItemRecord> for ScheduleItem {
    type Error = TimelineError;

    fn try_from(record: ScheduleItemRecord) -> TimelineResult<Self> {
        Ok(Self::new(
            record.id,
            record.name,
            record.start_date,
            Some(record.end_date),
            record.group_id,
        )?
        .with_status(record.status)
        .with_assignees(record.assignee_ids))
    }
}

/// Remote category an item belongs to, rendered as a swimlane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub color: String,
    pub position: usize,
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> TimelineResult<()> {
    if end < start {
        return Err(TimelineError::Validation(format!(
            "end date {end} precedes start date {start}"
        )));
    }
    Ok(())
}

/// Milliseconds since the Unix epoch at UTC midnight of `date`.
#[must_use]
pub fn date_to_ms(date: NaiveDate) -> f64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis() as f64
}

/// Calendar date containing the instant `ms`; `None` for non-finite or out-of-range input.
#[must_use]
pub fn ms_to_date(ms: f64) -> Option<NaiveDate> {
    if !ms.is_finite() {
        return None;
    }
    let floored = ms.floor();
    if floored < i64::MIN as f64 || floored > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(floored as i64).map(|dt| dt.date_naive())
}

/// Shifts a date by whole days through millisecond arithmetic.
#[must_use]
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    ms_to_date(date_to_ms(date) + days as f64 * DAY_MS)
}

/// Parses an ISO `YYYY-MM-DD` date, tolerating a trailing time component.
#[must_use]
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(raw: &str) -> NaiveDate {
        parse_iso_date(raw).expect("date")
    }

    #[test]
    fn absent_end_date_defaults_to_start() {
        let item = ScheduleItem::new("1".into(), "a", d("2025-01-02"), None, "g".into())
            .expect("item");
        assert_eq!(item.end_date(), d("2025-01-02"));
        assert_eq!(item.duration_days(), 1);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = ScheduleItem::new(
            "1".into(),
            "a",
            d("2025-01-05"),
            Some(d("2025-01-02")),
            "g".into(),
        )
        .expect_err("inverted");
        assert!(matches!(err, TimelineError::Validation(_)));
    }

    #[test]
    fn deserializing_an_inverted_record_fails() {
        let raw = r#"{"id":"1","name":"a","start_date":"2025-03-15","end_date":"2025-03-10","group_id":"g"}"#;
        let err = serde_json::from_str::<ScheduleItem>(raw).expect_err("inverted");
        assert!(err.to_string().contains("precedes start date"));

        let item = ScheduleItem::new("1".into(), "a", d("2025-03-10"), Some(d("2025-03-15")), "g".into())
            .expect("item")
            .with_assignees([PersonId(4)]);
        let json = serde_json::to_string(&item).expect("serialize");
        let back: ScheduleItem = serde_json::from_str(&json).expect("valid record");
        assert_eq!(back, item);
    }

    #[test]
    fn shift_days_crosses_month_and_leap_boundaries() {
        assert_eq!(shift_days(d("2024-02-28"), 1), Some(d("2024-02-29")));
        assert_eq!(shift_days(d("2024-02-28"), 2), Some(d("2024-03-01")));
        assert_eq!(shift_days(d("2025-12-31"), 1), Some(d("2026-01-01")));
        assert_eq!(shift_days(d("2025-03-11"), -10), Some(d("2025-03-01")));
    }

    #[test]
    fn ms_to_date_rejects_non_finite() {
        assert_eq!(ms_to_date(f64::NAN), None);
        assert_eq!(ms_to_date(f64::INFINITY), None);
    }

    #[test]
    fn iso_parse_accepts_datetime_suffix() {
        assert_eq!(parse_iso_date("2025-03-01T10:00:00Z"), Some(d("2025-03-01")));
        assert_eq!(parse_iso_date("not a date"), None);
    }
}

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::time_scale::{TimeScale, ZoomLevel};

/// Calendar unit emitted as one axis tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickUnit {
    Month,
    Week,
    Day,
}

impl From<ZoomLevel> for TickUnit {
    fn from(zoom: ZoomLevel) -> Self {
        match zoom {
            ZoomLevel::Month => Self::Month,
            ZoomLevel::Week => Self::Week,
            ZoomLevel::Day => Self::Day,
        }
    }
}

/// One axis cell. `width` spans to the next unit boundary, so months of
/// different length produce different widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeTick {
    pub unit: TickUnit,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub x: f64,
    pub width: f64,
    pub label: String,
    pub label_line2: Option<String>,
}

pub(crate) fn generate_ticks(scale: &TimeScale) -> Vec<TimeTick> {
    let unit = TickUnit::from(scale.zoom());
    let (view_start, view_end) = scale.view_range();
    let multi_year = view_start.year() != view_end.year();

    let mut ticks = Vec::new();
    let mut current = unit_floor(unit, view_start);
    while current <= view_end {
        let Some(next) = unit_next(unit, current) else {
            break;
        };
        let x = scale.date_to_x(current);
        let (label, label_line2) = tick_labels(unit, current, multi_year);
        ticks.push(TimeTick {
            unit,
            start: current,
            end: next,
            x,
            width: scale.date_to_x(next) - x,
            label,
            label_line2,
        });
        current = next;
    }
    ticks
}

fn unit_floor(unit: TickUnit, date: NaiveDate) -> NaiveDate {
    match unit {
        TickUnit::Month => date.with_day(1).unwrap_or(date),
        TickUnit::Week => {
            let offset = i64::from(date.weekday().num_days_from_monday());
            date - chrono::Duration::days(offset)
        }
        TickUnit::Day => date,
    }
}

fn unit_next(unit: TickUnit, date: NaiveDate) -> Option<NaiveDate> {
    match unit {
        TickUnit::Month => date.checked_add_months(Months::new(1)),
        TickUnit::Week => date.checked_add_days(chrono::Days::new(7)),
        TickUnit::Day => date.succ_opt(),
    }
}

fn tick_labels(unit: TickUnit, date: NaiveDate, multi_year: bool) -> (String, Option<String>) {
    match unit {
        TickUnit::Month => (
            date.format("%b").to_string(),
            multi_year.then(|| date.format("%y").to_string()),
        ),
        TickUnit::Week => (
            format!("W{}", date.iso_week().week()),
            Some(date.format("%d %b").to_string()),
        ),
        TickUnit::Day => (
            date.format("%d").to_string(),
            Some(date.format("%a").to_string()),
        ),
    }
}

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::LinearScale;
use crate::core::ticks::{TimeTick, generate_ticks};
use crate::core::types::{DAY_MS, date_to_ms, ms_to_date};
use crate::error::{TimelineError, TimelineResult};

/// Bars narrower than this are widened so they stay grabbable.
pub const MIN_BAR_WIDTH_PX: f64 = 20.0;

/// Timeline zoom presets, coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomLevel {
    Month,
    Week,
    Day,
}

impl ZoomLevel {
    #[must_use]
    pub fn pixels_per_day(self) -> f64 {
        match self {
            Self::Month => 5.0,
            Self::Week => 10.0,
            Self::Day => 30.0,
        }
    }

    #[must_use]
    pub fn finer(self) -> Self {
        match self {
            Self::Month => Self::Week,
            Self::Week | Self::Day => Self::Day,
        }
    }

    #[must_use]
    pub fn coarser(self) -> Self {
        match self {
            Self::Day => Self::Week,
            Self::Week | Self::Month => Self::Month,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScaleConfig {
    pub min_width_px: f64,
    pub zoom: ZoomLevel,
}

impl Default for TimeScaleConfig {
    fn default() -> Self {
        Self {
            min_width_px: 800.0,
            zoom: ZoomLevel::Month,
        }
    }
}

impl TimeScaleConfig {
    pub fn validate(self) -> TimelineResult<Self> {
        if !self.min_width_px.is_finite() || self.min_width_px <= 0.0 {
            return Err(TimelineError::InvalidData(
                "time scale min width must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Horizontal placement of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarSpan {
    pub x: f64,
    pub width: f64,
}

/// Date ↔ pixel mapping for a visible window at a zoom level.
///
/// Mapping works on millisecond instants so drag previews can sit between
/// day boundaries; `view_start` maps to `0` and `view_end` to `width()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    view_start: NaiveDate,
    view_end: NaiveDate,
    config: TimeScaleConfig,
    linear: LinearScale,
    width: f64,
}

impl TimeScale {
    pub fn new(
        view_start: NaiveDate,
        view_end: NaiveDate,
        config: TimeScaleConfig,
    ) -> TimelineResult<Self> {
        let config = config.validate()?;
        if view_end <= view_start {
            return Err(TimelineError::InvalidData(format!(
                "view end {view_end} must be after view start {view_start}"
            )));
        }

        let start_ms = date_to_ms(view_start);
        let end_ms = date_to_ms(view_end);
        let linear = LinearScale::new(start_ms, end_ms)?;
        let total_days = (end_ms - start_ms) / DAY_MS;
        let width = config
            .min_width_px
            .max(total_days * config.zoom.pixels_per_day());

        Ok(Self {
            view_start,
            view_end,
            config,
            linear,
            width,
        })
    }

    /// Jan 1 through Dec 31 of `year`.
    pub fn for_year(year: i32, config: TimeScaleConfig) -> TimelineResult<Self> {
        Self::for_years(year, year, config)
    }

    /// Jan 1 of `first_year` through Dec 31 of `last_year`.
    pub fn for_years(first_year: i32, last_year: i32, config: TimeScaleConfig) -> TimelineResult<Self> {
        let (first, last) = (first_year.min(last_year), first_year.max(last_year));
        let start = NaiveDate::from_ymd_opt(first, 1, 1)
            .ok_or_else(|| TimelineError::InvalidData(format!("year {first} out of range")))?;
        let end = NaiveDate::from_ymd_opt(last, 12, 31)
            .ok_or_else(|| TimelineError::InvalidData(format!("year {last} out of range")))?;
        Self::new(start, end, config)
    }

    /// Calendar year containing `today`.
    pub fn around_today(today: NaiveDate, config: TimeScaleConfig) -> TimelineResult<Self> {
        Self::for_year(today.year(), config)
    }

    #[must_use]
    pub fn view_range(&self) -> (NaiveDate, NaiveDate) {
        (self.view_start, self.view_end)
    }

    #[must_use]
    pub fn zoom(&self) -> ZoomLevel {
        self.config.zoom
    }

    #[must_use]
    pub fn config(&self) -> TimeScaleConfig {
        self.config
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn total_days(&self) -> f64 {
        let (start, end) = self.linear.domain();
        (end - start) / DAY_MS
    }

    /// Effective pixel density; exceeds the zoom constant when the minimum width applies.
    #[must_use]
    pub fn pixels_per_day(&self) -> f64 {
        self.width / self.total_days()
    }

    pub fn with_zoom(&self, zoom: ZoomLevel) -> TimelineResult<Self> {
        Self::new(
            self.view_start,
            self.view_end,
            TimeScaleConfig {
                zoom,
                ..self.config
            },
        )
    }

    pub fn zoom_in(&self) -> TimelineResult<Self> {
        self.with_zoom(self.config.zoom.finer())
    }

    pub fn zoom_out(&self) -> TimelineResult<Self> {
        self.with_zoom(self.config.zoom.coarser())
    }

    #[must_use]
    pub fn date_to_x(&self, date: NaiveDate) -> f64 {
        self.instant_to_x(date_to_ms(date))
    }

    /// Sub-day mapping for millisecond instants.
    #[must_use]
    pub fn instant_to_x(&self, ms: f64) -> f64 {
        self.linear.domain_to_pixel(ms, self.width)
    }

    #[must_use]
    pub fn x_to_instant(&self, x: f64) -> f64 {
        self.linear.pixel_to_domain(x, self.width)
    }

    #[must_use]
    pub fn x_to_date(&self, x: f64) -> Option<NaiveDate> {
        ms_to_date(self.x_to_instant(x))
    }

    /// Bar placement for an item, widened to `MIN_BAR_WIDTH_PX`.
    #[must_use]
    pub fn bar_span(&self, start: NaiveDate, end: NaiveDate) -> BarSpan {
        let x = self.date_to_x(start);
        let end_x = self.date_to_x(end);
        BarSpan {
            x,
            width: (end_x - x).max(MIN_BAR_WIDTH_PX),
        }
    }

    /// Scroll offset that places `date` a third of the way into the viewport.
    #[must_use]
    pub fn scroll_target(&self, date: NaiveDate, viewport_width: f64) -> f64 {
        (self.date_to_x(date) - viewport_width / 3.0).max(0.0)
    }

    #[must_use]
    pub fn ticks(&self) -> Vec<TimeTick> {
        generate_ticks(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("date")
    }

    #[test]
    fn short_range_uses_minimum_width() {
        let scale = TimeScale::new(d(2025, 3, 1), d(2025, 3, 11), TimeScaleConfig::default())
            .expect("scale");
        assert_eq!(scale.width(), 800.0);
        assert!((scale.pixels_per_day() - 80.0).abs() <= 1e-9);
    }

    #[test]
    fn zoom_steps_saturate() {
        assert_eq!(ZoomLevel::Day.finer(), ZoomLevel::Day);
        assert_eq!(ZoomLevel::Month.coarser(), ZoomLevel::Month);
        assert_eq!(ZoomLevel::Month.finer().finer(), ZoomLevel::Day);
    }

    #[test]
    fn inverted_view_is_rejected() {
        let err = TimeScale::new(d(2025, 3, 1), d(2025, 3, 1), TimeScaleConfig::default());
        assert!(err.is_err());
    }

    #[test]
    fn scroll_target_clamps_at_zero() {
        let scale = TimeScale::for_year(2025, TimeScaleConfig::default()).expect("scale");
        assert_eq!(scale.scroll_target(d(2025, 1, 2), 900.0), 0.0);
        let x = scale.date_to_x(d(2025, 7, 1));
        assert!((scale.scroll_target(d(2025, 7, 1), 900.0) - (x - 300.0)).abs() <= 1e-9);
    }

    #[test]
    fn single_day_bar_gets_minimum_width() {
        let scale = TimeScale::for_year(2025, TimeScaleConfig::default()).expect("scale");
        let span = scale.bar_span(d(2025, 5, 1), d(2025, 5, 1));
        assert_eq!(span.width, MIN_BAR_WIDTH_PX);
    }
}

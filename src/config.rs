//! Serializable configuration for the sync engine, gestures and layout.
//!
//! Hosts can persist a [`TimelineConfig`] as JSON and load it back; every
//! section validates itself before use.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{RowLayoutConfig, TimeScaleConfig};
use crate::error::{TimelineError, TimelineResult};

/// Largest page the board API serves.
pub const MAX_PAGE_SIZE: usize = 500;

pub const TIMELINE_CONFIG_JSON_SCHEMA_V1: u32 = 1;

/// Remote retrieval, retry and change-feed timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub page_size: usize,
    pub page_delay_ms: u64,
    pub max_read_attempts: u32,
    pub backoff_base_ms: u64,
    pub feed_debounce_ms: u64,
    pub suppress_grace_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            page_delay_ms: 200,
            max_read_attempts: 3,
            backoff_base_ms: 1_000,
            feed_debounce_ms: 500,
            suppress_grace_ms: 5_000,
        }
    }
}

impl SyncConfig {
    pub fn validate(self) -> TimelineResult<Self> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(TimelineError::InvalidData(format!(
                "page size must be in 1..={MAX_PAGE_SIZE}"
            )));
        }
        if self.max_read_attempts == 0 {
            return Err(TimelineError::InvalidData(
                "max read attempts must be >= 1".to_owned(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub fn page_delay(self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    #[must_use]
    pub fn backoff_base(self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    #[must_use]
    pub fn feed_debounce(self) -> Duration {
        Duration::from_millis(self.feed_debounce_ms)
    }

    #[must_use]
    pub fn suppress_grace(self) -> Duration {
        Duration::from_millis(self.suppress_grace_ms)
    }
}

/// Pointer gesture thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Distance from a bar edge that starts a resize instead of a move.
    pub edge_margin_px: f64,
    /// Cumulative movement below which a release counts as a click.
    pub click_threshold_px: f64,
    pub min_duration_days: i64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            edge_margin_px: 10.0,
            click_threshold_px: 3.0,
            min_duration_days: 1,
        }
    }
}

impl GestureConfig {
    pub fn validate(self) -> TimelineResult<Self> {
        if !self.edge_margin_px.is_finite() || self.edge_margin_px < 0.0 {
            return Err(TimelineError::InvalidData(
                "gesture edge margin must be finite and >= 0".to_owned(),
            ));
        }
        if !self.click_threshold_px.is_finite() || self.click_threshold_px < 0.0 {
            return Err(TimelineError::InvalidData(
                "gesture click threshold must be finite and >= 0".to_owned(),
            ));
        }
        if self.min_duration_days < 0 {
            return Err(TimelineError::InvalidData(
                "gesture min duration must be >= 0 days".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub rows: RowLayoutConfig,
    #[serde(default)]
    pub time_scale: TimeScaleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfigJsonContractV1 {
    pub schema_version: u32,
    pub config: TimelineConfig,
}

impl TimelineConfig {
    pub fn validate(self) -> TimelineResult<Self> {
        self.sync.validate()?;
        self.gesture.validate()?;
        self.rows.validate()?;
        self.time_scale.validate()?;
        Ok(self)
    }

    pub fn to_json_pretty(&self) -> TimelineResult<String> {
        let payload = TimelineConfigJsonContractV1 {
            schema_version: TIMELINE_CONFIG_JSON_SCHEMA_V1,
            config: *self,
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            TimelineError::InvalidData(format!("failed to serialize timeline config: {e}"))
        })
    }

    /// Accepts either the bare config or the versioned contract wrapper.
    pub fn from_json_str(input: &str) -> TimelineResult<Self> {
        if let Ok(config) = serde_json::from_str::<TimelineConfigJsonContractV1>(input) {
            if config.schema_version != TIMELINE_CONFIG_JSON_SCHEMA_V1 {
                return Err(TimelineError::InvalidData(format!(
                    "unsupported timeline config schema version: {}",
                    config.schema_version
                )));
            }
            return config.config.validate();
        }
        let config: Self = serde_json::from_str(input).map_err(|e| {
            TimelineError::InvalidData(format!("failed to parse timeline config: {e}"))
        })?;
        config.validate()
    }
}

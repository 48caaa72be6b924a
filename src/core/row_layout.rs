use serde::{Deserialize, Serialize};

use crate::core::types::GroupId;
use crate::error::{TimelineError, TimelineResult};

/// Vertical inset of a bar inside its item row.
pub const BAR_INSET_PX: f64 = 8.0;
pub const BAR_HEIGHT_PX: f64 = 24.0;

/// Key of one swimlane partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PartitionKey {
    Group(GroupId),
    Status(String),
}

impl PartitionKey {
    #[must_use]
    pub fn group_id(&self) -> Option<&GroupId> {
        match self {
            Self::Group(id) => Some(id),
            Self::Status(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowLayoutConfig {
    pub group_header_height_px: f64,
    pub item_row_height_px: f64,
    pub min_content_height_px: f64,
}

impl Default for RowLayoutConfig {
    fn default() -> Self {
        Self {
            group_header_height_px: 36.0,
            item_row_height_px: 40.0,
            min_content_height_px: 400.0,
        }
    }
}

impl RowLayoutConfig {
    pub fn validate(self) -> TimelineResult<Self> {
        for (name, value) in [
            ("group header height", self.group_header_height_px),
            ("item row height", self.item_row_height_px),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TimelineError::InvalidData(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !self.min_content_height_px.is_finite() || self.min_content_height_px < 0.0 {
            return Err(TimelineError::InvalidData(
                "min content height must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Vertical extent of one partition: header plus its rows when expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowBand {
    pub key: PartitionKey,
    pub y_start: f64,
    pub rows_start: f64,
    pub y_end: f64,
    pub item_count: usize,
    pub expanded: bool,
}

impl RowBand {
    #[must_use]
    pub fn contains(&self, y: f64) -> bool {
        y >= self.y_start && y < self.y_end
    }
}

/// Cumulative Y bands for the swimlanes, top to bottom.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowLayout {
    bands: Vec<RowBand>,
    config: RowLayoutConfig,
}

impl RowLayout {
    /// Builds bands from `(key, item_count, expanded)` in display order.
    pub fn build<I>(partitions: I, config: RowLayoutConfig) -> TimelineResult<Self>
    where
        I: IntoIterator<Item = (PartitionKey, usize, bool)>,
    {
        let config = config.validate()?;
        let mut y = 0.0;
        let bands = partitions
            .into_iter()
            .map(|(key, item_count, expanded)| {
                let y_start = y;
                let rows_start = y_start + config.group_header_height_px;
                let rows_height = if expanded {
                    item_count as f64 * config.item_row_height_px
                } else {
                    0.0
                };
                y = rows_start + rows_height;
                RowBand {
                    key,
                    y_start,
                    rows_start,
                    y_end: y,
                    item_count,
                    expanded,
                }
            })
            .collect();
        Ok(Self { bands, config })
    }

    #[must_use]
    pub fn bands(&self) -> &[RowBand] {
        &self.bands
    }

    #[must_use]
    pub fn band_at(&self, y: f64) -> Option<&RowBand> {
        if !y.is_finite() {
            return None;
        }
        self.bands.iter().find(|band| band.contains(y))
    }

    #[must_use]
    pub fn band_for(&self, key: &PartitionKey) -> Option<&RowBand> {
        self.bands.iter().find(|band| &band.key == key)
    }

    /// Total height, never below the configured minimum.
    #[must_use]
    pub fn content_height(&self) -> f64 {
        let used = self.bands.last().map_or(0.0, |band| band.y_end);
        used.max(self.config.min_content_height_px)
    }

    /// Top edge of the bar at `index` inside a partition, if that row is visible.
    #[must_use]
    pub fn bar_top(&self, key: &PartitionKey, index: usize) -> Option<f64> {
        let band = self.band_for(key)?;
        if !band.expanded || index >= band.item_count {
            return None;
        }
        Some(band.rows_start + index as f64 * self.config.item_row_height_px + BAR_INSET_PX)
    }
}

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::types::{DEFAULT_STATUS_COLOR, DEFAULT_STATUS_LABEL};
use crate::core::{Group, PersonId, ScheduleItem, StatusInfo};
use crate::remote::{BoardMeta, RawColumnValue, RawItem};

use super::column::{ColumnKind, ColumnValue};

/// Host choices that steer extraction on boards with several candidate columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Tried before the fixed range-then-date precedence.
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub status_column: Option<String>,
    /// Consulted only when the winning date column gave no end date.
    #[serde(default)]
    pub end_date_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusLabel {
    label: String,
    color: String,
}

/// Index → label/color table read from a status column's `settings_str`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    labels: HashMap<u32, StatusLabel>,
}

impl StatusTable {
    /// Parses `{"labels": {"0": "Done"}, "labels_colors": {"0": {"color": "#0f0"}}}`.
    ///
    /// Malformed settings produce an empty table.
    #[must_use]
    pub fn from_settings(settings_str: &str) -> Self {
        let Ok(settings) = serde_json::from_str::<Value>(settings_str) else {
            trace!("status settings are not valid json");
            return Self::default();
        };
        let Some(labels) = settings.get("labels").and_then(Value::as_object) else {
            return Self::default();
        };
        let colors = settings.get("labels_colors");
        let labels = labels
            .iter()
            .filter_map(|(index, label)| {
                let index = index.parse::<u32>().ok()?;
                let label = label.as_str()?.to_owned();
                let color = colors
                    .and_then(|colors| colors.get(index.to_string()))
                    .and_then(|entry| entry.get("color"))
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_STATUS_COLOR)
                    .to_owned();
                Some((index, StatusLabel { label, color }))
            })
            .collect();
        Self { labels }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index lookup first, then the raw label, then the default status.
    #[must_use]
    pub fn resolve(&self, index: Option<u32>, raw_label: Option<&str>) -> StatusInfo {
        if let Some(entry) = index.and_then(|index| self.labels.get(&index)) {
            return StatusInfo {
                index,
                label: entry.label.clone(),
                color: entry.color.clone(),
            };
        }
        StatusInfo {
            index,
            label: raw_label.unwrap_or(DEFAULT_STATUS_LABEL).to_owned(),
            color: DEFAULT_STATUS_COLOR.to_owned(),
        }
    }
}

/// Pure normalizer from raw board items to [`ScheduleItem`]s.
#[derive(Debug, Clone, Default)]
pub struct ScheduleExtractor {
    settings: ExtractionSettings,
    status_table: StatusTable,
    status_column: Option<String>,
}

impl ScheduleExtractor {
    #[must_use]
    pub fn new(meta: &BoardMeta, settings: ExtractionSettings) -> Self {
        let status_column = settings
            .status_column
            .as_deref()
            .and_then(|id| meta.column(id))
            .or_else(|| {
                meta.columns
                    .iter()
                    .find(|column| ColumnKind::from_type(&column.kind) == ColumnKind::Status)
            });
        let status_table = status_column
            .and_then(|column| column.settings_str.as_deref())
            .map(StatusTable::from_settings)
            .unwrap_or_default();
        debug!(
            status_column = status_column.map(|c| c.id.as_str()),
            labels = status_table.len(),
            "schedule extractor configured"
        );
        Self {
            status_column: status_column.map(|column| column.id.clone()),
            settings,
            status_table,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    #[must_use]
    pub fn status_table(&self) -> &StatusTable {
        &self.status_table
    }

    /// Normalizes every item; items without usable dates or group are dropped.
    #[must_use]
    pub fn extract(&self, items: &[RawItem]) -> Vec<ScheduleItem> {
        let extracted: Vec<ScheduleItem> =
            items.iter().filter_map(|item| self.extract_item(item)).collect();
        debug!(
            raw = items.len(),
            extracted = extracted.len(),
            "extracted schedule"
        );
        extracted
    }

    #[must_use]
    pub fn extract_item(&self, item: &RawItem) -> Option<ScheduleItem> {
        let Some(group) = item.group.as_ref() else {
            trace!(item = %item.id, "skipping item without group");
            return None;
        };
        let Some((start, end)) = self.dates(&item.column_values) else {
            trace!(item = %item.id, "skipping item without parseable dates");
            return None;
        };
        let scheduled =
            match ScheduleItem::new(item.id.clone(), item.name.clone(), start, end, group.id.clone()) {
                Ok(scheduled) => scheduled,
                Err(err) => {
                    trace!(item = %item.id, error = %err, "skipping item with inverted dates");
                    return None;
                }
            };
        Some(
            scheduled
                .with_status(self.status(&item.column_values))
                .with_assignees(assignees(&item.column_values)),
        )
    }

    fn dates(&self, values: &[RawColumnValue]) -> Option<(NaiveDate, Option<NaiveDate>)> {
        let preferred = self
            .settings
            .date_column
            .as_deref()
            .and_then(|id| values.iter().find(|value| value.id == id))
            .filter(|value| ColumnKind::from_type(&value.kind).carries_dates());
        let by_kind = |wanted: ColumnKind| {
            values
                .iter()
                .filter(move |value| ColumnKind::from_type(&value.kind) == wanted)
        };

        let (start, end) = preferred
            .into_iter()
            .chain(by_kind(ColumnKind::Range))
            .chain(by_kind(ColumnKind::Date))
            .find_map(|value| ColumnValue::decode(value).and_then(|decoded| decoded.dates()))?;

        let end = end.or_else(|| self.explicit_end(values));
        Some((start, end))
    }

    fn explicit_end(&self, values: &[RawColumnValue]) -> Option<NaiveDate> {
        let id = self.settings.end_date_column.as_deref()?;
        let value = values.iter().find(|value| value.id == id)?;
        match ColumnValue::decode(value)? {
            ColumnValue::Range { from, to } => Some(to.unwrap_or(from)),
            ColumnValue::Date(date) => Some(date),
            _ => None,
        }
    }

    fn status(&self, values: &[RawColumnValue]) -> StatusInfo {
        let decoded = values
            .iter()
            .filter(|value| match self.status_column.as_deref() {
                Some(id) => value.id == id,
                None => ColumnKind::from_type(&value.kind) == ColumnKind::Status,
            })
            .find_map(|value| ColumnValue::decode_as(ColumnKind::Status, value));
        match decoded {
            Some(ColumnValue::Status { index, label }) => {
                self.status_table.resolve(index, label.as_deref())
            }
            _ => StatusInfo::default(),
        }
    }
}

fn assignees(values: &[RawColumnValue]) -> Vec<PersonId> {
    values
        .iter()
        .filter(|value| ColumnKind::from_type(&value.kind) == ColumnKind::People)
        .filter_map(ColumnValue::decode)
        .flat_map(|decoded| match decoded {
            ColumnValue::People(persons) => persons,
            _ => Vec::new(),
        })
        .collect()
}

/// Board groups in board order.
#[must_use]
pub fn board_groups(meta: &BoardMeta) -> Vec<Group> {
    meta.groups
        .iter()
        .enumerate()
        .map(|(position, group)| Group {
            id: group.id.clone(),
            title: group.title.clone(),
            color: group.color.clone(),
            position,
        })
        .collect()
}

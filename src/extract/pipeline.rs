//! Filtering and partitioning of extracted schedule items.

use std::collections::BTreeSet;

use chrono::Datelike;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Group, GroupId, PartitionKey, PersonId, ScheduleItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupBy {
    #[default]
    Groups,
    Status,
}

/// One stage of the filter pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemFilter {
    /// Keeps items whose `[start year, end year]` contains the year.
    Year(YearFilter),
    Group(GroupId),
    /// Items without assignees never match.
    Assignee(PersonId),
}

impl ItemFilter {
    #[must_use]
    pub fn matches(&self, item: &ScheduleItem) -> bool {
        match self {
            Self::Year(YearFilter::All) => true,
            Self::Year(YearFilter::Year(year)) => {
                item.start_date().year() <= *year && item.end_date().year() >= *year
            }
            Self::Group(group_id) => &item.group_id == group_id,
            Self::Assignee(person) => item.assignee_ids.contains(person),
        }
    }
}

/// Ordered composition of [`ItemFilter`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPipeline {
    stages: Vec<ItemFilter>,
}

impl FilterPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, filter: ItemFilter) -> Self {
        self.stages.push(filter);
        self
    }

    #[must_use]
    pub fn stages(&self) -> &[ItemFilter] {
        &self.stages
    }

    #[must_use]
    pub fn apply<'a>(&self, items: impl IntoIterator<Item = &'a ScheduleItem>) -> Vec<&'a ScheduleItem> {
        self.stages.iter().fold(items.into_iter().collect(), |kept: Vec<_>, stage| {
            kept.into_iter().filter(|item| stage.matches(item)).collect()
        })
    }
}

/// Sorted distinct years touched by any start or end date.
#[must_use]
pub fn available_years<'a>(items: impl IntoIterator<Item = &'a ScheduleItem>) -> Vec<i32> {
    items
        .into_iter()
        .flat_map(|item| [item.start_date().year(), item.end_date().year()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Partitions items, each partition stably sorted by start date.
///
/// Group partitions follow `groups` order and include empty groups; items
/// whose group is unknown are left out. Status partitions appear in
/// first-appearance order.
#[must_use]
pub fn group_items<'a>(
    items: &[&'a ScheduleItem],
    groups: &[Group],
    group_by: GroupBy,
) -> IndexMap<PartitionKey, Vec<&'a ScheduleItem>> {
    let mut partitions: IndexMap<PartitionKey, Vec<&'a ScheduleItem>> = IndexMap::new();
    match group_by {
        GroupBy::Groups => {
            for group in groups {
                partitions.insert(PartitionKey::Group(group.id.clone()), Vec::new());
            }
            for &item in items {
                if let Some(bucket) = partitions.get_mut(&PartitionKey::Group(item.group_id.clone())) {
                    bucket.push(item);
                }
            }
        }
        GroupBy::Status => {
            for &item in items {
                partitions
                    .entry(PartitionKey::Status(item.status.label.clone()))
                    .or_default()
                    .push(item);
            }
        }
    }
    for bucket in partitions.values_mut() {
        bucket.sort_by_key(|item| item.start_date());
    }
    partitions
}

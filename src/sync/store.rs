//! Authoritative in-memory cache of schedule items and groups.
//!
//! Every change goes through [`ItemStore::apply`]: remote replacements,
//! optimistic writes and their settlement. Each item carries a
//! [`SyncState`] so a refetch never clobbers a write still in flight.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{Group, GroupId, ItemId, PersonId, ScheduleItem};
use crate::error::{TimelineError, TimelineResult};

use super::suppress::MutationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncState {
    Clean,
    /// Optimistically applied; the remote write has not answered yet.
    PendingWrite,
    /// Remote accepted the write; waiting for its change-feed echo.
    Reconciling,
}

/// Field-level change applied optimistically to one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub group_id: Option<GroupId>,
    pub name: Option<String>,
    pub assignee_ids: Option<Vec<PersonId>>,
}

impl ItemPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.group_id.is_none()
            && self.name.is_none()
            && self.assignee_ids.is_none()
    }

    /// Returns `item` with the patch applied, validating the date range.
    pub fn applied_to(&self, item: &ScheduleItem) -> TimelineResult<ScheduleItem> {
        let mut next = item.clone();
        let start = self.start_date.unwrap_or(item.start_date());
        let end = self.end_date.unwrap_or(item.end_date());
        next.set_dates(start, end)?;
        if let Some(group_id) = &self.group_id {
            next.group_id = group_id.clone();
        }
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(assignees) = &self.assignee_ids {
            next.assignee_ids = assignees.iter().copied().collect();
        }
        Ok(next)
    }
}

/// The single mutation vocabulary accepted by [`ItemStore::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMutation {
    /// Wholesale replacement from a fresh remote read.
    ReplaceAll {
        items: Vec<ScheduleItem>,
        groups: Vec<Group>,
    },
    BeginWrite {
        item_id: ItemId,
        patch: ItemPatch,
        mutation: MutationId,
    },
    WriteSucceeded {
        item_id: ItemId,
        mutation: MutationId,
    },
    /// Restores the pre-write snapshot.
    WriteFailed {
        item_id: ItemId,
        mutation: MutationId,
    },
    /// The write's echo arrived or its grace window lapsed.
    Settle { mutation: MutationId },
    Insert(ScheduleItem),
    Remove(ItemId),
    UpsertGroup(Group),
    /// Removes the group and every item in it.
    RemoveGroup(GroupId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    item: ScheduleItem,
    state: SyncState,
    snapshot: Option<ScheduleItem>,
    mutation: Option<MutationId>,
}

impl Entry {
    fn clean(item: ScheduleItem) -> Self {
        Self {
            item,
            state: SyncState::Clean,
            snapshot: None,
            mutation: None,
        }
    }

    fn settle(&mut self) {
        self.state = SyncState::Clean;
        self.snapshot = None;
        self.mutation = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemStore {
    entries: IndexMap<ItemId, Entry>,
    groups: Vec<Group>,
    revision: u64,
}

impl ItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every applied mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&ScheduleItem> {
        self.entries.get(id).map(|entry| &entry.item)
    }

    #[must_use]
    pub fn state(&self, id: &ItemId) -> Option<SyncState> {
        self.entries.get(id).map(|entry| entry.state)
    }

    pub fn items(&self) -> impl Iterator<Item = &ScheduleItem> {
        self.entries.values().map(|entry| &entry.item)
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| &group.id == id)
    }

    /// Items whose state is not [`SyncState::Clean`].
    #[must_use]
    pub fn unsettled(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state != SyncState::Clean)
            .count()
    }

    pub fn apply(&mut self, mutation: StoreMutation) -> TimelineResult<()> {
        match mutation {
            StoreMutation::ReplaceAll { items, groups } => self.replace_all(items, groups),
            StoreMutation::BeginWrite {
                item_id,
                patch,
                mutation,
            } => self.begin_write(&item_id, &patch, mutation)?,
            StoreMutation::WriteSucceeded { item_id, mutation } => {
                let entry = self.pending_entry(&item_id, mutation)?;
                entry.state = SyncState::Reconciling;
                trace!(item = %item_id, %mutation, "write acknowledged, reconciling");
            }
            StoreMutation::WriteFailed { item_id, mutation } => {
                let entry = self.pending_entry(&item_id, mutation)?;
                if let Some(snapshot) = entry.snapshot.take() {
                    entry.item = snapshot;
                }
                entry.settle();
                warn!(item = %item_id, %mutation, "write failed, rolled back");
            }
            StoreMutation::Settle { mutation } => {
                for entry in self
                    .entries
                    .values_mut()
                    .filter(|entry| entry.mutation == Some(mutation))
                {
                    if entry.state == SyncState::Reconciling {
                        entry.settle();
                    }
                }
            }
            StoreMutation::Insert(item) => {
                if !self.groups.is_empty() && self.group(&item.group_id).is_none() {
                    return Err(TimelineError::Validation(format!(
                        "unknown group {}",
                        item.group_id
                    )));
                }
                self.entries.insert(item.id.clone(), Entry::clean(item));
            }
            StoreMutation::Remove(id) => {
                if self.entries.shift_remove(&id).is_none() {
                    return Err(TimelineError::InvalidData(format!("unknown item {id}")));
                }
            }
            StoreMutation::UpsertGroup(group) => {
                match self.groups.iter_mut().find(|existing| existing.id == group.id) {
                    Some(existing) => {
                        existing.title = group.title;
                        existing.color = group.color;
                    }
                    None => {
                        let position = self.groups.len();
                        self.groups.push(Group { position, ..group });
                    }
                }
            }
            StoreMutation::RemoveGroup(group_id) => {
                let before = self.groups.len();
                self.groups.retain(|group| group.id != group_id);
                if before == self.groups.len() {
                    return Err(TimelineError::InvalidData(format!("unknown group {group_id}")));
                }
                for (position, group) in self.groups.iter_mut().enumerate() {
                    group.position = position;
                }
                let items_before = self.entries.len();
                self.entries.retain(|_, entry| entry.item.group_id != group_id);
                debug!(
                    group = %group_id,
                    removed_items = items_before - self.entries.len(),
                    "removed group"
                );
            }
        }
        self.revision += 1;
        Ok(())
    }

    /// Unsettled items keep their local value on top of the fresh record
    /// until their write settles; their rollback target becomes the fresh
    /// record.
    fn replace_all(&mut self, items: Vec<ScheduleItem>, groups: Vec<Group>) {
        let mut previous = std::mem::take(&mut self.entries);
        let mut kept_pending = 0;
        for item in items {
            let id = item.id.clone();
            let entry = match previous.shift_remove(&id) {
                Some(old) if old.state != SyncState::Clean => {
                    kept_pending += 1;
                    Entry {
                        item: old.item,
                        state: old.state,
                        snapshot: Some(item),
                        mutation: old.mutation,
                    }
                }
                _ => Entry::clean(item),
            };
            self.entries.insert(id, entry);
        }
        self.groups = groups;
        debug!(
            items = self.entries.len(),
            groups = self.groups.len(),
            kept_pending,
            "replaced store contents"
        );
    }

    fn begin_write(
        &mut self,
        item_id: &ItemId,
        patch: &ItemPatch,
        mutation: MutationId,
    ) -> TimelineResult<()> {
        if let Some(group_id) = &patch.group_id {
            if self.group(group_id).is_none() {
                return Err(TimelineError::Validation(format!("unknown group {group_id}")));
            }
        }
        let entry = self
            .entries
            .get_mut(item_id)
            .ok_or_else(|| TimelineError::Validation(format!("unknown item {item_id}")))?;
        if entry.state == SyncState::PendingWrite {
            return Err(TimelineError::Validation(format!(
                "item {item_id} already has a write in flight"
            )));
        }
        let next = patch.applied_to(&entry.item)?;
        // A Reconciling entry's item is already the accepted remote value.
        entry.snapshot = Some(std::mem::replace(&mut entry.item, next));
        entry.state = SyncState::PendingWrite;
        entry.mutation = Some(mutation);
        trace!(item = %item_id, %mutation, "optimistic write applied");
        Ok(())
    }

    fn pending_entry(&mut self, item_id: &ItemId, mutation: MutationId) -> TimelineResult<&mut Entry> {
        self.entries
            .get_mut(item_id)
            .filter(|entry| entry.state == SyncState::PendingWrite && entry.mutation == Some(mutation))
            .ok_or_else(|| {
                TimelineError::InvalidData(format!(
                    "no pending write {mutation} for item {item_id}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse_iso_date;

    fn d(raw: &str) -> NaiveDate {
        parse_iso_date(raw).expect("date")
    }

    fn item(id: &str, start: &str, end: &str, group: &str) -> ScheduleItem {
        ScheduleItem::new(id.into(), id, d(start), Some(d(end)), group.into()).expect("item")
    }

    fn group(id: &str) -> Group {
        Group {
            id: id.into(),
            title: id.to_owned(),
            color: "#000".to_owned(),
            position: 0,
        }
    }

    fn loaded() -> ItemStore {
        let mut store = ItemStore::new();
        store
            .apply(StoreMutation::ReplaceAll {
                items: vec![
                    item("1", "2025-03-01", "2025-03-05", "g1"),
                    item("2", "2025-04-01", "2025-04-02", "g2"),
                ],
                groups: vec![group("g1"), group("g2")],
            })
            .expect("replace");
        store
    }

    fn shift(start: &str, end: &str) -> ItemPatch {
        ItemPatch {
            start_date: Some(d(start)),
            end_date: Some(d(end)),
            ..ItemPatch::default()
        }
    }

    #[test]
    fn write_lifecycle_moves_through_states() {
        let mut store = loaded();
        let id = ItemId::new("1");
        let m = MutationId(1);
        store
            .apply(StoreMutation::BeginWrite {
                item_id: id.clone(),
                patch: shift("2025-03-11", "2025-03-15"),
                mutation: m,
            })
            .expect("begin");
        assert_eq!(store.state(&id), Some(SyncState::PendingWrite));
        assert_eq!(store.get(&id).map(ScheduleItem::start_date), Some(d("2025-03-11")));

        store
            .apply(StoreMutation::WriteSucceeded { item_id: id.clone(), mutation: m })
            .expect("ack");
        assert_eq!(store.state(&id), Some(SyncState::Reconciling));
        store.apply(StoreMutation::Settle { mutation: m }).expect("settle");
        assert_eq!(store.state(&id), Some(SyncState::Clean));
        assert_eq!(store.unsettled(), 0);
    }

    #[test]
    fn failed_write_rolls_back_to_snapshot() {
        let mut store = loaded();
        let id = ItemId::new("1");
        let m = MutationId(3);
        store
            .apply(StoreMutation::BeginWrite {
                item_id: id.clone(),
                patch: ItemPatch {
                    group_id: Some("g2".into()),
                    ..shift("2025-03-11", "2025-03-15")
                },
                mutation: m,
            })
            .expect("begin");
        store
            .apply(StoreMutation::WriteFailed { item_id: id.clone(), mutation: m })
            .expect("rollback");
        let restored = store.get(&id).expect("item");
        assert_eq!(restored.start_date(), d("2025-03-01"));
        assert_eq!(restored.group_id, GroupId::new("g1"));
        assert_eq!(store.state(&id), Some(SyncState::Clean));
    }

    #[test]
    fn refetch_keeps_pending_optimistic_value() {
        let mut store = loaded();
        let id = ItemId::new("1");
        store
            .apply(StoreMutation::BeginWrite {
                item_id: id.clone(),
                patch: shift("2025-03-11", "2025-03-15"),
                mutation: MutationId(1),
            })
            .expect("begin");
        store
            .apply(StoreMutation::ReplaceAll {
                items: vec![item("1", "2025-03-02", "2025-03-06", "g1")],
                groups: vec![group("g1")],
            })
            .expect("replace");
        assert_eq!(store.get(&id).map(ScheduleItem::start_date), Some(d("2025-03-11")));
        store
            .apply(StoreMutation::WriteFailed { item_id: id.clone(), mutation: MutationId(1) })
            .expect("rollback");
        assert_eq!(store.get(&id).map(ScheduleItem::start_date), Some(d("2025-03-02")));
    }

    #[test]
    fn stale_refetch_before_echo_keeps_acknowledged_value() {
        let mut store = loaded();
        let id = ItemId::new("1");
        let m = MutationId(2);
        store
            .apply(StoreMutation::BeginWrite {
                item_id: id.clone(),
                patch: shift("2025-03-11", "2025-03-15"),
                mutation: m,
            })
            .expect("begin");
        store
            .apply(StoreMutation::WriteSucceeded { item_id: id.clone(), mutation: m })
            .expect("ack");

        store
            .apply(StoreMutation::ReplaceAll {
                items: vec![item("1", "2025-03-01", "2025-03-05", "g1")],
                groups: vec![group("g1")],
            })
            .expect("stale replace");
        assert_eq!(store.state(&id), Some(SyncState::Reconciling));
        assert_eq!(store.get(&id).map(ScheduleItem::start_date), Some(d("2025-03-11")));

        store.apply(StoreMutation::Settle { mutation: m }).expect("settle");
        assert_eq!(store.state(&id), Some(SyncState::Clean));
        assert_eq!(store.get(&id).map(ScheduleItem::start_date), Some(d("2025-03-11")));
    }

    #[test]
    fn invalid_patch_is_rejected_without_state_change() {
        let mut store = loaded();
        let id = ItemId::new("1");
        let revision = store.revision();
        let err = store
            .apply(StoreMutation::BeginWrite {
                item_id: id.clone(),
                patch: shift("2025-03-10", "2025-03-01"),
                mutation: MutationId(1),
            })
            .expect_err("inverted");
        assert!(matches!(err, TimelineError::Validation(_)));
        assert_eq!(store.state(&id), Some(SyncState::Clean));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn removing_a_group_cascades_to_its_items() {
        let mut store = loaded();
        store
            .apply(StoreMutation::RemoveGroup("g1".into()))
            .expect("remove");
        assert!(store.get(&ItemId::new("1")).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.groups()[0].position, 0);
    }
}

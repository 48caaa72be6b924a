use smallvec::SmallVec;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::{Group, GroupId, ItemId, PersonId, ScheduleItem};
use crate::error::{TimelineError, TimelineResult};
use crate::interaction::{ItemUpdate, PlannedWrite};
use crate::remote::{BoardApi, BoardGroup, GroupPatch, NewItem};
use crate::sync::{ItemPatch, MutationId, StoreMutation};

use super::TimelineEngine;

/// One remote call that realizes part of an optimistic item patch.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemWrite {
    Planned(PlannedWrite),
    Name(String),
    Assignees(Vec<PersonId>),
}

impl<A: BoardApi> TimelineEngine<A> {
    /// Applies a gesture or dialog update optimistically and commits it.
    ///
    /// Dates are written before the group. If any write fails the whole
    /// update is rolled back and a refetch is forced.
    pub async fn commit_update(&mut self, update: ItemUpdate) -> TimelineResult<()> {
        let writes: SmallVec<[ItemWrite; 2]> = update
            .planned_writes()
            .into_iter()
            .map(ItemWrite::Planned)
            .collect();
        self.write_item(&update.id, update.to_patch(), writes).await
    }

    pub async fn rename_item(&mut self, item_id: &ItemId, name: &str) -> TimelineResult<()> {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(TimelineError::Validation("item name must not be empty".to_owned()));
        }
        let patch = ItemPatch {
            name: Some(name.clone()),
            ..ItemPatch::default()
        };
        self.write_item(item_id, patch, smallvec::smallvec![ItemWrite::Name(name)])
            .await
    }

    pub async fn set_assignees(&mut self, item_id: &ItemId, persons: Vec<PersonId>) -> TimelineResult<()> {
        let patch = ItemPatch {
            assignee_ids: Some(persons.clone()),
            ..ItemPatch::default()
        };
        self.write_item(item_id, patch, smallvec::smallvec![ItemWrite::Assignees(persons)])
            .await
    }

    async fn write_item(
        &mut self,
        item_id: &ItemId,
        patch: ItemPatch,
        writes: SmallVec<[ItemWrite; 2]>,
    ) -> TimelineResult<()> {
        self.ensure_writable()?;
        if writes.is_empty() || patch.is_empty() {
            debug!(item = %item_id, "update changes nothing, skipping");
            return Ok(());
        }

        let now = Instant::now();
        let tokens: SmallVec<[MutationId; 2]> =
            writes.iter().map(|_| self.coordinator.begin_write(now)).collect();
        let primary = tokens[0];
        if let Err(error) = self.store.apply(StoreMutation::BeginWrite {
            item_id: item_id.clone(),
            patch,
            mutation: primary,
        }) {
            for token in tokens {
                self.coordinator.abandon_write(token);
            }
            return Err(error);
        }
        self.refresh_layout()?;

        for (index, write) in writes.iter().enumerate() {
            if let Err(error) = self.send_item_write(item_id, write).await {
                return Err(self.roll_back(item_id, primary, &tokens[index..], error));
            }
        }

        self.store.apply(StoreMutation::WriteSucceeded {
            item_id: item_id.clone(),
            mutation: primary,
        })?;
        let now = Instant::now();
        for token in tokens {
            self.coordinator.write_succeeded(token, now);
        }
        debug!(item = %item_id, writes = writes.len(), "item update committed");
        Ok(())
    }

    /// Tokens of writes that already went through stay live so their echo
    /// is still suppressed; the forced refetch resynchronizes regardless.
    fn roll_back(
        &mut self,
        item_id: &ItemId,
        primary: MutationId,
        unsent: &[MutationId],
        error: TimelineError,
    ) -> TimelineError {
        let now = Instant::now();
        let rolled_back = self.store.apply(StoreMutation::WriteFailed {
            item_id: item_id.clone(),
            mutation: primary,
        });
        for token in unsent {
            self.coordinator.write_failed(*token, now);
        }
        if let Err(store_error) = rolled_back {
            warn!(error = %store_error, "rollback found no pending write");
        }
        if let Err(layout_error) = self.refresh_layout() {
            warn!(error = %layout_error, "layout refresh after rollback failed");
        }
        self.note_error(&error);
        warn!(item = %item_id, error = %error, "item write failed, rolled back");
        if error.is_authorization() {
            return error;
        }
        TimelineError::StaleWrite {
            item_id: item_id.to_string(),
            reason: error.to_string(),
        }
    }

    async fn send_item_write(&self, item_id: &ItemId, write: &ItemWrite) -> TimelineResult<()> {
        match write {
            ItemWrite::Planned(PlannedWrite::Dates { start, end }) => {
                self.client.commit_dates(item_id, *start, *end).await
            }
            ItemWrite::Planned(PlannedWrite::Group(group_id)) => {
                self.client.commit_group(item_id, group_id).await
            }
            ItemWrite::Name(name) => self.client.commit_name(item_id, name).await,
            ItemWrite::Assignees(persons) => self.client.commit_assignees(item_id, persons).await,
        }
    }

    /// Issues the suppression token for a non-optimistic write.
    fn open_guard(&mut self) -> TimelineResult<MutationId> {
        self.ensure_writable()?;
        Ok(self.coordinator.begin_write(Instant::now()))
    }

    fn close_guard<T>(
        &mut self,
        label: &str,
        token: MutationId,
        result: TimelineResult<T>,
    ) -> TimelineResult<T> {
        match result {
            Ok(value) => {
                self.coordinator.write_succeeded(token, Instant::now());
                Ok(value)
            }
            Err(error @ (TimelineError::Validation(_) | TimelineError::LastGroup)) => {
                self.coordinator.abandon_write(token);
                Err(error)
            }
            Err(error) => {
                self.coordinator.write_failed(token, Instant::now());
                self.note_error(&error);
                warn!(label, error = %error, "write failed");
                Err(error)
            }
        }
    }

    pub async fn create_item(&mut self, item: NewItem) -> TimelineResult<ItemId> {
        if self.store.group(&item.group_id).is_none() {
            return Err(TimelineError::Validation(format!("unknown group {}", item.group_id)));
        }
        let token = self.open_guard()?;
        let result = self.client.commit_create(&item).await;
        let id = self.close_guard("create_item", token, result)?;
        let created = ScheduleItem::new(
            id.clone(),
            item.name.trim(),
            item.start_date,
            item.end_date,
            item.group_id,
        )?;
        self.store.apply(StoreMutation::Insert(created))?;
        self.refresh_layout()?;
        Ok(id)
    }

    pub async fn create_group(&mut self, title: &str) -> TimelineResult<Group> {
        let token = self.open_guard()?;
        let result = self.client.commit_create_group(title).await;
        let created = self.close_guard("create_group", token, result)?;
        self.upsert_group(created)
    }

    pub async fn update_group(&mut self, group_id: &GroupId, patch: GroupPatch) -> TimelineResult<Group> {
        let token = self.open_guard()?;
        let result = self.client.commit_update_group(group_id, &patch).await;
        let updated = self.close_guard("update_group", token, result)?;
        self.upsert_group(updated)
    }

    /// Deletes a group remotely and its items locally.
    pub async fn delete_group(&mut self, group_id: &GroupId) -> TimelineResult<()> {
        let token = self.open_guard()?;
        let result = self.client.commit_delete_group(group_id).await;
        self.close_guard("delete_group", token, result)?;
        self.store
            .apply(StoreMutation::RemoveGroup(group_id.clone()))?;
        self.refresh_layout()
    }

    fn upsert_group(&mut self, group: BoardGroup) -> TimelineResult<Group> {
        let position = self.store.groups().len();
        self.store.apply(StoreMutation::UpsertGroup(Group {
            id: group.id.clone(),
            title: group.title,
            color: group.color,
            position,
        }))?;
        self.refresh_layout()?;
        self.store
            .group(&group.id)
            .cloned()
            .ok_or_else(|| TimelineError::InvalidData(format!("group {} missing after upsert", group.id)))
    }
}

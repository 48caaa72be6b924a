use chrono::NaiveDate;
use tracing::{debug, trace, warn};

use crate::config::SyncConfig;
use crate::core::types::validate_date_range;
use crate::core::{GroupId, ItemId, PersonId};
use crate::error::{TimelineError, TimelineResult};

use super::retry::{RetryPolicy, with_retry};
use super::wire::{
    BoardGroup, BoardId, BoardMeta, ColumnValues, ColumnWrite, Cursor, GroupAttribute, NewItem,
    RawItem,
};
use super::BoardApi;

pub(crate) const RANGE_COLUMN_KINDS: &[&str] = &["timeline", "timerange"];
pub(crate) const DATE_COLUMN_KINDS: &[&str] = &["date"];
pub(crate) const PEOPLE_COLUMN_KINDS: &[&str] = &["people", "person"];

/// Progress report emitted after each fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub page: usize,
    pub page_items: usize,
    pub total_items: usize,
    pub has_more: bool,
}

/// Column chosen for a date commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateColumnTarget {
    Range { column_id: String },
    Date { column_id: String },
}

impl DateColumnTarget {
    /// Multi-day ranges go to the range column; single days prefer the
    /// single-date column and fall back to the range column.
    pub fn resolve(meta: &BoardMeta, start: NaiveDate, end: NaiveDate) -> TimelineResult<Self> {
        let range = meta.first_column_of(RANGE_COLUMN_KINDS);
        let date = meta.first_column_of(DATE_COLUMN_KINDS);
        match (range, date) {
            (Some(range), Some(_)) if start != end => Ok(Self::Range {
                column_id: range.id.clone(),
            }),
            (_, Some(date)) => Ok(Self::Date {
                column_id: date.id.clone(),
            }),
            (Some(range), None) => Ok(Self::Range {
                column_id: range.id.clone(),
            }),
            (None, None) => Err(TimelineError::Validation(
                "board has no date or timeline column".to_owned(),
            )),
        }
    }

    #[must_use]
    pub fn column_id(&self) -> &str {
        match self {
            Self::Range { column_id } | Self::Date { column_id } => column_id,
        }
    }

    fn write(&self, start: NaiveDate, end: NaiveDate) -> ColumnWrite {
        match self {
            Self::Range { .. } => ColumnWrite::Range {
                from: start,
                to: end,
            },
            Self::Date { .. } => ColumnWrite::Date { date: start },
        }
    }
}

/// Group attributes to change; at least one must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPatch {
    pub title: Option<String>,
    pub color: Option<String>,
}

/// Paginating, retrying client bound to one board.
///
/// Reads go through [`with_retry`]; writes are single attempts.
#[derive(Debug)]
pub struct RemoteClient<A> {
    api: A,
    board_id: BoardId,
    config: SyncConfig,
    board: Option<BoardMeta>,
}

impl<A: BoardApi> RemoteClient<A> {
    pub fn new(api: A, board_id: BoardId, config: SyncConfig) -> TimelineResult<Self> {
        Ok(Self {
            api,
            board_id,
            config: config.validate()?,
            board: None,
        })
    }

    #[must_use]
    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// Board metadata from the last successful [`Self::fetch_board`].
    #[must_use]
    pub fn board(&self) -> Option<&BoardMeta> {
        self.board.as_ref()
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(self.config)
    }

    fn loaded_board(&self) -> TimelineResult<&BoardMeta> {
        self.board.as_ref().ok_or_else(|| {
            TimelineError::Validation("board metadata has not been loaded".to_owned())
        })
    }

    pub async fn fetch_board(&mut self) -> TimelineResult<BoardMeta> {
        let meta = with_retry(self.retry_policy(), "board", || self.api.board(&self.board_id)).await?;
        debug!(
            board = %self.board_id.as_str(),
            columns = meta.columns.len(),
            groups = meta.groups.len(),
            "fetched board metadata"
        );
        self.board = Some(meta.clone());
        Ok(meta)
    }

    pub async fn fetch_all(&self) -> TimelineResult<Vec<RawItem>> {
        self.fetch_all_with_progress(|_| {}).await
    }

    /// Reads every item page, strictly in cursor order.
    ///
    /// A page that fails all retries fails the whole fetch; no partial result
    /// is returned.
    pub async fn fetch_all_with_progress<P>(&self, mut progress: P) -> TimelineResult<Vec<RawItem>>
    where
        P: FnMut(PageProgress),
    {
        let policy = self.retry_policy();
        let mut items = Vec::new();
        let mut cursor: Option<Cursor> = None;
        let mut page = 0;

        loop {
            page += 1;
            let current = cursor.take();
            let fetched = with_retry(policy, "items_page", || {
                self.api
                    .items_page(&self.board_id, self.config.page_size, current.as_ref())
            })
            .await
            .inspect_err(|err| warn!(page, error = %err, "item page fetch failed"))?;

            let page_items = fetched.items.len();
            items.extend(fetched.items);
            cursor = fetched.cursor;
            let has_more = cursor.is_some();
            trace!(page, page_items, total = items.len(), has_more, "fetched item page");
            progress(PageProgress {
                page,
                page_items,
                total_items: items.len(),
                has_more,
            });

            if !has_more {
                break;
            }
            tokio::time::sleep(self.config.page_delay()).await;
        }

        debug!(pages = page, items = items.len(), "fetched all items");
        Ok(items)
    }

    pub async fn commit_dates(
        &self,
        item_id: &ItemId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> TimelineResult<()> {
        validate_date_range(start, end)?;
        let target = DateColumnTarget::resolve(self.loaded_board()?, start, end)?;
        debug!(
            item = %item_id,
            column = target.column_id(),
            %start,
            %end,
            "commit dates"
        );
        self.api
            .change_column_value(
                &self.board_id,
                item_id,
                target.column_id(),
                &target.write(start, end),
            )
            .await
    }

    pub async fn commit_group(&self, item_id: &ItemId, group_id: &GroupId) -> TimelineResult<()> {
        debug!(item = %item_id, group = %group_id, "commit group");
        self.api.move_item_to_group(item_id, group_id).await
    }

    pub async fn commit_name(&self, item_id: &ItemId, name: &str) -> TimelineResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TimelineError::Validation(
                "item name must not be empty".to_owned(),
            ));
        }
        debug!(item = %item_id, "commit name");
        self.api.change_item_name(&self.board_id, item_id, name).await
    }

    pub async fn commit_assignees(
        &self,
        item_id: &ItemId,
        persons: &[PersonId],
    ) -> TimelineResult<()> {
        let column = self
            .loaded_board()?
            .first_column_of(PEOPLE_COLUMN_KINDS)
            .ok_or_else(|| TimelineError::Validation("board has no people column".to_owned()))?;
        debug!(item = %item_id, count = persons.len(), "commit assignees");
        self.api
            .change_column_value(
                &self.board_id,
                item_id,
                &column.id,
                &ColumnWrite::People {
                    persons: persons.to_vec(),
                },
            )
            .await
    }

    pub async fn commit_create(&self, item: &NewItem) -> TimelineResult<ItemId> {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(TimelineError::Validation(
                "item name must not be empty".to_owned(),
            ));
        }
        let end = item.end_date.unwrap_or(item.start_date);
        validate_date_range(item.start_date, end)?;

        let meta = self.loaded_board()?;
        let mut values = ColumnValues::new();
        if let Some(date) = meta.first_column_of(DATE_COLUMN_KINDS) {
            values.insert(
                date.id.clone(),
                ColumnWrite::Date {
                    date: item.start_date,
                }
                .to_value(),
            );
        }
        if let Some(range) = meta.first_column_of(RANGE_COLUMN_KINDS) {
            values.insert(
                range.id.clone(),
                ColumnWrite::Range {
                    from: item.start_date,
                    to: end,
                }
                .to_value(),
            );
        }
        if values.is_empty() {
            return Err(TimelineError::Validation(
                "board has no date or timeline column".to_owned(),
            ));
        }

        let id = self
            .api
            .create_item(&self.board_id, &item.group_id, name, &values)
            .await?;
        debug!(item = %id, group = %item.group_id, "created item");
        Ok(id)
    }

    pub async fn commit_create_group(&self, title: &str) -> TimelineResult<BoardGroup> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TimelineError::Validation(
                "group title must not be empty".to_owned(),
            ));
        }
        let group = self.api.create_group(&self.board_id, title).await?;
        debug!(group = %group.id, "created group");
        Ok(group)
    }

    /// Applies a patch, one remote mutation per changed attribute.
    pub async fn commit_update_group(
        &self,
        group_id: &GroupId,
        patch: &GroupPatch,
    ) -> TimelineResult<BoardGroup> {
        let updates = [
            (GroupAttribute::Title, patch.title.as_deref()),
            (GroupAttribute::Color, patch.color.as_deref()),
        ];
        let mut last = None;
        for (attribute, value) in updates {
            let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            debug!(group = %group_id, attribute = attribute.as_str(), "commit group attribute");
            last = Some(
                self.api
                    .update_group(&self.board_id, group_id, attribute, value)
                    .await?,
            );
        }
        last.ok_or_else(|| {
            TimelineError::Validation("group update needs a title or a color".to_owned())
        })
    }

    /// Deletes a group after re-reading the remote group count.
    ///
    /// The check uses the live count rather than the local mirror, so a
    /// stale local list cannot delete the last group.
    pub async fn commit_delete_group(&self, group_id: &GroupId) -> TimelineResult<()> {
        let groups = with_retry(self.retry_policy(), "groups", || {
            self.api.groups(&self.board_id)
        })
        .await?;
        if groups.len() <= 1 {
            warn!(group = %group_id, "refusing to delete the last group");
            return Err(TimelineError::LastGroup);
        }
        debug!(group = %group_id, remaining = groups.len() - 1, "delete group");
        self.api.delete_group(&self.board_id, group_id).await
    }
}

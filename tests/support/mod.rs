#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use chrono::NaiveDate;
use serde_json::json;
use timeline_sync::api::TimelineEngine;
use timeline_sync::config::{GestureConfig, TimelineConfig};
use timeline_sync::core::{GroupId, ItemId, TimeScale, TimeScaleConfig};
use timeline_sync::error::{TimelineError, TimelineResult};
use timeline_sync::remote::{
    BoardApi, BoardColumn, BoardGroup, BoardId, BoardMeta, ColumnValues, ColumnWrite, Cursor,
    GroupAttribute, ItemsPage, RawColumnValue, RawGroupRef, RawItem,
};

/// Mutation observed by the fake board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ColumnValue {
        item_id: ItemId,
        column_id: String,
        value: ColumnWrite,
    },
    Name {
        item_id: ItemId,
        name: String,
    },
    Move {
        item_id: ItemId,
        group_id: GroupId,
    },
    CreateItem {
        group_id: GroupId,
        name: String,
    },
    CreateGroup {
        title: String,
    },
    UpdateGroup {
        group_id: GroupId,
        attribute: GroupAttribute,
        value: String,
    },
    DeleteGroup {
        group_id: GroupId,
    },
}

/// In-memory board that serves scripted pages and records writes.
#[derive(Debug, Default)]
pub struct FakeBoard {
    pub meta: RefCell<BoardMeta>,
    pub pages: RefCell<Vec<Vec<RawItem>>>,
    pub read_failures: RefCell<VecDeque<TimelineError>>,
    pub write_outcomes: RefCell<VecDeque<Option<TimelineError>>>,
    pub calls: RefCell<Vec<Call>>,
    pub page_requests: Cell<usize>,
    pub next_id: Cell<u64>,
}

impl FakeBoard {
    pub fn new(items: Vec<RawItem>) -> Self {
        let board = Self {
            meta: RefCell::new(standard_meta()),
            next_id: Cell::new(1_000),
            ..Self::default()
        };
        board.pages.borrow_mut().push(items);
        board
    }

    pub fn paged(pages: Vec<Vec<RawItem>>) -> Self {
        let board = Self::new(Vec::new());
        *board.pages.borrow_mut() = pages;
        board
    }

    pub fn fail_next_read(&self, error: TimelineError) {
        self.read_failures.borrow_mut().push_back(error);
    }

    pub fn fail_next_write(&self, error: TimelineError) {
        self.write_outcomes.borrow_mut().push_back(Some(error));
    }

    /// Lets one write through ahead of a queued failure.
    pub fn pass_next_write(&self) {
        self.write_outcomes.borrow_mut().push_back(None);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn take_read_failure(&self) -> TimelineResult<()> {
        match self.read_failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn record(&self, call: Call) -> TimelineResult<()> {
        self.calls.borrow_mut().push(call);
        match self.write_outcomes.borrow_mut().pop_front().flatten() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl BoardApi for FakeBoard {
    async fn board(&self, _board_id: &BoardId) -> TimelineResult<BoardMeta> {
        self.take_read_failure()?;
        Ok(self.meta.borrow().clone())
    }

    async fn items_page(
        &self,
        _board_id: &BoardId,
        _limit: usize,
        cursor: Option<&Cursor>,
    ) -> TimelineResult<ItemsPage> {
        self.page_requests.set(self.page_requests.get() + 1);
        self.take_read_failure()?;
        let index = match cursor {
            Some(cursor) => cursor
                .0
                .parse::<usize>()
                .map_err(|err| TimelineError::Remote(err.to_string()))?,
            None => 0,
        };
        let pages = self.pages.borrow();
        let items = pages.get(index).cloned().unwrap_or_default();
        let cursor = (index + 1 < pages.len()).then(|| Cursor((index + 1).to_string()));
        Ok(ItemsPage { cursor, items })
    }

    async fn groups(&self, _board_id: &BoardId) -> TimelineResult<Vec<BoardGroup>> {
        self.take_read_failure()?;
        Ok(self.meta.borrow().groups.clone())
    }

    async fn change_column_value(
        &self,
        _board_id: &BoardId,
        item_id: &ItemId,
        column_id: &str,
        value: &ColumnWrite,
    ) -> TimelineResult<()> {
        self.record(Call::ColumnValue {
            item_id: item_id.clone(),
            column_id: column_id.to_owned(),
            value: value.clone(),
        })
    }

    async fn change_item_name(
        &self,
        _board_id: &BoardId,
        item_id: &ItemId,
        name: &str,
    ) -> TimelineResult<()> {
        self.record(Call::Name {
            item_id: item_id.clone(),
            name: name.to_owned(),
        })
    }

    async fn move_item_to_group(&self, item_id: &ItemId, group_id: &GroupId) -> TimelineResult<()> {
        self.record(Call::Move {
            item_id: item_id.clone(),
            group_id: group_id.clone(),
        })
    }

    async fn create_item(
        &self,
        _board_id: &BoardId,
        group_id: &GroupId,
        name: &str,
        _column_values: &ColumnValues,
    ) -> TimelineResult<ItemId> {
        self.record(Call::CreateItem {
            group_id: group_id.clone(),
            name: name.to_owned(),
        })?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(ItemId::new(id.to_string()))
    }

    async fn create_group(&self, _board_id: &BoardId, title: &str) -> TimelineResult<BoardGroup> {
        self.record(Call::CreateGroup {
            title: title.to_owned(),
        })?;
        let group = BoardGroup {
            id: GroupId::new(format!("new_{}", self.meta.borrow().groups.len())),
            title: title.to_owned(),
            color: "#579BFC".to_owned(),
        };
        self.meta.borrow_mut().groups.push(group.clone());
        Ok(group)
    }

    async fn update_group(
        &self,
        _board_id: &BoardId,
        group_id: &GroupId,
        attribute: GroupAttribute,
        value: &str,
    ) -> TimelineResult<BoardGroup> {
        self.record(Call::UpdateGroup {
            group_id: group_id.clone(),
            attribute,
            value: value.to_owned(),
        })?;
        let mut meta = self.meta.borrow_mut();
        let group = meta
            .groups
            .iter_mut()
            .find(|group| &group.id == group_id)
            .ok_or_else(|| TimelineError::Remote(format!("no group {group_id}")))?;
        match attribute {
            GroupAttribute::Title => group.title = value.to_owned(),
            GroupAttribute::Color => group.color = value.to_owned(),
        }
        Ok(group.clone())
    }

    async fn delete_group(&self, _board_id: &BoardId, group_id: &GroupId) -> TimelineResult<()> {
        self.record(Call::DeleteGroup {
            group_id: group_id.clone(),
        })?;
        self.meta.borrow_mut().groups.retain(|group| &group.id != group_id);
        Ok(())
    }
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

pub fn standard_meta() -> BoardMeta {
    BoardMeta {
        id: Some("42".to_owned()),
        name: Some("Roadmap".to_owned()),
        columns: vec![
            BoardColumn {
                id: "timeline".to_owned(),
                title: "Timeline".to_owned(),
                kind: "timeline".to_owned(),
                settings_str: None,
            },
            BoardColumn {
                id: "people".to_owned(),
                title: "Owner".to_owned(),
                kind: "people".to_owned(),
                settings_str: None,
            },
        ],
        groups: vec![board_group("g1", "Planned"), board_group("g2", "Doing")],
    }
}

pub fn board_group(id: &str, title: &str) -> BoardGroup {
    BoardGroup {
        id: GroupId::new(id),
        title: title.to_owned(),
        color: "#579BFC".to_owned(),
    }
}

pub fn raw_item(id: &str, group: &str, from: &str, to: &str) -> RawItem {
    RawItem {
        id: ItemId::new(id),
        name: format!("Item {id}"),
        group: Some(RawGroupRef {
            id: GroupId::new(group),
            title: None,
            color: None,
        }),
        column_values: vec![RawColumnValue {
            id: "timeline".to_owned(),
            kind: "timeline".to_owned(),
            text: Some(format!("{from} - {to}")),
            value: Some(json!({ "from": from, "to": to }).to_string()),
        }],
    }
}

/// Engine over `board` showing 2025 at 5 px/day.
///
/// The edge margin is narrowed so the middle of a 4-day bar is a move zone.
pub fn engine(board: &FakeBoard) -> TimelineEngine<&FakeBoard> {
    let config = TimelineConfig {
        gesture: GestureConfig {
            edge_margin_px: 5.0,
            ..GestureConfig::default()
        },
        ..TimelineConfig::default()
    };
    let scale = TimeScale::for_year(2025, TimeScaleConfig::default()).expect("2025 scale");
    TimelineEngine::with_time_scale(board, BoardId::new("42"), config, scale).expect("engine")
}

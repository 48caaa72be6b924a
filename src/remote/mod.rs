//! Remote board access: the [`BoardApi`] seam, retry policy, GraphQL
//! encoding and the paginating [`RemoteClient`].

pub mod client;
pub mod graphql;
#[cfg(feature = "http-transport")]
pub mod http;
pub mod retry;
pub mod session;
pub mod wire;

use crate::core::{GroupId, ItemId};
use crate::error::TimelineResult;

pub use client::{DateColumnTarget, GroupPatch, PageProgress, RemoteClient};
pub use graphql::{GraphQlBoardApi, GraphQlError, GraphQlRequest, GraphQlResponse, GraphQlTransport};
#[cfg(feature = "http-transport")]
pub use http::HttpTransport;
pub use retry::{RetryPolicy, with_retry};
pub use wire::{
    BoardColumn, BoardGroup, BoardId, BoardMeta, ColumnValues, ColumnWrite, Cursor,
    GroupAttribute, ItemsPage, NewItem, RawColumnValue, RawGroupRef, RawItem,
};

/// Typed operations offered by the remote system of record.
///
/// Every call is one request; retries and pagination live in
/// [`RemoteClient`]. Futures are not required to be `Send`: the engine runs
/// on a single task.
#[allow(async_fn_in_trait)]
pub trait BoardApi {
    async fn board(&self, board_id: &BoardId) -> TimelineResult<BoardMeta>;

    async fn items_page(
        &self,
        board_id: &BoardId,
        limit: usize,
        cursor: Option<&Cursor>,
    ) -> TimelineResult<ItemsPage>;

    async fn groups(&self, board_id: &BoardId) -> TimelineResult<Vec<BoardGroup>>;

    async fn change_column_value(
        &self,
        board_id: &BoardId,
        item_id: &ItemId,
        column_id: &str,
        value: &ColumnWrite,
    ) -> TimelineResult<()>;

    async fn change_item_name(
        &self,
        board_id: &BoardId,
        item_id: &ItemId,
        name: &str,
    ) -> TimelineResult<()>;

    async fn move_item_to_group(&self, item_id: &ItemId, group_id: &GroupId) -> TimelineResult<()>;

    async fn create_item(
        &self,
        board_id: &BoardId,
        group_id: &GroupId,
        name: &str,
        column_values: &ColumnValues,
    ) -> TimelineResult<ItemId>;

    async fn create_group(&self, board_id: &BoardId, title: &str) -> TimelineResult<BoardGroup>;

    async fn update_group(
        &self,
        board_id: &BoardId,
        group_id: &GroupId,
        attribute: GroupAttribute,
        value: &str,
    ) -> TimelineResult<BoardGroup>;

    async fn delete_group(&self, board_id: &BoardId, group_id: &GroupId) -> TimelineResult<()>;
}

impl<A: BoardApi> BoardApi for &A {
    async fn board(&self, board_id: &BoardId) -> TimelineResult<BoardMeta> {
        (**self).board(board_id).await
    }

    async fn items_page(
        &self,
        board_id: &BoardId,
        limit: usize,
        cursor: Option<&Cursor>,
    ) -> TimelineResult<ItemsPage> {
        (**self).items_page(board_id, limit, cursor).await
    }

    async fn groups(&self, board_id: &BoardId) -> TimelineResult<Vec<BoardGroup>> {
        (**self).groups(board_id).await
    }

    async fn change_column_value(
        &self,
        board_id: &BoardId,
        item_id: &ItemId,
        column_id: &str,
        value: &ColumnWrite,
    ) -> TimelineResult<()> {
        (**self)
            .change_column_value(board_id, item_id, column_id, value)
            .await
    }

    async fn change_item_name(
        &self,
        board_id: &BoardId,
        item_id: &ItemId,
        name: &str,
    ) -> TimelineResult<()> {
        (**self).change_item_name(board_id, item_id, name).await
    }

    async fn move_item_to_group(&self, item_id: &ItemId, group_id: &GroupId) -> TimelineResult<()> {
        (**self).move_item_to_group(item_id, group_id).await
    }

    async fn create_item(
        &self,
        board_id: &BoardId,
        group_id: &GroupId,
        name: &str,
        column_values: &ColumnValues,
    ) -> TimelineResult<ItemId> {
        (**self)
            .create_item(board_id, group_id, name, column_values)
            .await
    }

    async fn create_group(&self, board_id: &BoardId, title: &str) -> TimelineResult<BoardGroup> {
        (**self).create_group(board_id, title).await
    }

    async fn update_group(
        &self,
        board_id: &BoardId,
        group_id: &GroupId,
        attribute: GroupAttribute,
        value: &str,
    ) -> TimelineResult<BoardGroup> {
        (**self)
            .update_group(board_id, group_id, attribute, value)
            .await
    }

    async fn delete_group(&self, board_id: &BoardId, group_id: &GroupId) -> TimelineResult<()> {
        (**self).delete_group(board_id, group_id).await
    }
}

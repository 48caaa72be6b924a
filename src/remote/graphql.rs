//! GraphQL encoding of [`BoardApi`] on top of a pluggable transport.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{trace, warn};

use crate::core::{GroupId, ItemId};
use crate::error::{TimelineError, TimelineResult};

use super::BoardApi;
use super::wire::{
    BoardGroup, BoardId, BoardMeta, ColumnValues, ColumnWrite, Cursor, GroupAttribute, ItemsPage,
};

const BOARD_QUERY: &str = "query ($boardId: [ID!]) {
  boards(ids: $boardId) {
    id
    name
    columns { id title type settings_str }
    groups { id title color }
  }
}";

const ITEMS_PAGE_QUERY: &str = "query ($boardId: [ID!], $limit: Int!, $cursor: String) {
  boards(ids: $boardId) {
    items_page(limit: $limit, cursor: $cursor) {
      cursor
      items {
        id
        name
        group { id title color }
        column_values { id type text value }
      }
    }
  }
}";

const GROUPS_QUERY: &str = "query ($boardId: [ID!]) {
  boards(ids: $boardId) { groups { id title color } }
}";

const CHANGE_COLUMN_VALUE_MUTATION: &str =
    "mutation ($boardId: ID!, $itemId: ID!, $columnId: String!, $value: JSON!) {
  change_column_value(board_id: $boardId, item_id: $itemId, column_id: $columnId, value: $value) { id }
}";

const CHANGE_NAME_MUTATION: &str =
    "mutation ($boardId: ID!, $itemId: ID!, $columnId: String!, $value: String!) {
  change_simple_column_value(board_id: $boardId, item_id: $itemId, column_id: $columnId, value: $value) { id name }
}";

const MOVE_ITEM_MUTATION: &str = "mutation ($itemId: ID!, $groupId: String!) {
  move_item_to_group(item_id: $itemId, group_id: $groupId) { id }
}";

const CREATE_ITEM_MUTATION: &str =
    "mutation ($boardId: ID!, $groupId: String!, $itemName: String!, $columnValues: JSON!) {
  create_item(board_id: $boardId, group_id: $groupId, item_name: $itemName, column_values: $columnValues) { id name }
}";

const CREATE_GROUP_MUTATION: &str = "mutation ($boardId: ID!, $groupName: String!) {
  create_group(board_id: $boardId, group_name: $groupName) { id title color }
}";

const UPDATE_GROUP_MUTATION: &str = "mutation ($boardId: ID!, $groupId: String!, $groupAttribute: GroupAttributes!, $newValue: String!) {
  update_group(board_id: $boardId, group_id: $groupId, group_attribute: $groupAttribute, new_value: $newValue) { id title color }
}";

const DELETE_GROUP_MUTATION: &str = "mutation ($boardId: ID!, $groupId: String!) {
  delete_group(board_id: $boardId, group_id: $groupId) { id deleted }
}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: Value,
}

impl GraphQlRequest {
    #[must_use]
    pub fn new(query: &str, variables: Value) -> Self {
        Self {
            query: query.to_owned(),
            variables,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphQlErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphQlErrorExtensions>,
}

impl GraphQlError {
    fn classify(&self) -> TimelineError {
        let code = self
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.code.as_deref());
        TimelineError::classify_remote(code, &self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// Folds several GraphQL errors into one, authorization first, then rate limits.
fn fold_errors(errors: &[GraphQlError]) -> TimelineError {
    let classified: Vec<TimelineError> = errors.iter().map(GraphQlError::classify).collect();
    if let Some(auth) = classified.iter().find(|err| err.is_authorization()) {
        return auth.clone();
    }
    if let Some(limited) = classified.iter().find(|err| err.is_rate_limit()) {
        return limited.clone();
    }
    let joined = errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    TimelineError::Remote(format!("GraphQL error: {joined}"))
}

/// Sends one GraphQL document and returns the decoded envelope.
#[allow(async_fn_in_trait)]
pub trait GraphQlTransport {
    async fn execute(&self, request: &GraphQlRequest) -> TimelineResult<GraphQlResponse>;
}

impl<T: GraphQlTransport> GraphQlTransport for &T {
    async fn execute(&self, request: &GraphQlRequest) -> TimelineResult<GraphQlResponse> {
        (**self).execute(request).await
    }
}

#[derive(Debug, Clone)]
pub struct GraphQlBoardApi<T> {
    transport: T,
}

impl<T: GraphQlTransport> GraphQlBoardApi<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read path: errors alongside usable data are logged and tolerated.
    async fn query(&self, query: &str, variables: Value) -> TimelineResult<Value> {
        let response = self
            .transport
            .execute(&GraphQlRequest::new(query, variables))
            .await?;
        match response.data {
            Some(data) if !data.is_null() => {
                if !response.errors.is_empty() {
                    warn!(
                        errors = response.errors.len(),
                        "graphql errors alongside data, continuing"
                    );
                }
                Ok(data)
            }
            _ if !response.errors.is_empty() => Err(fold_errors(&response.errors)),
            _ => Err(TimelineError::Remote("GraphQL response had no data".to_owned())),
        }
    }

    /// Write path: any reported error fails the mutation.
    async fn mutate(&self, query: &str, variables: Value) -> TimelineResult<Value> {
        let response = self
            .transport
            .execute(&GraphQlRequest::new(query, variables))
            .await?;
        if !response.errors.is_empty() {
            return Err(fold_errors(&response.errors));
        }
        trace!("graphql mutation acknowledged");
        Ok(response.data.unwrap_or(Value::Null))
    }
}

fn decode_at<D: DeserializeOwned>(data: &Value, pointer: &str) -> TimelineResult<D> {
    let node = data
        .pointer(pointer)
        .filter(|node| !node.is_null())
        .ok_or_else(|| TimelineError::Remote(format!("response is missing `{pointer}`")))?;
    serde_json::from_value(node.clone())
        .map_err(|e| TimelineError::InvalidData(format!("failed to decode `{pointer}`: {e}")))
}

fn encode_json(value: &impl Serialize) -> TimelineResult<String> {
    serde_json::to_string(value)
        .map_err(|e| TimelineError::InvalidData(format!("failed to encode column value: {e}")))
}

impl<T: GraphQlTransport> BoardApi for GraphQlBoardApi<T> {
    async fn board(&self, board_id: &BoardId) -> TimelineResult<BoardMeta> {
        let data = self
            .query(BOARD_QUERY, json!({ "boardId": [board_id.as_str()] }))
            .await?;
        decode_at(&data, "/boards/0")
    }

    async fn items_page(
        &self,
        board_id: &BoardId,
        limit: usize,
        cursor: Option<&Cursor>,
    ) -> TimelineResult<ItemsPage> {
        let mut variables = json!({ "boardId": [board_id.as_str()], "limit": limit });
        if let Some(cursor) = cursor {
            variables["cursor"] = Value::String(cursor.0.clone());
        }
        let data = self.query(ITEMS_PAGE_QUERY, variables).await?;
        if data.pointer("/boards/0/items_page").is_none_or(Value::is_null) {
            return Ok(ItemsPage::default());
        }
        decode_at(&data, "/boards/0/items_page")
    }

    async fn groups(&self, board_id: &BoardId) -> TimelineResult<Vec<BoardGroup>> {
        let data = self
            .query(GROUPS_QUERY, json!({ "boardId": [board_id.as_str()] }))
            .await?;
        if data.pointer("/boards/0/groups").is_none_or(Value::is_null) {
            return Ok(Vec::new());
        }
        decode_at(&data, "/boards/0/groups")
    }

    async fn change_column_value(
        &self,
        board_id: &BoardId,
        item_id: &ItemId,
        column_id: &str,
        value: &ColumnWrite,
    ) -> TimelineResult<()> {
        let encoded = encode_json(&value.to_value())?;
        self.mutate(
            CHANGE_COLUMN_VALUE_MUTATION,
            json!({
                "boardId": board_id.as_str(),
                "itemId": item_id.as_str(),
                "columnId": column_id,
                "value": encoded,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn change_item_name(
        &self,
        board_id: &BoardId,
        item_id: &ItemId,
        name: &str,
    ) -> TimelineResult<()> {
        self.mutate(
            CHANGE_NAME_MUTATION,
            json!({
                "boardId": board_id.as_str(),
                "itemId": item_id.as_str(),
                "columnId": "name",
                "value": name,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn move_item_to_group(&self, item_id: &ItemId, group_id: &GroupId) -> TimelineResult<()> {
        self.mutate(
            MOVE_ITEM_MUTATION,
            json!({ "itemId": item_id.as_str(), "groupId": group_id.as_str() }),
        )
        .await
        .map(|_| ())
    }

    async fn create_item(
        &self,
        board_id: &BoardId,
        group_id: &GroupId,
        name: &str,
        column_values: &ColumnValues,
    ) -> TimelineResult<ItemId> {
        let data = self
            .mutate(
                CREATE_ITEM_MUTATION,
                json!({
                    "boardId": board_id.as_str(),
                    "groupId": group_id.as_str(),
                    "itemName": name,
                    "columnValues": encode_json(column_values)?,
                }),
            )
            .await?;
        decode_at(&data, "/create_item/id")
    }

    async fn create_group(&self, board_id: &BoardId, title: &str) -> TimelineResult<BoardGroup> {
        let data = self
            .mutate(
                CREATE_GROUP_MUTATION,
                json!({ "boardId": board_id.as_str(), "groupName": title }),
            )
            .await?;
        decode_at(&data, "/create_group")
    }

    async fn update_group(
        &self,
        board_id: &BoardId,
        group_id: &GroupId,
        attribute: GroupAttribute,
        value: &str,
    ) -> TimelineResult<BoardGroup> {
        let data = self
            .mutate(
                UPDATE_GROUP_MUTATION,
                json!({
                    "boardId": board_id.as_str(),
                    "groupId": group_id.as_str(),
                    "groupAttribute": attribute.as_str(),
                    "newValue": value,
                }),
            )
            .await?;
        decode_at(&data, "/update_group")
    }

    async fn delete_group(&self, board_id: &BoardId, group_id: &GroupId) -> TimelineResult<()> {
        let data = self
            .mutate(
                DELETE_GROUP_MUTATION,
                json!({ "boardId": board_id.as_str(), "groupId": group_id.as_str() }),
            )
            .await?;
        if data.pointer("/delete_group").is_none_or(Value::is_null) {
            return Err(TimelineError::Remote("group deletion was not acknowledged".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: RefCell<Vec<GraphQlResponse>>,
        requests: RefCell<Vec<GraphQlRequest>>,
    }

    impl GraphQlTransport for ScriptedTransport {
        async fn execute(&self, request: &GraphQlRequest) -> TimelineResult<GraphQlResponse> {
            self.requests.borrow_mut().push(request.clone());
            Ok(self.responses.borrow_mut().remove(0))
        }
    }

    fn response(raw: Value) -> GraphQlResponse {
        serde_json::from_value(raw).expect("response")
    }

    #[tokio::test]
    async fn items_page_passes_cursor_and_decodes_page() {
        let transport = ScriptedTransport::default();
        transport.responses.borrow_mut().push(response(json!({
            "data": { "boards": [{ "items_page": {
                "cursor": "c2",
                "items": [{ "id": "1", "name": "a", "column_values": [] }]
            }}]}
        })));
        let api = GraphQlBoardApi::new(&transport);
        let page = api
            .items_page(&BoardId::new("b"), 500, Some(&Cursor("c1".to_owned())))
            .await
            .expect("page");
        assert_eq!(page.cursor, Some(Cursor("c2".to_owned())));
        assert_eq!(page.items.len(), 1);
        assert_eq!(transport.requests.borrow()[0].variables["cursor"], "c1");
    }

    #[tokio::test]
    async fn auth_error_without_data_is_authorization() {
        let transport = ScriptedTransport::default();
        transport.responses.borrow_mut().push(response(json!({
            "errors": [
                { "message": "boom" },
                { "message": "nope", "extensions": { "code": "authorization_error" } }
            ]
        })));
        let api = GraphQlBoardApi::new(&transport);
        let err = api.board(&BoardId::new("b")).await.expect_err("auth");
        assert!(err.is_authorization());
    }

    #[tokio::test]
    async fn mutation_errors_fail_even_with_data() {
        let transport = ScriptedTransport::default();
        transport.responses.borrow_mut().push(response(json!({
            "data": { "move_item_to_group": { "id": "1" } },
            "errors": [{ "message": "Complexity budget exhausted" }]
        })));
        let api = GraphQlBoardApi::new(&transport);
        let err = api
            .move_item_to_group(&ItemId::new("1"), &GroupId::new("g"))
            .await
            .expect_err("rate limit");
        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn column_value_is_sent_as_json_string() {
        let transport = ScriptedTransport::default();
        transport
            .responses
            .borrow_mut()
            .push(response(json!({ "data": { "change_column_value": { "id": "1" } } })));
        let api = GraphQlBoardApi::new(&transport);
        let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 11).expect("date");
        api.change_column_value(
            &BoardId::new("b"),
            &ItemId::new("1"),
            "date4",
            &ColumnWrite::Date { date },
        )
        .await
        .expect("mutation");
        let sent = transport.requests.borrow()[0].variables["value"].clone();
        assert_eq!(sent, Value::String(r#"{"date":"2025-03-11"}"#.to_owned()));
    }
}

//! Wire shapes of the board API, kept close to the JSON the remote returns.
//!
//! Column payloads stay as their raw JSON-encoded strings here; decoding
//! into typed values happens in [`crate::extract::column`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::core::{GroupId, ItemId, PersonId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(pub String);

impl BoardId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque continuation token; absence marks the end of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub settings_str: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardGroup {
    pub id: GroupId,
    pub title: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardMeta {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<BoardColumn>,
    #[serde(default)]
    pub groups: Vec<BoardGroup>,
}

impl BoardMeta {
    #[must_use]
    pub fn column(&self, id: &str) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.id == id)
    }

    #[must_use]
    pub fn first_column_of(&self, kinds: &[&str]) -> Option<&BoardColumn> {
        self.columns
            .iter()
            .find(|column| kinds.contains(&column.kind.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnValue {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    /// JSON document encoded as a string, as the remote sends it.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGroupRef {
    pub id: GroupId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub group: Option<RawGroupRef>,
    #[serde(default)]
    pub column_values: Vec<RawColumnValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemsPage {
    #[serde(default)]
    pub cursor: Option<Cursor>,
    #[serde(default)]
    pub items: Vec<RawItem>,
}

/// Value written by `change_column_value`, one variant per column kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnWrite {
    Range { from: NaiveDate, to: NaiveDate },
    Date { date: NaiveDate },
    People { persons: Vec<PersonId> },
}

impl ColumnWrite {
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Range { from, to } => json!({
                "from": from.format("%Y-%m-%d").to_string(),
                "to": to.format("%Y-%m-%d").to_string(),
            }),
            Self::Date { date } => json!({ "date": date.format("%Y-%m-%d").to_string() }),
            Self::People { persons } => json!({
                "personsAndTeams": persons
                    .iter()
                    .map(|person| json!({ "id": person.0, "kind": "person" }))
                    .collect::<Vec<_>>(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupAttribute {
    Title,
    Color,
}

impl GroupAttribute {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Color => "color",
        }
    }
}

/// Item to create remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub group_id: GroupId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Initial column values for `create_item`, keyed by column id.
pub type ColumnValues = Map<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn people_write_encodes_persons_and_teams() {
        let value = ColumnWrite::People {
            persons: vec![PersonId(7), PersonId(9)],
        }
        .to_value();
        assert_eq!(
            value,
            json!({ "personsAndTeams": [
                { "id": 7, "kind": "person" },
                { "id": 9, "kind": "person" }
            ]})
        );
    }

    #[test]
    fn items_page_accepts_null_cursor() {
        let page: ItemsPage =
            serde_json::from_str(r#"{"cursor": null, "items": []}"#).expect("page");
        assert!(page.cursor.is_none());
    }
}

//! Per-kind decoding of raw column payloads.
//!
//! Every recognised column kind has its own payload schema; anything that
//! does not match the schema of its kind decodes to `None` and is skipped by
//! the extractor.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::core::{PersonId, parse_iso_date};
use crate::remote::RawColumnValue;

/// Semantic role of a column, derived from its remote type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Range,
    Date,
    Status,
    People,
    Text,
}

impl ColumnKind {
    #[must_use]
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "timeline" | "timerange" => Self::Range,
            "date" => Self::Date,
            "status" | "color" => Self::Status,
            "people" | "person" => Self::People,
            _ => Self::Text,
        }
    }

    #[must_use]
    pub fn carries_dates(self) -> bool {
        matches!(self, Self::Range | Self::Date)
    }
}

#[derive(Debug, Deserialize)]
struct RangePayload {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatePayload {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonRef {
    id: u64,
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PeoplePayload {
    #[serde(default, rename = "personsAndTeams")]
    persons_and_teams: Vec<PersonRef>,
}

/// Decoded column content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    /// `to` is absent when the remote only stored a start.
    Range {
        from: NaiveDate,
        to: Option<NaiveDate>,
    },
    Date(NaiveDate),
    Status {
        index: Option<u32>,
        label: Option<String>,
    },
    People(Vec<PersonId>),
    Text(String),
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

impl ColumnValue {
    /// Decodes `raw` according to its kind.
    #[must_use]
    pub fn decode(raw: &RawColumnValue) -> Option<Self> {
        Self::decode_as(ColumnKind::from_type(&raw.kind), raw)
    }

    /// Decodes `raw` as `kind`, ignoring the type string it carries.
    #[must_use]
    pub fn decode_as(kind: ColumnKind, raw: &RawColumnValue) -> Option<Self> {
        let value = raw.value.as_deref().filter(|v| !v.trim().is_empty());
        match kind {
            ColumnKind::Range => {
                let payload: RangePayload = serde_json::from_str(value?).ok()?;
                let from = parse_iso_date(payload.from.as_deref()?)?;
                let to = payload.to.as_deref().and_then(parse_iso_date);
                Some(Self::Range { from, to })
            }
            ColumnKind::Date => {
                let payload: DatePayload = serde_json::from_str(value?).ok()?;
                parse_iso_date(payload.date.as_deref()?).map(Self::Date)
            }
            ColumnKind::Status => {
                let text = non_empty(raw.text.clone());
                let payload = value.and_then(|v| serde_json::from_str::<StatusPayload>(v).ok());
                let (index, label) = match payload {
                    Some(payload) => (
                        payload.index,
                        non_empty(payload.label).or_else(|| non_empty(payload.text)),
                    ),
                    None => (None, None),
                };
                let label = label.or(text);
                if index.is_none() && label.is_none() {
                    return None;
                }
                Some(Self::Status { index, label })
            }
            ColumnKind::People => {
                let payload: PeoplePayload = serde_json::from_str(value?).ok()?;
                let persons = payload
                    .persons_and_teams
                    .into_iter()
                    .filter(|person| person.kind.as_deref() == Some("person"))
                    .map(|person| PersonId(person.id))
                    .collect();
                Some(Self::People(persons))
            }
            ColumnKind::Text => non_empty(raw.text.clone()).map(Self::Text),
        }
    }

    /// `(start, end)` for date-bearing variants.
    #[must_use]
    pub fn dates(&self) -> Option<(NaiveDate, Option<NaiveDate>)> {
        match self {
            Self::Range { from, to } => Some((*from, *to)),
            Self::Date(date) => Some((*date, None)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: &str, value: Option<&str>, text: Option<&str>) -> RawColumnValue {
        RawColumnValue {
            id: "c".to_owned(),
            kind: kind.to_owned(),
            text: text.map(str::to_owned),
            value: value.map(str::to_owned),
        }
    }

    fn d(raw: &str) -> NaiveDate {
        parse_iso_date(raw).expect("date")
    }

    #[test]
    fn range_decodes_from_and_optional_to() {
        let value = ColumnValue::decode(&raw(
            "timeline",
            Some(r#"{"from":"2025-03-01","to":"2025-03-05","changed_at":"x"}"#),
            None,
        ));
        assert_eq!(
            value,
            Some(ColumnValue::Range {
                from: d("2025-03-01"),
                to: Some(d("2025-03-05")),
            })
        );
        let open = ColumnValue::decode(&raw("timerange", Some(r#"{"from":"2025-03-01"}"#), None));
        assert_eq!(open.and_then(|v| v.dates()), Some((d("2025-03-01"), None)));
    }

    #[test]
    fn date_decodes_and_tolerates_time_suffix() {
        let value = ColumnValue::decode(&raw(
            "date",
            Some(r#"{"date":"2025-07-04","time":"10:00:00"}"#),
            None,
        ));
        assert_eq!(value, Some(ColumnValue::Date(d("2025-07-04"))));
        assert_eq!(ColumnValue::decode(&raw("date", Some(r#"{"date":"soon"}"#), None)), None);
    }

    #[test]
    fn status_prefers_payload_label_then_display_text() {
        let indexed = ColumnValue::decode(&raw("status", Some(r#"{"index":2}"#), Some("Done")));
        assert_eq!(
            indexed,
            Some(ColumnValue::Status {
                index: Some(2),
                label: Some("Done".to_owned()),
            })
        );
        let labelled = ColumnValue::decode(&raw("color", Some(r#"{"label":"Stuck"}"#), None));
        assert_eq!(
            labelled,
            Some(ColumnValue::Status {
                index: None,
                label: Some("Stuck".to_owned()),
            })
        );
        assert_eq!(ColumnValue::decode(&raw("status", None, None)), None);
    }

    #[test]
    fn people_keeps_only_person_references() {
        let value = ColumnValue::decode(&raw(
            "people",
            Some(r#"{"personsAndTeams":[{"id":4,"kind":"person"},{"id":9,"kind":"team"}]}"#),
            None,
        ));
        assert_eq!(value, Some(ColumnValue::People(vec![PersonId(4)])));
    }

    #[test]
    fn text_uses_display_text_and_malformed_json_is_skipped() {
        assert_eq!(
            ColumnValue::decode(&raw("long_text", None, Some(" notes "))),
            Some(ColumnValue::Text("notes".to_owned()))
        );
        assert_eq!(ColumnValue::decode(&raw("timeline", Some("{not json"), None)), None);
    }
}

//! Test records returned by the results service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One test run, passed through as the service sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestRecord(Map<String, Value>);

impl TestRecord {
    #[allow(dead_code)]
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field names in the order the service sent them
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for TestRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Records from the most recent successful fetch, in service order
pub type ResultSet = Vec<TestRecord>;

/// Body shapes the service answers with
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Page {
    Records(Vec<TestRecord>),
    Paginated {
        results: Vec<TestRecord>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl Page {
    pub(crate) fn into_parts(self) -> (Vec<TestRecord>, Option<String>) {
        match self {
            Page::Records(records) => (records, None),
            Page::Paginated { results, next } => (results, next.filter(|n| !n.is_empty())),
        }
    }
}

/// Column names across `records`, in first-seen order
pub fn columns(records: &[TestRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

/// Display text for a field value; strings unquoted, null empty
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Page, serde_json::Error> {
        serde_json::from_str(body)
    }

    #[test]
    fn test_bare_array() {
        let (records, next) = parse(r#"[{"id": 1}, {"id": 2, "bandwidth": 48.2}]"#)
            .unwrap()
            .into_parts();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), Some(&Value::from(1)));
        assert_eq!(records[1].get("bandwidth"), Some(&Value::from(48.2)));
        assert!(next.is_none());
    }

    #[test]
    fn test_paginated_envelope() {
        let (records, next) = parse(
            r#"{"count": 3, "next": "http://svc/nanopi/?page=2", "results": [{"id": 7}]}"#,
        )
        .unwrap()
        .into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(next.as_deref(), Some("http://svc/nanopi/?page=2"));

        let (_, next) = parse(r#"{"next": null, "results": []}"#).unwrap().into_parts();
        assert!(next.is_none());
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(parse(r#"{"detail": "oops"}"#).is_err());
        assert!(parse(r#"[1, 2, 3]"#).is_err());
        assert!(parse(r#"[{"id": 1}, "two"]"#).is_err());
        assert!(parse("<html></html>").is_err());
    }

    #[test]
    fn test_columns_first_seen_order() {
        let records: Vec<TestRecord> = serde_json::from_str(
            r#"[{"id": 1, "jitter": 0.4}, {"id": 2, "nanopi": 5, "jitter": 0.3}]"#,
        )
        .unwrap();
        assert_eq!(columns(&records), vec!["id", "jitter", "nanopi"]);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&Value::Null)), "");
        assert_eq!(cell_text(Some(&Value::from("up"))), "up");
        assert_eq!(cell_text(Some(&Value::from(12))), "12");
        assert_eq!(cell_text(Some(&serde_json::json!({"a": 1}))), r#"{"a":1}"#);
    }
}

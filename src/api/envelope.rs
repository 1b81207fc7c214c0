//! Normalization of list-endpoint response bodies
//!
//! The list endpoints answer in one of several shapes: a bare JSON array,
//! an object keyed by the collection name (or `data`), and either of those
//! with a `pagination`/`meta` block carrying page counters. Everything is
//! folded into [`Envelope`] before the pager looks at it.

use serde_json::{Map, Value};

use crate::model::scalar::value_as_id;

/// The two paginated collections the service exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Forms,
    Submissions,
}

impl Collection {
    /// Object key the records are listed under
    pub fn key(self) -> &'static str {
        match self {
            Self::Forms => "forms",
            Self::Submissions => "submissions",
        }
    }
}

/// Fallback record key when the collection key is absent
const DATA_KEY: &str = "data";

/// Keys that may carry page counters, in order of preference
const COUNTER_KEYS: &[&str] = &["pagination", "meta"];

/// One page of a list endpoint, normalized
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// The body was the record array itself
    Bare(Vec<Value>),
    /// Records under `field` with no page counters
    Keyed {
        field: &'static str,
        records: Vec<Value>,
    },
    /// Records with explicit page counters
    Paginated {
        records: Vec<Value>,
        page: u64,
        total_pages: u64,
    },
}

impl Envelope {
    /// Normalize a response body fetched for `requested_page`
    pub fn normalize(body: Value, collection: Collection, requested_page: u32) -> Self {
        match body {
            Value::Array(records) => Self::Bare(records),
            Value::Object(mut object) => {
                let (field, records) = take_records(&mut object, collection);
                match counters(&object, requested_page) {
                    Some((page, total_pages)) => Self::Paginated {
                        records,
                        page,
                        total_pages,
                    },
                    None => Self::Keyed { field, records },
                }
            }
            _ => Self::Bare(Vec::new()),
        }
    }

    pub fn records(&self) -> &[Value] {
        match self {
            Self::Bare(records) | Self::Keyed { records, .. } | Self::Paginated { records, .. } => {
                records
            }
        }
    }

    pub fn into_records(self) -> Vec<Value> {
        match self {
            Self::Bare(records) | Self::Keyed { records, .. } | Self::Paginated { records, .. } => {
                records
            }
        }
    }

    /// Whether another page may follow.
    ///
    /// Explicit counters decide when present; otherwise a full page implies
    /// there may be more.
    pub fn has_more(&self, per_page: u32) -> bool {
        match self {
            Self::Paginated {
                page, total_pages, ..
            } => page < total_pages,
            Self::Bare(records) | Self::Keyed { records, .. } => records.len() == per_page as usize,
        }
    }
}

fn take_records(object: &mut Map<String, Value>, collection: Collection) -> (&'static str, Vec<Value>) {
    for field in [collection.key(), DATA_KEY] {
        if let Some(Value::Array(records)) = object.remove(field) {
            return (field, records);
        }
    }
    (DATA_KEY, Vec::new())
}

fn counters(object: &Map<String, Value>, requested_page: u32) -> Option<(u64, u64)> {
    let block = COUNTER_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_object))?;
    let page = block
        .get("current_page")
        .and_then(value_as_id)
        .unwrap_or(u64::from(requested_page));
    let total_pages = block.get("total_pages").and_then(value_as_id).unwrap_or(1);
    Some((page, total_pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let envelope = Envelope::normalize(json!([{"id": 1}, {"id": 2}]), Collection::Submissions, 1);
        assert_eq!(envelope, Envelope::Bare(vec![json!({"id": 1}), json!({"id": 2})]));
        assert!(envelope.has_more(2));
        assert!(!envelope.has_more(3));
    }

    #[test]
    fn test_collection_key_before_data() {
        let envelope = Envelope::normalize(
            json!({"submissions": [{"id": 1}], "data": [{"id": 9}]}),
            Collection::Submissions,
            1,
        );
        assert_eq!(
            envelope,
            Envelope::Keyed {
                field: "submissions",
                records: vec![json!({"id": 1})]
            }
        );
    }

    #[test]
    fn test_data_fallback() {
        let envelope = Envelope::normalize(json!({"data": [{"id": 3}]}), Collection::Forms, 1);
        assert_eq!(
            envelope,
            Envelope::Keyed {
                field: "data",
                records: vec![json!({"id": 3})]
            }
        );
    }

    #[test]
    fn test_forms_key() {
        let envelope = Envelope::normalize(json!({"forms": [{"id": 3}]}), Collection::Forms, 1);
        assert_eq!(envelope.records(), &[json!({"id": 3})]);
    }

    #[test]
    fn test_pagination_counters() {
        let envelope = Envelope::normalize(
            json!({"submissions": [{"id": 1}], "pagination": {"current_page": 2, "total_pages": 3}}),
            Collection::Submissions,
            2,
        );
        assert_eq!(
            envelope,
            Envelope::Paginated {
                records: vec![json!({"id": 1})],
                page: 2,
                total_pages: 3
            }
        );
        assert!(envelope.has_more(100));
    }

    #[test]
    fn test_meta_counters_and_defaults() {
        // missing current_page falls back to the requested page, total to 1
        let envelope = Envelope::normalize(
            json!({"data": [], "meta": {"total_pages": "4"}}),
            Collection::Forms,
            4,
        );
        assert_eq!(
            envelope,
            Envelope::Paginated {
                records: vec![],
                page: 4,
                total_pages: 4
            }
        );
        assert!(!envelope.has_more(100));

        let envelope = Envelope::normalize(json!({"forms": [], "meta": {}}), Collection::Forms, 1);
        assert!(!envelope.has_more(0));
    }

    #[test]
    fn test_pagination_preferred_over_meta() {
        let envelope = Envelope::normalize(
            json!({
                "data": [],
                "pagination": {"current_page": 1, "total_pages": 1},
                "meta": {"current_page": 1, "total_pages": 5}
            }),
            Collection::Submissions,
            1,
        );
        assert!(!envelope.has_more(100));
    }

    #[test]
    fn test_counters_override_page_fullness() {
        let envelope = Envelope::normalize(
            json!({"submissions": [{"id": 1}, {"id": 2}], "meta": {"current_page": 3, "total_pages": 3}}),
            Collection::Submissions,
            3,
        );
        assert!(!envelope.has_more(2));
    }

    #[test]
    fn test_unexpected_shapes_are_empty() {
        let envelope = Envelope::normalize(json!("oops"), Collection::Submissions, 1);
        assert!(envelope.records().is_empty());

        let envelope = Envelope::normalize(json!({"submissions": null}), Collection::Submissions, 1);
        assert!(envelope.records().is_empty());
    }
}

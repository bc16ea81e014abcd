//! Audit facts.
//!
//! A [`Fact`] is one immutable line of the audit trail. It is written once,
//! keyed by its id, to the history collection and never updated from here.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::platform::{Document, from_document, to_document};

/// One recorded event.
///
/// The timestamp travels as `occured` on the wire; consumers of the history
/// collection depend on that key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    #[serde(rename = "occured")]
    pub occurred: String,
    pub source: String,
    pub action: String,
    pub data: String,
}

impl Fact {
    /// A fresh fact: UUID v4 id, stamped now.
    pub fn new(source: impl Into<String>, action: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            occurred: occurred_now(),
            source: source.into(),
            action: action.into(),
            data: data.into(),
        }
    }

    /// `occurred` parsed back into a timestamp.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.occurred)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        to_document(self)
    }

    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        from_document(doc)
    }
}

static LAST_STAMP_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current UTC time as fixed-width RFC 3339 (`2024-05-01T12:00:00.123456Z`).
///
/// Never earlier than a stamp previously handed out in this process, even
/// if the wall clock steps back.
fn occurred_now() -> String {
    let now = Utc::now().timestamp_micros();
    let previous = LAST_STAMP_MICROS.fetch_max(now, Ordering::SeqCst);
    let stamp = DateTime::<Utc>::from_timestamp_micros(now.max(previous)).unwrap_or_default();
    stamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<String> = (0..1_000).map(|_| Fact::new("s", "a", "d").id).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn occurred_never_decreases() {
        let facts: Vec<Fact> = (0..500).map(|i| Fact::new("s", "a", i.to_string())).collect();
        for pair in facts.windows(2) {
            assert!(pair[0].occurred <= pair[1].occurred, "{} > {}", pair[0].occurred, pair[1].occurred);
            assert!(pair[0].occurred_at() <= pair[1].occurred_at());
        }
    }

    #[test]
    fn occurred_is_rfc3339_utc() {
        let fact = Fact::new("s", "a", "d");
        assert!(fact.occurred.ends_with('Z'));
        assert!(fact.occurred_at().is_some());
    }

    #[test]
    fn document_round_trip() {
        let fact = Fact::new("ping", "received event", r#"{"id":"t2"}"#);
        let doc = fact.to_document().unwrap();

        let mut keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["action", "data", "id", "occured", "source"]);

        assert_eq!(Fact::from_document(doc).unwrap(), fact);
    }
}

//! Ordered, in-memory store of generated summaries.
//!
//! Most-recent-first: `add` prepends, so the order is insertion order
//! reversed rather than a timestamp sort. Operations never error on
//! unknown ids and repeated deletes are no-ops.

use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::types::{SummaryDraft, SummaryRecord};

/// Thread-safe summary history shared across sessions.
pub struct HistoryStore {
    records: Mutex<Vec<SummaryRecord>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Restore a store from a previously persisted ordered sequence.
    pub fn from_records(records: Vec<SummaryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Append a new record built from synthesized fields.
    ///
    /// Assigns a fresh id, fills in `created_at` when the draft carries
    /// none, and prepends so the newest record lists first. Returns the
    /// assigned id.
    pub fn add(&self, draft: SummaryDraft) -> String {
        let record = SummaryRecord {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            file_name: draft.file_name,
            created_at: draft.created_at.unwrap_or_else(Utc::now),
            content: draft.content,
            key_points: draft.key_points,
            word_count: draft.word_count,
        };
        let id = record.id.clone();

        if let Ok(mut guard) = self.records.lock() {
            log::info!("HistoryStore: added {} ({})", id, record.file_name);
            guard.insert(0, record);
        }

        id
    }

    /// Remove a record if present. No-op for unknown ids.
    pub fn delete(&self, id: &str) {
        if let Ok(mut guard) = self.records.lock() {
            let before = guard.len();
            guard.retain(|r| r.id != id);
            if guard.len() < before {
                log::info!("HistoryStore: deleted {}", id);
            }
        }
    }

    /// Retitle a record. Silent no-op when the new title trims to empty
    /// or the id is unknown; otherwise the draft is stored as given.
    pub fn rename(&self, id: &str, new_title: &str) {
        if new_title.trim().is_empty() {
            log::debug!("HistoryStore: rejected empty title for {}", id);
            return;
        }
        if let Ok(mut guard) = self.records.lock() {
            if let Some(record) = guard.iter_mut().find(|r| r.id == id) {
                record.title = new_title.to_string();
                log::info!("HistoryStore: renamed {}", id);
            }
        }
    }

    /// Fetch a single record by id.
    pub fn get(&self, id: &str) -> Option<SummaryRecord> {
        self.records
            .lock()
            .ok()
            .and_then(|guard| guard.iter().find(|r| r.id == id).cloned())
    }

    /// Snapshot of the current membership and order.
    pub fn list(&self) -> Vec<SummaryRecord> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn draft(title: &str) -> SummaryDraft {
        SummaryDraft {
            title: title.to_string(),
            file_name: format!("{}.pdf", title),
            content: "Body text here".to_string(),
            key_points: vec!["One point".to_string()],
            word_count: 3,
            created_at: None,
        }
    }

    #[test]
    fn test_add_prepends_newest_first() {
        let store = HistoryStore::new();
        let first = store.add(draft("first"));
        let second = store.add(draft("second"));

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second);
        assert_eq!(list[1].id, first);
    }

    #[test]
    fn test_add_assigns_unique_ids_and_timestamp() {
        let store = HistoryStore::new();
        let a = store.add(draft("a"));
        let b = store.add(draft("b"));
        assert_ne!(a, b);
        assert!(store.get(&a).is_some());
    }

    #[test]
    fn test_add_keeps_provided_created_at() {
        let store = HistoryStore::new();
        let stamp = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut d = draft("stamped");
        d.created_at = Some(stamp);

        let id = store.add(d);
        assert_eq!(store.get(&id).unwrap().created_at, stamp);
    }

    #[test]
    fn test_delete_removes_record() {
        let store = HistoryStore::new();
        let id = store.add(draft("doomed"));
        store.delete(&id);
        assert!(store.get(&id).is_none());
        assert!(store.list().iter().all(|r| r.id != id));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = HistoryStore::new();
        let keep = store.add(draft("keep"));
        let gone = store.add(draft("gone"));

        store.delete(&gone);
        store.delete(&gone);
        store.delete("never-existed");

        assert_eq!(store.len(), 1);
        assert!(store.get(&keep).is_some());
    }

    #[test]
    fn test_rename_applies_new_title() {
        let store = HistoryStore::new();
        let id = store.add(draft("old"));
        store.rename(&id, "Renamed summary");
        assert_eq!(store.get(&id).unwrap().title, "Renamed summary");
    }

    #[test]
    fn test_rename_rejects_blank_titles() {
        let store = HistoryStore::new();
        let id = store.add(draft("original"));

        store.rename(&id, "");
        store.rename(&id, "   \t  ");

        assert_eq!(store.get(&id).unwrap().title, "original");
    }

    #[test]
    fn test_rename_unknown_id_is_noop() {
        let store = HistoryStore::new();
        store.add(draft("only"));
        store.rename("missing", "New title");
        assert_eq!(store.list()[0].title, "only");
    }

    #[test]
    fn test_round_trip_through_json() {
        let store = HistoryStore::new();
        store.add(draft("alpha"));
        store.add(draft("beta"));

        let snapshot = store.list();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: Vec<SummaryRecord> = serde_json::from_str(&json).unwrap();

        let rebuilt = HistoryStore::from_records(restored);
        assert_eq!(rebuilt.list(), snapshot);
    }

    #[test]
    fn test_len_and_is_empty() {
        let store = HistoryStore::new();
        assert!(store.is_empty());
        store.add(draft("one"));
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}

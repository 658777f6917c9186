//! Record store adapters
//!
//! The analytics core never writes to the store; it only asks for whole
//! collections and filters them in memory, the same way the portal's
//! dashboard queries do to avoid composite indexes.

use super::records::{Collection, Record};
use crate::error::{AnalyticsError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Read access to the portal's record collections
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every record in a collection. Order is unspecified.
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Record>>;
}

/// In-memory store with outage injection
///
/// Useful for embedding callers that already hold the records, and for tests
/// that need to count fetches or simulate an unreachable backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
    unavailable: RwLock<HashSet<Collection>>,
    fetches: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to a collection
    pub fn insert(&self, collection: Collection, records: impl IntoIterator<Item = Record>) {
        self.collections
            .write()
            .entry(collection)
            .or_default()
            .extend(records);
    }

    /// Replace a collection's contents
    pub fn replace(&self, collection: Collection, records: Vec<Record>) {
        self.collections.write().insert(collection, records);
    }

    /// Make fetches of `collection` fail with `StoreUnavailable`
    pub fn set_unavailable(&self, collection: Collection, unavailable: bool) {
        let mut down = self.unavailable.write();
        if unavailable {
            down.insert(collection);
        } else {
            down.remove(&collection);
        }
    }

    /// Total `fetch_all` calls served, including failed ones
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Record>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        if self.unavailable.read().contains(&collection) {
            return Err(AnalyticsError::store_unavailable(
                collection.as_str(),
                "backend unreachable",
            ));
        }

        Ok(self
            .collections
            .read()
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }
}

/// Store backed by a JSON export of the portal database
///
/// The file holds one object keyed by collection name, each value an array of
/// tagged records. The file is re-read on every fetch so that a fresh export
/// is picked up without restarting.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Record>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AnalyticsError::store_unavailable(
                collection.as_str(),
                format!("failed to read {}: {}", self.path.display(), e),
            )
        })?;

        let mut export: HashMap<String, serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| {
                AnalyticsError::store_unavailable(
                    collection.as_str(),
                    format!("malformed export {}: {}", self.path.display(), e),
                )
            })?;

        // Other top-level keys (export metadata, unrelated collections) may
        // hold anything; only the requested one must be an array.
        let section = match collection {
            Collection::Logs => export.remove("logs").or_else(|| export.remove("tasks")),
            other => export.remove(other.as_str()),
        };
        let documents = match section {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(documents)) => documents,
            Some(_) => {
                return Err(AnalyticsError::store_unavailable(
                    collection.as_str(),
                    format!("'{}' in {} is not an array", collection, self.path.display()),
                ))
            }
        };

        let total = documents.len();
        let records: Vec<Record> = documents
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<Record>(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(collection = %collection, error = %e, "Skipping undecodable document");
                    None
                }
            })
            .collect();

        debug!(
            collection = %collection,
            decoded = records.len(),
            total,
            "Loaded collection from JSON export"
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::records::{Task, TaskStatus};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_in_memory_store_fetch_and_count() {
        let store = InMemoryStore::new();
        store.insert(Collection::Logs, vec![Record::Task(Task::new("t1", "Agenda"))]);

        let logs = store.fetch_all(Collection::Logs).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(store.fetch_all(Collection::Users).await.unwrap().is_empty());
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_store_outage() {
        let store = InMemoryStore::new();
        store.set_unavailable(Collection::Events, true);

        let err = store.fetch_all(Collection::Events).await.unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::StoreUnavailable { ref collection, .. } if collection == "events"
        ));

        store.set_unavailable(Collection::Events, false);
        assert!(store.fetch_all(Collection::Events).await.is_ok());
    }

    #[tokio::test]
    async fn test_json_file_store_skips_bad_documents() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        std::fs::write(
            &path,
            r#"{
                "tasks": [
                    {"type": "task", "id": "t1", "status": "completed"},
                    {"type": "task", "id": "t2", "status": "archived"},
                    {"type": "payment", "id": "p1"}
                ],
                "users": [{"type": "user", "id": "u1", "name": "Mina"}]
            }"#,
        )
        .unwrap();

        let store = JsonFileStore::new(&path);
        let logs = store.fetch_all(Collection::Logs).await.unwrap();
        assert_eq!(logs.len(), 1);
        match &logs[0] {
            Record::Task(task) => assert_eq!(task.status, TaskStatus::Completed),
            other => panic!("Expected task, got {:?}", other),
        }

        assert_eq!(store.fetch_all(Collection::Users).await.unwrap().len(), 1);
        assert!(store.fetch_all(Collection::Events).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_file_store_missing_file_is_unavailable() {
        let temp_dir = tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("missing.json"));

        let err = store.fetch_all(Collection::Transactions).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::StoreUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_json_file_store_ignores_non_array_metadata() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        std::fs::write(
            &path,
            r#"{
                "exported_at": "2024-06-15T12:00:00Z",
                "meta": {"version": 3},
                "events": {"not": "a list"},
                "users": [{"type": "user", "id": "u1", "name": "Mina"}]
            }"#,
        )
        .unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.fetch_all(Collection::Users).await.unwrap().len(), 1);
        assert!(store.fetch_all(Collection::Logs).await.unwrap().is_empty());

        let err = store.fetch_all(Collection::Events).await.unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::StoreUnavailable { ref collection, .. } if collection == "events"
        ));
    }
}

//! In-memory result store
//!
//! Keyed registry of query records. Each record sits behind its own lock so
//! provider tasks of one query never contend with readers of another; reads
//! always hand out cloned snapshots.

pub mod archive;
mod export;

pub use export::{csv_row, render, ExportFormat};

use crate::analysis::AnalysisResult;
use crate::results::{ProviderResult, QueryId, QueryRecord};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors surfaced by store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("query {0} not found")]
    NotFound(QueryId),

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared store of query records
#[derive(Default)]
pub struct ResultStore {
    records: RwLock<HashMap<QueryId, Arc<RwLock<QueryRecord>>>>,
    archive_dir: Option<PathBuf>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write completed records as JSON files under `dir`
    pub fn with_archive_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.archive_dir = dir;
        self
    }

    /// Register a new record; an existing id is left untouched
    pub fn insert(&self, record: QueryRecord) -> bool {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return false;
        }
        records.insert(record.id.clone(), Arc::new(RwLock::new(record)));
        true
    }

    fn entry(&self, id: &str) -> Result<Arc<RwLock<QueryRecord>>, StoreError> {
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Snapshot of a record
    pub fn get(&self, id: &str) -> Result<QueryRecord, StoreError> {
        Ok(self.entry(id)?.read().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.read().contains_key(id)
    }

    /// Store a provider result; a provider's first result wins
    pub fn record_result(&self, id: &str, result: ProviderResult) -> Result<bool, StoreError> {
        Ok(self.entry(id)?.write().insert_result(result))
    }

    /// Mark a record completed, returning the final snapshot on transition
    pub fn complete(&self, id: &str) -> Result<Option<QueryRecord>, StoreError> {
        let entry = self.entry(id)?;
        let mut record = entry.write();
        Ok(record.mark_completed().then(|| record.clone()))
    }

    /// Mark a record failed, returning the final snapshot on transition
    pub fn fail(&self, id: &str, error: &str) -> Result<Option<QueryRecord>, StoreError> {
        let entry = self.entry(id)?;
        let mut record = entry.write();
        Ok(record.mark_failed(error).then(|| record.clone()))
    }

    /// Attach an analysis to a completed record
    pub fn attach_analysis(&self, id: &str, analysis: AnalysisResult) -> Result<bool, StoreError> {
        Ok(self.entry(id)?.write().attach_analysis(analysis))
    }

    /// Analysis mapping of a record (empty when none is attached)
    pub fn analysis(&self, id: &str) -> Result<HashMap<String, AnalysisResult>, StoreError> {
        Ok(self.entry(id)?.read().analysis.clone().unwrap_or_default())
    }

    /// Records, most recent first
    pub fn history(&self, limit: Option<usize>) -> Vec<QueryRecord> {
        let entries: Vec<_> = self.records.read().values().cloned().collect();
        let mut records: Vec<QueryRecord> = entries.iter().map(|e| e.read().clone()).collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        records
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Serialize one record
    pub fn export(&self, id: &str, format: ExportFormat) -> Result<String, StoreError> {
        render(&self.get(id)?, format)
    }

    /// Write a record to the archive directory, if one is configured
    pub async fn archive(&self, id: &str) -> Result<Option<PathBuf>, StoreError> {
        let Some(ref dir) = self.archive_dir else {
            return Ok(None);
        };
        let record = self.get(id)?;
        archive::write(dir, &record).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ProviderPayload, QueryStatus};
    use chrono::Duration;

    fn text(provider: &str) -> ProviderResult {
        ProviderResult::success(provider, ProviderPayload::Text("answer".into()))
    }

    #[test]
    fn test_insert_and_get() {
        let store = ResultStore::new();
        assert!(store.insert(QueryRecord::new("q1", "best etfs")));
        assert!(!store.insert(QueryRecord::new("q1", "dup")));
        assert_eq!(store.get("q1").unwrap().query, "best etfs");
        assert!(matches!(store.get("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_snapshots_are_detached() {
        let store = ResultStore::new();
        store.insert(QueryRecord::new("q1", "best etfs"));
        let before = store.get("q1").unwrap();
        store.record_result("q1", text("openai")).unwrap();
        assert!(before.results.is_empty());
        assert_eq!(store.get("q1").unwrap().results.len(), 1);
    }

    #[test]
    fn test_complete_once() {
        let store = ResultStore::new();
        store.insert(QueryRecord::new("q1", "best etfs"));
        let done = store.complete("q1").unwrap().unwrap();
        assert_eq!(done.status, QueryStatus::Completed);
        assert!(store.complete("q1").unwrap().is_none());
        assert!(store.fail("q1", "late").unwrap().is_none());
    }

    #[test]
    fn test_history_order_and_limit() {
        let store = ResultStore::new();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            let mut record = QueryRecord::new(*id, "q");
            record.timestamp = record.timestamp + Duration::seconds(i as i64);
            store.insert(record);
        }
        let ids: Vec<_> = store.history(None).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(store.history(Some(2)).len(), 2);
    }

    #[test]
    fn test_analysis_defaults_empty() {
        let store = ResultStore::new();
        store.insert(QueryRecord::new("q1", "q"));
        assert!(store.analysis("q1").unwrap().is_empty());
        store.complete("q1").unwrap();
        assert!(store
            .attach_analysis("q1", AnalysisResult::empty("openai"))
            .unwrap());
        assert_eq!(store.analysis("q1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_disabled_by_default() {
        let store = ResultStore::new();
        store.insert(QueryRecord::new("q1", "q"));
        assert!(store.archive("q1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_archive_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new().with_archive_dir(Some(dir.path().to_path_buf()));
        store.insert(QueryRecord::new("q1", "best etfs"));
        let path = store.archive("q1").await.unwrap().unwrap();
        assert!(path.exists());
    }
}

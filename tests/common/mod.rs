//! Shared fixtures and trait doubles for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use errata::error::{AppError, Result};
use errata::models::{Example, ErrorRecord, Severity};
use errata::search::{BulkResult, RawHit, SearchError, SearchIndexClient, SearchResult};
use errata::state::{ErrorStore, InMemoryStore, RecordFilter};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Record with a fresh id, ready to insert
pub fn record(code: &str, error: &str) -> ErrorRecord {
    let mut record = ErrorRecord::new("JavaScript", "Runtime", code, error);
    record.id = Uuid::now_v7();
    record
}

/// A small, varied catalog
pub fn sample_records() -> Vec<ErrorRecord> {
    let mut type_error = record("JS-TYPE-001", "TypeError: undefined is not a function");
    type_error.framework = Some("React".to_string());
    type_error.severity = Some(Severity::High);
    type_error.description = Some("Calling something that is not callable".to_string());
    type_error.tags = vec!["typeerror".to_string(), "callback".to_string()];

    let mut npe = record("JAVA-NPE-001", "Encountered a NullPointerException at line 4");
    npe.language = "Java".to_string();
    npe.framework = Some("Spring".to_string());
    npe.cause = vec!["Dereferencing a null reference".to_string()];

    let mut key_error = record("PY-KEY-001", "KeyError: 'user_id'");
    key_error.language = "Python".to_string();
    key_error.examples = vec![Example {
        code: "data['user_id']".to_string(),
        output: "KeyError: 'user_id'".to_string(),
    }];
    key_error.meta.added_by = Some("maintainer@example.com".to_string());

    vec![type_error, npe, key_error]
}

pub async fn store_with(records: &[ErrorRecord]) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    for record in records {
        store.insert(record).await.unwrap();
    }
    store
}

/// Scripted primary index that counts every call
pub struct MockIndexClient {
    search_result: SearchResult<Vec<RawHit>>,
    rejected: HashSet<String>,
    unreachable: Option<SearchError>,
    pub search_texts: Mutex<Vec<String>>,
    pub indexed: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub search_calls: AtomicUsize,
    pub index_calls: AtomicUsize,
    pub bulk_calls: AtomicUsize,
}

impl MockIndexClient {
    pub fn new() -> Self {
        Self {
            search_result: Ok(Vec::new()),
            rejected: HashSet::new(),
            unreachable: None,
            search_texts: Mutex::new(Vec::new()),
            indexed: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            search_calls: AtomicUsize::new(0),
            index_calls: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
        }
    }

    /// Searches return these hits, in this order
    pub fn with_hits(mut self, hits: Vec<RawHit>) -> Self {
        self.search_result = Ok(hits);
        self
    }

    /// Searches fail with `error`
    pub fn failing_search(mut self, error: SearchError) -> Self {
        self.search_result = Err(error);
        self
    }

    /// Bulk writes reject these ids
    pub fn rejecting(mut self, ids: &[&str]) -> Self {
        self.rejected = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Every call fails with `cause`
    pub fn unreachable(mut self, cause: SearchError) -> Self {
        self.search_result = Err(cause.clone());
        self.unreachable = Some(cause);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
            + self.index_calls.load(Ordering::SeqCst)
            + self.bulk_calls.load(Ordering::SeqCst)
            + self.deleted.lock().len()
    }
}

#[async_trait]
impl SearchIndexClient for MockIndexClient {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, text: &str, _fields: &[&str]) -> SearchResult<Vec<RawHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_texts.lock().push(text.to_string());
        self.search_result.clone()
    }

    async fn index_one(&self, id: &str, _doc: &ErrorRecord) -> SearchResult<()> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(cause) = &self.unreachable {
            return Err(SearchError::IndexWrite(cause.to_string()));
        }
        self.indexed.lock().push(id.to_string());
        Ok(())
    }

    async fn index_many(&self, docs: &[(String, &ErrorRecord)]) -> BulkResult {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(cause) = &self.unreachable {
            return BulkResult::all_failed(docs.iter().map(|(id, _)| id.clone()), cause.clone());
        }

        let mut result = BulkResult::default();
        for (id, _) in docs {
            if self.rejected.contains(id) {
                result.record_failure(
                    id.clone(),
                    SearchError::IndexWrite("mapper_parsing_exception".to_string()),
                );
            } else {
                self.indexed.lock().push(id.clone());
                result.record_success(id.clone());
            }
        }
        result
    }

    async fn delete(&self, id: &str) -> SearchResult<()> {
        self.deleted.lock().push(id.to_string());
        match &self.unreachable {
            Some(cause) => Err(SearchError::IndexWrite(cause.to_string())),
            None => Ok(()),
        }
    }
}

/// Store wrapper counting every call
pub struct CountingStore {
    inner: InMemoryStore,
    pub calls: AtomicUsize,
}

impl CountingStore {
    pub async fn with(records: &[ErrorRecord]) -> Self {
        let inner = InMemoryStore::new();
        for record in records {
            inner.insert(record).await.unwrap();
        }
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ErrorStore for CountingStore {
    async fn insert(&self, record: &ErrorRecord) -> Result<()> {
        self.tick();
        self.inner.insert(record).await
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        self.tick();
        self.inner.get(id).await
    }

    async fn update(&self, record: &ErrorRecord) -> Result<()> {
        self.tick();
        self.inner.update(record).await
    }

    async fn delete(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        self.tick();
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<ErrorRecord>> {
        self.tick();
        self.inner.list().await
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<ErrorRecord>> {
        self.tick();
        self.inner.find(filter).await
    }

    async fn count(&self) -> Result<u64> {
        self.tick();
        self.inner.count().await
    }
}

/// Store whose every call fails as if the database were down
pub struct FailingStore;

fn down() -> AppError {
    AppError::Database("connection refused".to_string())
}

#[async_trait]
impl ErrorStore for FailingStore {
    async fn insert(&self, _record: &ErrorRecord) -> Result<()> {
        Err(down())
    }

    async fn get(&self, _id: &Uuid) -> Result<Option<ErrorRecord>> {
        Err(down())
    }

    async fn update(&self, _record: &ErrorRecord) -> Result<()> {
        Err(down())
    }

    async fn delete(&self, _id: &Uuid) -> Result<Option<ErrorRecord>> {
        Err(down())
    }

    async fn list(&self) -> Result<Vec<ErrorRecord>> {
        Err(down())
    }

    async fn find(&self, _filter: &RecordFilter) -> Result<Vec<ErrorRecord>> {
        Err(down())
    }

    async fn count(&self) -> Result<u64> {
        Err(down())
    }
}

/// In-memory store that goes down after accepting `limit` inserts
pub struct InsertLimitStore {
    inner: InMemoryStore,
    limit: usize,
    inserts: AtomicUsize,
}

impl InsertLimitStore {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: InMemoryStore::new(),
            limit,
            inserts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ErrorStore for InsertLimitStore {
    async fn insert(&self, record: &ErrorRecord) -> Result<()> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) >= self.limit {
            return Err(down());
        }
        self.inner.insert(record).await
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        self.inner.get(id).await
    }

    async fn update(&self, record: &ErrorRecord) -> Result<()> {
        self.inner.update(record).await
    }

    async fn delete(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<ErrorRecord>> {
        self.inner.list().await
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<ErrorRecord>> {
        self.inner.find(filter).await
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }
}

/// Metric sample lines from Prometheus text output, keyed by metric name
pub fn metric_lines<'a>(output: &'a str, metric_name: &str) -> Vec<&'a str> {
    output
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.starts_with(metric_name)
                && matches!(line[metric_name.len()..].chars().next(), Some('{') | Some(' '))
        })
        .collect()
}

/// Value of a metric sample line, e.g. `name{a="1"} 42` -> 42.0
pub fn extract_metric_value(line: &str) -> Option<f64> {
    line.split_whitespace().last()?.parse::<f64>().ok()
}

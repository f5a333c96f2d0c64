use crate::error::{AppError, Result};
use crate::models::{ErrorRecord, RecordField};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for the authoritative error record store
#[async_trait]
pub trait ErrorStore: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if its code is taken.
    async fn insert(&self, record: &ErrorRecord) -> Result<()>;

    /// Get a record by ID
    async fn get(&self, id: &Uuid) -> Result<Option<ErrorRecord>>;

    /// Replace an existing record
    async fn update(&self, record: &ErrorRecord) -> Result<()>;

    /// Delete a record, returning it if it existed
    async fn delete(&self, id: &Uuid) -> Result<Option<ErrorRecord>>;

    /// All records in natural (creation) order
    async fn list(&self) -> Result<Vec<ErrorRecord>>;

    /// Records matching the filter, in natural order
    async fn find(&self, filter: &RecordFilter) -> Result<Vec<ErrorRecord>>;

    /// Number of stored records
    async fn count(&self) -> Result<u64>;
}

/// Disjunctive, case-insensitive pattern match over a set of record fields.
///
/// A record matches when the pattern is found in any value of any listed field.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    matcher: Matcher,
    fields: Vec<RecordField>,
}

#[derive(Debug, Clone)]
enum Matcher {
    Pattern(Regex),
    /// Lowercased text, for queries no regex can be built from
    Substring(String),
}

impl Matcher {
    fn build(text: &str) -> Self {
        RegexBuilder::new(text)
            .case_insensitive(true)
            .build()
            .or_else(|_| {
                RegexBuilder::new(&regex::escape(text))
                    .case_insensitive(true)
                    .build()
            })
            .map(Matcher::Pattern)
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Query does not compile as a pattern, matching substrings");
                Matcher::Substring(text.to_lowercase())
            })
    }

    fn is_match(&self, value: &str) -> bool {
        match self {
            Matcher::Pattern(pattern) => pattern.is_match(value),
            Matcher::Substring(needle) => value.to_lowercase().contains(needle.as_str()),
        }
    }
}

impl RecordFilter {
    /// Build a filter for `text` over `fields`.
    ///
    /// `text` is interpreted as a regular expression; if it does not compile it
    /// is matched literally. Returns `None` for blank text, which would
    /// otherwise match every record.
    pub fn any_field_matching(text: &str, fields: &[RecordField]) -> Option<Self> {
        // whitespace-only text counts as blank too
        if text.trim().is_empty() {
            return None;
        }

        Some(Self {
            matcher: Matcher::build(text),
            fields: fields.to_vec(),
        })
    }

    pub fn matches(&self, record: &ErrorRecord) -> bool {
        self.fields.iter().any(|field| {
            field
                .values(record)
                .into_iter()
                .any(|value| self.matcher.is_match(value))
        })
    }
}

/// In-memory record store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    records: Arc<RwLock<BTreeMap<Uuid, ErrorRecord>>>,
    code_index: Arc<DashMap<String, Uuid>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            code_index: Arc::new(DashMap::new()),
        }
    }

    /// Claim `code` for `id`; fails if another record already holds it.
    fn claim_code(&self, code: &str, id: Uuid) -> Result<()> {
        match self.code_index.entry(code.to_string()) {
            Entry::Occupied(entry) if *entry.get() != id => Err(AppError::Conflict(format!(
                "Error code '{}' already exists",
                code
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ErrorStore for InMemoryStore {
    async fn insert(&self, record: &ErrorRecord) -> Result<()> {
        if self.records.read().contains_key(&record.id) {
            return Err(AppError::Conflict(format!(
                "Error record {} already exists",
                record.id
            )));
        }

        self.claim_code(&record.code, record.id)?;
        self.records.write().insert(record.id, record.clone());

        tracing::debug!(record_id = %record.id, code = %record.code, "Error record saved");
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn update(&self, record: &ErrorRecord) -> Result<()> {
        let previous_code = match self.records.read().get(&record.id) {
            Some(existing) => existing.code.clone(),
            None => {
                return Err(AppError::NotFound(format!(
                    "Error record {} not found",
                    record.id
                )))
            }
        };

        if previous_code != record.code {
            self.claim_code(&record.code, record.id)?;
            self.code_index.remove(&previous_code);
        }

        self.records.write().insert(record.id, record.clone());
        tracing::debug!(record_id = %record.id, "Error record updated");
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        let removed = self.records.write().remove(id);
        if let Some(ref record) = removed {
            self.code_index.remove(&record.code);
            tracing::debug!(record_id = %id, "Error record deleted");
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<ErrorRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<ErrorRecord>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().len() as u64)
    }
}

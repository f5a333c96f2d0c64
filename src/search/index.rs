//! Primary search index client abstraction

use crate::models::ErrorRecord;
use crate::search::config::{IndexBackend, SearchConfig};
use crate::search::elasticsearch::ElasticsearchClient;
use crate::search::error::{SearchError, SearchResult};
use crate::search::tantivy_index::TantivyIndex;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A hit as returned by a search backend, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// Document ID in the backend
    pub id: String,

    /// Relevance score, when the backend ranks
    pub score: Option<f32>,

    /// The stored record
    pub source: ErrorRecord,
}

impl RawHit {
    pub fn scored(source: ErrorRecord, score: f32) -> Self {
        Self {
            id: source.id.to_string(),
            score: Some(score),
            source,
        }
    }
}

impl From<ErrorRecord> for RawHit {
    fn from(source: ErrorRecord) -> Self {
        Self {
            id: source.id.to_string(),
            score: None,
            source,
        }
    }
}

/// A document the backend refused during a bulk write
#[derive(Debug, Clone)]
pub struct BulkFailure {
    pub id: String,
    pub cause: SearchError,
}

/// Outcome of a bulk upsert: every submitted ID lands in exactly one list
#[derive(Debug, Clone, Default)]
pub struct BulkResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkResult {
    /// Every ID failed for the same reason (e.g. backend unreachable)
    pub fn all_failed<I>(ids: I, cause: SearchError) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            succeeded: Vec::new(),
            failed: ids
                .into_iter()
                .map(|id| BulkFailure {
                    id,
                    cause: cause.clone(),
                })
                .collect(),
        }
    }

    pub fn record_success(&mut self, id: impl Into<String>) {
        self.succeeded.push(id.into());
    }

    pub fn record_failure(&mut self, id: impl Into<String>, cause: SearchError) {
        self.failed.push(BulkFailure {
            id: id.into(),
            cause,
        });
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.id.as_str()).collect()
    }
}

/// Client for the primary full-text index
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Fuzzy multi-field relevance search, best hit first
    async fn search(&self, text: &str, fields: &[&str]) -> SearchResult<Vec<RawHit>>;

    /// Upsert one document under `id`
    async fn index_one(&self, id: &str, doc: &ErrorRecord) -> SearchResult<()>;

    /// Batched upsert. Never fails as a whole: per-document outcomes are
    /// reported in the result, and a backend-level failure marks every
    /// document failed with the same cause.
    async fn index_many(&self, docs: &[(String, &ErrorRecord)]) -> BulkResult;

    /// Remove the document stored under `id`; absent documents are not an error
    async fn delete(&self, id: &str) -> SearchResult<()>;
}

/// Create the primary index client selected by configuration
pub async fn create_index_client(config: &SearchConfig) -> SearchResult<Arc<dyn SearchIndexClient>> {
    match config.backend {
        IndexBackend::Elasticsearch => {
            tracing::info!(
                url = %config.elasticsearch_url,
                index = %config.index_name,
                "Initializing Elasticsearch index client"
            );
            Ok(Arc::new(ElasticsearchClient::new(config)?))
        }
        IndexBackend::Tantivy => {
            tracing::info!(path = ?config.index_path, "Initializing Tantivy index");
            Ok(Arc::new(TantivyIndex::new(config).await?))
        }
    }
}

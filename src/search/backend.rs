//! The two interchangeable search strategies behind the gateway

use crate::search::document::SEARCH_FIELDS;
use crate::search::error::SearchResult;
use crate::search::fallback::FallbackStore;
use crate::search::index::{RawHit, SearchIndexClient};
use crate::search::query::interpret;
use crate::search::response::ResultSource;
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can answer a raw search query
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// How results of this backend are normalized
    fn source(&self) -> ResultSource;

    async fn execute(&self, raw_query: &str) -> SearchResult<Vec<RawHit>>;
}

/// Relevance-ranked search against the primary index
#[derive(Clone)]
pub struct PrimaryIndex {
    client: Arc<dyn SearchIndexClient>,
}

impl PrimaryIndex {
    pub fn new(client: Arc<dyn SearchIndexClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchBackend for PrimaryIndex {
    fn source(&self) -> ResultSource {
        ResultSource::Primary
    }

    /// Interprets the query and searches with the error type name when one
    /// leads the query, otherwise with the raw text.
    async fn execute(&self, raw_query: &str) -> SearchResult<Vec<RawHit>> {
        let interpreted = interpret(raw_query);
        let text = interpreted.search_text();

        tracing::debug!(
            backend = self.client.backend_name(),
            text = %text,
            error_type = ?interpreted.error_type_name,
            stack_frame = ?interpreted.stack_trace_fragment,
            "Querying primary index"
        );

        self.client.search(text, &SEARCH_FIELDS).await
    }
}

#[async_trait]
impl SearchBackend for FallbackStore {
    fn source(&self) -> ResultSource {
        ResultSource::Fallback
    }

    async fn execute(&self, raw_query: &str) -> SearchResult<Vec<RawHit>> {
        let records = self.query_fallback(raw_query).await?;
        Ok(records.into_iter().map(RawHit::from).collect())
    }
}

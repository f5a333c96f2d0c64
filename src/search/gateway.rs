//! Search gateway: primary index with record store fallback

use crate::models::ErrorRecord;
use crate::search::availability::{IndexAvailability, SearchRoute};
use crate::search::backend::{PrimaryIndex, SearchBackend};
use crate::search::error::{SearchError, SearchResult};
use crate::search::fallback::FallbackStore;
use crate::search::index::{BulkResult, RawHit, SearchIndexClient};
use crate::search::metrics::SEARCH_METRICS;
use crate::search::response::{normalize, SearchResponse};
use crate::state::ErrorStore;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Entry point for searching and indexing error records.
///
/// Reads degrade from the primary index to the record store. Writes to the
/// index are best-effort: the record store stays authoritative and the index
/// can always be rebuilt from it with [`SearchGateway::reindex_from_store`].
#[derive(Clone)]
pub struct SearchGateway {
    availability: IndexAvailability,
    index: Arc<dyn SearchIndexClient>,
    primary: PrimaryIndex,
    fallback: FallbackStore,
}

impl SearchGateway {
    pub fn new(
        availability: IndexAvailability,
        index: Arc<dyn SearchIndexClient>,
        store: Arc<dyn ErrorStore>,
    ) -> Self {
        Self {
            availability,
            primary: PrimaryIndex::new(index.clone()),
            index,
            fallback: FallbackStore::new(store),
        }
    }

    /// Handle to the shared availability flag
    pub fn availability(&self) -> &IndexAvailability {
        &self.availability
    }

    /// Search for error records matching `raw_query`.
    ///
    /// Blank queries return no results without contacting any backend. Only
    /// a failure of the record store fallback is an error, reported as
    /// [`SearchError::SearchUnavailable`].
    pub async fn search_errors(&self, raw_query: &str) -> SearchResult<SearchResponse> {
        let started = Instant::now();
        let mut route = self.availability.route();

        // whitespace-only queries count as blank
        if raw_query.trim().is_empty() {
            tracing::debug!(route = %route, "Blank search query, returning no results");
            return Ok(SearchResponse::default());
        }

        if route == SearchRoute::Primary {
            match self.primary.execute(raw_query).await {
                Ok(hits) => {
                    tracing::debug!(hits = hits.len(), "Primary index search succeeded");
                    return Ok(self.respond(&self.primary, route, hits, started));
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        error_code = e.error_code(),
                        backend = self.index.backend_name(),
                        "Primary index search failed, falling back to record store"
                    );
                    route = SearchRoute::FallbackRecover;
                }
            }
        } else {
            tracing::info!("Primary index disabled, searching record store");
        }

        match self.fallback.execute(raw_query).await {
            Ok(hits) => Ok(self.respond(&self.fallback, route, hits, started)),
            Err(e) => {
                tracing::error!(error = %e, route = %route, "Record store fallback search failed");
                SEARCH_METRICS.record_search_failure(e.error_code());
                Err(SearchError::SearchUnavailable(e.to_string()))
            }
        }
    }

    fn respond(
        &self,
        backend: &dyn SearchBackend,
        route: SearchRoute,
        hits: Vec<RawHit>,
        started: Instant,
    ) -> SearchResponse {
        SEARCH_METRICS.record_search(route.into(), started.elapsed().as_secs_f64());
        SearchResponse {
            results: normalize(hits, backend.source()),
        }
    }

    /// Index one record. Never fails: errors are logged and dropped, and
    /// nothing happens while the index is disabled.
    pub async fn index_error(&self, record: &ErrorRecord) {
        if !self.availability.is_enabled() {
            tracing::debug!(record_id = %record.id, "Index disabled, skipping indexing");
            return;
        }

        if let Err(e) = self.try_index_error(record).await {
            SEARCH_METRICS.record_index_failures("index", 1);
            tracing::warn!(
                error = %e,
                record_id = %record.id,
                "Skipping indexing due to search index failure"
            );
        }
    }

    async fn try_index_error(&self, record: &ErrorRecord) -> SearchResult<()> {
        self.index.index_one(&record.id.to_string(), record).await?;
        tracing::debug!(record_id = %record.id, "Record indexed");
        Ok(())
    }

    /// Index many records, best-effort. Per-record failures are logged.
    pub async fn bulk_index_errors(&self, records: &[ErrorRecord]) {
        if !self.availability.is_enabled() {
            tracing::debug!(count = records.len(), "Index disabled, skipping bulk indexing");
            return;
        }

        self.bulk_index_report(records).await;
    }

    /// Index many records and report the per-record outcome.
    ///
    /// While the index is disabled nothing is submitted and the report is
    /// empty. Callers are responsible for batch sizing.
    pub async fn bulk_index_report(&self, records: &[ErrorRecord]) -> BulkResult {
        if !self.availability.is_enabled() || records.is_empty() {
            return BulkResult::default();
        }

        let docs: Vec<(String, &ErrorRecord)> =
            records.iter().map(|r| (r.id.to_string(), r)).collect();
        let result = self.index.index_many(&docs).await;

        if result.is_complete_success() {
            tracing::info!(count = result.succeeded.len(), "Bulk indexing completed");
        } else {
            SEARCH_METRICS.record_index_failures("bulk", result.failed.len());
            for failure in &result.failed {
                tracing::warn!(
                    record_id = %failure.id,
                    error = %failure.cause,
                    "Record rejected during bulk indexing"
                );
            }
            tracing::error!(
                succeeded = result.succeeded.len(),
                failed = result.failed.len(),
                "Bulk indexing completed with failures"
            );
        }

        result
    }

    /// Remove a record from the index, best-effort
    pub async fn remove_error(&self, id: &Uuid) {
        if !self.availability.is_enabled() {
            tracing::debug!(record_id = %id, "Index disabled, skipping removal");
            return;
        }

        if let Err(e) = self.index.delete(&id.to_string()).await {
            SEARCH_METRICS.record_index_failures("delete", 1);
            tracing::warn!(error = %e, record_id = %id, "Failed to remove record from index");
        }
    }

    /// Rebuild the index from every record in the store
    pub async fn reindex_from_store(&self) -> SearchResult<BulkResult> {
        let records = self
            .fallback
            .store()
            .list()
            .await
            .map_err(|e| SearchError::StoreQuery(e.to_string()))?;

        tracing::info!(
            count = records.len(),
            enabled = self.availability.is_enabled(),
            "Reindexing records from store"
        );

        Ok(self.bulk_index_report(&records).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tantivy_index::TantivyIndex;
    use crate::state::InMemoryStore;

    async fn gateway(enabled: bool) -> (SearchGateway, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let mut record = ErrorRecord::new(
            "Java",
            "Runtime",
            "JAVA-NPE",
            "Encountered a NullPointerException at line 4",
        );
        record.id = Uuid::now_v7();
        store.insert(&record).await.unwrap();

        let index = Arc::new(TantivyIndex::in_memory(10).unwrap());
        let gateway = SearchGateway::new(IndexAvailability::new(enabled), index, store.clone());
        (gateway, store)
    }

    #[tokio::test]
    async fn test_disabled_gateway_searches_store() {
        let (gateway, _) = gateway(false).await;
        let response = gateway.search_errors("nullpointerexception").await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].score.is_none());
    }

    #[tokio::test]
    async fn test_reindex_then_primary_search() {
        let (gateway, _) = gateway(true).await;

        // empty index: primary succeeds with no hits
        let response = gateway.search_errors("NullPointerException").await.unwrap();
        assert!(response.results.is_empty());

        let report = gateway.reindex_from_store().await.unwrap();
        assert_eq!(report.succeeded.len(), 1);

        let response = gateway.search_errors("NullPointerException").await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].score.is_some());
        assert_eq!(response.results[0].record.code, "JAVA-NPE");
    }

    #[tokio::test]
    async fn test_reindex_while_disabled_submits_nothing() {
        let (gateway, _) = gateway(false).await;
        let report = gateway.reindex_from_store().await.unwrap();
        assert_eq!(report.total(), 0);
    }
}

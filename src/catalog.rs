use crate::error::{AppError, Result};
use crate::models::ErrorRecord;
use crate::search::{SearchGateway, SearchResponse, SearchResult};
use crate::state::ErrorStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// A record an import could not store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub code: String,
    pub reason: String,
}

/// Outcome of [`ErrorCatalog::import`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: Vec<ErrorRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Write path for error records.
///
/// The store is written first and is authoritative; the index is updated
/// afterwards through the gateway and never fails an operation.
pub struct ErrorCatalog {
    store: Arc<dyn ErrorStore>,
    gateway: Arc<SearchGateway>,
}

impl ErrorCatalog {
    pub fn new(store: Arc<dyn ErrorStore>, gateway: Arc<SearchGateway>) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &Arc<dyn ErrorStore> {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<SearchGateway> {
        &self.gateway
    }

    /// Validate and store a new record, then index it
    pub async fn create(&self, record: ErrorRecord) -> Result<ErrorRecord> {
        let record = self.store_new(record).await?;

        tracing::info!(record_id = %record.id, code = %record.code, "Error record created");

        self.gateway.index_error(&record).await;
        Ok(record)
    }

    async fn store_new(&self, mut record: ErrorRecord) -> Result<ErrorRecord> {
        record.validate()?;
        record.dedup_tags();
        record.id = Uuid::now_v7();
        record.meta.added_on = Some(Utc::now());
        record.meta.updated_on = None;

        self.store.insert(&record).await?;
        Ok(record)
    }

    /// Replace an existing record, keeping its creation metadata
    pub async fn update(&self, id: &Uuid, mut record: ErrorRecord) -> Result<ErrorRecord> {
        let existing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Error record {} not found", id)))?;

        record.validate()?;
        record.dedup_tags();
        record.id = existing.id;
        record.meta.added_on = existing.meta.added_on;
        if record.meta.added_by.is_none() {
            record.meta.added_by = existing.meta.added_by;
        }
        record.meta.updated_on = Some(Utc::now());

        self.store.update(&record).await?;

        tracing::info!(record_id = %record.id, code = %record.code, "Error record updated");

        self.gateway.index_error(&record).await;
        Ok(record)
    }

    /// Delete a record from the store and the index
    pub async fn delete(&self, id: &Uuid) -> Result<ErrorRecord> {
        let removed = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Error record {} not found", id)))?;

        tracing::info!(record_id = %id, code = %removed.code, "Error record deleted");

        self.gateway.remove_error(id).await;
        Ok(removed)
    }

    pub async fn get(&self, id: &Uuid) -> Result<ErrorRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Error record {} not found", id)))
    }

    /// All records in creation order
    pub async fn list(&self) -> Result<Vec<ErrorRecord>> {
        self.store.list().await
    }

    pub async fn search(&self, query: &str) -> SearchResult<SearchResponse> {
        self.gateway.search_errors(query).await
    }

    /// Store every valid record, then bulk index the ones stored.
    ///
    /// Invalid or conflicting records are reported, not fatal. Any other store
    /// failure stops the import; records stored before it are still indexed.
    pub async fn import(&self, records: Vec<ErrorRecord>) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for record in records {
            let code = record.code.clone();
            match self.store_new(record).await {
                Ok(stored) => summary.created.push(stored),
                Err(e @ (AppError::Validation(_) | AppError::Conflict(_))) => {
                    tracing::warn!(code = %code, error = %e, "Skipping record during import");
                    summary.rejected.push(RejectedRecord {
                        code,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!(
                        code = %code,
                        error = %e,
                        stored = summary.created.len(),
                        "Import aborted by store failure"
                    );
                    self.gateway.bulk_index_errors(&summary.created).await;
                    return Err(e);
                }
            }
        }

        tracing::info!(
            created = summary.created.len(),
            rejected = summary.rejected.len(),
            "Import finished"
        );

        self.gateway.bulk_index_errors(&summary.created).await;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{IndexAvailability, TantivyIndex};
    use crate::state::InMemoryStore;

    fn catalog() -> ErrorCatalog {
        let store: Arc<dyn ErrorStore> = Arc::new(InMemoryStore::new());
        let index = Arc::new(TantivyIndex::in_memory(10).unwrap());
        let gateway = SearchGateway::new(IndexAvailability::disabled(), index, store.clone());
        ErrorCatalog::new(store, Arc::new(gateway))
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamp() {
        let catalog = catalog();
        let mut record = ErrorRecord::new("Python", "Runtime", "PY-KEY", "KeyError: 'name'");
        record.tags = vec!["dict".into(), "dict".into()];

        let created = catalog.create(record).await.unwrap();
        assert!(!created.id.is_nil());
        assert!(created.meta.added_on.is_some());
        assert_eq!(created.tags, vec!["dict".to_string()]);
        assert_eq!(catalog.get(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_record() {
        let catalog = catalog();
        let result = catalog.create(ErrorRecord::new("", "Runtime", "X", "x")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_creation_metadata() {
        let catalog = catalog();
        let created = catalog
            .create(ErrorRecord::new("Go", "Runtime", "GO-NIL", "nil pointer dereference"))
            .await
            .unwrap();

        let mut changed = created.clone();
        changed.meta.added_on = None;
        changed.description = Some("Dereferencing a nil pointer".into());

        let updated = catalog.update(&created.id, changed).await.unwrap();
        assert_eq!(updated.meta.added_on, created.meta.added_on);
        assert!(updated.meta.updated_on.is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_record() {
        let catalog = catalog();
        let result = catalog.delete(&Uuid::now_v7()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_import_reports_rejections() {
        let catalog = catalog();
        let summary = catalog
            .import(vec![
                ErrorRecord::new("Rust", "Compile", "E0382", "borrow of moved value"),
                ErrorRecord::new("Rust", "Compile", "E0382", "duplicate code"),
                ErrorRecord::new("Rust", "", "E0499", "missing type"),
            ])
            .await
            .unwrap();

        assert_eq!(summary.created.len(), 1);
        assert_eq!(summary.rejected.len(), 2);
        assert_eq!(summary.rejected[0].code, "E0382");
    }
}

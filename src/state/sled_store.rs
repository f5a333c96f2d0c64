use crate::error::{AppError, Result};
use crate::models::ErrorRecord;
use crate::state::{ErrorStore, RecordFilter};
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent record store using the Sled embedded database.
///
/// Records are keyed by their UUIDv7 bytes, so key order is creation order.
/// A second tree maps each error code to its record ID and enforces code
/// uniqueness.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    records_tree: sled::Tree,
    codes_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            AppError::Database(format!("Failed to open Sled database: {}", e))
        })?;

        let records_tree = db.open_tree("errors").map_err(|e| {
            AppError::Database(format!("Failed to open errors tree: {}", e))
        })?;

        let codes_tree = db.open_tree("codes").map_err(|e| {
            AppError::Database(format!("Failed to open codes tree: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path.as_ref());

        Ok(Self {
            db: Arc::new(db),
            records_tree,
            codes_tree,
        })
    }

    fn serialize_record(record: &ErrorRecord) -> Result<Vec<u8>> {
        bincode::serialize(record).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize error record: {}", e))
        })
    }

    fn deserialize_record(bytes: &[u8]) -> Result<ErrorRecord> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize error record: {}", e))
        })
    }

    fn record_key(id: &Uuid) -> Vec<u8> {
        id.as_bytes().to_vec()
    }

    /// Atomically bind `code` to `id` unless another record holds it.
    fn claim_code(&self, code: &str, id: &Uuid) -> Result<()> {
        let swap = self
            .codes_tree
            .compare_and_swap(
                code.as_bytes(),
                None as Option<&[u8]>,
                Some(Self::record_key(id)),
            )
            .map_err(|e| AppError::Database(format!("Failed to claim error code: {}", e)))?;

        match swap {
            Ok(()) => Ok(()),
            Err(existing) if existing.current.as_deref() == Some(id.as_bytes().as_slice()) => {
                Ok(())
            }
            Err(_) => Err(AppError::Conflict(format!(
                "Error code '{}' already exists",
                code
            ))),
        }
    }

    fn release_code(&self, code: &str) -> Result<()> {
        self.codes_tree
            .remove(code.as_bytes())
            .map_err(|e| AppError::Database(format!("Failed to release error code: {}", e)))?;
        Ok(())
    }

    fn scan(&self) -> impl Iterator<Item = Result<ErrorRecord>> + '_ {
        self.records_tree.iter().values().map(|value| {
            let bytes = value.map_err(|e| {
                AppError::Database(format!("Failed to read error record: {}", e))
            })?;
            Self::deserialize_record(&bytes)
        })
    }

    fn flush_records(&self) -> Result<()> {
        self.records_tree.flush().map_err(|e| {
            AppError::Database(format!("Failed to flush errors tree: {}", e))
        })?;
        Ok(())
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Database(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl ErrorStore for SledStore {
    async fn insert(&self, record: &ErrorRecord) -> Result<()> {
        let key = Self::record_key(&record.id);

        if self.records_tree.contains_key(&key)? {
            return Err(AppError::Conflict(format!(
                "Error record {} already exists",
                record.id
            )));
        }

        let value = Self::serialize_record(record)?;
        self.claim_code(&record.code, &record.id)?;

        if let Err(e) = self.records_tree.insert(&key, value) {
            self.release_code(&record.code)?;
            return Err(AppError::Database(format!("Failed to save error record: {}", e)));
        }

        self.flush_records()?;

        tracing::debug!(record_id = %record.id, code = %record.code, "Error record saved to Sled");
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        match self.records_tree.get(Self::record_key(id)) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize_record(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!(
                "Failed to get error record: {}",
                e
            ))),
        }
    }

    async fn update(&self, record: &ErrorRecord) -> Result<()> {
        let key = Self::record_key(&record.id);

        let existing = match self.records_tree.get(&key)? {
            Some(bytes) => Self::deserialize_record(&bytes)?,
            None => {
                return Err(AppError::NotFound(format!(
                    "Error record {} not found",
                    record.id
                )))
            }
        };

        if existing.code != record.code {
            self.claim_code(&record.code, &record.id)?;
            self.release_code(&existing.code)?;
        }

        let value = Self::serialize_record(record)?;
        self.records_tree.insert(&key, value).map_err(|e| {
            AppError::Database(format!("Failed to update error record: {}", e))
        })?;
        self.flush_records()?;

        tracing::debug!(record_id = %record.id, "Error record updated in Sled");
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<Option<ErrorRecord>> {
        let removed = self
            .records_tree
            .remove(Self::record_key(id))
            .map_err(|e| AppError::Database(format!("Failed to delete error record: {}", e)))?;

        match removed {
            Some(bytes) => {
                let record = Self::deserialize_record(&bytes)?;
                self.release_code(&record.code)?;
                self.flush_records()?;
                tracing::debug!(record_id = %id, "Error record deleted from Sled");
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<ErrorRecord>> {
        self.scan().collect()
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<ErrorRecord>> {
        let mut matches = Vec::new();
        for record in self.scan() {
            let record = record?;
            if filter.matches(&record) {
                matches.push(record);
            }
        }
        Ok(matches)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records_tree.len() as u64)
    }
}

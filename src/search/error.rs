//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search and indexing.
///
/// The `Index*` variants describe primary index failures; the gateway recovers
/// from them (reads) or logs and drops them (writes). `StoreQuery` is a
/// fallback failure and is surfaced to callers only as `SearchUnavailable`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// Index backend unreachable, timed out or overloaded
    #[error("Search index unavailable: {0}")]
    IndexUnavailable(String),

    /// Target index does not exist
    #[error("Search index not found: {0}")]
    IndexNotFound(String),

    /// Query rejected by the index backend
    #[error("Search index query failed: {0}")]
    IndexQuery(String),

    /// Document write rejected by the index backend
    #[error("Search index write failed: {0}")]
    IndexWrite(String),

    /// Fallback record store query failed
    #[error("Record store query failed: {0}")]
    StoreQuery(String),

    /// No backend could serve the search
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SearchError {
    /// Stable short name, used as a log field and metric label
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::IndexUnavailable(_) => "index_unavailable",
            SearchError::IndexNotFound(_) => "index_not_found",
            SearchError::IndexQuery(_) => "index_query_error",
            SearchError::IndexWrite(_) => "index_write_error",
            SearchError::StoreQuery(_) => "store_query_error",
            SearchError::SearchUnavailable(_) => "search_unavailable",
            SearchError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_builder() {
            SearchError::IndexQuery(err.to_string())
        } else {
            // connect, timeout, request and body errors all mean the backend
            // could not be reached
            SearchError::IndexUnavailable(err.to_string())
        }
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        match err {
            tantivy::TantivyError::IoError(_)
            | tantivy::TantivyError::LockFailure(..)
            | tantivy::TantivyError::Poisoned => SearchError::IndexUnavailable(err.to_string()),
            _ => SearchError::IndexQuery(err.to_string()),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::SearchUnavailable(msg) => AppError::Unavailable(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

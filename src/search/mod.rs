//! Error record search with a primary index and a record store fallback
//!
//! This module answers free-text queries about known errors:
//!
//! - **Query Interpretation**: Recognises a leading `TypeError:`-style type name
//!   and stack frames in the query
//! - **Primary Index**: Fuzzy, relevance-ranked search over Elasticsearch or an
//!   embedded Tantivy index
//! - **Fallback**: Case-insensitive pattern match over the record store when the
//!   index is disabled or failing
//! - **Best-Effort Indexing**: Index writes never fail the caller
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              Search Gateway                      │
//! ├─────────────────────────────────────────────────┤
//! │  - search_errors()     - index_error()          │
//! │  - bulk_index_errors() - remove_error()         │
//! │  - reindex_from_store()                         │
//! └─────────────────────────────────────────────────┘
//!            │ IndexAvailability picks the route
//!            ▼
//! ┌──────────────────────┐    on failure    ┌──────────────────────┐
//! │     PrimaryIndex     │ ───────────────▶ │    FallbackStore     │
//! ├──────────────────────┤                  ├──────────────────────┤
//! │  interpret() query   │                  │  regex OR over 16    │
//! │  SearchIndexClient   │                  │  record fields       │
//! │  (ES / Tantivy)      │                  │  ErrorStore          │
//! └──────────────────────┘                  └──────────────────────┘
//!            │                                         │
//!            └──────────────► normalize() ◄────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use errata::search::{IndexAvailability, SearchGateway, TantivyIndex};
//! use errata::state::InMemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let index = Arc::new(TantivyIndex::in_memory(20)?);
//!     let gateway = SearchGateway::new(IndexAvailability::enabled(), index, store);
//!
//!     let response = gateway.search_errors("TypeError: undefined is not a function").await?;
//!     println!("Found {} errors", response.results.len());
//!
//!     Ok(())
//! }
//! ```

mod availability;
mod backend;
mod config;
mod document;
mod elasticsearch;
mod error;
mod fallback;
mod gateway;
mod index;
pub mod metrics;
mod query;
mod response;
mod tantivy_index;

pub use availability::{IndexAvailability, SearchRoute};
pub use backend::{PrimaryIndex, SearchBackend};
pub use config::{IndexBackend, SearchConfig, SearchConfigBuilder};
pub use document::{build_error_schema, SearchDocument, SEARCH_FIELDS};
pub use elasticsearch::ElasticsearchClient;
pub use error::{SearchError, SearchResult};
pub use fallback::{FallbackStore, FALLBACK_FIELDS};
pub use gateway::SearchGateway;
pub use index::{create_index_client, BulkFailure, BulkResult, RawHit, SearchIndexClient};
pub use query::{interpret, InterpretedQuery};
pub use response::{normalize, ResultSource, SearchHit, SearchResponse};
pub use tantivy_index::{auto_fuzziness, TantivyIndex};

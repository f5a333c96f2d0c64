//! Errata: a searchable catalog of programming errors
//!
//! Records live in an authoritative store (sled or in-memory). Searches go to
//! a fuzzy full-text index (Elasticsearch or Tantivy) when it is enabled and
//! healthy, and fall back to pattern matching over the store otherwise.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod state;

pub use catalog::{ErrorCatalog, ImportSummary, RejectedRecord};
pub use error::{AppError, Result};

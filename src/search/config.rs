//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which engine backs the primary index
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    /// Remote Elasticsearch cluster over HTTP
    #[default]
    Elasticsearch,
    /// Embedded Tantivy index on local disk
    Tantivy,
}

/// Primary search index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Initial availability of the primary index
    pub enabled: bool,

    /// Primary index engine
    pub backend: IndexBackend,

    /// Elasticsearch base URL
    pub elasticsearch_url: String,

    /// Index name
    pub index_name: String,

    /// HTTP request timeout for the Elasticsearch client
    pub request_timeout_secs: u64,

    /// Path to the Tantivy index directory
    pub index_path: PathBuf,

    /// Tantivy writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Maximum hits returned by one primary search
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: IndexBackend::default(),
            elasticsearch_url: "http://localhost:9200".to_string(),
            index_name: "errors".to_string(),
            request_timeout_secs: 10,
            index_path: PathBuf::from("./data/search_index"),
            writer_heap_size: 50_000_000,
            max_results: 100,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn backend(mut self, backend: IndexBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn elasticsearch_url(mut self, url: impl Into<String>) -> Self {
        self.config.elasticsearch_url = url.into();
        self
    }

    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_name = name.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

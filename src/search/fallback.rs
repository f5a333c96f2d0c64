//! Record store fallback: pattern matching over the authoritative store

use crate::models::{ErrorRecord, RecordField};
use crate::search::error::{SearchError, SearchResult};
use crate::state::{ErrorStore, RecordFilter};
use std::sync::Arc;

/// Fields the fallback query matches against
pub const FALLBACK_FIELDS: [RecordField; 16] = [
    RecordField::Language,
    RecordField::Framework,
    RecordField::Type,
    RecordField::Code,
    RecordField::Error,
    RecordField::Severity,
    RecordField::Description,
    RecordField::Tags,
    RecordField::Cause,
    RecordField::Solution,
    RecordField::ExampleCode,
    RecordField::ExampleOutput,
    RecordField::ResourceVideos,
    RecordField::ResourceTutorials,
    RecordField::Links,
    RecordField::AddedBy,
];

/// Unranked search over the record store.
///
/// Results come back in the store's natural order; there is no relevance
/// signal on this path.
#[derive(Clone)]
pub struct FallbackStore {
    store: Arc<dyn ErrorStore>,
}

impl FallbackStore {
    pub fn new(store: Arc<dyn ErrorStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ErrorStore> {
        &self.store
    }

    /// Records where any fallback field matches `text`, case-insensitively.
    /// Blank text returns nothing without touching the store.
    pub async fn query_fallback(&self, text: &str) -> SearchResult<Vec<ErrorRecord>> {
        let Some(filter) = RecordFilter::any_field_matching(text, &FALLBACK_FIELDS) else {
            return Ok(Vec::new());
        };

        self.store
            .find(&filter)
            .await
            .map_err(|e| SearchError::StoreQuery(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Example, Resources};
    use crate::state::InMemoryStore;
    use uuid::Uuid;

    async fn store_with(records: Vec<ErrorRecord>) -> FallbackStore {
        let store = InMemoryStore::new();
        for mut record in records {
            record.id = Uuid::now_v7();
            store.insert(&record).await.unwrap();
        }
        FallbackStore::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_matches_nested_fields() {
        let mut with_example = ErrorRecord::new("Python", "Runtime", "PY-1", "boom");
        with_example.examples.push(Example {
            code: "int('abc')".to_string(),
            output: "ValueError: invalid literal".to_string(),
        });

        let mut with_video = ErrorRecord::new("Go", "Runtime", "GO-1", "boom");
        with_video.resources = Resources {
            videos: vec!["https://videos.example/valueerror".to_string()],
            tutorials: Vec::new(),
        };

        let unrelated = ErrorRecord::new("Rust", "Compile", "E0308", "mismatched types");

        let fallback = store_with(vec![with_example, with_video, unrelated]).await;
        let codes: Vec<String> = fallback
            .query_fallback("valueerror")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.code)
            .collect();

        assert_eq!(codes, vec!["PY-1", "GO-1"]);
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let fallback =
            store_with(vec![ErrorRecord::new("Java", "Runtime", "J-1", "anything")]).await;
        assert!(fallback.query_fallback("").await.unwrap().is_empty());
    }

    #[test]
    fn test_fallback_field_paths() {
        let paths: Vec<&str> = FALLBACK_FIELDS.iter().map(|f| f.path()).collect();
        assert!(paths.contains(&"examples.output"));
        assert!(paths.contains(&"resources.tutorials"));
        assert!(paths.contains(&"meta.added_by"));
        assert_eq!(paths.len(), 16);
    }
}

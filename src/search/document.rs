//! Search document structures and indexing

use crate::models::ErrorRecord;
use crate::search::error::{SearchError, SearchResult};
use tantivy::schema::*;
use tantivy::TantivyDocument;

/// Fields the primary index searches, in multi-match order
pub const SEARCH_FIELDS: [&str; 6] = [
    "code",
    "error",
    "description",
    "tags",
    "language",
    "framework",
];

/// Stored JSON copy of the whole record
pub const SOURCE_FIELD: &str = "source";

pub const ID_FIELD: &str = "id";

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, schema: &Schema) -> SearchResult<TantivyDocument>;

    /// Get document ID
    fn document_id(&self) -> String;
}

impl SearchDocument for ErrorRecord {
    fn to_tantivy_doc(&self, schema: &Schema) -> SearchResult<TantivyDocument> {
        let mut doc = TantivyDocument::new();

        if let Ok(field) = schema.get_field(ID_FIELD) {
            doc.add_text(field, self.document_id());
        }

        if let Ok(field) = schema.get_field("code") {
            doc.add_text(field, &self.code);
        }

        if let Ok(field) = schema.get_field("error") {
            doc.add_text(field, &self.error);
        }

        if let Some(ref description) = self.description {
            if let Ok(field) = schema.get_field("description") {
                doc.add_text(field, description);
            }
        }

        // Tags (multi-valued)
        if let Ok(field) = schema.get_field("tags") {
            for tag in &self.tags {
                doc.add_text(field, tag);
            }
        }

        if let Ok(field) = schema.get_field("language") {
            doc.add_text(field, &self.language);
        }

        if let Some(ref framework) = self.framework {
            if let Ok(field) = schema.get_field("framework") {
                doc.add_text(field, framework);
            }
        }

        // Whole record, returned verbatim on hits
        if let Ok(field) = schema.get_field(SOURCE_FIELD) {
            let source = serde_json::to_string(self).map_err(|e| {
                SearchError::IndexWrite(format!(
                    "Failed to serialize record {}: {}",
                    self.id, e
                ))
            })?;
            doc.add_text(field, source);
        }

        Ok(doc)
    }

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Build the search schema for error records
pub fn build_error_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // ID - stored, indexed as a single token for upserts and deletes
    schema_builder.add_text_field(ID_FIELD, STRING | STORED);

    for field in SEARCH_FIELDS {
        schema_builder.add_text_field(field, TEXT);
    }

    schema_builder.add_text_field(SOURCE_FIELD, STORED);

    schema_builder.build()
}

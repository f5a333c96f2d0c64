//! Embedded primary index backed by Tantivy

use crate::models::ErrorRecord;
use crate::search::config::SearchConfig;
use crate::search::document::{build_error_schema, SearchDocument, ID_FIELD, SOURCE_FIELD};
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{BulkResult, RawHit, SearchIndexClient};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, DisjunctionMaxQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

/// Edit distance for a term of `len` characters, following the
/// Elasticsearch `AUTO` fuzziness rule.
pub fn auto_fuzziness(len: usize) -> u8 {
    match len {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Tantivy-backed implementation of the primary index
pub struct TantivyIndex {
    index: Index,
    schema: Schema,
    writer: Arc<RwLock<IndexWriter>>,
    reader: IndexReader,
    max_results: usize,
}

impl TantivyIndex {
    /// Open the index at `config.index_path`, creating it if needed
    pub async fn new(config: &SearchConfig) -> SearchResult<Self> {
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::IndexUnavailable(format!("Failed to create index directory: {}", e))
        })?;

        let schema = build_error_schema();

        let index = if Self::index_exists(&config.index_path) {
            Index::open_in_dir(&config.index_path).map_err(|e| {
                SearchError::IndexUnavailable(format!("Failed to open existing index: {}", e))
            })?
        } else {
            Index::create_in_dir(&config.index_path, schema.clone()).map_err(|e| {
                SearchError::IndexUnavailable(format!("Failed to create new index: {}", e))
            })?
        };

        Self::from_index(index, config.writer_heap_size, config.max_results)
    }

    /// Index held entirely in RAM
    pub fn in_memory(max_results: usize) -> SearchResult<Self> {
        let index = Index::create_in_ram(build_error_schema());
        Self::from_index(index, 50_000_000, max_results)
    }

    fn from_index(index: Index, writer_heap_size: usize, max_results: usize) -> SearchResult<Self> {
        let schema = index.schema();

        let writer = index.writer(writer_heap_size).map_err(|e| {
            SearchError::IndexUnavailable(format!("Failed to create writer: {}", e))
        })?;

        // Reloaded explicitly after every commit so writes are visible to the
        // next search.
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexUnavailable(format!("Failed to create reader: {}", e)))?;

        Ok(Self {
            index,
            schema,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            max_results,
        })
    }

    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Number of live documents visible to searches
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn id_term(&self, id: &str) -> SearchResult<Term> {
        let field = self.schema.get_field(ID_FIELD).map_err(|e| {
            SearchError::IndexNotFound(format!("Schema has no id field: {}", e))
        })?;
        Ok(Term::from_field_text(field, id))
    }

    fn resolve_fields(&self, fields: &[&str]) -> SearchResult<Vec<Field>> {
        fields
            .iter()
            .map(|name| {
                self.schema
                    .get_field(name)
                    .map_err(|_| SearchError::IndexQuery(format!("Unknown search field '{}'", name)))
            })
            .collect()
    }

    fn tokenize(&self, text: &str) -> SearchResult<Vec<String>> {
        let mut analyzer = self
            .index
            .tokenizers()
            .get("default")
            .ok_or_else(|| SearchError::IndexQuery("Default tokenizer not registered".to_string()))?;

        let mut terms: Vec<String> = Vec::new();
        let mut stream = analyzer.token_stream(text);
        stream.process(&mut |token| {
            if !terms.contains(&token.text) {
                terms.push(token.text.clone());
            }
        });
        Ok(terms)
    }

    /// Best-fields multi-match: within a field any term may match (exactly
    /// or within the auto edit distance); across fields the best one wins.
    fn build_query(&self, terms: &[String], fields: &[Field]) -> Box<dyn Query> {
        let field_queries: Vec<Box<dyn Query>> = fields
            .iter()
            .map(|&field| {
                let clauses: Vec<(Occur, Box<dyn Query>)> = terms
                    .iter()
                    .map(|text| {
                        let term = Term::from_field_text(field, text);
                        let exact: Box<dyn Query> =
                            Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs));

                        let distance = auto_fuzziness(text.chars().count());
                        let query: Box<dyn Query> = if distance == 0 {
                            exact
                        } else {
                            Box::new(BooleanQuery::new(vec![
                                (Occur::Should, exact),
                                (
                                    Occur::Should,
                                    Box::new(FuzzyTermQuery::new(term, distance, true)),
                                ),
                            ]))
                        };
                        (Occur::Should, query)
                    })
                    .collect();
                Box::new(BooleanQuery::new(clauses)) as Box<dyn Query>
            })
            .collect();

        Box::new(DisjunctionMaxQuery::new(field_queries))
    }

    fn decode_hit(&self, doc: &TantivyDocument, score: f32) -> SearchResult<RawHit> {
        let source_field = self.schema.get_field(SOURCE_FIELD).map_err(|e| {
            SearchError::IndexNotFound(format!("Schema has no source field: {}", e))
        })?;

        let source = doc
            .get_first(source_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SearchError::IndexQuery("Hit is missing its stored source".to_string()))?;

        let record: ErrorRecord = serde_json::from_str(source).map_err(|e| {
            SearchError::IndexQuery(format!("Failed to decode stored source: {}", e))
        })?;

        Ok(RawHit::scored(record, score))
    }

    fn commit(&self, writer: &mut IndexWriter) -> SearchResult<()> {
        writer
            .commit()
            .map_err(|e| SearchError::IndexWrite(format!("Failed to commit: {}", e)))?;
        self.reader
            .reload()
            .map_err(|e| SearchError::IndexWrite(format!("Failed to reload reader: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl SearchIndexClient for TantivyIndex {
    fn backend_name(&self) -> &'static str {
        "tantivy"
    }

    async fn search(&self, text: &str, fields: &[&str]) -> SearchResult<Vec<RawHit>> {
        let fields = self.resolve_fields(fields)?;
        let terms = self.tokenize(text)?;
        if terms.is_empty() || fields.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.build_query(&terms, &fields);
        let searcher = self.reader.searcher();

        let top_docs = searcher.search(&*query, &TopDocs::with_limit(self.max_results.max(1)))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            hits.push(self.decode_hit(&doc, score)?);
        }

        Ok(hits)
    }

    async fn index_one(&self, id: &str, doc: &ErrorRecord) -> SearchResult<()> {
        let tantivy_doc = doc.to_tantivy_doc(&self.schema)?;
        let id_term = self.id_term(id)?;

        let mut writer = self.writer.write().await;
        writer.delete_term(id_term);
        writer
            .add_document(tantivy_doc)
            .map_err(|e| SearchError::IndexWrite(format!("Failed to add document: {}", e)))?;

        self.commit(&mut writer)
    }

    async fn index_many(&self, docs: &[(String, &ErrorRecord)]) -> BulkResult {
        let mut result = BulkResult::default();
        if docs.is_empty() {
            return result;
        }

        let mut writer = self.writer.write().await;
        let mut pending = Vec::with_capacity(docs.len());

        for (id, record) in docs {
            let prepared = record
                .to_tantivy_doc(&self.schema)
                .and_then(|doc| self.id_term(id).map(|term| (doc, term)));

            let (tantivy_doc, id_term) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    result.record_failure(id.clone(), e);
                    continue;
                }
            };

            writer.delete_term(id_term);
            match writer.add_document(tantivy_doc) {
                Ok(_) => pending.push(id.clone()),
                Err(e) => result.record_failure(
                    id.clone(),
                    SearchError::IndexWrite(format!("Failed to add document: {}", e)),
                ),
            }
        }

        match self.commit(&mut writer) {
            Ok(()) => result.succeeded.extend(pending),
            Err(e) => {
                for id in pending {
                    result.record_failure(id, e.clone());
                }
            }
        }

        result
    }

    async fn delete(&self, id: &str) -> SearchResult<()> {
        let id_term = self.id_term(id)?;
        let mut writer = self.writer.write().await;
        writer.delete_term(id_term);
        self.commit(&mut writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_fuzziness() {
        assert_eq!(auto_fuzziness(1), 0);
        assert_eq!(auto_fuzziness(2), 0);
        assert_eq!(auto_fuzziness(3), 1);
        assert_eq!(auto_fuzziness(5), 1);
        assert_eq!(auto_fuzziness(6), 2);
        assert_eq!(auto_fuzziness(20), 2);
    }

    #[tokio::test]
    async fn test_index_creation() {
        let index = TantivyIndex::in_memory(10).unwrap();
        assert_eq!(index.num_docs(), 0);
        assert_eq!(index.backend_name(), "tantivy");
    }

    #[tokio::test]
    async fn test_unknown_field_is_query_error() {
        let index = TantivyIndex::in_memory(10).unwrap();
        let result = index.search("anything", &["no_such_field"]).await;
        assert!(matches!(result, Err(SearchError::IndexQuery(_))));
    }

    #[test]
    fn test_tokenize_lowercases_and_dedups() {
        let index = TantivyIndex::in_memory(10).unwrap();
        let terms = index.tokenize("TypeError typeerror: Foo").unwrap();
        assert_eq!(terms, vec!["typeerror".to_string(), "foo".to_string()]);
    }
}

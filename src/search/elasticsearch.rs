//! Remote primary index backed by Elasticsearch

use crate::models::ErrorRecord;
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{BulkResult, RawHit, SearchIndexClient};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct EsSearchResponse {
    hits: EsHits,
}

#[derive(Debug, Deserialize)]
struct EsHits {
    #[serde(default)]
    hits: Vec<EsHit>,
}

#[derive(Debug, Deserialize)]
struct EsHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: ErrorRecord,
}

#[derive(Debug, Deserialize)]
struct EsBulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, EsBulkItem>>,
}

#[derive(Debug, Deserialize)]
struct EsBulkItem {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(default)]
    status: u16,
    error: Option<serde_json::Value>,
}

/// HTTP client for an Elasticsearch index
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: String,
    index: String,
    max_results: usize,
}

impl ElasticsearchClient {
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.elasticsearch_url.trim_end_matches('/').to_string(),
            index: config.index_name.clone(),
            max_results: config.max_results,
        })
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index, id)
    }

    /// Map a non-success response onto the index error taxonomy
    async fn classify_failure(&self, response: Response) -> SearchError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND => SearchError::IndexNotFound(format!(
                "index '{}' not found: {}",
                self.index, body
            )),
            StatusCode::BAD_REQUEST => SearchError::IndexQuery(body),
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                SearchError::IndexUnavailable(format!("HTTP {}: {}", s.as_u16(), body))
            }
            s => SearchError::IndexQuery(format!("HTTP {}: {}", s.as_u16(), body)),
        }
    }

    fn bulk_body(&self, docs: &[(String, &ErrorRecord)], result: &mut BulkResult) -> (String, Vec<String>) {
        let mut body = String::new();
        let mut submitted = Vec::with_capacity(docs.len());

        for (id, record) in docs {
            match serde_json::to_string(record) {
                Ok(source) => {
                    let action = json!({ "index": { "_index": self.index, "_id": id } });
                    body.push_str(&action.to_string());
                    body.push('\n');
                    body.push_str(&source);
                    body.push('\n');
                    submitted.push(id.clone());
                }
                Err(e) => result.record_failure(
                    id.clone(),
                    SearchError::IndexWrite(format!("Failed to serialize document: {}", e)),
                ),
            }
        }

        (body, submitted)
    }
}

#[async_trait]
impl SearchIndexClient for ElasticsearchClient {
    fn backend_name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn search(&self, text: &str, fields: &[&str]) -> SearchResult<Vec<RawHit>> {
        let body = json!({
            "size": self.max_results,
            "query": {
                "multi_match": {
                    "query": text,
                    "fields": fields,
                    "fuzziness": "AUTO",
                }
            }
        });

        let response = self
            .client
            .post(format!("{}/{}/_search", self.base_url, self.index))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.classify_failure(response).await);
        }

        let parsed: EsSearchResponse = response.json().await.map_err(|e| {
            SearchError::IndexQuery(format!("Malformed search response: {}", e))
        })?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let mut source = hit.source;
                if source.id.is_nil() {
                    if let Ok(id) = Uuid::parse_str(&hit.id) {
                        source.id = id;
                    }
                }
                RawHit {
                    id: hit.id,
                    score: hit.score,
                    source,
                }
            })
            .collect())
    }

    async fn index_one(&self, id: &str, doc: &ErrorRecord) -> SearchResult<()> {
        let response = self
            .client
            .put(self.doc_url(id))
            .json(doc)
            .send()
            .await
            .map_err(|e| SearchError::IndexWrite(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let cause = self.classify_failure(response).await;
            Err(SearchError::IndexWrite(cause.to_string()))
        }
    }

    async fn index_many(&self, docs: &[(String, &ErrorRecord)]) -> BulkResult {
        let mut result = BulkResult::default();
        let (body, submitted) = self.bulk_body(docs, &mut result);
        if submitted.is_empty() {
            return result;
        }

        let response = match self
            .client
            .post(format!("{}/_bulk", self.base_url))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                let cause = self.classify_failure(response).await;
                return merge(result, BulkResult::all_failed(submitted, SearchError::IndexWrite(cause.to_string())));
            }
            Err(e) => {
                return merge(result, BulkResult::all_failed(submitted, SearchError::IndexWrite(e.to_string())));
            }
        };

        let parsed: EsBulkResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                let cause = SearchError::IndexWrite(format!("Malformed bulk response: {}", e));
                return merge(result, BulkResult::all_failed(submitted, cause));
            }
        };

        if !parsed.errors {
            result.succeeded.extend(submitted);
            return result;
        }

        // Items come back in request order
        let mut items = parsed.items.into_iter();
        for id in submitted {
            let item = items.next().and_then(|entry| entry.into_values().next());
            match item {
                Some(EsBulkItem { error: Some(error), status, id: item_id }) => {
                    let reason = error
                        .get("reason")
                        .and_then(|r| r.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string());
                    result.record_failure(
                        item_id.unwrap_or(id),
                        SearchError::IndexWrite(format!("HTTP {}: {}", status, reason)),
                    );
                }
                Some(_) => result.record_success(id),
                None => result.record_failure(
                    id,
                    SearchError::IndexWrite("Missing item in bulk response".to_string()),
                ),
            }
        }

        result
    }

    async fn delete(&self, id: &str) -> SearchResult<()> {
        let response = self
            .client
            .delete(self.doc_url(id))
            .send()
            .await
            .map_err(|e| SearchError::IndexWrite(e.to_string()))?;

        match response.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            _ => {
                let cause = self.classify_failure(response).await;
                Err(SearchError::IndexWrite(cause.to_string()))
            }
        }
    }
}

fn merge(mut into: BulkResult, other: BulkResult) -> BulkResult {
    into.succeeded.extend(other.succeeded);
    into.failed.extend(other.failed);
    into
}

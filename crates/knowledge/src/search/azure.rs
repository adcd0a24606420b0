//! Azure AI Search backend.
//!
//! Documents are written with `mergeOrUpload` batches to
//! `POST /indexes/{index}/docs/index`, and queried with a hybrid request
//! to `POST /indexes/{index}/docs/search` that combines a full-text query
//! restricted to the text field with a vector query on the vector field.

use super::{RecordAck, SearchHit, SearchIndex, VectorRecord};
use easydocs_core::config::SearchSettings;
use easydocs_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

const PROVIDER: &str = "azure-search";
const VECTOR_PROFILE: &str = "easydocs-vector-profile";
const VECTOR_ALGORITHM: &str = "easydocs-hnsw";

pub struct AzureSearchIndex {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    index_name: String,
    text_field: String,
    vector_field: String,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct IndexBatchResponse {
    #[serde(default)]
    value: Vec<IndexingResult>,
}

#[derive(Debug, Deserialize)]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

impl AzureSearchIndex {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        settings: &SearchSettings,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::provider(PROVIDER, format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_version: settings.api_version.clone(),
            index_name: settings.index_name.clone(),
            text_field: settings.text_field.clone(),
            vector_field: settings.vector_field.clone(),
            dimensions,
        })
    }

    fn index_url(&self) -> String {
        format!(
            "{}/indexes/{}?api-version={}",
            self.endpoint, self.index_name, self.api_version
        )
    }

    fn docs_url(&self, operation: &str) -> String {
        format!(
            "{}/indexes/{}/docs/{}?api-version={}",
            self.endpoint, self.index_name, operation, self.api_version
        )
    }

    fn upload_body(&self, records: &[VectorRecord]) -> Value {
        let documents: Vec<Value> = records
            .iter()
            .map(|record| {
                let mut doc = Map::new();
                doc.insert("@search.action".to_string(), json!("mergeOrUpload"));
                doc.insert("id".to_string(), json!(record.id));
                doc.insert("title".to_string(), json!(record.title));
                doc.insert(self.text_field.clone(), json!(record.content));
                doc.insert(self.vector_field.clone(), json!(record.vector));
                Value::Object(doc)
            })
            .collect();

        json!({ "value": documents })
    }

    fn search_body(&self, query: &str, vector: &[f32], k: usize) -> Value {
        json!({
            "search": query,
            "searchFields": self.text_field,
            "select": format!("id,title,{}", self.text_field),
            "top": k,
            "vectorQueries": [{
                "kind": "vector",
                "vector": vector,
                "fields": self.vector_field,
                "k": k,
            }],
        })
    }

    fn index_schema(&self) -> Value {
        json!({
            "name": self.index_name,
            "fields": [
                { "name": "id", "type": "Edm.String", "key": true, "filterable": true },
                { "name": "title", "type": "Edm.String", "searchable": true, "filterable": true },
                { "name": self.text_field, "type": "Edm.String", "searchable": true },
                {
                    "name": self.vector_field,
                    "type": "Collection(Edm.Single)",
                    "searchable": true,
                    "dimensions": self.dimensions,
                    "vectorSearchProfile": VECTOR_PROFILE,
                },
            ],
            "vectorSearch": {
                "algorithms": [{ "name": VECTOR_ALGORITHM, "kind": "hnsw" }],
                "profiles": [{ "name": VECTOR_PROFILE, "algorithm": VECTOR_ALGORITHM }],
            },
        })
    }

    fn hit_from_document(&self, doc: &Map<String, Value>) -> Option<SearchHit> {
        let text = |field: &str| doc.get(field).and_then(Value::as_str).map(str::to_string);

        Some(SearchHit {
            id: text("id")?,
            title: text("title").unwrap_or_default(),
            content: text(&self.text_field)?,
            score: doc
                .get("@search.score")
                .and_then(Value::as_f64)
                .unwrap_or(0.0) as f32,
        })
    }

    async fn post(&self, url: String, body: &Value) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        error_for_status(response).await
    }
}

async fn error_for_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::provider(
        PROVIDER,
        format!("API error ({}): {}", status, error_text),
    ))
}

#[async_trait::async_trait]
impl SearchIndex for AzureSearchIndex {
    fn name(&self) -> &str {
        "azure"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> AppResult<Vec<RecordAck>> {
        tracing::info!(
            "Uploading {} documents to Azure AI Search index '{}'",
            records.len(),
            self.index_name
        );

        // 207 Multi-Status still carries per-document results
        let response = self
            .post(self.docs_url("index"), &self.upload_body(records))
            .await?;

        let parsed: IndexBatchResponse = response.json().await.map_err(|e| {
            AppError::provider(PROVIDER, format!("Failed to parse indexing response: {}", e))
        })?;

        Ok(parsed
            .value
            .into_iter()
            .map(|result| {
                if result.status {
                    RecordAck::written(result.key)
                } else {
                    RecordAck::rejected(
                        result.key,
                        result
                            .error_message
                            .unwrap_or_else(|| "rejected by index".to_string()),
                    )
                }
            })
            .collect())
    }

    async fn hybrid_search(
        &self,
        query: &str,
        vector: &[f32],
        k: usize,
    ) -> AppResult<Vec<SearchHit>> {
        tracing::debug!("Hybrid search on '{}' (k = {})", self.index_name, k);

        let response = self
            .post(self.docs_url("search"), &self.search_body(query, vector, k))
            .await?;

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            AppError::provider(PROVIDER, format!("Failed to parse search response: {}", e))
        })?;

        Ok(parsed
            .value
            .iter()
            .filter_map(|doc| self.hit_from_document(doc))
            .collect())
    }

    async fn ensure_index(&self) -> AppResult<bool> {
        let existing = self
            .client
            .get(self.index_url())
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        if existing.status() != StatusCode::NOT_FOUND {
            error_for_status(existing).await?;
            tracing::info!("Index '{}' already exists", self.index_name);
            return Ok(false);
        }

        let response = self
            .client
            .put(self.index_url())
            .header("api-key", &self.api_key)
            .json(&self.index_schema())
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;
        error_for_status(response).await?;

        tracing::info!("Created index '{}'", self.index_name);
        Ok(true)
    }
}

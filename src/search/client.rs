//! HTTP client for an Elasticsearch-compatible index store

use crate::config::IndexStoreConfig;
use crate::search::error::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const NDJSON: &str = "application/x-ndjson";

/// Outcome of a bulk request the index store accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkResponse {
    /// Actions in the request
    pub items: usize,

    /// Actions the index store rejected individually
    pub item_errors: usize,
}

/// Index store operations used by the pipeline
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Whether the index exists
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    /// Create an index with the given settings and mappings.
    ///
    /// Returns [`SearchError::IndexAlreadyExists`] when another creator won.
    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()>;

    /// Send a newline-delimited bulk body
    async fn bulk(&self, body: String) -> SearchResult<BulkResponse>;

    /// Run a search request against an index and return the raw response
    async fn search(&self, index: &str, body: &Value) -> SearchResult<Value>;
}

#[derive(Debug, Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Map<String, Value>>,
}

impl RawBulkResponse {
    fn summarize(self) -> BulkResponse {
        let item_errors = if self.errors {
            self.items
                .iter()
                .filter(|item| item.values().any(|action| action.get("error").is_some()))
                .count()
        } else {
            0
        };

        BulkResponse {
            items: self.items.len(),
            item_errors,
        }
    }
}

/// reqwest-backed [`IndexStore`]
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: String,
}

impl ElasticsearchClient {
    /// Create a client against `config.host`
    pub fn new(config: &IndexStoreConfig) -> SearchResult<Self> {
        let base_url = config.host.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "index_store.host must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn error_from(response: reqwest::Response) -> SearchError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SearchError::Http { status, body }
    }
}

#[async_trait]
impl IndexStore for ElasticsearchClient {
    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let response = self.client.head(self.url(index)).send().await?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()> {
        let response = self.client.put(self.url(index)).json(body).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        match Self::error_from(response).await {
            SearchError::Http { body, .. } if body.contains("resource_already_exists_exception") => {
                Err(SearchError::IndexAlreadyExists(index.to_string()))
            }
            err => Err(err),
        }
    }

    async fn bulk(&self, body: String) -> SearchResult<BulkResponse> {
        let bytes = body.len();
        let response = self
            .client
            .post(self.url("_bulk"))
            .header(CONTENT_TYPE, NDJSON)
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let raw: RawBulkResponse = response.json().await?;
        debug!(bytes = bytes, items = raw.items.len(), "Bulk request accepted");
        Ok(raw.summarize())
    }

    async fn search(&self, index: &str, body: &Value) -> SearchResult<Value> {
        let response = self
            .client
            .post(self.url(&format!("{}/_search", index)))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(response.json().await?)
    }
}

//! Search service: compiled queries against the article index

use crate::search::client::IndexStore;
use crate::search::error::SearchResult;
use crate::search::query::{tag_aggregation_query, SearchRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs relevance searches and tag analytics.
///
/// Responses are the index store's JSON, passed through unchanged.
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn IndexStore>,
    index: String,
}

impl SearchService {
    pub fn new(store: Arc<dyn IndexStore>, index: impl Into<String>) -> Self {
        Self {
            store,
            index: index.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Relevance search
    pub async fn search(&self, request: &SearchRequest) -> SearchResult<Value> {
        let start = Instant::now();
        let body = request.compile();
        let response = self.store.search(&self.index, &body).await?;

        debug!(
            query = %request.query,
            from = request.from,
            size = request.size,
            took_ms = start.elapsed().as_millis() as u64,
            "Search executed"
        );
        Ok(response)
    }

    /// Top tags by document count
    pub async fn top_tags(&self) -> SearchResult<Value> {
        self.store.search(&self.index, &tag_aggregation_query()).await
    }
}

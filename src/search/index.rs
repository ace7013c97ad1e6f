//! Index lifecycle: make sure the article index exists before it is used

use crate::config::IndexStoreConfig;
use crate::search::client::IndexStore;
use crate::search::error::SearchError;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of [`IndexManager::ensure_index`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index was already there
    Exists,
    /// The index was created with [`index_schema`]
    Created,
    /// The index could not be confirmed or created; index and search calls
    /// will fail until it is created out of band
    Degraded { reason: String },
}

impl IndexStatus {
    pub fn is_ready(&self) -> bool {
        !matches!(self, IndexStatus::Degraded { .. })
    }
}

/// Settings and mappings of the article index.
///
/// `title` and `content` are analyzed full text; `tags` and `source_url` are
/// exact-match keywords.
pub fn index_schema(number_of_shards: u32, number_of_replicas: u32) -> Value {
    json!({
        "settings": {
            "number_of_shards": number_of_shards,
            "number_of_replicas": number_of_replicas
        },
        "mappings": {
            "properties": {
                "title": { "type": "text" },
                "content": { "type": "text" },
                "tags": { "type": "keyword" },
                "source_url": { "type": "keyword" }
            }
        }
    })
}

/// Ensures the article index exists
pub struct IndexManager {
    store: Arc<dyn IndexStore>,
    index: String,
    number_of_shards: u32,
    number_of_replicas: u32,
}

impl IndexManager {
    pub fn new(store: Arc<dyn IndexStore>, config: &IndexStoreConfig) -> Self {
        Self {
            store,
            index: config.index.clone(),
            number_of_shards: config.number_of_shards,
            number_of_replicas: config.number_of_replicas,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Probe for the index and create it when absent.
    ///
    /// Never fails: problems are logged and reported as
    /// [`IndexStatus::Degraded`]. Safe to call repeatedly.
    pub async fn ensure_index(&self) -> IndexStatus {
        match self.store.index_exists(&self.index).await {
            Ok(true) => {
                info!(index = %self.index, "Index already exists");
                return IndexStatus::Exists;
            }
            Ok(false) => {}
            Err(e) => {
                // Fall through and try to create it anyway
                warn!(index = %self.index, error = %e, "Index existence check failed");
            }
        }

        let schema = index_schema(self.number_of_shards, self.number_of_replicas);
        match self.store.create_index(&self.index, &schema).await {
            Ok(()) => {
                info!(index = %self.index, "Created index");
                IndexStatus::Created
            }
            Err(SearchError::IndexAlreadyExists(_)) => {
                info!(index = %self.index, "Index was created concurrently");
                IndexStatus::Exists
            }
            Err(e) => {
                error!(
                    index = %self.index,
                    status = ?e.status(),
                    error = %e,
                    "Failed to create index, continuing in degraded mode"
                );
                IndexStatus::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }
}

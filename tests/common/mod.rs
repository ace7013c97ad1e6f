//! Shared fakes for integration tests
//!
//! - [`RecordingIndexStore`]: an in-process index store that records every
//!   request body it receives
//! - [`FlakyProducer`]: a message producer that fails for chosen keys

#![allow(dead_code)]

use article_pipeline::messaging::{MessageProducer, MessagingError, MessagingResult};
use article_pipeline::models::Article;
use article_pipeline::search::{BulkResponse, IndexStore, SearchError, SearchResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;

/// Index store fake
#[derive(Default)]
pub struct RecordingIndexStore {
    pub bulk_bodies: Mutex<Vec<String>>,
    pub search_bodies: Mutex<Vec<Value>>,
    pub fail_with_status: Option<u16>,
}

impl RecordingIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake whose every request answers with `status`
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Default::default()
        }
    }

    pub fn bulk_count(&self) -> usize {
        self.bulk_bodies.lock().len()
    }

    /// Number of documents in the `n`th bulk request
    pub fn documents_in(&self, n: usize) -> usize {
        self.bulk_bodies.lock()[n].lines().count() / 2
    }

    /// Ids of the documents in the `n`th bulk request, in order
    pub fn ids_in(&self, n: usize) -> Vec<i64> {
        self.bulk_bodies.lock()[n]
            .lines()
            .skip(1)
            .step_by(2)
            .map(|line| {
                serde_json::from_str::<Value>(line).unwrap()["id"]
                    .as_i64()
                    .unwrap()
            })
            .collect()
    }

    pub fn last_search(&self) -> Option<Value> {
        self.search_bodies.lock().last().cloned()
    }

    fn check(&self) -> SearchResult<()> {
        match self.fail_with_status {
            Some(status) => Err(SearchError::Http {
                status,
                body: json!({"error": {"type": "cluster_block_exception"}}).to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IndexStore for RecordingIndexStore {
    async fn index_exists(&self, _index: &str) -> SearchResult<bool> {
        self.check()?;
        Ok(true)
    }

    async fn create_index(&self, _index: &str, _body: &Value) -> SearchResult<()> {
        self.check()
    }

    async fn bulk(&self, body: String) -> SearchResult<BulkResponse> {
        let items = body.lines().count() / 2;
        self.bulk_bodies.lock().push(body);
        self.check()?;
        Ok(BulkResponse {
            items,
            item_errors: 0,
        })
    }

    async fn search(&self, _index: &str, body: &Value) -> SearchResult<Value> {
        self.search_bodies.lock().push(body.clone());
        self.check()?;
        Ok(json!({
            "took": 1,
            "hits": {"total": {"value": 0, "relation": "eq"}, "hits": []}
        }))
    }
}

/// Producer that records what it published and fails for selected keys
#[derive(Default)]
pub struct FlakyProducer {
    pub failing_keys: HashSet<String>,
    pub published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FlakyProducer {
    pub fn failing_on<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        Self {
            failing_keys: ids.into_iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn published_keys(&self) -> Vec<String> {
        self.published.lock().iter().map(|(k, _)| k.clone()).collect()
    }
}

#[async_trait]
impl MessageProducer for FlakyProducer {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()> {
        if self.failing_keys.contains(key) {
            return Err(MessagingError::PublishFailed(format!(
                "broker rejected key {} on {}",
                key, topic
            )));
        }
        self.published.lock().push((key.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// A fully populated article
pub fn article(id: i64) -> Article {
    Article::new(
        id,
        format!("Book {id}"),
        format!("Description of book {id}"),
        "Fiction;Three",
        format!("https://books.toscrape.com/catalogue/book_{id}/index.html"),
    )
}

/// Flat envelope for `article(id)`
pub fn flat_event(id: i64) -> Vec<u8> {
    serde_json::to_vec(&article(id)).unwrap()
}

//! Bulk index buffer
//!
//! Articles decoded from the bus accumulate here and go to the index store
//! as one bulk request once the threshold is reached. All mutation,
//! including the flush itself, happens under a single async lock, so any
//! number of consumer tasks can feed the same buffer.

use crate::indexer::bulk::BulkBatch;
use crate::messaging::events;
use crate::metrics::{BULK_DOCUMENTS_TOTAL, BULK_FLUSHES_TOTAL, EVENTS_CONSUMED_TOTAL};
use crate::models::Article;
use crate::search::IndexStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Buffered documents that trigger a flush unless configured otherwise
pub const DEFAULT_BULK_SIZE: usize = 200;

/// What a flush did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered; no request was sent
    Empty,
    /// The index store accepted the batch
    Indexed { documents: usize, item_errors: usize },
    /// The batch could not be sent or was rejected; it has been discarded
    Failed { documents: usize },
}

/// What happened to one consumed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Appended; `pending` documents are now buffered
    Buffered { pending: usize },
    /// Appended and the threshold was reached
    Flushed(FlushOutcome),
    /// The payload was not a valid article envelope
    Dropped,
}

/// Batches articles into bulk requests
pub struct BulkIndexBuffer {
    store: Arc<dyn IndexStore>,
    index: String,
    threshold: usize,
    buffer: Mutex<Vec<Article>>,
}

impl BulkIndexBuffer {
    pub fn new(store: Arc<dyn IndexStore>, index: impl Into<String>, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            store,
            index: index.into(),
            threshold,
            buffer: Mutex::new(Vec::with_capacity(threshold)),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Documents currently waiting for a flush
    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Decode one envelope and buffer it, flushing when the threshold is reached.
    ///
    /// Malformed envelopes are logged and dropped.
    pub async fn on_message(&self, payload: &[u8]) -> MessageOutcome {
        let article = match events::decode(payload) {
            Ok(article) => article,
            Err(e) => {
                EVENTS_CONSUMED_TOTAL.with_label_values(&["dropped"]).inc();
                warn!(error = %e, bytes = payload.len(), "Dropping malformed article event");
                return MessageOutcome::Dropped;
            }
        };
        EVENTS_CONSUMED_TOTAL.with_label_values(&["buffered"]).inc();

        let mut buffer = self.buffer.lock().await;
        buffer.push(article);

        if buffer.len() >= self.threshold {
            MessageOutcome::Flushed(self.flush_locked(&mut buffer).await)
        } else {
            MessageOutcome::Buffered {
                pending: buffer.len(),
            }
        }
    }

    /// Send everything buffered as one bulk request.
    ///
    /// The buffer is empty afterwards whatever the outcome; a failed batch
    /// is not retried.
    pub async fn flush(&self) -> FlushOutcome {
        let mut buffer = self.buffer.lock().await;
        self.flush_locked(&mut buffer).await
    }

    /// Final flush before the process exits
    pub async fn on_shutdown(&self) -> FlushOutcome {
        let outcome = self.flush().await;
        info!(outcome = ?outcome, "Bulk index buffer drained on shutdown");
        outcome
    }

    async fn flush_locked(&self, buffer: &mut Vec<Article>) -> FlushOutcome {
        if buffer.is_empty() {
            return FlushOutcome::Empty;
        }

        let articles = std::mem::take(buffer);
        let documents = articles.len();

        let batch = match BulkBatch::from_articles(&self.index, &articles) {
            Ok(batch) => batch,
            Err(e) => {
                BULK_FLUSHES_TOTAL.with_label_values(&["failure"]).inc();
                error!(documents = documents, error = %e, "Failed to build bulk batch");
                return FlushOutcome::Failed { documents };
            }
        };

        match self.store.bulk(batch.into_body()).await {
            Ok(response) => {
                BULK_FLUSHES_TOTAL.with_label_values(&["success"]).inc();
                BULK_DOCUMENTS_TOTAL.inc_by(documents as u64);

                if response.item_errors > 0 {
                    warn!(
                        index = %self.index,
                        documents = documents,
                        item_errors = response.item_errors,
                        "Bulk request completed with item errors"
                    );
                } else {
                    info!(index = %self.index, documents = documents, "Bulk indexed documents");
                }

                FlushOutcome::Indexed {
                    documents,
                    item_errors: response.item_errors,
                }
            }
            Err(e) => {
                BULK_FLUSHES_TOTAL.with_label_values(&["failure"]).inc();
                error!(
                    index = %self.index,
                    documents = documents,
                    status = ?e.status(),
                    error = %e,
                    "Bulk request failed, batch discarded"
                );
                FlushOutcome::Failed { documents }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{BulkResponse, SearchError, SearchResult};
    use async_trait::async_trait;
    use serde_json::Value;

    #[derive(Default)]
    struct RecordingStore {
        bodies: parking_lot::Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl IndexStore for RecordingStore {
        async fn index_exists(&self, _index: &str) -> SearchResult<bool> {
            Ok(true)
        }

        async fn create_index(&self, _index: &str, _body: &Value) -> SearchResult<()> {
            Ok(())
        }

        async fn bulk(&self, body: String) -> SearchResult<BulkResponse> {
            let items = body.lines().count() / 2;
            self.bodies.lock().push(body);
            if self.fail {
                return Err(SearchError::Http {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(BulkResponse {
                items,
                item_errors: 0,
            })
        }

        async fn search(&self, _index: &str, _body: &Value) -> SearchResult<Value> {
            Ok(Value::Null)
        }
    }

    fn event(id: i64) -> Vec<u8> {
        format!(r#"{{"id":{id},"title":"t{id}","content":"c","tags":"Fiction","source_url":"u"}}"#)
            .into_bytes()
    }

    #[tokio::test]
    async fn test_flushes_exactly_at_threshold() {
        let store = Arc::new(RecordingStore::default());
        let buffer = BulkIndexBuffer::new(store.clone(), "articles", 3);

        assert_eq!(
            buffer.on_message(&event(1)).await,
            MessageOutcome::Buffered { pending: 1 }
        );
        assert_eq!(
            buffer.on_message(&event(2)).await,
            MessageOutcome::Buffered { pending: 2 }
        );
        assert!(store.bodies.lock().is_empty());

        assert_eq!(
            buffer.on_message(&event(3)).await,
            MessageOutcome::Flushed(FlushOutcome::Indexed {
                documents: 3,
                item_errors: 0
            })
        );
        assert_eq!(store.bodies.lock().len(), 1);
        assert_eq!(buffer.pending().await, 0);
    }

    #[tokio::test]
    async fn test_flush_on_empty_buffer_sends_nothing() {
        let store = Arc::new(RecordingStore::default());
        let buffer = BulkIndexBuffer::new(store.clone(), "articles", 10);

        assert_eq!(buffer.flush().await, FlushOutcome::Empty);
        assert_eq!(buffer.flush().await, FlushOutcome::Empty);
        assert!(store.bodies.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_flush_discards_batch() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let buffer = BulkIndexBuffer::new(store.clone(), "articles", 10);

        buffer.on_message(&event(1)).await;
        buffer.on_message(&event(2)).await;

        assert_eq!(buffer.flush().await, FlushOutcome::Failed { documents: 2 });
        assert_eq!(buffer.pending().await, 0);
        assert_eq!(buffer.flush().await, FlushOutcome::Empty);
        assert_eq!(store.bodies.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_event_is_dropped() {
        let store = Arc::new(RecordingStore::default());
        let buffer = BulkIndexBuffer::new(store, "articles", 10);

        assert_eq!(buffer.on_message(b"{not json").await, MessageOutcome::Dropped);
        assert_eq!(buffer.on_message(br#"{"title":"no id"}"#).await, MessageOutcome::Dropped);
        assert_eq!(
            buffer.on_message(&event(9)).await,
            MessageOutcome::Buffered { pending: 1 }
        );
    }
}

//! Watermark poller
//!
//! Reads articles past a cursor from the relational store and publishes each
//! one to the event bus. The cursor is recomputed from `MAX(id)` at startup,
//! so rows inserted while the process was down are never published.

use crate::messaging::{events, MessageProducer};
use crate::metrics::{ARTICLES_PUBLISHED_TOTAL, PUBLISH_FAILURES_TOTAL, WATERMARK};
use crate::store::{ArticleStore, StoreResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Rows read per poll unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Publishes new relational rows to the event bus.
///
/// Owns the watermark exclusively; every method that moves it takes
/// `&mut self`, so two polls can never run at once.
pub struct ArticlePublisher {
    store: Arc<dyn ArticleStore>,
    producer: Arc<dyn MessageProducer>,
    topic: String,
    page_size: u32,
    watermark: i64,
}

impl ArticlePublisher {
    /// Create a publisher whose watermark starts at the store's current `MAX(id)`
    pub async fn new(
        store: Arc<dyn ArticleStore>,
        producer: Arc<dyn MessageProducer>,
        topic: impl Into<String>,
        page_size: u32,
    ) -> StoreResult<Self> {
        let watermark = store.max_id().await?;
        info!(watermark = watermark, "Watermark initialised from relational store");
        Ok(Self::with_watermark(store, producer, topic, page_size, watermark))
    }

    /// Create a publisher starting from an explicit watermark
    pub fn with_watermark(
        store: Arc<dyn ArticleStore>,
        producer: Arc<dyn MessageProducer>,
        topic: impl Into<String>,
        page_size: u32,
        watermark: i64,
    ) -> Self {
        WATERMARK.set(watermark);
        Self {
            store,
            producer,
            topic: topic.into(),
            page_size: page_size.max(1),
            watermark,
        }
    }

    /// Highest id handed to the event bus so far
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// Publish one page of rows past the watermark and return how many succeeded.
    ///
    /// The watermark moves to the id of every successful publish in turn. A
    /// failed row is logged and skipped; if a later row of the same page
    /// succeeds, the watermark passes the failed id and it is not retried.
    /// Only a failure to read the page is returned as an error.
    pub async fn poll(&mut self) -> StoreResult<usize> {
        let articles = self.store.fetch_after(self.watermark, self.page_size).await?;
        let mut published = 0;

        for article in &articles {
            let payload = match events::encode(article) {
                Ok(payload) => payload,
                Err(e) => {
                    PUBLISH_FAILURES_TOTAL.inc();
                    error!(article_id = article.id, error = %e, "Failed to encode article");
                    continue;
                }
            };

            let key = events::message_key(article);
            match self.producer.publish(&self.topic, &key, &payload).await {
                Ok(()) => {
                    self.watermark = article.id;
                    published += 1;
                    ARTICLES_PUBLISHED_TOTAL.inc();
                    WATERMARK.set(self.watermark);
                }
                Err(e) => {
                    PUBLISH_FAILURES_TOTAL.inc();
                    error!(
                        article_id = article.id,
                        topic = %self.topic,
                        error = %e,
                        "Failed to publish article"
                    );
                }
            }
        }

        if published > 0 {
            info!(
                published = published,
                watermark = self.watermark,
                "Published new articles"
            );
        } else {
            debug!(fetched = articles.len(), "No articles published this cycle");
        }

        Ok(published)
    }

    /// Poll until `shutdown` flips to `true`, waiting `interval` after each
    /// completed cycle.
    pub async fn run(mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            topic = %self.topic,
            interval_ms = interval.as_millis() as u64,
            "Watermark poller started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.poll().await {
                warn!(error = %e, watermark = self.watermark, "Poll failed, retrying next cycle");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(watermark = self.watermark, "Watermark poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{InMemoryBus, MessageConsumer};
    use crate::models::Article;
    use crate::store::InMemoryArticleStore;

    fn seeded_store(ids: &[i64]) -> Arc<InMemoryArticleStore> {
        let store = InMemoryArticleStore::new();
        for &id in ids {
            store.put(Article::new(id, format!("title {id}"), "content", "Fiction", "https://example.com"));
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_new_starts_at_max_id() {
        let store = seeded_store(&[1, 2, 7]);
        let bus = Arc::new(InMemoryBus::new());

        let publisher = ArticlePublisher::new(store, bus, "articles.new", DEFAULT_PAGE_SIZE)
            .await
            .unwrap();
        assert_eq!(publisher.watermark(), 7);
    }

    #[tokio::test]
    async fn test_poll_publishes_in_id_order() {
        let store = seeded_store(&[1, 2, 3]);
        let bus = Arc::new(InMemoryBus::new());
        let mut stream = bus.subscribe("articles.new").await.unwrap();

        let mut publisher =
            ArticlePublisher::with_watermark(store, bus.clone(), "articles.new", DEFAULT_PAGE_SIZE, 0);

        assert_eq!(publisher.poll().await.unwrap(), 3);
        assert_eq!(publisher.watermark(), 3);
        assert_eq!(publisher.poll().await.unwrap(), 0);
        assert_eq!(publisher.watermark(), 3);

        for expected in 1..=3 {
            let message = stream.next().await.unwrap().unwrap();
            assert_eq!(message.key, Some(expected.to_string()));
            assert_eq!(events::decode(&message.payload).unwrap().id, expected);
        }
    }

    #[tokio::test]
    async fn test_page_size_bounds_each_poll() {
        let store = seeded_store(&[1, 2, 3, 4, 5]);
        let bus = Arc::new(InMemoryBus::new());
        let mut publisher = ArticlePublisher::with_watermark(store, bus, "articles.new", 2, 0);

        assert_eq!(publisher.poll().await.unwrap(), 2);
        assert_eq!(publisher.watermark(), 2);
        assert_eq!(publisher.poll().await.unwrap(), 2);
        assert_eq!(publisher.poll().await.unwrap(), 1);
        assert_eq!(publisher.watermark(), 5);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = seeded_store(&[]);
        let bus = Arc::new(InMemoryBus::new());
        let publisher = ArticlePublisher::with_watermark(store, bus, "articles.new", 10, 0);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(publisher.run(Duration::from_secs(3600), rx));
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }
}

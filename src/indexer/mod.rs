//! Bulk indexer
//!
//! Consumes article events from the bus and writes them to the index store
//! in bulk. Several consumers may share one [`BulkIndexBuffer`].

mod buffer;
mod bulk;
mod consumer;

pub use buffer::{BulkIndexBuffer, FlushOutcome, MessageOutcome, DEFAULT_BULK_SIZE};
pub use bulk::BulkBatch;
pub use consumer::run_consumer;

use crate::messaging::{MessageConsumer, MessagingResult};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Runs the consumers of one indexer process and drains the buffer at the end
pub struct IndexerWorker {
    consumer: Arc<dyn MessageConsumer>,
    buffer: Arc<BulkIndexBuffer>,
    topic: String,
    consumers: usize,
}

impl IndexerWorker {
    pub fn new(
        consumer: Arc<dyn MessageConsumer>,
        buffer: Arc<BulkIndexBuffer>,
        topic: impl Into<String>,
        consumers: usize,
    ) -> Self {
        Self {
            consumer,
            buffer,
            topic: topic.into(),
            consumers: consumers.max(1),
        }
    }

    pub fn buffer(&self) -> &Arc<BulkIndexBuffer> {
        &self.buffer
    }

    /// Subscribe every consumer, run them until `shutdown` flips, then flush
    /// whatever is still buffered.
    ///
    /// Fails only when a subscription cannot be created.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> MessagingResult<FlushOutcome> {
        let mut streams = Vec::with_capacity(self.consumers);
        for _ in 0..self.consumers {
            streams.push(self.consumer.subscribe(&self.topic).await?);
        }

        info!(
            topic = %self.topic,
            consumers = self.consumers,
            bulk_size = self.buffer.threshold(),
            "Indexer started"
        );

        let tasks: Vec<_> = streams
            .into_iter()
            .enumerate()
            .map(|(id, stream)| {
                tokio::spawn(run_consumer(
                    id,
                    stream,
                    self.buffer.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Consumer task panicked");
            }
        }

        Ok(self.buffer.on_shutdown().await)
    }
}

//! Consumer loop feeding the bulk index buffer

use crate::indexer::buffer::BulkIndexBuffer;
use crate::messaging::{ConsumedMessage, MessageStream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Pause after a failed receive so a broken connection does not spin
const RECEIVE_ERROR_PAUSE: Duration = Duration::from_millis(500);

/// Deliver messages from `stream` to `buffer` until shutdown or end of stream.
///
/// A message already being delivered is finished before shutdown is honoured.
/// On shutdown, messages the stream already holds locally are delivered too,
/// so the final flush sees them.
pub async fn run_consumer(
    consumer_id: usize,
    mut stream: Box<dyn MessageStream>,
    buffer: Arc<BulkIndexBuffer>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(consumer_id = consumer_id, "Consumer started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let received = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            received = stream.next() => received,
        };

        match received {
            Ok(Some(message)) => deliver(consumer_id, &buffer, message).await,
            Ok(None) => {
                info!(consumer_id = consumer_id, "Message stream ended");
                break;
            }
            Err(e) => {
                warn!(consumer_id = consumer_id, error = %e, "Failed to receive message");
                tokio::time::sleep(RECEIVE_ERROR_PAUSE).await;
            }
        }
    }

    let mut drained = 0usize;
    while let Some(message) = stream.try_next() {
        deliver(consumer_id, &buffer, message).await;
        drained += 1;
    }
    if drained > 0 {
        info!(consumer_id = consumer_id, drained = drained, "Delivered queued messages before stopping");
    }

    info!(consumer_id = consumer_id, "Consumer stopped");
}

async fn deliver(consumer_id: usize, buffer: &BulkIndexBuffer, message: ConsumedMessage) {
    let outcome = buffer.on_message(&message.payload).await;
    debug!(
        consumer_id = consumer_id,
        key = ?message.key,
        outcome = ?outcome,
        "Message delivered"
    );
}

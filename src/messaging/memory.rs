//! In-process message bus for single-process deployments and tests

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{ConsumedMessage, MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Unbounded channel standing in for the broker.
///
/// Ordering is preserved and every message is delivered once. There is a
/// single receiving end, so only one stream can be subscribed.
pub struct InMemoryBus {
    sender: mpsc::UnboundedSender<ConsumedMessage>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<ConsumedMessage>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageProducer for InMemoryBus {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()> {
        self.sender
            .send(ConsumedMessage {
                topic: topic.to_string(),
                key: Some(key.to_string()),
                payload: payload.to_vec(),
            })
            .map_err(|_| MessagingError::ChannelClosed(topic.to_string()))
    }
}

#[async_trait]
impl MessageConsumer for InMemoryBus {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let receiver = self.receiver.lock().take().ok_or_else(|| {
            MessagingError::SubscribeFailed("in-memory bus supports a single subscriber".to_string())
        })?;

        Ok(Box::new(InMemoryStream {
            topic: topic.to_string(),
            receiver,
        }))
    }
}

/// Receiving end of an [`InMemoryBus`]
pub struct InMemoryStream {
    topic: String,
    receiver: mpsc::UnboundedReceiver<ConsumedMessage>,
}

#[async_trait]
impl MessageStream for InMemoryStream {
    async fn next(&mut self) -> MessagingResult<Option<ConsumedMessage>> {
        while let Some(message) = self.receiver.recv().await {
            if message.topic == self.topic {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    fn try_next(&mut self) -> Option<ConsumedMessage> {
        while let Ok(message) = self.receiver.try_recv() {
            if message.topic == self.topic {
                return Some(message);
            }
        }
        None
    }
}

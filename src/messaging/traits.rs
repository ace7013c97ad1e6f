//! Messaging trait abstractions

use crate::messaging::error::MessagingResult;
use async_trait::async_trait;

/// A message as delivered by the bus, before any decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedMessage {
    /// Topic the message was read from
    pub topic: String,

    /// Partitioning key, if the producer set one
    pub key: Option<String>,

    /// Raw payload; empty when the bus delivered a tombstone
    pub payload: Vec<u8>,
}

/// Message producer trait
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish one payload to a topic under a partitioning key.
    ///
    /// Returns once the bus acknowledged the message or the configured
    /// message timeout elapsed.
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()>;
}

/// Message consumer trait
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Subscribe to a topic and receive its messages
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>>;
}

/// Message stream trait for consuming messages
#[async_trait]
pub trait MessageStream: Send {
    /// Wait for the next message; `None` once the stream has ended
    async fn next(&mut self) -> MessagingResult<Option<ConsumedMessage>>;

    /// Take a message that is already available locally without waiting.
    ///
    /// Used to drain in-process queues on shutdown. Brokers that retain
    /// unconsumed messages return `None`.
    fn try_next(&mut self) -> Option<ConsumedMessage> {
        None
    }
}

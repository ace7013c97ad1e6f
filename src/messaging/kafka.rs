//! Kafka message queue implementation

use crate::messaging::config::KafkaConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{ConsumedMessage, MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;
use std::sync::Arc;
use std::time::Duration;

fn apply_sasl(client_config: &mut ClientConfig, config: &KafkaConfig) {
    if config.enable_sasl {
        if let (Some(mechanism), Some(username), Some(password)) = (
            &config.sasl_mechanism,
            &config.sasl_username,
            &config.sasl_password,
        ) {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanism", mechanism)
                .set("sasl.username", username)
                .set("sasl.password", password);
        }
    }
}

/// Kafka producer
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

impl KafkaProducer {
    /// Create a new Kafka producer
    pub fn new(config: &KafkaConfig) -> MessagingResult<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("compression.type", &config.compression_type)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("retries", config.retries.to_string());
        apply_sasl(&mut client_config, config);

        let producer: FutureProducer = client_config.create().map_err(|e| {
            MessagingError::ConnectionFailed(format!("Kafka producer creation failed: {}", e))
        })?;

        Ok(Self {
            producer: Arc::new(producer),
        })
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()> {
        let record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic).key(key).payload(payload);

        // A zero queue timeout fails fast when the local queue is full;
        // message.timeout.ms bounds the wait for the broker.
        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| MessagingError::PublishFailed(format!("Kafka publish failed: {}", e)))?;

        Ok(())
    }
}

/// Kafka consumer.
///
/// Each call to [`MessageConsumer::subscribe`] creates a separate group
/// member, so several streams split the topic's partitions between them.
pub struct KafkaConsumer {
    client_config: ClientConfig,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer
    pub fn new(config: &KafkaConfig) -> MessagingResult<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.group_id)
            .set("client.id", &config.client_id)
            .set("enable.auto.commit", config.enable_auto_commit.to_string())
            .set(
                "auto.commit.interval.ms",
                config.auto_commit_interval_ms.to_string(),
            )
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("session.timeout.ms", config.session_timeout_ms.to_string());
        apply_sasl(&mut client_config, config);

        Ok(Self { client_config })
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let consumer: StreamConsumer = self.client_config.create().map_err(|e| {
            MessagingError::ConnectionFailed(format!("Kafka consumer creation failed: {}", e))
        })?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| MessagingError::SubscribeFailed(format!("Kafka subscribe failed: {}", e)))?;

        Ok(Box::new(KafkaMessageStream { consumer }))
    }
}

/// Kafka message stream
pub struct KafkaMessageStream {
    consumer: StreamConsumer,
}

#[async_trait]
impl MessageStream for KafkaMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<ConsumedMessage>> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka recv failed: {}", e)))?;

        Ok(Some(ConsumedMessage {
            topic: msg.topic().to_string(),
            key: msg.key().map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kafka_config() {
        let config = KafkaConfig::default();
        assert_eq!(config.client_id, "article-pipeline");
        assert_eq!(config.compression_type, "snappy");
        assert_eq!(config.retries, 0);
    }

    #[test]
    fn test_consumer_creation_is_lazy() {
        // No broker is contacted until subscribe()
        let consumer = KafkaConsumer::new(&KafkaConfig::default());
        assert!(consumer.is_ok());
    }
}

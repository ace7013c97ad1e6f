//! Messaging configuration

use serde::{Deserialize, Serialize};

/// Messaging backend type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessagingBackend {
    /// Kafka - distributed event streaming platform
    #[default]
    Kafka,
    /// In-process channel, only usable when publisher and indexer share a process
    InMemory,
}

/// Kafka configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Kafka bootstrap servers
    pub bootstrap_servers: String,

    /// Client ID
    pub client_id: String,

    /// Consumer group ID
    pub group_id: String,

    /// Enable auto commit
    pub enable_auto_commit: bool,

    /// Auto commit interval in milliseconds
    pub auto_commit_interval_ms: u64,

    /// Where a new consumer group starts reading (earliest, latest)
    pub auto_offset_reset: String,

    /// Session timeout in milliseconds
    pub session_timeout_ms: u64,

    /// Enable SASL authentication
    pub enable_sasl: bool,

    /// SASL mechanism (PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    pub sasl_mechanism: Option<String>,

    /// SASL username
    pub sasl_username: Option<String>,

    /// SASL password
    pub sasl_password: Option<String>,

    /// Compression type (none, gzip, snappy, lz4, zstd)
    pub compression_type: String,

    /// Upper bound on a single publish, including broker acknowledgement
    pub message_timeout_ms: u64,

    /// Client-level send retries
    pub retries: u32,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "article-pipeline".to_string(),
            group_id: "article-indexer".to_string(),
            enable_auto_commit: true,
            auto_commit_interval_ms: 5000,
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: 30000,
            enable_sasl: false,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
            compression_type: "snappy".to_string(),
            message_timeout_ms: 30000,
            retries: 0,
        }
    }
}

//! Event bus access for article propagation
//!
//! The publisher writes one message per new article, keyed by the article id
//! so every event for an id lands on the same partition. The indexer reads the
//! same topic back. Delivery is at-least-once; re-indexing the same id is an
//! overwrite, so duplicates are harmless.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐          ┌───────────────────┐
//! │ ArticlePublisher  │          │ BulkIndexBuffer   │
//! └─────────┬─────────┘          └─────────▲─────────┘
//!           │ MessageProducer              │ MessageStream
//!           ▼                              │
//! ┌──────────────────────────────────────────────────┐
//! │   Kafka (production)  │  InMemoryBus (one process) │
//! └──────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
pub mod events;
mod kafka;
mod memory;
mod traits;

pub use config::{KafkaConfig, MessagingBackend};
pub use error::{MessagingError, MessagingResult};
pub use events::EnvelopeError;
pub use kafka::{KafkaConsumer, KafkaMessageStream, KafkaProducer};
pub use memory::{InMemoryBus, InMemoryStream};
pub use traits::{ConsumedMessage, MessageConsumer, MessageProducer, MessageStream};

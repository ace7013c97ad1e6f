//! Article propagation pipeline and search API.
//!
//! Rows land in the relational `articles` table (written by an external
//! crawler). The [`publisher`] polls past a watermark and publishes each new
//! row to the event bus, the [`indexer`] buffers those events and bulk-upserts
//! them into the index store, and the [`api`] compiles query strings into
//! relevance queries against that index.
//!
//! ```text
//! articles table ──► publisher ──► Kafka topic ──► indexer ──► index store
//!                                                                   ▲
//!                                       client ──► api ──► search ──┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod indexer;
pub mod messaging;
pub mod metrics;
pub mod models;
pub mod publisher;
pub mod search;
pub mod store;

pub use error::{AppError, Result};
pub use models::Article;

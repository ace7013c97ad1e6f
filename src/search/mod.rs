//! Index store access and search
//!
//! The index store is an Elasticsearch-compatible HTTP service. This module
//! owns the article index schema and the shape of every query sent to it.
//!
//! ```text
//! ┌───────────────┐   ┌──────────────┐   ┌────────────────┐
//! │ BulkIndexBuffer│  │ IndexManager │   │ SearchService  │
//! └───────┬───────┘   └──────┬───────┘   └───────┬────────┘
//!         │ bulk()           │ HEAD / PUT        │ query::compile()
//!         ▼                  ▼                   ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          IndexStore (ElasticsearchClient)                │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use article_pipeline::config::IndexStoreConfig;
//! use article_pipeline::search::{ElasticsearchClient, SearchRequest, SearchService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IndexStoreConfig::default();
//!     let client = Arc::new(ElasticsearchClient::new(&config)?);
//!     let search = SearchService::new(client, &config.index);
//!
//!     let hits = search.search(&SearchRequest::new("tag:fiction velvet", 0, 10)).await?;
//!     println!("{}", hits);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod index;
pub mod query;
mod service;

pub use client::{BulkResponse, ElasticsearchClient, IndexStore};
pub use error::{SearchError, SearchResult};
pub use index::{index_schema, IndexManager, IndexStatus};
pub use query::{compile, parse_query, tag_aggregation_query, ParsedQuery, SearchRequest};
pub use service::SearchService;

//! Relational store access
//!
//! The `articles` table is written by the crawler and only read here, apart
//! from [`ArticleStore::insert`] which tests and fixtures use to populate a
//! store.

mod error;
mod memory;
mod sql;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryArticleStore;
pub use sql::SqlArticleStore;

use crate::models::Article;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Row returned by the baseline substring scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            content: article.content.clone(),
        }
    }
}

/// Fields of an article before the store assigns its id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
    pub source_url: Option<String>,
}

/// Trait for article storage operations
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Highest id in the table, 0 when it is empty
    async fn max_id(&self) -> StoreResult<i64>;

    /// Up to `limit` articles with `id > after`, ascending by id
    async fn fetch_after(&self, after: i64, limit: u32) -> StoreResult<Vec<Article>>;

    /// Every article whose content contains `needle`, without any index.
    ///
    /// Matching ignores ASCII case, as `LIKE` does under the default SQLite
    /// and MySQL collations.
    async fn search_content(&self, needle: &str) -> StoreResult<Vec<ArticleSummary>>;

    /// Insert an article and return its assigned id. Used by tests and
    /// fixtures; the pipeline itself never writes articles.
    async fn insert(&self, article: &NewArticle) -> StoreResult<i64>;
}

//! In-memory article store for development and tests

use super::{ArticleStore, ArticleSummary, NewArticle, StoreResult};
use crate::models::Article;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Articles kept in id order behind a lock; ids are assigned sequentially
#[derive(Clone, Default)]
pub struct InMemoryArticleStore {
    articles: Arc<RwLock<BTreeMap<i64, Article>>>,
}

impl InMemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an article under its own id, replacing any previous row
    pub fn put(&self, article: Article) {
        self.articles.write().insert(article.id, article);
    }

    pub fn len(&self) -> usize {
        self.articles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.read().is_empty()
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn max_id(&self) -> StoreResult<i64> {
        Ok(self.articles.read().keys().next_back().copied().unwrap_or(0))
    }

    async fn fetch_after(&self, after: i64, limit: u32) -> StoreResult<Vec<Article>> {
        let articles = self.articles.read();
        Ok(articles
            .range(after.saturating_add(1)..)
            .take(limit as usize)
            .map(|(_, article)| article.clone())
            .collect())
    }

    async fn search_content(&self, needle: &str) -> StoreResult<Vec<ArticleSummary>> {
        let needle = needle.to_ascii_lowercase();
        let articles = self.articles.read();
        Ok(articles
            .values()
            .filter(|article| {
                article
                    .content
                    .as_deref()
                    .map(|content| content.to_ascii_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .map(ArticleSummary::from)
            .collect())
    }

    async fn insert(&self, article: &NewArticle) -> StoreResult<i64> {
        let mut articles = self.articles.write();
        let id = articles.keys().next_back().copied().unwrap_or(0) + 1;
        articles.insert(
            id,
            Article {
                id,
                title: article.title.clone(),
                content: article.content.clone(),
                tags: article.tags.clone(),
                source_url: article.source_url.clone(),
            },
        );
        tracing::debug!(article_id = id, "Article inserted");
        Ok(id)
    }
}

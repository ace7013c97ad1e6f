//! Newline-delimited bulk request bodies

use crate::models::Article;
use serde::Serialize;

#[derive(Serialize)]
struct BulkAction<'a> {
    index: ActionMeta<'a>,
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: String,
}

/// One bulk request: an action line and a source line per article.
///
/// The article id is the document id, so sending the same article twice
/// overwrites the earlier document.
#[derive(Debug, Clone, Default)]
pub struct BulkBatch {
    body: String,
    documents: usize,
}

impl BulkBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch for `articles`, in order
    pub fn from_articles(index: &str, articles: &[Article]) -> Result<Self, serde_json::Error> {
        let mut batch = Self {
            body: String::with_capacity(articles.len() * 256),
            documents: 0,
        };
        for article in articles {
            batch.push(index, article)?;
        }
        Ok(batch)
    }

    /// Append the action and source lines for one article
    pub fn push(&mut self, index: &str, article: &Article) -> Result<(), serde_json::Error> {
        let action = BulkAction {
            index: ActionMeta {
                index,
                id: article.id.to_string(),
            },
        };

        self.body.push_str(&serde_json::to_string(&action)?);
        self.body.push('\n');
        self.body.push_str(&serde_json::to_string(article)?);
        self.body.push('\n');
        self.documents += 1;
        Ok(())
    }

    /// Number of documents in the batch
    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

use serde::{Deserialize, Serialize};

/// Delimiter the crawler uses when it joins tag labels into the `tags` column
pub const TAG_DELIMITER: char = ';';

/// One row of the relational `articles` table.
///
/// The same shape is published on the event bus and stored as the index
/// document. `id` doubles as the index document id, so indexing the same
/// article twice overwrites instead of duplicating. Text columns are nullable
/// and `None` always serializes as an explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Primary key assigned by the relational store, strictly increasing
    pub id: i64,

    pub title: Option<String>,

    pub content: Option<String>,

    /// Delimiter-joined tag labels (e.g. `"Fiction;Three"`)
    pub tags: Option<String>,

    /// Page the article was scraped from
    pub source_url: Option<String>,
}

impl Article {
    /// Create an article with every text field present
    pub fn new(
        id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: Some(title.into()),
            content: Some(content.into()),
            tags: Some(tags.into()),
            source_url: Some(source_url.into()),
        }
    }

    /// The tag labels in stored order, trimmed, with blank entries dropped
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.as_deref().map(split_tags).unwrap_or_default()
    }

    /// Build the physical tag column from a list of labels
    pub fn join_tags<I, S>(labels: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_string())
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>()
            .join(&TAG_DELIMITER.to_string());

        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

/// Split a tag list on `;` or `,`, trimming entries and discarding blanks
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Map absent or whitespace-only text to `None`
pub fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

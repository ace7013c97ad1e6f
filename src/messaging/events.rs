//! Article event envelope carried on the bus

use crate::models::{none_if_blank, Article};
use serde_json::{Map, Value};

/// Reasons an envelope cannot be turned into an [`Article`]
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("`article` is present but is not an object")]
    InvalidNestedArticle,

    #[error("missing `id`")]
    MissingId,

    #[error("`id` is not an integer: {0}")]
    InvalidId(String),
}

/// Message key for an article: its id as a string, for partition affinity
pub fn message_key(article: &Article) -> String {
    article.id.to_string()
}

/// Encode an article as the flat envelope published on the bus
pub fn encode(article: &Article) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(article)
}

/// Decode an envelope in either the flat form or the `{"article": {...}}` form.
///
/// Text fields that are absent, `null`, or blank come back as `None`.
pub fn decode(payload: &[u8]) -> Result<Article, EnvelopeError> {
    let root: Value = serde_json::from_slice(payload)?;
    let root = root.as_object().ok_or(EnvelopeError::NotAnObject)?;

    let fields = match root.get("article") {
        Some(Value::Object(nested)) => nested,
        Some(_) => return Err(EnvelopeError::InvalidNestedArticle),
        None => root,
    };

    Ok(Article {
        id: read_id(fields)?,
        title: read_text(fields, "title"),
        content: read_text(fields, "content"),
        tags: read_text(fields, "tags"),
        source_url: read_text(fields, "source_url"),
    })
}

fn read_id(fields: &Map<String, Value>) -> Result<i64, EnvelopeError> {
    match fields.get("id") {
        None | Some(Value::Null) => Err(EnvelopeError::MissingId),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| EnvelopeError::InvalidId(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| EnvelopeError::InvalidId(s.clone())),
        Some(other) => Err(EnvelopeError::InvalidId(other.to_string())),
    }
}

fn read_text(fields: &Map<String, Value>, name: &str) -> Option<String> {
    let text = match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Producers that already split tags send them as an array
        Value::Array(items) => Article::join_tags(items.iter().filter_map(Value::as_str)),
        Value::Null | Value::Object(_) => None,
    };
    none_if_blank(text)
}

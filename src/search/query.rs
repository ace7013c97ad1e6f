//! Query compiler
//!
//! Grammar: an optional leading `tag:` token restricts results to documents
//! carrying at least one of the listed tags, the rest is free text.
//!
//! ```text
//! tag:classic;fiction pride   ->  tags {classic, fiction}, text "pride"
//! tag:fiction                 ->  tags {fiction}, match everything
//! pride and prejudice         ->  no tag filter, text "pride and prejudice"
//! ```

use crate::models::split_tags;
use serde_json::{json, Value};

/// Prefix that introduces a tag filter
pub const TAG_PREFIX: &str = "tag:";

/// Fields matched by free text, title weighted higher
pub const MATCH_FIELDS: [&str; 2] = ["title^2", "content"];

/// Fields returned for each hit
pub const SOURCE_FIELDS: [&str; 5] = ["id", "title", "content", "tags", "source_url"];

pub const HIGHLIGHT_FRAGMENT_SIZE: u32 = 120;
pub const HIGHLIGHT_FRAGMENTS: u32 = 1;

/// Name of the tag frequency aggregation
pub const TOP_TAGS_AGGREGATION: &str = "top_tags";
pub const TOP_TAGS_SIZE: u32 = 10;

/// A query string split into its tag filter and free text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Free text; `None` when blank, which matches every document
    pub text: Option<String>,

    /// Tags a document must have at least one of; empty means no filter
    pub tags: Vec<String>,
}

impl ParsedQuery {
    pub fn has_tag_filter(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Split a raw query string into tag filter and free text
pub fn parse_query(raw: &str) -> ParsedQuery {
    let trimmed = raw.trim();

    let (tags, text) = match trimmed.strip_prefix(TAG_PREFIX) {
        Some(rest) => match rest.split_once(' ') {
            Some((tag_list, text)) => (split_tags(tag_list), text.trim()),
            None => (split_tags(rest), ""),
        },
        None => (Vec::new(), trimmed),
    };

    ParsedQuery {
        text: (!text.is_empty()).then(|| text.to_string()),
        tags,
    }
}

/// A relevance search as received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub from: i64,
    pub size: i64,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, from: i64, size: i64) -> Self {
        Self {
            query: query.into(),
            from,
            size,
        }
    }

    /// Compile into an index store search body
    pub fn compile(&self) -> Value {
        compile(&self.query, self.from, self.size)
    }
}

/// Compile a query string into an index store search body.
///
/// `from` is floored at 0 and `size` at 1; callers enforce any upper bound.
pub fn compile(raw: &str, from: i64, size: i64) -> Value {
    let parsed = parse_query(raw);

    let relevance = match &parsed.text {
        Some(text) => json!({
            "multi_match": {
                "query": text,
                "fields": MATCH_FIELDS
            }
        }),
        None => json!({ "match_all": {} }),
    };

    let filter: Vec<Value> = if parsed.has_tag_filter() {
        vec![json!({ "terms": { "tags": parsed.tags } })]
    } else {
        Vec::new()
    };

    json!({
        "from": from.max(0),
        "size": size.max(1),
        "_source": SOURCE_FIELDS,
        "query": {
            "bool": {
                "must": [relevance],
                "filter": filter
            }
        },
        "highlight": {
            "fields": {
                "title": {},
                "content": {}
            },
            "fragment_size": HIGHLIGHT_FRAGMENT_SIZE,
            "number_of_fragments": HIGHLIGHT_FRAGMENTS
        }
    })
}

/// Top tags by document count, without any hits
pub fn tag_aggregation_query() -> Value {
    json!({
        "size": 0,
        "aggs": {
            TOP_TAGS_AGGREGATION: {
                "terms": {
                    "field": "tags",
                    "size": TOP_TAGS_SIZE
                }
            }
        }
    })
}

mod common;

use article_pipeline::search::{compile, parse_query, SearchRequest, SearchService};
use common::RecordingIndexStore;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_query_grammar_table() {
    let cases: &[(&str, &[&str], Option<&str>)] = &[
        ("tag:fiction hello", &["fiction"], Some("hello")),
        ("tag:classic;fiction pride", &["classic", "fiction"], Some("pride")),
        ("  tag:classic, fiction  pride  ", &["classic"], Some("fiction  pride")),
        ("hello", &[], Some("hello")),
        ("", &[], None),
        ("   ", &[], None),
        ("tag:;; ", &[], None),
    ];

    for (input, tags, text) in cases {
        let parsed = parse_query(input);
        assert_eq!(parsed.tags, *tags, "tags for {:?}", input);
        assert_eq!(parsed.text.as_deref(), *text, "text for {:?}", input);
    }
}

#[test]
fn test_compiled_body_shape() {
    let body = compile("tag:poetry light attic", 10, 20);
    assert_eq!(
        body,
        json!({
            "from": 10,
            "size": 20,
            "_source": ["id", "title", "content", "tags", "source_url"],
            "query": {
                "bool": {
                    "must": [{
                        "multi_match": {
                            "query": "light attic",
                            "fields": ["title^2", "content"]
                        }
                    }],
                    "filter": [{ "terms": { "tags": ["poetry"] } }]
                }
            },
            "highlight": {
                "fields": { "title": {}, "content": {} },
                "fragment_size": 120,
                "number_of_fragments": 1
            }
        })
    );
}

#[tokio::test]
async fn test_service_sends_compiled_query() {
    let index = Arc::new(RecordingIndexStore::new());
    let service = SearchService::new(index.clone(), "articles");

    let response = service
        .search(&SearchRequest::new("tag:mystery sharp", -1, 5))
        .await
        .unwrap();
    assert_eq!(response["hits"]["hits"], json!([]));

    let sent = index.last_search().unwrap();
    assert_eq!(sent["from"], 0);
    assert_eq!(sent["size"], 5);
    assert_eq!(sent["query"]["bool"]["filter"][0]["terms"]["tags"], json!(["mystery"]));
}

#[tokio::test]
async fn test_service_top_tags_requests_no_hits() {
    let index = Arc::new(RecordingIndexStore::new());
    let service = SearchService::new(index.clone(), "articles");

    service.top_tags().await.unwrap();

    let sent = index.last_search().unwrap();
    assert_eq!(sent["size"], 0);
    assert_eq!(sent["aggs"]["top_tags"]["terms"], json!({"field": "tags", "size": 10}));
}

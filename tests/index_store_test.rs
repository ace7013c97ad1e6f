use article_pipeline::config::IndexStoreConfig;
use article_pipeline::indexer::{BulkIndexBuffer, FlushOutcome};
use article_pipeline::search::{
    ElasticsearchClient, IndexManager, IndexStatus, IndexStore, SearchError, SearchRequest,
    SearchService,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

fn client_for(server: &Server) -> (Arc<ElasticsearchClient>, IndexStoreConfig) {
    let config = IndexStoreConfig {
        host: server.url(),
        index: "articles".to_string(),
        timeout_secs: 5,
        number_of_shards: 1,
        number_of_replicas: 0,
    };
    (Arc::new(ElasticsearchClient::new(&config).unwrap()), config)
}

#[tokio::test]
async fn test_creates_missing_index_with_mapping() {
    let mut server = Server::new_async().await;
    let head = server
        .mock("HEAD", "/articles")
        .with_status(404)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/articles")
        .match_body(Matcher::PartialJson(json!({
            "settings": {"number_of_shards": 1, "number_of_replicas": 0},
            "mappings": {"properties": {
                "title": {"type": "text"},
                "content": {"type": "text"},
                "tags": {"type": "keyword"},
                "source_url": {"type": "keyword"}
            }}
        })))
        .with_status(200)
        .with_body(r#"{"acknowledged":true,"index":"articles"}"#)
        .create_async()
        .await;

    let (client, config) = client_for(&server);
    let status = IndexManager::new(client, &config).ensure_index().await;

    assert_eq!(status, IndexStatus::Created);
    head.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn test_existing_index_is_left_alone() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/articles")
        .with_status(200)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/articles")
        .expect(0)
        .create_async()
        .await;

    let (client, config) = client_for(&server);
    let manager = IndexManager::new(client, &config);

    assert_eq!(manager.ensure_index().await, IndexStatus::Exists);
    assert_eq!(manager.ensure_index().await, IndexStatus::Exists);
    put.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_creation_counts_as_existing() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/articles")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("PUT", "/articles")
        .with_status(400)
        .with_body(r#"{"error":{"type":"resource_already_exists_exception","reason":"index [articles] already exists"},"status":400}"#)
        .create_async()
        .await;

    let (client, config) = client_for(&server);
    assert_eq!(
        IndexManager::new(client, &config).ensure_index().await,
        IndexStatus::Exists
    );
}

#[tokio::test]
async fn test_creation_failure_degrades() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/articles")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("PUT", "/articles")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let (client, config) = client_for(&server);
    let status = IndexManager::new(client, &config).ensure_index().await;

    assert!(!status.is_ready());
    match status {
        IndexStatus::Degraded { reason } => assert!(reason.contains("500")),
        other => panic!("unexpected status {:?}", other),
    }
}

#[tokio::test]
async fn test_bulk_flush_sends_ndjson_and_counts_item_errors() {
    let mut server = Server::new_async().await;
    let bulk = server
        .mock("POST", "/_bulk")
        .match_header("content-type", "application/x-ndjson")
        .match_body(Matcher::Regex(
            r#"^\{"index":\{"_index":"articles","_id":"1"\}\}\n.*\n\{"index":\{"_index":"articles","_id":"2"\}\}\n.*\n$"#.to_string(),
        ))
        .with_status(200)
        .with_body(
            json!({
                "took": 4,
                "errors": true,
                "items": [
                    {"index": {"_id": "1", "status": 201}},
                    {"index": {"_id": "2", "status": 400, "error": {"type": "mapper_parsing_exception"}}}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (client, config) = client_for(&server);
    let buffer = BulkIndexBuffer::new(client, config.index, 10);
    buffer.on_message(br#"{"id":1,"title":"a"}"#).await;
    buffer.on_message(br#"{"id":2,"title":"b"}"#).await;

    assert_eq!(
        buffer.flush().await,
        FlushOutcome::Indexed {
            documents: 2,
            item_errors: 1
        }
    );
    bulk.assert_async().await;
}

#[tokio::test]
async fn test_bulk_http_error_discards_batch() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/_bulk")
        .with_status(429)
        .with_body(r#"{"error":"too many requests"}"#)
        .create_async()
        .await;

    let (client, config) = client_for(&server);
    let buffer = BulkIndexBuffer::new(client, config.index, 10);
    buffer.on_message(br#"{"id":1}"#).await;

    assert_eq!(buffer.flush().await, FlushOutcome::Failed { documents: 1 });
    assert_eq!(buffer.pending().await, 0);
}

#[tokio::test]
async fn test_search_passes_response_through() {
    let mut server = Server::new_async().await;
    let response = json!({
        "took": 2,
        "hits": {
            "total": {"value": 1, "relation": "eq"},
            "hits": [{
                "_id": "3",
                "_source": {"id": 3, "title": "Soumission", "content": null, "tags": "Fiction", "source_url": null},
                "highlight": {"title": ["<em>Soumission</em>"]}
            }]
        }
    });
    let search = server
        .mock("POST", "/articles/_search")
        .match_body(Matcher::PartialJson(json!({"from": 0, "size": 10})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(response.to_string())
        .create_async()
        .await;

    let (client, config) = client_for(&server);
    let service = SearchService::new(client, config.index);
    let body = service
        .search(&SearchRequest::new("soumission", 0, 10))
        .await
        .unwrap();

    assert_eq!(body, response);
    search.assert_async().await;
}

#[tokio::test]
async fn test_missing_index_surfaces_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/articles/_search")
        .with_status(404)
        .with_body(r#"{"error":{"type":"index_not_found_exception"},"status":404}"#)
        .create_async()
        .await;

    let (client, _) = client_for(&server);
    let err = client
        .search("articles", &json!({"size": 0}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    match err {
        SearchError::Http { body, .. } => assert!(body.contains("index_not_found_exception")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_store_is_a_transport_error() {
    let config = IndexStoreConfig {
        host: "http://127.0.0.1:9".to_string(),
        timeout_secs: 1,
        ..Default::default()
    };
    let client = ElasticsearchClient::new(&config).unwrap();

    let err = client.index_exists("articles").await.unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
}

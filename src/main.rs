use anyhow::{bail, Context};
use article_pipeline::{
    api::{build_router, AppState},
    config::{Config, ObservabilityConfig, WorkerType},
    indexer::{BulkIndexBuffer, IndexerWorker},
    messaging::{
        InMemoryBus, KafkaConsumer, KafkaProducer, MessageConsumer, MessageProducer,
        MessagingBackend,
    },
    publisher::ArticlePublisher,
    search::{ElasticsearchClient, IndexManager, IndexStore, SearchService},
    store::{ArticleStore, SqlArticleStore},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config.observability);

    tracing::info!(
        service = %config.observability.service_name,
        "Starting article pipeline v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        mode = ?config.deployment.mode,
        worker_type = ?config.deployment.worker_type,
        "Deployment"
    );

    let run_publisher = config.runs(WorkerType::Publisher);
    let run_indexer = config.runs(WorkerType::Indexer);
    let run_search = config.runs(WorkerType::Search);

    if config.observability.prometheus_enabled {
        article_pipeline::metrics::init_metrics();
        tracing::info!("Prometheus metrics initialized");
    }

    // Relational store: polled by the publisher, scanned by the baseline search
    let store: Option<Arc<dyn ArticleStore>> = if run_publisher || run_search {
        let store = SqlArticleStore::connect(&config.database)
            .await
            .context("failed to connect to the relational store")?;
        if config.database.url.starts_with("sqlite:") {
            store
                .ensure_table()
                .await
                .context("failed to create the articles table")?;
        }
        Some(Arc::new(store))
    } else {
        None
    };

    // Event bus
    let (producer, consumer): (
        Option<Arc<dyn MessageProducer>>,
        Option<Arc<dyn MessageConsumer>>,
    ) = match config.messaging.backend {
        MessagingBackend::InMemory => {
            if run_publisher != run_indexer {
                bail!("the in_memory messaging backend needs the publisher and indexer in one process");
            }
            let bus = Arc::new(InMemoryBus::new());
            let producer: Arc<dyn MessageProducer> = bus.clone();
            let consumer: Arc<dyn MessageConsumer> = bus;
            (Some(producer), Some(consumer))
        }
        MessagingBackend::Kafka => {
            let producer: Option<Arc<dyn MessageProducer>> = if run_publisher {
                Some(Arc::new(
                    KafkaProducer::new(&config.messaging.kafka)
                        .context("failed to create Kafka producer")?,
                ))
            } else {
                None
            };
            let consumer: Option<Arc<dyn MessageConsumer>> = if run_indexer {
                Some(Arc::new(
                    KafkaConsumer::new(&config.messaging.kafka)
                        .context("failed to create Kafka consumer")?,
                ))
            } else {
                None
            };
            (producer, consumer)
        }
    };
    tracing::info!(backend = ?config.messaging.backend, topic = %config.messaging.topic, "Event bus ready");

    // Index store
    let index_store: Arc<dyn IndexStore> = Arc::new(
        ElasticsearchClient::new(&config.index_store).context("invalid index store settings")?,
    );
    if run_indexer || run_search {
        let status = IndexManager::new(index_store.clone(), &config.index_store)
            .ensure_index()
            .await;
        tracing::info!(index = %config.index_store.index, status = ?status, "Index checked");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Watermark poller
    let poller_handle = match (run_publisher, &store, &producer) {
        (true, Some(store), Some(producer)) => {
            let publisher = ArticlePublisher::new(
                store.clone(),
                producer.clone(),
                config.messaging.topic.clone(),
                config.publisher.page_size,
            )
            .await
            .context("failed to read the initial watermark")?;

            let interval = Duration::from_millis(config.publisher.poll_interval_ms);
            Some(tokio::spawn(publisher.run(interval, shutdown_rx.clone())))
        }
        _ => None,
    };

    // Bulk indexer
    let indexer_handle = match (run_indexer, &consumer) {
        (true, Some(consumer)) => {
            let buffer = Arc::new(BulkIndexBuffer::new(
                index_store.clone(),
                config.index_store.index.clone(),
                config.indexer.bulk_size,
            ));
            let consumers = match config.messaging.backend {
                MessagingBackend::InMemory => 1,
                MessagingBackend::Kafka => config.indexer.consumers,
            };
            let worker = IndexerWorker::new(
                consumer.clone(),
                buffer,
                config.messaging.topic.clone(),
                consumers,
            );
            let shutdown = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                let result = worker.run(shutdown).await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Indexer failed to subscribe");
                }
                result
            }))
        }
        _ => None,
    };

    // Search API
    let (http_shutdown_tx, mut http_shutdown_rx) = watch::channel(false);
    let http_handle = match (run_search, &store) {
        (true, Some(store)) => {
            let search = SearchService::new(index_store.clone(), config.index_store.index.clone());
            let app_state = AppState::new(search, store.clone()).with_search_config(&config.search);
            let app = build_router(app_state).layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )));

            let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
            let listener = tokio::net::TcpListener::bind(&http_addr)
                .await
                .with_context(|| format!("failed to bind {}", http_addr))?;

            tracing::info!("HTTP API server listening on http://{}", http_addr);
            tracing::info!("   Search: http://{}/api/search?q=", http_addr);
            tracing::info!("   Tags: http://{}/api/analytics/tags", http_addr);
            tracing::info!("   Baseline: http://{}/api/search/db?q=", http_addr);

            Some(tokio::spawn(async move {
                let shutdown = async move {
                    while !*http_shutdown_rx.borrow() {
                        if http_shutdown_rx.changed().await.is_err() {
                            break;
                        }
                    }
                };
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    tracing::error!("HTTP server error: {}", e);
                }
            }))
        }
        _ => None,
    };

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);

    if let Some(handle) = poller_handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Watermark poller task failed");
        }
    }

    if let Some(handle) = indexer_handle {
        match handle.await {
            Ok(Ok(outcome)) => tracing::info!(outcome = ?outcome, "Indexer stopped"),
            Ok(Err(_)) => {}
            Err(e) => tracing::error!(error = %e, "Indexer task failed"),
        }
    }

    let _ = http_shutdown_tx.send(true);
    if let Some(handle) = http_handle {
        let _ = handle.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("article_pipeline={},tower_http=info", config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

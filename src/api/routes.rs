use crate::api::{handlers, AppState};
use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the search API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health & metrics
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Relevance search and its alias
        .route("/search", get(handlers::search))
        .route("/api/search", get(handlers::search))
        // Analytics
        .route("/api/analytics/tags", get(handlers::top_tags))
        // Unindexed baseline
        .route("/api/search/db", get(handlers::baseline_search))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}

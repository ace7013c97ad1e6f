use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{gather_metrics, BASELINE_SCAN_SECONDS, SEARCH_REQUESTS_TOTAL};
use crate::search::SearchRequest;
use crate::store::ArticleSummary;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::info;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Prometheus metrics in text format
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Query parameters of `/search` and `/api/search`.
///
/// Kept as raw strings so that `size` can fall back to the default instead
/// of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub from: Option<String>,
    pub size: Option<String>,
}

/// Relevance search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    SEARCH_REQUESTS_TOTAL.with_label_values(&["search"]).inc();

    let from = resolve_from(params.from.as_deref())?;
    let size = resolve_size(params.size.as_deref(), state.default_size, state.max_size);
    let request = SearchRequest::new(params.q.unwrap_or_default(), from, size);

    Ok(Json(state.search.search(&request).await?))
}

/// Top tags by document count
pub async fn top_tags(State(state): State<AppState>) -> Result<Json<Value>> {
    SEARCH_REQUESTS_TOTAL.with_label_values(&["tags"]).inc();
    Ok(Json(state.search.top_tags().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct BaselineParams {
    pub q: Option<String>,
}

/// Substring scan straight against the relational store, for comparison
/// with index-backed search
pub async fn baseline_search(
    State(state): State<AppState>,
    Query(params): Query<BaselineParams>,
) -> Result<Json<Vec<ArticleSummary>>> {
    SEARCH_REQUESTS_TOTAL.with_label_values(&["baseline"]).inc();

    let q = params
        .q
        .ok_or_else(|| AppError::Validation("missing required parameter `q`".to_string()))?;

    let start = Instant::now();
    let rows = state.store.search_content(&q).await?;
    let elapsed = start.elapsed();

    BASELINE_SCAN_SECONDS.observe(elapsed.as_secs_f64());
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        rows = rows.len(),
        "Baseline relational search completed"
    );

    Ok(Json(rows))
}

/// Parse `from`; absent or blank means 0
pub fn resolve_from(raw: Option<&str>) -> Result<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value.parse().map_err(|_| {
            AppError::Validation(format!("`from` must be an integer, got {:?}", value))
        }),
    }
}

/// Parse `size`; anything absent, unparsable or outside `[1, max]` becomes `default`
pub fn resolve_size(raw: Option<&str>, default: i64, max: i64) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|size| (1..=max).contains(size))
        .unwrap_or(default)
}

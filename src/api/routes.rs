//! API Routes
//!
//! HTTP endpoints for health checks, the current record set and metrics

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::Metrics;
use crate::registry::RecordStore;

/// Shared API state
pub struct ApiState {
    pub store: Arc<RecordStore>,
    pub metrics: Arc<Metrics>,
}

/// Build the API router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_check))

        // Records
        .route("/records", get(get_records))

        // Metrics
        .route("/metrics", get(get_metrics_prometheus))
        .route("/metrics/json", get(get_metrics_json))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP API server until `shutdown` flips to true
pub async fn run_api_server(
    addr: SocketAddr,
    state: Arc<ApiState>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("📊 HTTP API server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    Ok(())
}

/// GET /health - Simple health check
async fn health_check() -> impl IntoResponse {
    "OK"
}

/// GET /records - Every record currently served
async fn get_records(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let records = state.store.records().await;

    Json(serde_json::json!({
        "domain": state.store.domain(),
        "ttl": state.store.ttl(),
        "count": records.len(),
        "records": records,
    }))
}

/// GET /metrics - Prometheus format metrics
async fn get_metrics_prometheus(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    state.metrics.set_records(state.store.len().await as u64);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.to_prometheus(),
    )
}

/// GET /metrics/json - JSON format metrics
async fn get_metrics_json(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    state.metrics.set_records(state.store.len().await as u64);

    Json(state.metrics.to_json())
}

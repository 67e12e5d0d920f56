use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

/// `GET /health`
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/v1/health`, including database connectivity.
async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Database ping failed: {e}");
            "disconnected"
        }
    };

    Json(DetailedHealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

/// Health check mounted at the root.
pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Health check mounted under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(health_detailed))
}

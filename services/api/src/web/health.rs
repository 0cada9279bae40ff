//! services/api/src/web/health.rs
//!
//! Health check endpoint for monitoring and load balancing.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthChecks {
    pub database: String,
    pub runtime_version: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub checks: HealthChecks,
    pub version: String,
}

/// GET /health - Reports store connectivity and the service version.
/// Returns 200 when healthy, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (database, healthy) = match state.store.ping().await {
        Ok(()) => ("connected".to_string(), true),
        Err(e) => (format!("error: {e}"), false),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        checks: HealthChecks {
            database,
            runtime_version: option_env!("CARGO_PKG_RUST_VERSION")
                .unwrap_or("unknown")
                .to_string(),
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(body))
}

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Jobs waiting for a solver slot.
    pub queue_depth: usize,
    /// Solver processes currently holding a slot.
    pub running_jobs: usize,
    /// Maximum concurrent solver processes.
    pub process_limit: usize,
}

/// GET /health -- returns service and pipeline health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // A closed queue means the dispatcher is gone and submissions will fail.
    let status = if state.queue.is_closed() {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        queue_depth: state.queue.depth(),
        running_jobs: state.limiter.running(),
        process_limit: state.limiter.capacity(),
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

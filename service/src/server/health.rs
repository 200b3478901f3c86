//! Operational endpoints: liveness and Prometheus metrics.

use super::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Body of a successful health check.
pub const HEALTH_MESSAGE: &str = "GRADE SERVICE IS HEALTH";

/// Liveness check. Does not touch any dependency.
///
/// ```bash
/// curl http://localhost:8080/grade/health
/// # "GRADE SERVICE IS HEALTH"
/// ```
pub async fn health_check() -> (StatusCode, Json<&'static str>) {
    (StatusCode::OK, Json(HEALTH_MESSAGE))
}

/// Prometheus exposition of the service metrics.
///
/// Answers 503 when no recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}

//! Router configuration for the grade service.

use super::health::{health_check, metrics};
use super::state::AppState;
use crate::api::reviews;
use axum::{
    Router,
    routing::{get, post, put},
};
use grade_web::correlation_id_layer;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// `/grade/:id/:type` serves both the report (`GET`, where the first segment
/// is a subject id) and deletion (`DELETE`, where it is a review id). The
/// correlation id layer is outermost so the trace span sits inside it.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/grade", post(reviews::create_review))
        .route("/grade/health", get(health_check))
        .route("/grade/:id", put(reviews::update_review))
        .route(
            "/grade/:id/:review_type",
            get(reviews::get_report).delete(reviews::delete_review),
        )
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}

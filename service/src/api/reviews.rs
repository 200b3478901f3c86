//! Review endpoints.

use super::requests::{CreateReviewRequest, UpdateReviewRequest};
use super::responses::{ReportResponse, ReviewResponse};
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use grade_core::review::{ReviewId, ReviewType};
use grade_web::{AppError, CorrelationId, JsonBody};

/// Create a review.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/grade \
///   -H "Content-Type: application/json" \
///   -d '{
///     "comment": "Spotless apartment",
///     "grade": 4.5,
///     "reviewerId": "66573d8fb73585ebf9ae0751",
///     "subjectId": "57325353-5469-4930-8ec9-35c003e1b967",
///     "reviewerName": "Saska Topalovic",
///     "reviewType": 1
///   }'
/// ```
///
/// # Errors
///
/// - 400 for invalid input
/// - 403 if the reviewer has no completed reservation
/// - 500 if the store fails
/// - 503 if the request deadline expires
pub async fn create_review(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    JsonBody(request): JsonBody<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let draft = request.into_draft()?;
    tracing::debug!(
        correlation_id = %correlation_id.0,
        review_type = %draft.review_type,
        subject_id = %draft.subject_id,
        "Creating review"
    );

    let review = state.service.create(draft).await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

/// Change comment and grade of a review.
///
/// # Errors
///
/// - 400 for an invalid id or body
/// - 404 if the review does not exist
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let id: ReviewId = id.parse()?;
    let change = request.into_change()?;

    let review = state
        .service
        .update(id, change.review_type, change.comment, change.grade)
        .await?;
    Ok(Json(review.into()))
}

/// Aggregate report of a subject.
///
/// # Errors
///
/// - 400 for an unknown review type
pub async fn get_report(
    State(state): State<AppState>,
    Path((subject_id, review_type)): Path<(String, String)>,
) -> Result<Json<ReportResponse>, AppError> {
    let review_type: ReviewType = review_type.parse()?;

    let report = state
        .service
        .aggregate_report(&subject_id, review_type)
        .await?;
    Ok(Json(report.into()))
}

/// Delete a review.
///
/// # Errors
///
/// - 400 for an invalid id or review type
/// - 404 if the review does not exist
pub async fn delete_review(
    State(state): State<AppState>,
    Path((id, review_type)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id: ReviewId = id.parse()?;
    let review_type: ReviewType = review_type.parse()?;

    state.service.delete(id, review_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

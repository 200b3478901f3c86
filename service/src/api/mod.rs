//! HTTP API for reviews.
//!
//! - `POST /grade` - create a review
//! - `PUT /grade/:id` - change comment and grade
//! - `GET /grade/:subject_id/:type` - aggregate report of a subject
//! - `DELETE /grade/:id/:type` - delete a review
//!
//! `:type` is the review type code, `0` (host) or `1` (accommodation).

pub mod requests;
pub mod responses;
pub mod reviews;

use crate::service::ReviewServiceError;
use grade_web::AppError;

impl From<ReviewServiceError> for AppError {
    fn from(error: ReviewServiceError) -> Self {
        match error {
            ReviewServiceError::Validation(error) => Self::from(error),
            ReviewServiceError::EligibilityDenied { .. } => Self::forbidden(error.to_string()),
            ReviewServiceError::NotFound(id) => Self::not_found("Review", id),
            ReviewServiceError::Store(source) => {
                Self::internal("Review store unavailable").with_source(anyhow::Error::new(source))
            }
            ReviewServiceError::Timeout { .. } => Self::unavailable(error.to_string()),
        }
    }
}

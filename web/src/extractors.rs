//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`JsonBody`]: JSON body whose rejections render as [`AppError`]
//!
//! # Examples
//!
//! ```ignore
//! use grade_web::extractors::{CorrelationId, JsonBody};
//!
//! async fn create(
//!     correlation_id: CorrelationId,
//!     JsonBody(request): JsonBody<CreateReviewRequest>,
//! ) -> Result<Json<ReviewResponse>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Creating review");
//!     ...
//! }
//! ```

use crate::error::AppError;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Taken from the request extensions when
/// [`correlation_id_layer`](crate::middleware::correlation_id_layer) is
/// installed, otherwise parsed from the `X-Correlation-ID` header, otherwise
/// freshly generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(crate::middleware::CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// JSON request body.
///
/// Behaves like [`axum::Json`] but a missing content type, malformed JSON or
/// a body that does not match `T` becomes a `400 Bad Request` [`AppError`]
/// with the usual `{ "code", "message" }` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

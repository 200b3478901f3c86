//! Axum integration for the grade service.
//!
//! The HTTP shell around the review workflow: request parsing, error mapping
//! and request correlation. Nothing here knows about reviews beyond mapping
//! input validation failures to `400 Bad Request`.
//!
//! # Request Flow
//!
//! 1. [`middleware::correlation_id_layer`] tags the request with a correlation id
//!    and opens a tracing span
//! 2. [`extractors::JsonBody`] parses the body, rejecting malformed JSON with
//!    an [`AppError`]
//! 3. The handler calls the workflow and maps its errors to [`AppError`]
//! 4. [`AppError`] renders `{ "code", "message" }` with the matching status
//!
//! # Example
//!
//! ```ignore
//! use grade_web::{AppError, JsonBody};
//! use axum::{Router, routing::post, Json};
//!
//! async fn create(JsonBody(request): JsonBody<CreateRequest>) -> Result<Json<Created>, AppError> {
//!     let draft = request.into_draft()?;
//!     Ok(Json(service.create(draft).await?))
//! }
//!
//! let app = Router::new()
//!     .route("/grade", post(create))
//!     .layer(grade_web::middleware::correlation_id_layer());
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod middleware;

pub use error::AppError;
pub use extractors::{CorrelationId, JsonBody};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

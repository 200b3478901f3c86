//! Application state for the grade HTTP server.

use crate::service::ReviewService;
use grade_runtime::metrics::MetricsRecorder;
use std::sync::Arc;

/// State shared by all handlers. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// The review workflow
    pub service: ReviewService,
    /// Prometheus recorder rendering `/metrics`
    pub metrics: Arc<MetricsRecorder>,
}

impl AppState {
    /// Create the application state.
    #[must_use]
    pub const fn new(service: ReviewService, metrics: Arc<MetricsRecorder>) -> Self {
        Self { service, metrics }
    }
}

//! Prometheus metrics for the grade service.
//!
//! Counters and histograms are recorded through the `metrics` facade, so
//! recording is a no-op until [`MetricsRecorder::install`] runs (tests never
//! need to install anything). The rendered exposition is served by the HTTP
//! layer at `/metrics`.
//!
//! # Example
//!
//! ```rust,no_run
//! use grade_runtime::metrics::{GradeMetrics, MetricsRecorder};
//! use grade_core::review::ReviewType;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! GradeMetrics::record_review_created(ReviewType::Host);
//! let text = recorder.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use grade_core::review::ReviewType;
use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

/// Reviews created, by `type`.
pub const REVIEWS_CREATED: &str = "grade_reviews_created_total";
/// Reviews updated, by `type`.
pub const REVIEWS_UPDATED: &str = "grade_reviews_updated_total";
/// Reviews deleted, by `type`.
pub const REVIEWS_DELETED: &str = "grade_reviews_deleted_total";
/// Create requests refused, by `type` and `reason`.
pub const ELIGIBILITY_DENIED: &str = "grade_eligibility_denied_total";
/// Events acknowledged by the broker, by `topic`.
pub const EVENTS_PUBLISHED: &str = "grade_events_published_total";
/// Events that could not be published, by `topic` and `reason`.
pub const EVENT_PUBLISH_FAILURES: &str = "grade_event_publish_failures_total";
/// Post-write re-reads of a subject that failed, by `type`.
pub const RATING_REFETCH_FAILURES: &str = "grade_rating_refetch_failures_total";
/// Workflow latency, by `operation`.
pub const WORKFLOW_DURATION: &str = "grade_workflow_duration_seconds";

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Why a create request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The booking service answered "no completed reservation".
    NoReservation,
    /// The booking service could not be asked.
    OracleUnavailable,
}

impl DenialReason {
    /// Metric label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoReservation => "no_reservation",
            Self::OracleUnavailable => "oracle_unavailable",
        }
    }
}

/// Why an event was not published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishFailure {
    /// The payload could not be serialized.
    Encode,
    /// The broker rejected the event or could not be reached.
    Broker,
    /// The post-write publication deadline expired first.
    Deadline,
}

impl PublishFailure {
    /// Metric label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::Broker => "broker",
            Self::Deadline => "deadline",
        }
    }
}

/// Process-wide Prometheus recorder.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe the grade metrics and install the global Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if another recorder is already
    /// installed in this process.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        let handle = prometheus_builder()?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        describe_metrics();
        self.handle = Some(handle);
        tracing::info!("Prometheus recorder installed");
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if the recorder hasn't been installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn prometheus_builder() -> Result<PrometheusBuilder, MetricsError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| MetricsError::Build(e.to_string()))
}

fn describe_metrics() {
    describe_counter!(REVIEWS_CREATED, "Total number of reviews created");
    describe_counter!(REVIEWS_UPDATED, "Total number of reviews updated");
    describe_counter!(REVIEWS_DELETED, "Total number of reviews deleted");
    describe_counter!(
        ELIGIBILITY_DENIED,
        "Total number of review creations refused by the eligibility check"
    );
    describe_counter!(
        EVENTS_PUBLISHED,
        "Total number of events acknowledged by the broker"
    );
    describe_counter!(
        EVENT_PUBLISH_FAILURES,
        "Total number of events that could not be published"
    );
    describe_counter!(
        RATING_REFETCH_FAILURES,
        "Total number of subject re-reads after a write that failed"
    );
    describe_histogram!(
        WORKFLOW_DURATION,
        Unit::Seconds,
        "Time taken by review workflow operations"
    );
}

/// Grade service metrics recorder.
pub struct GradeMetrics;

impl GradeMetrics {
    /// Record a created review.
    pub fn record_review_created(review_type: ReviewType) {
        counter!(REVIEWS_CREATED, "type" => review_type.as_str()).increment(1);
    }

    /// Record an updated review.
    pub fn record_review_updated(review_type: ReviewType) {
        counter!(REVIEWS_UPDATED, "type" => review_type.as_str()).increment(1);
    }

    /// Record a deleted review.
    pub fn record_review_deleted(review_type: ReviewType) {
        counter!(REVIEWS_DELETED, "type" => review_type.as_str()).increment(1);
    }

    /// Record a refused create request.
    pub fn record_eligibility_denied(review_type: ReviewType, reason: DenialReason) {
        counter!(
            ELIGIBILITY_DENIED,
            "type" => review_type.as_str(),
            "reason" => reason.as_str()
        )
        .increment(1);
    }

    /// Record an acknowledged publish.
    pub fn record_event_published(topic: &str) {
        counter!(EVENTS_PUBLISHED, "topic" => topic.to_string()).increment(1);
    }

    /// Record a publish that failed for good.
    pub fn record_publish_failure(topic: &str, reason: PublishFailure) {
        counter!(
            EVENT_PUBLISH_FAILURES,
            "topic" => topic.to_string(),
            "reason" => reason.as_str()
        )
        .increment(1);
    }

    /// Record a failed re-read of a subject's reviews after a write.
    pub fn record_refetch_failure(review_type: ReviewType) {
        counter!(RATING_REFETCH_FAILURES, "type" => review_type.as_str()).increment(1);
    }

    /// Record how long a workflow operation took.
    pub fn record_workflow_duration(operation: &'static str, duration: Duration) {
        histogram!(WORKFLOW_DURATION, "operation" => operation).record(duration.as_secs_f64());
    }
}

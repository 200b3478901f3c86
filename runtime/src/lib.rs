//! # Grade Runtime
//!
//! Runtime support shared by the grade service's collaborators.
//!
//! ## Core Components
//!
//! - **Retry**: exponential backoff with a retryability predicate
//! - **Resilient decorators**: retrying wrappers around the event bus and the
//!   eligibility oracle
//! - **Sequencer**: per-subject ordering of "re-fetch, aggregate, publish"
//! - **Metrics**: Prometheus recorder and the service's counters
//!
//! ## Example
//!
//! ```ignore
//! use grade_runtime::{RetryPolicy, RetryingEventBus};
//!
//! let bus = RetryingEventBus::new(redpanda_bus, RetryPolicy::default());
//! ```

/// Retry logic with exponential backoff
pub mod retry;

/// Retrying collaborator decorators
pub mod resilient;

/// Per-subject async locks
pub mod sequencer;

/// Prometheus metrics for observability
pub mod metrics;

pub use metrics::{DenialReason, GradeMetrics, MetricsRecorder, PublishFailure};
pub use resilient::{RetryingEligibilityOracle, RetryingEventBus};
pub use retry::{RetryPolicy, retry_with_predicate};
pub use sequencer::{SubjectGuard, SubjectSequencer};

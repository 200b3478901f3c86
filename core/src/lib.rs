//! # Grade Core
//!
//! Domain model and collaborator contracts for the grade (review and rating)
//! service.
//!
//! - [`review`]: reviews, review ids, the closed [`review::ReviewType`] enum, input validation
//! - [`aggregate`]: pure rating aggregation (mean grade, star histogram)
//! - [`event`]: integration events and their topic routing
//! - [`event_bus`]: the publishing side of the message broker
//! - [`store`]: durable review storage
//! - [`eligibility`]: the booking authority deciding who may review
//! - [`environment`]: injectable clock
//!
//! Collaborator traits return boxed futures so they can be used as trait
//! objects (`Arc<dyn ReviewStore>` and friends).

pub mod aggregate;
pub mod eligibility;
pub mod event;
pub mod event_bus;
pub mod review;
pub mod store;

/// Environment traits for dependency injection.
///
/// All external dependencies are abstracted behind traits and injected by the
/// caller, so tests can pin time.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

pub use aggregate::{RatingSummary, StarCount, compute_aggregate};
pub use eligibility::{EligibilityError, EligibilityOracle};
pub use event::{Event, OutboundEvent, RatingChanged, ReviewCreated};
pub use event_bus::{EventBus, EventBusError};
pub use review::{NewReview, Review, ReviewDraft, ReviewId, ReviewType, ValidationError};
pub use store::{ReviewStore, ReviewStoreError};

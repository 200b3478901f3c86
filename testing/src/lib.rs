//! # Grade Testing
//!
//! Test doubles and fixtures for the grade service.
//!
//! This crate provides:
//! - [`InMemoryReviewStore`]: `Vec`-backed review store with failure switches
//! - [`ScriptedEligibilityOracle`]: answers eligibility checks from a script
//! - [`RecordingEventBus`]: records every publish for assertions
//! - [`FixedClock`] / [`test_clock`]: deterministic time
//! - [`ReviewBuilder`] and [`draft`]: review fixtures
//!
//! ## Example
//!
//! ```ignore
//! use grade_testing::{InMemoryReviewStore, RecordingEventBus, ScriptedEligibilityOracle, test_clock};
//!
//! #[tokio::test]
//! async fn creates_review() {
//!     let store = InMemoryReviewStore::new();
//!     let bus = RecordingEventBus::new();
//!     let oracle = ScriptedEligibilityOracle::allow_all();
//!     // build the service from the doubles, run it, assert on store and bus
//! }
//! ```

use chrono::{DateTime, Utc};
use grade_core::environment::Clock;

pub mod event_bus;
pub mod fixtures;
pub mod oracle;
pub mod review_store;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use grade_testing::mocks::FixedClock;
    /// use grade_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Never in practice: the timestamp is hardcoded.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use event_bus::{PublishedEvent, RecordingEventBus};
pub use fixtures::{ReviewBuilder, draft};
pub use mocks::{FixedClock, test_clock};
pub use oracle::{EligibilityCall, ScriptedEligibilityOracle};
pub use review_store::InMemoryReviewStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_fixed_at_new_year_2025() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}

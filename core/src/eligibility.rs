//! Review eligibility.
//!
//! Only guests who completed a reservation may review. The answer comes from
//! the booking service; this module only defines the question.

use crate::review::ReviewType;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Failure to obtain an eligibility answer.
///
/// The workflow treats every variant as "not eligible".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EligibilityError {
    /// The request never got a response (connect error, timeout, reset).
    #[error("Eligibility transport error: {0}")]
    Transport(String),

    /// The authority answered with a non-success status.
    #[error("Eligibility check rejected with status {status}")]
    Rejected {
        /// HTTP status code returned
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("Invalid eligibility response: {0}")]
    InvalidResponse(String),
}

impl EligibilityError {
    /// Whether asking again may produce an answer.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status } => *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// External authority on "may this reviewer review this subject".
pub trait EligibilityOracle: Send + Sync {
    /// Whether `reviewer_id` completed a reservation with the subject.
    ///
    /// For [`ReviewType::Host`] the subject is a host, for
    /// [`ReviewType::Accommodation`] an accommodation.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError`] when no answer could be obtained.
    fn has_completed_reservation<'a>(
        &'a self,
        review_type: ReviewType,
        reviewer_id: &'a str,
        subject_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, EligibilityError>> + Send + 'a>>;
}

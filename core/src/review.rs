//! Review domain types.
//!
//! A [`Review`] is one reviewer's grade and comment for one subject. Subjects
//! come in two kinds, captured by the closed [`ReviewType`] enumeration.
//!
//! # Invariants
//!
//! - `grade` lies in `0.0..=5.0` (enforced by [`ReviewDraft::validate`] before
//!   anything reaches the store)
//! - `review_type`, `reviewer_id` and `subject_id` never change after creation
//! - `id` is assigned once by the store and never reused

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Lowest grade a reviewer may give.
pub const MIN_GRADE: f32 = 0.0;

/// Highest grade a reviewer may give.
pub const MAX_GRADE: f32 = 5.0;

/// Input rejected before the review workflow runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty or whitespace.
    #[error("{field} is required")]
    MissingField {
        /// Wire name of the field
        field: &'static str,
    },

    /// Grade outside `0..=5` or not a finite number.
    #[error("grade must be between 0 and 5, got {grade}")]
    GradeOutOfRange {
        /// The rejected grade, as received
        grade: String,
    },

    /// Review type code other than 0 (host) or 1 (accommodation).
    #[error("unknown review type code {0}")]
    UnknownReviewType(i64),

    /// Review id that does not parse as a UUID.
    #[error("Invalid review ID")]
    InvalidReviewId(String),
}

/// Unique identifier of a stored review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(Uuid);

impl ReviewId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. one read back from the database).
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ReviewId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidReviewId(s.to_string()))
    }
}

/// Kind of subject a review is about.
///
/// On the wire (HTTP bodies, the database) the type travels as its integer
/// code: `0` for hosts, `1` for accommodations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ReviewType {
    /// Review of a host (the person renting out accommodations)
    Host,
    /// Review of a single accommodation
    Accommodation,
}

impl ReviewType {
    /// Integer code used on the wire and in storage.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Host => 0,
            Self::Accommodation => 1,
        }
    }

    /// Parse the integer wire code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownReviewType`] for anything but 0 or 1.
    pub const fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            0 => Ok(Self::Host),
            1 => Ok(Self::Accommodation),
            other => Err(ValidationError::UnknownReviewType(other)),
        }
    }

    /// Lowercase label, used for metric labels and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Accommodation => "accommodation",
        }
    }
}

impl TryFrom<i64> for ReviewType {
    type Error = ValidationError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<ReviewType> for i64 {
    fn from(review_type: ReviewType) -> Self {
        Self::from(review_type.code())
    }
}

impl FromStr for ReviewType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: i64 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::UnknownReviewType(-1))?;
        Self::from_code(code)
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Store-assigned identity
    pub id: ReviewId,
    /// Free-text comment
    pub comment: String,
    /// Grade in `0.0..=5.0`
    pub grade: f32,
    /// Who wrote the review
    pub reviewer_id: String,
    /// What is being reviewed (a host id or an accommodation id)
    pub subject_id: String,
    /// Display name of the reviewer at the time of writing
    pub reviewer_name: String,
    /// Last time comment or grade changed
    pub modified_at: DateTime<Utc>,
    /// Host or accommodation review
    pub review_type: ReviewType,
}

/// A review that has not been stored yet, so has no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    /// Free-text comment
    pub comment: String,
    /// Grade in `0.0..=5.0`
    pub grade: f32,
    /// Who wrote the review
    pub reviewer_id: String,
    /// What is being reviewed
    pub subject_id: String,
    /// Display name of the reviewer
    pub reviewer_name: String,
    /// Creation timestamp
    pub modified_at: DateTime<Utc>,
    /// Host or accommodation review
    pub review_type: ReviewType,
}

impl NewReview {
    /// Attach the identity assigned by the store.
    #[must_use]
    pub fn with_id(self, id: ReviewId) -> Review {
        Review {
            id,
            comment: self.comment,
            grade: self.grade,
            reviewer_id: self.reviewer_id,
            subject_id: self.subject_id,
            reviewer_name: self.reviewer_name,
            modified_at: self.modified_at,
            review_type: self.review_type,
        }
    }
}

/// Everything a caller supplies to create a review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    /// Host or accommodation review
    pub review_type: ReviewType,
    /// Free-text comment (must not be empty)
    pub comment: String,
    /// Grade in `0.0..=5.0`
    pub grade: f32,
    /// Who writes the review (must not be empty)
    pub reviewer_id: String,
    /// What is reviewed (must not be empty)
    pub subject_id: String,
    /// Optional display name of the reviewer
    pub reviewer_name: Option<String>,
    /// User to notify about the new review. Host reviews fall back to the
    /// host (the subject); accommodation reviews must name the owner.
    pub notify_target_id: Option<String>,
}

impl ReviewDraft {
    /// Check the draft against the input rules.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("comment", &self.comment)?;
        validate_grade(self.grade)?;
        require("reviewerId", &self.reviewer_id)?;
        require("subjectId", &self.subject_id)?;
        if self.notify_target().is_none() {
            return Err(ValidationError::MissingField { field: "hostId" });
        }
        Ok(())
    }

    /// The user the review-created notification is addressed to.
    ///
    /// `None` for an accommodation review without an owner, which
    /// [`validate`](Self::validate) rejects.
    #[must_use]
    pub fn notify_target(&self) -> Option<&str> {
        let explicit = self
            .notify_target_id
            .as_deref()
            .filter(|id| !id.trim().is_empty());

        match self.review_type {
            ReviewType::Host => Some(explicit.unwrap_or(&self.subject_id)),
            ReviewType::Accommodation => explicit,
        }
    }
}

/// Check that a grade lies in `0.0..=5.0`.
///
/// # Errors
///
/// Returns [`ValidationError::GradeOutOfRange`] for NaN, infinities and
/// anything outside the range.
pub fn validate_grade(grade: f32) -> Result<(), ValidationError> {
    if grade.is_finite() && (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(())
    } else {
        Err(ValidationError::GradeOutOfRange {
            grade: grade.to_string(),
        })
    }
}

/// Check that a required text field is not blank.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] when `value` is blank.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ReviewDraft {
        ReviewDraft {
            review_type: ReviewType::Host,
            comment: "Great host".to_string(),
            grade: 4.5,
            reviewer_id: "guest-1".to_string(),
            subject_id: "host-1".to_string(),
            reviewer_name: None,
            notify_target_id: None,
        }
    }

    #[test]
    fn review_type_codes() {
        assert_eq!(ReviewType::from_code(0), Ok(ReviewType::Host));
        assert_eq!(ReviewType::from_code(1), Ok(ReviewType::Accommodation));
        assert_eq!(
            ReviewType::from_code(2),
            Err(ValidationError::UnknownReviewType(2))
        );
        assert_eq!(ReviewType::Accommodation.code(), 1);
    }

    #[test]
    fn review_type_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ReviewType::Accommodation).unwrap(), "1");
        let parsed: ReviewType = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, ReviewType::Host);
        assert!(serde_json::from_str::<ReviewType>("7").is_err());
    }

    #[test]
    fn review_type_from_path_segment() {
        assert_eq!("1".parse::<ReviewType>(), Ok(ReviewType::Accommodation));
        assert!("host".parse::<ReviewType>().is_err());
    }

    #[test]
    fn review_id_parse() {
        let id = ReviewId::new();
        assert_eq!(id.to_string().parse::<ReviewId>().unwrap(), id);
        assert!(matches!(
            "not-a-uuid".parse::<ReviewId>(),
            Err(ValidationError::InvalidReviewId(_))
        ));
    }

    #[test]
    fn grade_bounds_are_inclusive() {
        assert!(validate_grade(0.0).is_ok());
        assert!(validate_grade(5.0).is_ok());
        assert!(validate_grade(5.01).is_err());
        assert!(validate_grade(-0.5).is_err());
        assert!(validate_grade(f32::NAN).is_err());
    }

    #[test]
    fn draft_requires_text_fields() {
        assert!(draft().validate().is_ok());

        let mut blank_comment = draft();
        blank_comment.comment = "   ".to_string();
        assert_eq!(
            blank_comment.validate(),
            Err(ValidationError::MissingField { field: "comment" })
        );

        let mut no_subject = draft();
        no_subject.subject_id = String::new();
        assert_eq!(
            no_subject.validate(),
            Err(ValidationError::MissingField { field: "subjectId" })
        );
    }

    #[test]
    fn host_review_notifies_the_host_by_default() {
        let mut d = draft();
        assert_eq!(d.notify_target(), Some("host-1"));
        d.notify_target_id = Some("owner-9".to_string());
        assert_eq!(d.notify_target(), Some("owner-9"));
        d.notify_target_id = Some(String::new());
        assert_eq!(d.notify_target(), Some("host-1"));
    }

    #[test]
    fn accommodation_review_needs_an_owner() {
        let mut d = draft();
        d.review_type = ReviewType::Accommodation;
        d.subject_id = "acc-1".to_string();

        assert_eq!(d.notify_target(), None);
        assert_eq!(
            d.validate(),
            Err(ValidationError::MissingField { field: "hostId" })
        );

        d.notify_target_id = Some("  ".to_string());
        assert!(d.validate().is_err());

        d.notify_target_id = Some("host-7".to_string());
        assert_eq!(d.notify_target(), Some("host-7"));
        assert!(d.validate().is_ok());
    }
}

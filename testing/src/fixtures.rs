//! Review fixtures.

use crate::mocks::test_clock;
use chrono::{DateTime, Utc};
use grade_core::environment::Clock;
use grade_core::review::{NewReview, Review, ReviewDraft, ReviewId, ReviewType};

/// Builder for [`Review`] and [`NewReview`] values with sensible defaults.
///
/// Defaults: accommodation `acc-1`, reviewer `guest-1` ("Test Guest"),
/// grade 4.0, timestamp from [`test_clock`].
#[derive(Debug, Clone)]
pub struct ReviewBuilder {
    id: ReviewId,
    comment: String,
    grade: f32,
    reviewer_id: String,
    subject_id: String,
    reviewer_name: String,
    modified_at: DateTime<Utc>,
    review_type: ReviewType,
}

impl Default for ReviewBuilder {
    fn default() -> Self {
        Self {
            id: ReviewId::new(),
            comment: "Nice stay".to_string(),
            grade: 4.0,
            reviewer_id: "guest-1".to_string(),
            subject_id: "acc-1".to_string(),
            reviewer_name: "Test Guest".to_string(),
            modified_at: test_clock().now(),
            review_type: ReviewType::Accommodation,
        }
    }
}

impl ReviewBuilder {
    /// Start from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id (only used by [`build`](Self::build)).
    #[must_use]
    pub const fn id(mut self, id: ReviewId) -> Self {
        self.id = id;
        self
    }

    /// Set the comment.
    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    /// Set the grade.
    #[must_use]
    pub const fn grade(mut self, grade: f32) -> Self {
        self.grade = grade;
        self
    }

    /// Set the reviewer id.
    #[must_use]
    pub fn reviewer(mut self, reviewer_id: &str) -> Self {
        self.reviewer_id = reviewer_id.to_string();
        self
    }

    /// Set the reviewed subject.
    #[must_use]
    pub fn subject(mut self, subject_id: &str) -> Self {
        self.subject_id = subject_id.to_string();
        self
    }

    /// Set the reviewer display name.
    #[must_use]
    pub fn reviewer_name(mut self, name: &str) -> Self {
        self.reviewer_name = name.to_string();
        self
    }

    /// Set the modification time.
    #[must_use]
    pub const fn modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = modified_at;
        self
    }

    /// Set host or accommodation.
    #[must_use]
    pub const fn review_type(mut self, review_type: ReviewType) -> Self {
        self.review_type = review_type;
        self
    }

    /// Build a stored review.
    #[must_use]
    pub fn build(self) -> Review {
        let id = self.id;
        self.build_new().with_id(id)
    }

    /// Build a review without identity, ready for `ReviewStore::insert`.
    #[must_use]
    pub fn build_new(self) -> NewReview {
        NewReview {
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

/// A valid create request for `subject_id` by `reviewer_id`.
///
/// Accommodation drafts name `host-1` as the owner to notify.
#[must_use]
pub fn draft(review_type: ReviewType, reviewer_id: &str, subject_id: &str, grade: f32) -> ReviewDraft {
    ReviewDraft {
        review_type,
        comment: "Would come again".to_string(),
        grade,
        reviewer_id: reviewer_id.to_string(),
        subject_id: subject_id.to_string(),
        reviewer_name: Some("Test Guest".to_string()),
        notify_target_id: match review_type {
            ReviewType::Host => None,
            ReviewType::Accommodation => Some("host-1".to_string()),
        },
    }
}

//! Review workflow.
//!
//! [`ReviewService`] coordinates the review store, the booking service and
//! the event publisher:
//!
//! 1. **Create**: check eligibility, insert, re-aggregate the subject, publish
//!    rating-changed, publish review-created
//! 2. **Update**: update comment and grade, re-aggregate, publish rating-changed
//! 3. **Delete**: fetch, delete, re-aggregate, publish rating-changed
//! 4. **Report**: aggregate a subject's reviews, read-only
//!
//! The store write is the commit point. The request deadline covers
//! everything up to and including it. Re-aggregation and publication after
//! it run under their own deadline and are best-effort: failures are logged
//! and counted, never rolled back and never reported to the caller.

use grade_core::aggregate::{RatingSummary, average_grade, compute_aggregate};
use grade_core::eligibility::EligibilityOracle;
use grade_core::environment::Clock;
use grade_core::event::{Event, RatingChanged, ReviewCreated, rating_changed_topic, review_created_topic};
use grade_core::event_bus::EventBus;
use grade_core::review::{
    NewReview, Review, ReviewDraft, ReviewId, ReviewType, ValidationError, require, validate_grade,
};
use grade_core::store::{ReviewStore, ReviewStoreError};
use grade_runtime::metrics::{DenialReason, GradeMetrics, PublishFailure};
use grade_runtime::sequencer::SubjectSequencer;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default deadline for one workflow operation, up to its store write.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for re-aggregation and publication after a store write.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors returned by the review workflow.
#[derive(Error, Debug)]
pub enum ReviewServiceError {
    /// The input breaks a validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The reviewer may not review this subject, or eligibility could not be
    /// established.
    #[error("Reviewer {reviewer_id} has no completed reservation for {review_type} {subject_id}")]
    EligibilityDenied {
        /// Who tried to review
        reviewer_id: String,
        /// What they tried to review
        subject_id: String,
        /// Host or accommodation
        review_type: ReviewType,
    },

    /// No review with this id.
    #[error("Review not found: {0}")]
    NotFound(ReviewId),

    /// The review store failed.
    #[error("Review store error: {0}")]
    Store(ReviewStoreError),

    /// The operation did not finish before its deadline.
    #[error("{operation} did not complete within {timeout:?}")]
    Timeout {
        /// Workflow operation name
        operation: &'static str,
        /// Deadline that expired
        timeout: Duration,
    },
}

impl From<ReviewStoreError> for ReviewServiceError {
    fn from(error: ReviewStoreError) -> Self {
        match error {
            ReviewStoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Aggregated view of one subject's reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    /// Count, mean grade and star histogram
    pub summary: RatingSummary,
    /// Every review of the subject
    pub reviews: Vec<Review>,
}

/// The review workflow.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    oracle: Arc<dyn EligibilityOracle>,
    publisher: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    sequencer: Option<SubjectSequencer>,
    request_timeout: Duration,
    publish_timeout: Duration,
}

impl ReviewService {
    /// Create a workflow over the given collaborators.
    ///
    /// Publication is not sequenced per subject until
    /// [`with_sequencer`](Self::with_sequencer) is called.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReviewStore>,
        oracle: Arc<dyn EligibilityOracle>,
        publisher: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            oracle,
            publisher,
            clock,
            sequencer: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    /// Hold a per-subject lock across "re-fetch, aggregate, publish".
    #[must_use]
    pub fn with_sequencer(mut self, sequencer: SubjectSequencer) -> Self {
        self.sequencer = Some(sequencer);
        self
    }

    /// Deadline for each workflow operation up to its store write.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Deadline for the re-fetch and publishes that follow a store write.
    ///
    /// Expiry skips the remaining events; the operation still succeeds.
    #[must_use]
    pub const fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// The review store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ReviewStore> {
        &self.store
    }

    /// Create a review after checking the reviewer's eligibility.
    ///
    /// # Errors
    ///
    /// - [`ReviewServiceError::Validation`] if the draft is invalid
    /// - [`ReviewServiceError::EligibilityDenied`] if the booking service says
    ///   no or cannot be reached
    /// - [`ReviewServiceError::Store`] if the insert fails
    /// - [`ReviewServiceError::Timeout`] if the deadline expires before the
    ///   review is stored
    pub async fn create(&self, draft: ReviewDraft) -> Result<Review, ReviewServiceError> {
        let started = Instant::now();
        let committed = self.before_deadline("create", self.insert_review(draft)).await;

        if let Ok((review, created)) = &committed {
            let deadline = self.publish_deadline();
            self.publish_rating(&review.subject_id, review.review_type, deadline)
                .await;
            self.publish(
                review_created_topic(review.review_type),
                &review.subject_id,
                created,
                deadline,
            )
            .await;
        }

        GradeMetrics::record_workflow_duration("create", started.elapsed());
        committed.map(|(review, _)| review)
    }

    /// Change the comment and grade of a review.
    ///
    /// `review_type` is what the caller believes the review to be; the stored
    /// type wins.
    ///
    /// # Errors
    ///
    /// - [`ReviewServiceError::Validation`] if comment or grade are invalid
    /// - [`ReviewServiceError::NotFound`] if the review does not exist
    /// - [`ReviewServiceError::Store`] if the update fails
    /// - [`ReviewServiceError::Timeout`] if the deadline expires before the
    ///   change is stored
    pub async fn update(
        &self,
        id: ReviewId,
        review_type: ReviewType,
        comment: String,
        grade: f32,
    ) -> Result<Review, ReviewServiceError> {
        let started = Instant::now();
        let committed = self
            .before_deadline("update", self.update_review(id, review_type, comment, grade))
            .await;
        self.republish_after(&committed).await;

        GradeMetrics::record_workflow_duration("update", started.elapsed());
        committed
    }

    /// Delete a review and return what was deleted.
    ///
    /// # Errors
    ///
    /// - [`ReviewServiceError::NotFound`] if the review does not exist
    /// - [`ReviewServiceError::Store`] if the store fails
    /// - [`ReviewServiceError::Timeout`] if the deadline expires before the
    ///   review is deleted
    pub async fn delete(
        &self,
        id: ReviewId,
        review_type: ReviewType,
    ) -> Result<Review, ReviewServiceError> {
        let started = Instant::now();
        let committed = self
            .before_deadline("delete", self.delete_review(id, review_type))
            .await;
        self.republish_after(&committed).await;

        GradeMetrics::record_workflow_duration("delete", started.elapsed());
        committed
    }

    /// Aggregate all reviews of a subject.
    ///
    /// # Errors
    ///
    /// - [`ReviewServiceError::Validation`] if `subject_id` is blank
    /// - [`ReviewServiceError::Store`] if the query fails
    /// - [`ReviewServiceError::Timeout`] if the deadline expires
    pub async fn aggregate_report(
        &self,
        subject_id: &str,
        review_type: ReviewType,
    ) -> Result<AggregateReport, ReviewServiceError> {
        let started = Instant::now();
        let report = self
            .before_deadline("report", async {
                require("subjectId", subject_id)?;
                let reviews = self.store.find_by_subject(subject_id, review_type).await?;
                let summary = compute_aggregate(&reviews);
                Ok(AggregateReport { summary, reviews })
            })
            .await;

        GradeMetrics::record_workflow_duration("report", started.elapsed());
        report
    }

    async fn before_deadline<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<T, ReviewServiceError>>,
    ) -> Result<T, ReviewServiceError> {
        tokio::time::timeout(self.request_timeout, work)
            .await
            .unwrap_or_else(|_| {
                tracing::warn!(
                    operation,
                    timeout_ms = millis(self.request_timeout),
                    "Workflow operation timed out"
                );
                Err(ReviewServiceError::Timeout {
                    operation,
                    timeout: self.request_timeout,
                })
            })
    }

    fn publish_deadline(&self) -> tokio::time::Instant {
        tokio::time::Instant::now() + self.publish_timeout
    }

    async fn republish_after(&self, committed: &Result<Review, ReviewServiceError>) {
        if let Ok(review) = committed {
            self.publish_rating(&review.subject_id, review.review_type, self.publish_deadline())
                .await;
        }
    }

    async fn insert_review(
        &self,
        draft: ReviewDraft,
    ) -> Result<(Review, ReviewCreated), ReviewServiceError> {
        draft.validate()?;
        let notify_target = draft
            .notify_target()
            .map(str::to_string)
            .ok_or(ValidationError::MissingField { field: "hostId" })?;
        let ReviewDraft {
            review_type,
            comment,
            grade,
            reviewer_id,
            subject_id,
            reviewer_name,
            ..
        } = draft;

        self.ensure_eligible(review_type, &reviewer_id, &subject_id)
            .await?;

        let new_review = NewReview {
            comment,
            grade,
            reviewer_id,
            subject_id,
            reviewer_name: reviewer_name.unwrap_or_default(),
            modified_at: self.clock.now(),
            review_type,
        };
        let id = self.store.insert(new_review.clone()).await?;
        let review = new_review.with_id(id);

        GradeMetrics::record_review_created(review_type);
        tracing::info!(
            review_id = %review.id,
            review_type = %review_type,
            subject_id = %review.subject_id,
            reviewer_id = %review.reviewer_id,
            grade = review.grade,
            "Review created"
        );

        let created = ReviewCreated::new(
            review_type,
            notify_target,
            review.subject_id.as_str(),
            review.reviewer_name.as_str(),
        );
        Ok((review, created))
    }

    async fn ensure_eligible(
        &self,
        review_type: ReviewType,
        reviewer_id: &str,
        subject_id: &str,
    ) -> Result<(), ReviewServiceError> {
        let denied = || ReviewServiceError::EligibilityDenied {
            reviewer_id: reviewer_id.to_string(),
            subject_id: subject_id.to_string(),
            review_type,
        };

        match self
            .oracle
            .has_completed_reservation(review_type, reviewer_id, subject_id)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::info!(
                    review_type = %review_type,
                    reviewer_id,
                    subject_id,
                    "Review refused: no completed reservation"
                );
                GradeMetrics::record_eligibility_denied(review_type, DenialReason::NoReservation);
                Err(denied())
            }
            Err(error) => {
                tracing::warn!(
                    review_type = %review_type,
                    reviewer_id,
                    subject_id,
                    error = %error,
                    "Eligibility check failed, refusing review"
                );
                GradeMetrics::record_eligibility_denied(
                    review_type,
                    DenialReason::OracleUnavailable,
                );
                Err(denied())
            }
        }
    }

    async fn update_review(
        &self,
        id: ReviewId,
        review_type: ReviewType,
        comment: String,
        grade: f32,
    ) -> Result<Review, ReviewServiceError> {
        require("comment", &comment)?;
        validate_grade(grade)?;

        let review = self
            .store
            .update(id, &comment, grade, self.clock.now())
            .await?;
        warn_on_type_mismatch(&review, review_type);

        GradeMetrics::record_review_updated(review.review_type);
        tracing::info!(
            review_id = %review.id,
            subject_id = %review.subject_id,
            grade = review.grade,
            "Review updated"
        );

        Ok(review)
    }

    async fn delete_review(
        &self,
        id: ReviewId,
        review_type: ReviewType,
    ) -> Result<Review, ReviewServiceError> {
        let review = self.store.get(id).await?;
        warn_on_type_mismatch(&review, review_type);

        self.store.delete(id).await?;

        GradeMetrics::record_review_deleted(review.review_type);
        tracing::info!(
            review_id = %review.id,
            subject_id = %review.subject_id,
            "Review deleted"
        );

        Ok(review)
    }

    /// Re-aggregate `subject_id` and publish its new average.
    async fn publish_rating(
        &self,
        subject_id: &str,
        review_type: ReviewType,
        deadline: tokio::time::Instant,
    ) {
        let topic = rating_changed_topic(review_type);
        let refetch = async {
            let guard = match &self.sequencer {
                Some(sequencer) => Some(sequencer.lock(subject_id).await),
                None => None,
            };
            let reviews = self.store.find_by_subject(subject_id, review_type).await;
            (guard, reviews)
        };

        let (_guard, reviews) = match tokio::time::timeout_at(deadline, refetch).await {
            Ok((guard, Ok(reviews))) => (guard, reviews),
            Ok((_, Err(error))) => {
                tracing::warn!(
                    subject_id,
                    review_type = %review_type,
                    error = %error,
                    "Could not re-fetch reviews, rating not published"
                );
                GradeMetrics::record_refetch_failure(review_type);
                return;
            }
            Err(_) => {
                tracing::warn!(
                    subject_id,
                    review_type = %review_type,
                    "Publication deadline expired before re-fetch, rating not published"
                );
                GradeMetrics::record_publish_failure(topic, PublishFailure::Deadline);
                return;
            }
        };

        let rating = RatingChanged {
            id: subject_id.to_string(),
            rating: average_grade(&reviews),
        };
        self.publish(topic, subject_id, &rating, deadline).await;
    }

    async fn publish<E: Event + Serialize>(
        &self,
        topic: &str,
        key: &str,
        event: &E,
        deadline: tokio::time::Instant,
    ) {
        let outbound = match event.to_outbound(key) {
            Ok(outbound) => outbound,
            Err(error) => {
                tracing::warn!(topic, key, error = %error, "Could not encode event");
                GradeMetrics::record_publish_failure(topic, PublishFailure::Encode);
                return;
            }
        };

        match tokio::time::timeout_at(deadline, self.publisher.publish(topic, &outbound)).await {
            Ok(Ok(())) => {
                GradeMetrics::record_event_published(topic);
                tracing::debug!(topic, key, event_type = %outbound.event_type, "Event published");
            }
            Ok(Err(error)) => {
                GradeMetrics::record_publish_failure(topic, PublishFailure::Broker);
                tracing::warn!(
                    topic,
                    key,
                    event_type = %outbound.event_type,
                    error = %error,
                    "Event not published"
                );
            }
            Err(_) => {
                GradeMetrics::record_publish_failure(topic, PublishFailure::Deadline);
                tracing::warn!(
                    topic,
                    key,
                    event_type = %outbound.event_type,
                    timeout_ms = millis(self.publish_timeout),
                    "Publication deadline expired, event not published"
                );
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn warn_on_type_mismatch(review: &Review, requested: ReviewType) {
    if review.review_type != requested {
        tracing::warn!(
            review_id = %review.id,
            stored = %review.review_type,
            requested = %requested,
            "Requested review type differs from stored type, using stored type"
        );
    }
}

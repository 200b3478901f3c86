//! Review storage abstraction.
//!
//! The store owns review identity: [`ReviewStore::insert`] assigns the id and
//! returns it. Mutations other than insert touch only comment, grade and
//! modification time; reviewer, subject and type are fixed for life.

use crate::review::{NewReview, Review, ReviewId, ReviewType};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors returned by review stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewStoreError {
    /// No review with this id exists.
    #[error("Review not found: {0}")]
    NotFound(ReviewId),

    /// The backing database failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be turned back into a review.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Boxed future returned by [`ReviewStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ReviewStoreError>> + Send + 'a>>;

/// Durable keyed storage for reviews.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the workflow can hold an
/// `Arc<dyn ReviewStore>`.
pub trait ReviewStore: Send + Sync {
    /// Fetch one review.
    ///
    /// # Errors
    ///
    /// [`ReviewStoreError::NotFound`] if absent, [`ReviewStoreError::DatabaseError`]
    /// if the backend fails.
    fn get(&self, id: ReviewId) -> StoreFuture<'_, Review>;

    /// All reviews of one subject of one type, oldest first.
    ///
    /// # Errors
    ///
    /// [`ReviewStoreError::DatabaseError`] if the backend fails.
    fn find_by_subject<'a>(
        &'a self,
        subject_id: &'a str,
        review_type: ReviewType,
    ) -> StoreFuture<'a, Vec<Review>>;

    /// Persist a new review and return its freshly assigned id.
    ///
    /// # Errors
    ///
    /// [`ReviewStoreError::DatabaseError`] if the backend fails.
    fn insert(&self, review: NewReview) -> StoreFuture<'_, ReviewId>;

    /// Replace comment, grade and modification time in one step.
    ///
    /// Returns the review as it is after the update.
    ///
    /// # Errors
    ///
    /// [`ReviewStoreError::NotFound`] if absent, [`ReviewStoreError::DatabaseError`]
    /// if the backend fails.
    fn update<'a>(
        &'a self,
        id: ReviewId,
        comment: &'a str,
        grade: f32,
        modified_at: DateTime<Utc>,
    ) -> StoreFuture<'a, Review>;

    /// Physically delete a review.
    ///
    /// # Errors
    ///
    /// [`ReviewStoreError::NotFound`] if absent, [`ReviewStoreError::DatabaseError`]
    /// if the backend fails.
    fn delete(&self, id: ReviewId) -> StoreFuture<'_, ()>;

    /// Delete every review. Used when reseeding demo data.
    ///
    /// Returns the number of reviews removed.
    ///
    /// # Errors
    ///
    /// [`ReviewStoreError::DatabaseError`] if the backend fails.
    fn delete_all(&self) -> StoreFuture<'_, u64>;
}

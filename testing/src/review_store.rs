//! In-memory review store.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use chrono::{DateTime, Utc};
use grade_core::review::{NewReview, Review, ReviewId, ReviewType};
use grade_core::store::{ReviewStore, ReviewStoreError, StoreFuture};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// `Vec`-backed [`ReviewStore`] for fast, deterministic tests.
///
/// Reviews are kept in insertion order. Two switches simulate outages:
/// [`set_unavailable`](Self::set_unavailable) fails every call, and
/// [`set_reads_failing`](Self::set_reads_failing) fails only `get` and
/// `find_by_subject`, which lets tests break the re-fetch after a write.
///
/// # Example
///
/// ```
/// use grade_testing::{InMemoryReviewStore, ReviewBuilder};
/// use grade_core::store::ReviewStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryReviewStore::new();
/// let id = store.insert(ReviewBuilder::new().grade(4.0).build_new()).await?;
///
/// assert_eq!(store.get(id).await?.grade, 4.0);
/// assert_eq!(store.insert_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryReviewStore {
    reviews: Arc<RwLock<Vec<Review>>>,
    inserts: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    reads_failing: Arc<AtomicBool>,
}

impl InMemoryReviewStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `reviews`. Pre-filled reviews do not
    /// count as inserts.
    #[must_use]
    pub fn with_reviews(reviews: Vec<Review>) -> Self {
        let store = Self::new();
        *store.reviews.write().unwrap() = reviews;
        store
    }

    /// Number of stored reviews.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reviews.read().unwrap().len()
    }

    /// Whether the store holds no reviews.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reviews.read().unwrap().is_empty()
    }

    /// How many times `insert` succeeded.
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Copy of every stored review, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Review> {
        self.reviews.read().unwrap().clone()
    }

    /// Make every call fail with a database error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `get` and `find_by_subject` fail with a database error.
    pub fn set_reads_failing(&self, failing: bool) {
        self.reads_failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), ReviewStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ReviewStoreError::DatabaseError(
                "store unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn check_readable(&self) -> Result<(), ReviewStoreError> {
        self.check_available()?;
        if self.reads_failing.load(Ordering::SeqCst) {
            return Err(ReviewStoreError::DatabaseError("read failed".to_string()));
        }
        Ok(())
    }

    fn find(&self, id: ReviewId) -> Result<Review, ReviewStoreError> {
        self.check_readable()?;
        self.reviews
            .read()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(ReviewStoreError::NotFound(id))
    }

    fn filter(&self, subject_id: &str, review_type: ReviewType) -> Result<Vec<Review>, ReviewStoreError> {
        self.check_readable()?;
        Ok(self
            .reviews
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.subject_id == subject_id && r.review_type == review_type)
            .cloned()
            .collect())
    }

    fn push(&self, review: NewReview) -> Result<ReviewId, ReviewStoreError> {
        self.check_available()?;
        let id = ReviewId::new();
        self.reviews.write().unwrap().push(review.with_id(id));
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    fn modify(
        &self,
        id: ReviewId,
        comment: &str,
        grade: f32,
        modified_at: DateTime<Utc>,
    ) -> Result<Review, ReviewStoreError> {
        self.check_available()?;
        let mut reviews = self.reviews.write().unwrap();
        let review = reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReviewStoreError::NotFound(id))?;
        review.comment = comment.to_string();
        review.grade = grade;
        review.modified_at = modified_at;
        Ok(review.clone())
    }

    fn remove(&self, id: ReviewId) -> Result<(), ReviewStoreError> {
        self.check_available()?;
        let mut reviews = self.reviews.write().unwrap();
        let index = reviews
            .iter()
            .position(|r| r.id == id)
            .ok_or(ReviewStoreError::NotFound(id))?;
        reviews.remove(index);
        Ok(())
    }

    fn clear(&self) -> Result<u64, ReviewStoreError> {
        self.check_available()?;
        let mut reviews = self.reviews.write().unwrap();
        let removed = reviews.len() as u64;
        reviews.clear();
        Ok(removed)
    }
}

impl ReviewStore for InMemoryReviewStore {
    fn get(&self, id: ReviewId) -> StoreFuture<'_, Review> {
        let result = self.find(id);
        Box::pin(async move { result })
    }

    fn find_by_subject<'a>(
        &'a self,
        subject_id: &'a str,
        review_type: ReviewType,
    ) -> StoreFuture<'a, Vec<Review>> {
        let result = self.filter(subject_id, review_type);
        Box::pin(async move { result })
    }

    fn insert(&self, review: NewReview) -> StoreFuture<'_, ReviewId> {
        let result = self.push(review);
        Box::pin(async move { result })
    }

    fn update<'a>(
        &'a self,
        id: ReviewId,
        comment: &'a str,
        grade: f32,
        modified_at: DateTime<Utc>,
    ) -> StoreFuture<'a, Review> {
        let result = self.modify(id, comment, grade, modified_at);
        Box::pin(async move { result })
    }

    fn delete(&self, id: ReviewId) -> StoreFuture<'_, ()> {
        let result = self.remove(id);
        Box::pin(async move { result })
    }

    fn delete_all(&self) -> StoreFuture<'_, u64> {
        let result = self.clear();
        Box::pin(async move { result })
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::fixtures::ReviewBuilder;

    #[tokio::test]
    async fn insert_assigns_fresh_ids() {
        let store = InMemoryReviewStore::new();
        let a = store.insert(ReviewBuilder::new().build_new()).await.unwrap();
        let b = store.insert(ReviewBuilder::new().build_new()).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.insert_count(), 2);
    }

    #[tokio::test]
    async fn find_by_subject_keeps_insertion_order() {
        let store = InMemoryReviewStore::new();
        for grade in [1.0, 5.0, 3.0] {
            store
                .insert(ReviewBuilder::new().subject("h-1").review_type(ReviewType::Host).grade(grade).build_new())
                .await
                .unwrap();
        }
        store
            .insert(ReviewBuilder::new().subject("h-1").review_type(ReviewType::Accommodation).build_new())
            .await
            .unwrap();

        let grades: Vec<f32> = store
            .find_by_subject("h-1", ReviewType::Host)
            .await
            .unwrap()
            .iter()
            .map(|r| r.grade)
            .collect();
        assert_eq!(grades, vec![1.0, 5.0, 3.0]);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = InMemoryReviewStore::new();
        let id = ReviewId::new();

        assert_eq!(store.get(id).await, Err(ReviewStoreError::NotFound(id)));
        assert_eq!(store.delete(id).await, Err(ReviewStoreError::NotFound(id)));
    }

    #[tokio::test]
    async fn unavailable_store_fails_everything() {
        let store = InMemoryReviewStore::with_reviews(vec![ReviewBuilder::new().build()]);
        store.set_unavailable(true);

        assert!(store.insert(ReviewBuilder::new().build_new()).await.is_err());
        assert!(store.find_by_subject("acc-1", ReviewType::Accommodation).await.is_err());
        assert!(store.delete_all().await.is_err());

        store.set_unavailable(false);
        assert_eq!(store.delete_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failing_reads_still_accept_writes() {
        let store = InMemoryReviewStore::new();
        store.set_reads_failing(true);

        let id = store.insert(ReviewBuilder::new().build_new()).await.unwrap();
        assert!(store.get(id).await.is_err());
        assert_eq!(store.len(), 1);
    }
}

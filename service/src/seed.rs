//! Demo data.
//!
//! Replaces the store contents with three accommodation reviews so a fresh
//! environment has something to show. Enabled with `GRADE_SEED_DEMO_DATA`.

use grade_core::environment::Clock;
use grade_core::review::{NewReview, ReviewType};
use grade_core::store::{ReviewStore, ReviewStoreError};

const DEMO_REVIEWER_ID: &str = "66573d8fb73585ebf9ae0751";
const VILLA: &str = "57325353-5469-4930-8ec9-35c003e1b967";
const VILLA_2: &str = "88895353-5469-4930-8ec9-35c003e1b967";

/// The demo reviews, stamped with `now`.
#[must_use]
pub fn demo_reviews(now: chrono::DateTime<chrono::Utc>) -> Vec<NewReview> {
    let review = |comment: &str, grade: f32, reviewer_name: &str, subject_id: &str| NewReview {
        comment: comment.to_string(),
        grade,
        reviewer_id: DEMO_REVIEWER_ID.to_string(),
        subject_id: subject_id.to_string(),
        reviewer_name: reviewer_name.to_string(),
        modified_at: now,
        review_type: ReviewType::Accommodation,
    };

    vec![
        review("Luxury Villa", 2.5, "Zorica Vukovic", VILLA),
        review(
            "At least everything was new. Apartment was clean. Excellent accommodation!",
            4.0,
            "Saska Topalovic",
            VILLA,
        ),
        review("Luxury Villa 2", 4.0, "Saska Topalovic", VILLA_2),
    ]
}

/// Delete every review, then insert the demo reviews.
///
/// Returns the number of reviews inserted.
///
/// # Errors
///
/// Returns the first store error; the store may be left partially seeded.
pub async fn seed_demo_reviews(
    store: &dyn ReviewStore,
    clock: &dyn Clock,
) -> Result<usize, ReviewStoreError> {
    let removed = store.delete_all().await?;

    let reviews = demo_reviews(clock.now());
    let count = reviews.len();
    for review in reviews {
        store.insert(review).await?;
    }

    tracing::info!(removed, inserted = count, "Demo reviews seeded");
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use grade_core::aggregate::compute_aggregate;
    use grade_testing::fixtures::ReviewBuilder;
    use grade_testing::mocks::test_clock;
    use grade_testing::review_store::InMemoryReviewStore;

    #[tokio::test]
    async fn seeding_replaces_existing_reviews() {
        let store = InMemoryReviewStore::with_reviews(vec![
            ReviewBuilder::new().subject("old").build(),
        ]);

        let inserted = seed_demo_reviews(&store, &test_clock()).await.unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(store.len(), 3);
        assert!(store.snapshot().iter().all(|r| r.subject_id != "old"));
    }

    #[tokio::test]
    async fn villa_averages_three_and_a_quarter() {
        let store = InMemoryReviewStore::new();
        seed_demo_reviews(&store, &test_clock()).await.unwrap();

        let reviews = store
            .find_by_subject(VILLA, ReviewType::Accommodation)
            .await
            .unwrap();
        let summary = compute_aggregate(&reviews);

        assert_eq!(summary.total, 2);
        assert!((summary.average - 3.25).abs() < 1e-6);
        assert_eq!(summary.histogram.counts(), [0, 0, 1, 1, 0]);
    }
}

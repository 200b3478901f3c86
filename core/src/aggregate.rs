//! Rating aggregation.
//!
//! Turns a set of reviews into the statistics published and reported for a
//! subject: the mean grade and a five-bucket star histogram.
//!
//! Everything here is pure. The same input always yields the same
//! [`RatingSummary`], and nothing is cached between calls.
//!
//! # Bucketing
//!
//! A grade lands in bucket `ceil(grade)` clamped into `1..=5`, with closed
//! upper bounds:
//!
//! | grade          | bucket |
//! |----------------|--------|
//! | `g <= 1`       | `"1"`  |
//! | `1 < g <= 2`   | `"2"`  |
//! | `2 < g <= 3`   | `"3"`  |
//! | `3 < g <= 4`   | `"4"`  |
//! | `g > 4`        | `"5"`  |
//!
//! # Example
//!
//! ```
//! use grade_core::aggregate::{compute_aggregate, star_bucket};
//!
//! assert_eq!(star_bucket(1.0), 0);
//! assert_eq!(star_bucket(1.5), 1);
//!
//! let summary = compute_aggregate(&[]);
//! assert_eq!(summary.total, 0);
//! assert!(summary.average.abs() < f32::EPSILON);
//! ```

use crate::review::Review;
use serde::{Deserialize, Serialize};

/// Fixed bucket labels, in histogram order.
pub const STAR_LABELS: [&str; 5] = ["1", "2", "3", "4", "5"];

/// One histogram bucket as it appears in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarCount {
    /// Bucket label, `"1"` through `"5"`
    pub label: String,
    /// Number of reviews in the bucket
    pub value: u64,
}

/// Review counts per star bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StarHistogram([u64; 5]);

impl StarHistogram {
    /// Count one grade.
    pub fn record(&mut self, grade: f32) {
        self.0[star_bucket(grade)] += 1;
    }

    /// Count for the bucket with the given label, if the label exists.
    #[must_use]
    pub fn count(&self, label: &str) -> Option<u64> {
        STAR_LABELS
            .iter()
            .position(|l| *l == label)
            .map(|index| self.0[index])
    }

    /// Raw counts in label order.
    #[must_use]
    pub const fn counts(&self) -> [u64; 5] {
        self.0
    }

    /// The histogram as labelled buckets, always five, always in order.
    #[must_use]
    pub fn buckets(&self) -> Vec<StarCount> {
        STAR_LABELS
            .iter()
            .zip(self.0)
            .map(|(label, value)| StarCount {
                label: (*label).to_string(),
                value,
            })
            .collect()
    }
}

/// Aggregate statistics over a set of reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Number of reviews aggregated
    pub total: u64,
    /// Mean grade, `0.0` for an empty set
    pub average: f32,
    /// Star distribution
    pub histogram: StarHistogram,
}

/// Index (0-based) of the star bucket a grade falls into.
///
/// Grades above 5 and below 0 never reach this point through the workflow,
/// but they still map to the outer buckets.
#[must_use]
pub fn star_bucket(grade: f32) -> usize {
    if grade <= 1.0 {
        0
    } else if grade <= 2.0 {
        1
    } else if grade <= 3.0 {
        2
    } else if grade <= 4.0 {
        3
    } else {
        4
    }
}

/// Arithmetic mean of the review grades, `0.0` when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)] // review counts stay far below 2^24
pub fn average_grade(reviews: &[Review]) -> f32 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: f32 = reviews.iter().map(|r| r.grade).sum();
    sum / reviews.len() as f32
}

/// Compute total, mean and star histogram for a set of reviews.
#[must_use]
pub fn compute_aggregate(reviews: &[Review]) -> RatingSummary {
    let mut histogram = StarHistogram::default();
    for review in reviews {
        histogram.record(review.grade);
    }

    RatingSummary {
        total: reviews.len() as u64,
        average: average_grade(reviews),
        histogram,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::review::{ReviewId, ReviewType};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn review(grade: f32) -> Review {
        Review {
            id: ReviewId::new(),
            comment: "ok".to_string(),
            grade,
            reviewer_id: "guest".to_string(),
            subject_id: "subject".to_string(),
            reviewer_name: String::new(),
            modified_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            review_type: ReviewType::Accommodation,
        }
    }

    #[test]
    fn empty_set_has_zero_average_and_five_empty_buckets() {
        let summary = compute_aggregate(&[]);

        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, 0.0);

        let buckets = summary.histogram.buckets();
        assert_eq!(buckets.len(), 5);
        for (bucket, label) in buckets.iter().zip(STAR_LABELS) {
            assert_eq!(bucket.label, label);
            assert_eq!(bucket.value, 0);
        }
    }

    #[test]
    fn bucket_upper_bounds_are_closed() {
        assert_eq!(star_bucket(0.0), 0);
        assert_eq!(star_bucket(1.0), 0);
        assert_eq!(star_bucket(1.5), 1);
        assert_eq!(star_bucket(2.0), 1);
        assert_eq!(star_bucket(3.0), 2);
        assert_eq!(star_bucket(4.0), 3);
        assert_eq!(star_bucket(4.01), 4);
        assert_eq!(star_bucket(5.0), 4);
    }

    #[test]
    fn out_of_range_grades_clamp_to_outer_buckets() {
        assert_eq!(star_bucket(7.5), 4);
        assert_eq!(star_bucket(-1.0), 0);
    }

    #[test]
    fn mixed_accommodation_scenario() {
        let reviews = vec![review(2.5), review(4.0), review(4.0)];
        let summary = compute_aggregate(&reviews);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.average, 3.5);
        // 2.5 rounds up into bucket "3"
        assert_eq!(summary.histogram.counts(), [0, 0, 1, 2, 0]);
        assert_eq!(summary.histogram.count("4"), Some(2));
        assert_eq!(summary.histogram.count("6"), None);
    }

    #[test]
    fn histogram_counts_sum_to_total() {
        let reviews: Vec<_> = [0.0, 1.0, 1.2, 2.9, 3.3, 4.8, 5.0]
            .into_iter()
            .map(review)
            .collect();
        let summary = compute_aggregate(&reviews);

        assert_eq!(summary.histogram.counts().iter().sum::<u64>(), summary.total);
    }

    proptest! {
        #[test]
        fn average_is_arithmetic_mean(grades in prop::collection::vec(0.0f32..=5.0, 1..64)) {
            let reviews: Vec<_> = grades.iter().copied().map(review).collect();
            let summary = compute_aggregate(&reviews);

            let expected = grades.iter().map(|g| f64::from(*g)).sum::<f64>() / grades.len() as f64;
            prop_assert!((f64::from(summary.average) - expected).abs() < 1e-3);
            prop_assert!(summary.average >= 0.0 && summary.average <= 5.0 + f32::EPSILON);
        }

        #[test]
        fn every_review_lands_in_exactly_one_bucket(grades in prop::collection::vec(0.0f32..=5.0, 0..64)) {
            let reviews: Vec<_> = grades.iter().copied().map(review).collect();
            let summary = compute_aggregate(&reviews);

            prop_assert_eq!(summary.histogram.counts().iter().sum::<u64>(), grades.len() as u64);
        }
    }
}

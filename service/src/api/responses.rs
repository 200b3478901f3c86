//! Response bodies.

use crate::service::AggregateReport;
use chrono::{DateTime, Utc};
use grade_core::aggregate::StarCount;
use grade_core::review::{Review, ReviewId};
use serde::{Deserialize, Serialize};

/// One review as shown to clients. Subject and type are implied by the
/// request and left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    /// Review id
    pub id: ReviewId,
    /// Review text
    pub comment: String,
    /// Grade in `0..=5`
    pub grade: f32,
    /// Who wrote the review
    #[serde(rename = "subReviewer")]
    pub reviewer_id: String,
    /// Reviewer display name
    pub full_name: String,
    /// Last change of comment or grade
    pub date_of_modification: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            comment: review.comment,
            grade: review.grade,
            reviewer_id: review.reviewer_id,
            full_name: review.reviewer_name,
            date_of_modification: review.modified_at,
        }
    }
}

/// Aggregate report of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Number of reviews
    pub total_reviews: u64,
    /// Mean grade, `0` without reviews
    pub average_rating: f32,
    /// Star histogram, labels `"1"` to `"5"` in order
    pub number_of_stars: Vec<StarCount>,
    /// All reviews of the subject
    pub reviews: Vec<ReviewResponse>,
}

impl From<AggregateReport> for ReportResponse {
    fn from(report: AggregateReport) -> Self {
        Self {
            total_reviews: report.summary.total,
            average_rating: report.summary.average,
            number_of_stars: report.summary.histogram.buckets(),
            reviews: report.reviews.into_iter().map(ReviewResponse::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use grade_core::aggregate::compute_aggregate;
    use grade_core::review::ReviewType;

    fn review(grade: f32) -> Review {
        Review {
            id: ReviewId::new(),
            comment: "Clean and quiet".to_string(),
            grade,
            reviewer_id: "guest-1".to_string(),
            subject_id: "acc-1".to_string(),
            reviewer_name: "Ana".to_string(),
            modified_at: Utc::now(),
            review_type: ReviewType::Accommodation,
        }
    }

    #[test]
    fn review_uses_wire_names() {
        let json = serde_json::to_value(ReviewResponse::from(review(4.0))).unwrap();

        assert_eq!(json["subReviewer"], "guest-1");
        assert_eq!(json["fullName"], "Ana");
        assert!(json.get("dateOfModification").is_some());
        assert!(json.get("subjectId").is_none());
        assert!(json.get("reviewType").is_none());
    }

    #[test]
    fn empty_report_has_default_histogram() {
        let report = ReportResponse::from(AggregateReport {
            summary: compute_aggregate(&[]),
            reviews: Vec::new(),
        });
        let json = serde_json::to_value(report).unwrap();

        assert_eq!(json["totalReviews"], 0);
        assert_eq!(json["averageRating"], 0.0);
        assert_eq!(
            json["numberOfStars"],
            serde_json::json!([
                { "label": "1", "value": 0 },
                { "label": "2", "value": 0 },
                { "label": "3", "value": 0 },
                { "label": "4", "value": 0 },
                { "label": "5", "value": 0 }
            ])
        );
    }
}

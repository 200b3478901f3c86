//! Request bodies.
//!
//! Field names are camelCase. The names used by older clients
//! (`subReviewer`, `subReviewed`, `reviewerFullName`) are accepted as aliases.
//! Missing fields deserialize to empty values and are rejected by validation,
//! so the client gets one consistent error shape.

use grade_core::review::{
    ReviewDraft, ReviewType, ValidationError, require, validate_grade,
};
use serde::Deserialize;

/// `POST /grade` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// Review text
    #[serde(default)]
    pub comment: String,
    /// Grade in `0..=5`
    pub grade: Option<f32>,
    /// Who writes the review
    #[serde(default, alias = "subReviewer")]
    pub reviewer_id: String,
    /// Host or accommodation id
    #[serde(default, alias = "subReviewed")]
    pub subject_id: String,
    /// Reviewer display name
    #[serde(default, alias = "reviewerFullName")]
    pub reviewer_name: Option<String>,
    /// `0` host, `1` accommodation
    #[serde(default)]
    pub review_type: i64,
    /// User to notify. Required for accommodation reviews; host reviews
    /// default to the host
    #[serde(default)]
    pub host_id: Option<String>,
}

impl CreateReviewRequest {
    /// Validate and turn into a workflow draft.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn into_draft(self) -> Result<ReviewDraft, ValidationError> {
        let review_type = ReviewType::from_code(self.review_type)?;
        let grade = self
            .grade
            .ok_or(ValidationError::MissingField { field: "grade" })?;

        let draft = ReviewDraft {
            review_type,
            comment: self.comment,
            grade,
            reviewer_id: self.reviewer_id,
            subject_id: self.subject_id,
            reviewer_name: self.reviewer_name,
            notify_target_id: self.host_id,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// `PUT /grade/:id` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    /// New review text
    #[serde(default)]
    pub comment: String,
    /// New grade in `0..=5`
    pub grade: Option<f32>,
    /// `0` host, `1` accommodation
    #[serde(default)]
    pub review_type: i64,
}

/// Validated contents of an [`UpdateReviewRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewChange {
    /// Type the caller believes the review has
    pub review_type: ReviewType,
    /// New comment
    pub comment: String,
    /// New grade
    pub grade: f32,
}

impl UpdateReviewRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn into_change(self) -> Result<ReviewChange, ValidationError> {
        let review_type = ReviewType::from_code(self.review_type)?;
        require("comment", &self.comment)?;
        let grade = self
            .grade
            .ok_or(ValidationError::MissingField { field: "grade" })?;
        validate_grade(grade)?;

        Ok(ReviewChange {
            review_type,
            comment: self.comment,
            grade,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: serde_json::Value) -> Result<ReviewDraft, ValidationError> {
        serde_json::from_value::<CreateReviewRequest>(body)
            .unwrap()
            .into_draft()
    }

    #[test]
    fn accepts_current_field_names() {
        let draft = create(json!({
            "comment": "Lovely stay",
            "grade": 4.5,
            "reviewerId": "guest-1",
            "subjectId": "acc-1",
            "reviewerName": "Ana",
            "reviewType": 1,
            "hostId": "host-1"
        }))
        .unwrap();

        assert_eq!(draft.review_type, ReviewType::Accommodation);
        assert_eq!(draft.reviewer_id, "guest-1");
        assert_eq!(draft.notify_target(), Some("host-1"));
    }

    #[test]
    fn accepts_legacy_field_names() {
        let draft = create(json!({
            "comment": "Great host",
            "grade": 5,
            "subReviewer": "guest-1",
            "subReviewed": "host-1",
            "reviewerFullName": "Ana Anic",
            "reviewType": 0
        }))
        .unwrap();

        assert_eq!(draft.review_type, ReviewType::Host);
        assert_eq!(draft.subject_id, "host-1");
        assert_eq!(draft.reviewer_name.as_deref(), Some("Ana Anic"));
        assert_eq!(draft.notify_target(), Some("host-1"));
    }

    #[test]
    fn accommodation_without_host_is_rejected() {
        let result = create(json!({
            "comment": "Lovely stay",
            "grade": 4,
            "reviewerId": "guest-1",
            "subjectId": "acc-1",
            "reviewType": 1
        }));
        assert_eq!(result, Err(ValidationError::MissingField { field: "hostId" }));
    }

    #[test]
    fn missing_grade_is_rejected() {
        let result = create(json!({
            "comment": "ok",
            "reviewerId": "guest-1",
            "subjectId": "acc-1"
        }));
        assert_eq!(result, Err(ValidationError::MissingField { field: "grade" }));
    }

    #[test]
    fn missing_reviewer_is_rejected() {
        let result = create(json!({ "comment": "ok", "grade": 3, "subjectId": "acc-1" }));
        assert_eq!(
            result,
            Err(ValidationError::MissingField { field: "reviewerId" })
        );
    }

    #[test]
    fn unknown_review_type_is_rejected() {
        let result = create(json!({
            "comment": "ok",
            "grade": 3,
            "reviewerId": "guest-1",
            "subjectId": "acc-1",
            "reviewType": 2
        }));
        assert_eq!(result, Err(ValidationError::UnknownReviewType(2)));
    }

    #[test]
    fn update_validates_grade_range() {
        let request: UpdateReviewRequest =
            serde_json::from_value(json!({ "comment": "meh", "grade": 7, "reviewType": 1 }))
                .unwrap();
        assert!(matches!(
            request.into_change(),
            Err(ValidationError::GradeOutOfRange { .. })
        ));
    }

    #[test]
    fn update_accepts_zero_grade() {
        let request: UpdateReviewRequest =
            serde_json::from_value(json!({ "comment": "awful", "grade": 0 })).unwrap();
        let change = request.into_change().unwrap();
        assert_eq!(change.review_type, ReviewType::Host);
        assert!(change.grade.abs() < f32::EPSILON);
    }
}

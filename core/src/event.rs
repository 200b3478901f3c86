//! Outbound integration events.
//!
//! The workflow emits two kinds of events after a mutation:
//!
//! - [`RatingChanged`] carries the recomputed average for a subject.
//! - [`ReviewCreated`] notifies a user that a new review was written.
//!
//! Both are routed per [`ReviewType`] to their own topic and serialized as
//! JSON, the format the consuming services read.
//!
//! # Example
//!
//! ```
//! use grade_core::event::{Event, RatingChanged, rating_changed_topic};
//! use grade_core::review::ReviewType;
//!
//! let event = RatingChanged { id: "host-1".to_string(), rating: 4.5 };
//! let outbound = event.to_outbound("host-1").unwrap();
//!
//! assert_eq!(rating_changed_topic(ReviewType::Host), "host-rating.changed");
//! assert_eq!(outbound.event_type, "RatingChanged.v1");
//! ```

use crate::review::ReviewType;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Topic for host rating updates.
pub const HOST_RATING_CHANGED: &str = "host-rating.changed";
/// Topic for accommodation rating updates.
pub const ACCOMMODATION_RATING_CHANGED: &str = "accommodation-rating.changed";
/// Topic for new host reviews.
pub const HOST_REVIEW_CREATED: &str = "host-review.created";
/// Topic for new accommodation reviews.
pub const ACCOMMODATION_REVIEW_CREATED: &str = "accommodation-review.created";

/// Topic that receives rating-changed events for the given subject type.
#[must_use]
pub const fn rating_changed_topic(review_type: ReviewType) -> &'static str {
    match review_type {
        ReviewType::Host => HOST_RATING_CHANGED,
        ReviewType::Accommodation => ACCOMMODATION_RATING_CHANGED,
    }
}

/// Topic that receives review-created events for the given subject type.
#[must_use]
pub const fn review_created_topic(review_type: ReviewType) -> &'static str {
    match review_type {
        ReviewType::Host => HOST_REVIEW_CREATED,
        ReviewType::Accommodation => ACCOMMODATION_REVIEW_CREATED,
    }
}

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// An integration event published to other services.
///
/// `event_type()` returns a stable, versioned name (`"RatingChanged.v1"`)
/// that travels alongside the payload as a message header.
pub trait Event: Send + Sync + 'static {
    /// Versioned event type identifier.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes do not hold
    /// this event type.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        serde_json::from_slice(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }

    /// Package this event for the event bus, partitioned by `key`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_outbound(&self, key: &str) -> Result<OutboundEvent, EventError>
    where
        Self: Serialize,
    {
        Ok(OutboundEvent::new(
            self.event_type().to_string(),
            key.to_string(),
            self.to_bytes()?,
        ))
    }
}

/// A serialized event ready for the event bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundEvent {
    /// The event type identifier (e.g., `"RatingChanged.v1"`).
    pub event_type: String,

    /// Partition key. Events about one subject share a key, and so a partition.
    pub key: String,

    /// JSON payload.
    pub payload: Vec<u8>,
}

impl OutboundEvent {
    /// Create a new outbound event.
    #[must_use]
    pub const fn new(event_type: String, key: String, payload: Vec<u8>) -> Self {
        Self {
            event_type,
            key,
            payload,
        }
    }

    /// Decode the payload back into a typed event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` on a payload of another shape.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_bytes(&self.payload)
    }
}

impl fmt::Display for OutboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutboundEvent {{ type: {}, key: {}, size: {} bytes }}",
            self.event_type,
            self.key,
            self.payload.len()
        )
    }
}

/// The average rating of a subject changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingChanged {
    /// Subject id (host or accommodation)
    pub id: String,
    /// New mean grade, `0.0` once the last review is gone
    pub rating: f32,
}

impl Event for RatingChanged {
    fn event_type(&self) -> &'static str {
        "RatingChanged.v1"
    }
}

/// A review was written. Addressed to the user who should be notified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewCreated {
    /// An accommodation received a review.
    #[serde(rename_all = "camelCase")]
    Accommodation {
        /// User to notify
        user_id: String,
        /// The reviewed accommodation
        accommodation_id: String,
        /// Display name of the reviewer
        reviewer_name: String,
    },
    /// A host received a review.
    #[serde(rename_all = "camelCase")]
    Host {
        /// User to notify
        user_id: String,
        /// Display name of the reviewer
        reviewer_name: String,
    },
}

impl ReviewCreated {
    /// Build the notification for a new review of `subject_id`.
    #[must_use]
    pub fn new(
        review_type: ReviewType,
        user_id: impl Into<String>,
        subject_id: impl Into<String>,
        reviewer_name: impl Into<String>,
    ) -> Self {
        match review_type {
            ReviewType::Host => Self::Host {
                user_id: user_id.into(),
                reviewer_name: reviewer_name.into(),
            },
            ReviewType::Accommodation => Self::Accommodation {
                user_id: user_id.into(),
                accommodation_id: subject_id.into(),
                reviewer_name: reviewer_name.into(),
            },
        }
    }

    /// The notified user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Host { user_id, .. } | Self::Accommodation { user_id, .. } => user_id,
        }
    }
}

impl Event for ReviewCreated {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Host { .. } => "HostReviewCreated.v1",
            Self::Accommodation { .. } => "AccommodationReviewCreated.v1",
        }
    }
}

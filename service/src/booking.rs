//! HTTP client for the booking service eligibility checks.
//!
//! The booking service knows which guests completed a reservation with which
//! host or accommodation. One endpoint per review type:
//!
//! - `POST /booking/reservations/check/host` with `{ "reviewerId", "hostId" }`
//! - `POST /booking/reservations/check/accommodation` with
//!   `{ "reviewerId", "accommodationId" }`
//!
//! Both answer `{ "hasReservation": bool }`.

use grade_core::eligibility::{EligibilityError, EligibilityOracle};
use grade_core::review::ReviewType;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors building a [`BookingClient`].
#[derive(Error, Debug)]
pub enum BookingClientError {
    /// The base URL does not parse.
    #[error("Invalid booking service URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Parser message
        reason: String,
    },
    /// The underlying HTTP client could not be created.
    #[error("Failed to build booking HTTP client: {0}")]
    Client(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HostCheck<'a> {
    reviewer_id: &'a str,
    host_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccommodationCheck<'a> {
    reviewer_id: &'a str,
    accommodation_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponse {
    has_reservation: bool,
}

/// [`EligibilityOracle`] backed by the booking service.
#[derive(Debug, Clone)]
pub struct BookingClient {
    base_url: String,
    client: reqwest::Client,
}

impl BookingClient {
    /// Create a client for the booking service at `base_url`.
    ///
    /// `timeout` bounds each request, connect included.
    ///
    /// # Errors
    ///
    /// Returns [`BookingClientError`] if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BookingClientError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| BookingClientError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BookingClientError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn check_url(&self, review_type: ReviewType) -> String {
        format!(
            "{}/booking/reservations/check/{}",
            self.base_url,
            review_type.as_str()
        )
    }

    async fn check(
        &self,
        review_type: ReviewType,
        reviewer_id: &str,
        subject_id: &str,
    ) -> Result<bool, EligibilityError> {
        let request = self.client.post(self.check_url(review_type));
        let request = match review_type {
            ReviewType::Host => request.json(&HostCheck {
                reviewer_id,
                host_id: subject_id,
            }),
            ReviewType::Accommodation => request.json(&AccommodationCheck {
                reviewer_id,
                accommodation_id: subject_id,
            }),
        };

        let response = request
            .send()
            .await
            .map_err(|e| EligibilityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EligibilityError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<CheckResponse>()
            .await
            .map_err(|e| EligibilityError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            review_type = %review_type,
            reviewer_id,
            subject_id,
            has_reservation = body.has_reservation,
            "Eligibility answered"
        );

        Ok(body.has_reservation)
    }
}

impl EligibilityOracle for BookingClient {
    fn has_completed_reservation<'a>(
        &'a self,
        review_type: ReviewType,
        reviewer_id: &'a str,
        subject_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, EligibilityError>> + Send + 'a>> {
        Box::pin(self.check(review_type, reviewer_id, subject_id))
    }
}

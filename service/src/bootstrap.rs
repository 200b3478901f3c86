//! Production wiring.
//!
//! [`Resources::from_config`] builds every collaborator from configuration:
//!
//! 1. Connect the Postgres pool and run migrations
//! 2. Build the Redpanda producer, wrapped in publish retries
//! 3. Build the booking client, wrapped in transport retries
//! 4. Optionally seed demo reviews
//!
//! Every constructor is fallible; `main` decides what to do with the error.

use crate::booking::{BookingClient, BookingClientError};
use crate::config::Config;
use crate::seed::seed_demo_reviews;
use crate::service::ReviewService;
use grade_core::eligibility::EligibilityOracle;
use grade_core::environment::SystemClock;
use grade_core::event_bus::{EventBus, EventBusError};
use grade_core::store::{ReviewStore, ReviewStoreError};
use grade_postgres::PostgresReviewStore;
use grade_redpanda::RedpandaEventBus;
use grade_runtime::resilient::{RetryingEligibilityOracle, RetryingEventBus};
use grade_runtime::retry::RetryPolicy;
use grade_runtime::sequencer::SubjectSequencer;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors while building resources.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Could not connect to Postgres.
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations or seeding failed.
    #[error(transparent)]
    Store(#[from] ReviewStoreError),

    /// The Kafka producer could not be created.
    #[error(transparent)]
    EventBus(#[from] EventBusError),

    /// The booking client could not be created.
    #[error(transparent)]
    Booking(#[from] BookingClientError),
}

/// Infrastructure shared by the workflow.
#[derive(Clone)]
pub struct Resources {
    /// Review store
    pub store: Arc<PostgresReviewStore>,
    /// Event publisher with publish retries
    pub event_bus: Arc<RetryingEventBus<RedpandaEventBus>>,
    /// Booking service with transport retries
    pub oracle: Arc<RetryingEligibilityOracle<BookingClient>>,
    /// Wall clock
    pub clock: Arc<SystemClock>,
}

impl Resources {
    /// Initialize all infrastructure resources from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] if the database is unreachable, a migration
    /// fails, the producer or booking client cannot be built, or seeding
    /// fails.
    pub async fn from_config(config: &Config) -> Result<Self, BootstrapError> {
        info!("Connecting to review database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.postgres.max_connections)
            .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
            .connect(&config.postgres.url)
            .await?;
        let store = PostgresReviewStore::from_pool(pool);
        store.migrate().await?;
        info!("Review database ready");

        let event_bus = build_event_bus(config)?;
        info!(brokers = %config.redpanda.brokers, "Event publisher ready");

        let booking = BookingClient::new(
            config.booking.url.clone(),
            Duration::from_millis(config.booking.timeout_ms),
        )?;
        info!(url = %booking.base_url(), "Booking client ready");

        let resources = Self {
            store: Arc::new(store),
            event_bus: Arc::new(RetryingEventBus::new(
                event_bus,
                retry_policy(config.workflow.publish_retries),
            )),
            oracle: Arc::new(RetryingEligibilityOracle::new(
                booking,
                retry_policy(config.workflow.oracle_retries),
            )),
            clock: Arc::new(SystemClock),
        };

        if config.workflow.seed_demo_data {
            seed_demo_reviews(resources.store.as_ref(), resources.clock.as_ref()).await?;
        }

        Ok(resources)
    }

    /// The review workflow over these resources.
    #[must_use]
    pub fn review_service(&self, config: &Config) -> ReviewService {
        let store: Arc<dyn ReviewStore> = self.store.clone();
        let oracle: Arc<dyn EligibilityOracle> = self.oracle.clone();
        let event_bus: Arc<dyn EventBus> = self.event_bus.clone();

        let service = ReviewService::new(store, oracle, event_bus, self.clock.clone())
            .with_request_timeout(config.request_timeout())
            .with_publish_timeout(config.publish_timeout());

        if config.workflow.serialize_per_subject {
            service.with_sequencer(SubjectSequencer::new())
        } else {
            service
        }
    }
}

fn build_event_bus(config: &Config) -> Result<RedpandaEventBus, EventBusError> {
    let redpanda = &config.redpanda;
    let mut builder = RedpandaEventBus::builder()
        .brokers(&redpanda.brokers)
        .producer_acks(&redpanda.producer_acks)
        .security_protocol(&redpanda.security_protocol)
        .timeout(Duration::from_millis(redpanda.send_timeout_ms));

    if let Some(mechanism) = &redpanda.sasl_mechanism {
        builder = builder.sasl_mechanism(mechanism);
    }
    if let (Some(username), Some(password)) = (&redpanda.sasl_username, &redpanda.sasl_password) {
        builder = builder.sasl_credentials(username, password);
    }

    builder.build()
}

fn retry_policy(max_retries: usize) -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(max_retries)
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(2))
        .build()
}

//! Redpanda event publisher for the grade service.
//!
//! Implements [`EventBus`] with an rdkafka `FutureProducer`, so it works
//! against Redpanda or any Kafka-compatible broker.
//!
//! # Message layout
//!
//! - **value**: the event's JSON payload, unchanged
//! - **key**: the subject id, so every event about one subject lands on the
//!   same partition and keeps its order
//! - **header** `event-type`: the versioned event type (`"RatingChanged.v1"`)
//!
//! # Delivery Semantics
//!
//! At-least-once. `publish` resolves when the broker acknowledged the record
//! (per the configured `acks`) or the send timeout expired. Buffered records
//! are drained with [`EventBus::flush`] at shutdown.
//!
//! # Example
//!
//! ```no_run
//! use grade_redpanda::RedpandaEventBus;
//! use grade_core::event::{Event, RatingChanged};
//! use grade_core::event_bus::EventBus;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let event_bus = RedpandaEventBus::new("localhost:9092")?;
//!
//! let event = RatingChanged { id: "host-1".to_string(), rating: 4.0 };
//! event_bus
//!     .publish("host-rating.changed", &event.to_outbound("host-1")?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use grade_core::event::OutboundEvent;
use grade_core::event_bus::{EventBus, EventBusError};
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Header carrying the event type.
pub const EVENT_TYPE_HEADER: &str = "event-type";

const DEFAULT_ACKS: &str = "1";
const DEFAULT_COMPRESSION: &str = "none";
const DEFAULT_SECURITY_PROTOCOL: &str = "plaintext";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// Redpanda event bus implementation.
///
/// # Configuration
///
/// - **Broker addresses**: bootstrap servers (required)
/// - **Producer settings**: acks, compression, send timeout
/// - **Security**: protocol plus optional SASL mechanism and credentials
///
/// # Example
///
/// ```no_run
/// use grade_redpanda::RedpandaEventBus;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let event_bus = RedpandaEventBus::builder()
///     .brokers("kafka-1:9092,kafka-2:9092")
///     .producer_acks("all")
///     .security_protocol("sasl_plaintext")
///     .sasl_mechanism("PLAIN")
///     .sasl_credentials("user1", "secret")
///     .timeout(Duration::from_secs(4))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaEventBus {
    producer: FutureProducer,
    brokers: String,
    timeout: Duration,
}

impl RedpandaEventBus {
    /// Create a new Redpanda event bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot be
    /// created from the configuration.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder for configuring the event bus.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// Get a reference to the brokers string.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Per-record delivery timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for configuring a [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
    security_protocol: Option<String>,
    sasl_mechanism: Option<String>,
    sasl_username: Option<String>,
    sasl_password: Option<String>,
}

impl RedpandaEventBusBuilder {
    /// Set the broker addresses (comma-separated, e.g. `"localhost:9092"`).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode: `"0"`, `"1"` or `"all"`.
    ///
    /// Default: `"1"`
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec: `"none"`, `"gzip"`, `"snappy"`, `"lz4"`, `"zstd"`.
    ///
    /// Default: `"none"`
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the per-record delivery timeout.
    ///
    /// Default: 4 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set `security.protocol` (`"plaintext"`, `"sasl_plaintext"`, `"sasl_ssl"`, ...).
    ///
    /// Default: `"plaintext"`
    #[must_use]
    pub fn security_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.security_protocol = Some(protocol.into());
        self
    }

    /// Set the SASL mechanism (e.g. `"PLAIN"`, `"SCRAM-SHA-256"`).
    #[must_use]
    pub fn sasl_mechanism(mut self, mechanism: impl Into<String>) -> Self {
        self.sasl_mechanism = Some(mechanism.into());
        self
    }

    /// Set SASL username and password.
    #[must_use]
    pub fn sasl_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.sasl_username = Some(username.into());
        self.sasl_password = Some(password.into());
        self
    }

    /// Build the [`RedpandaEventBus`].
    ///
    /// Creating the producer does not contact the brokers; connection
    /// problems surface on the first publish.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if brokers are not set or
    /// the configuration is rejected by librdkafka.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self
            .brokers
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| EventBusError::ConnectionFailed("Brokers not configured".to_string()))?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let acks = self.producer_acks.as_deref().unwrap_or(DEFAULT_ACKS);
        let compression = self.compression.as_deref().unwrap_or(DEFAULT_COMPRESSION);
        let security_protocol = self
            .security_protocol
            .as_deref()
            .unwrap_or(DEFAULT_SECURITY_PROTOCOL);

        let mut producer_config = ClientConfig::new();
        producer_config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", acks)
            .set("compression.type", compression)
            .set("security.protocol", security_protocol);

        if let Some(mechanism) = &self.sasl_mechanism {
            producer_config.set("sasl.mechanisms", mechanism);
        }
        if let Some(username) = &self.sasl_username {
            producer_config.set("sasl.username", username);
        }
        if let Some(password) = &self.sasl_password {
            producer_config.set("sasl.password", password);
        }

        let producer: FutureProducer = producer_config.create().map_err(|e| {
            EventBusError::ConnectionFailed(format!("Failed to create producer: {e}"))
        })?;

        tracing::info!(
            brokers = %brokers,
            acks,
            compression,
            security_protocol,
            sasl_mechanism = self.sasl_mechanism.as_deref().unwrap_or("none"),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "RedpandaEventBus created successfully"
        );

        Ok(RedpandaEventBus {
            producer,
            brokers,
            timeout,
        })
    }
}

fn publish_error(topic: &str, error: &KafkaError) -> EventBusError {
    match error.rdkafka_error_code() {
        Some(RDKafkaErrorCode::MessageTimedOut | RDKafkaErrorCode::RequestTimedOut) => {
            EventBusError::Timeout(topic.to_string())
        }
        Some(RDKafkaErrorCode::UnknownTopic | RDKafkaErrorCode::UnknownTopicOrPartition) => {
            EventBusError::InvalidTopic(topic.to_string())
        }
        _ => EventBusError::PublishFailed {
            topic: topic.to_string(),
            reason: error.to_string(),
        },
    }
}

impl EventBus for RedpandaEventBus {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        event: &'a OutboundEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + 'a>> {
        Box::pin(async move {
            let headers = OwnedHeaders::new().insert(Header {
                key: EVENT_TYPE_HEADER,
                value: Some(event.event_type.as_str()),
            });

            let record = FutureRecord::to(topic)
                .payload(&event.payload)
                .key(event.key.as_str())
                .headers(headers);

            match self.producer.send(record, Timeout::After(self.timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic,
                        partition,
                        offset,
                        key = %event.key,
                        event_type = %event.event_type,
                        "Event published successfully"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::warn!(
                        topic,
                        key = %event.key,
                        event_type = %event.event_type,
                        error = %kafka_error,
                        "Failed to publish event"
                    );
                    Err(publish_error(topic, &kafka_error))
                }
            }
        })
    }

    fn flush(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let producer = self.producer.clone();
        Box::pin(async move {
            let in_flight = producer.in_flight_count();
            let result = tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
                .await
                .map_err(|e| EventBusError::Other(format!("Flush task failed: {e}")))?;

            match result {
                Ok(()) => {
                    tracing::info!(in_flight, "Producer flushed");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(in_flight, error = %e, "Producer flush incomplete");
                    Err(EventBusError::Timeout(format!("flush: {e}")))
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_brokers() {
        let result = RedpandaEventBus::builder().build();
        assert!(matches!(result, Err(EventBusError::ConnectionFailed(_))));

        let blank = RedpandaEventBus::builder().brokers("  ").build();
        assert!(matches!(blank, Err(EventBusError::ConnectionFailed(_))));
    }

    #[test]
    fn build_does_not_need_a_reachable_broker() {
        let bus = RedpandaEventBus::builder()
            .brokers("127.0.0.1:1")
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(bus.brokers(), "127.0.0.1:1");
        assert_eq!(bus.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn invalid_settings_are_rejected_at_build() {
        let result = RedpandaEventBus::builder()
            .brokers("localhost:9092")
            .compression("definitely-not-a-codec")
            .build();
        assert!(matches!(result, Err(EventBusError::ConnectionFailed(_))));
    }

    #[test]
    fn kafka_timeouts_map_to_timeout_errors() {
        let error = KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut);
        assert!(matches!(
            publish_error("host-rating.changed", &error),
            EventBusError::Timeout(topic) if topic == "host-rating.changed"
        ));

        let error = KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull);
        assert!(matches!(
            publish_error("t", &error),
            EventBusError::PublishFailed { .. }
        ));
    }
}

//! Event bus abstraction for publishing integration events.
//!
//! The review workflow writes to the store first, then publishes. There is no
//! transaction spanning both steps:
//!
//! ```text
//! ┌─────────────────┐
//! │ 1. Write review │◄─── Source of truth
//! │   to the store  │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ 2. Publish to   │
//! │    Event Bus    │◄─── At-least-once, best effort
//! └────────┬────────┘
//!          │
//!     ┌────┴──────────┐
//!     ▼               ▼
//! ┌─────────┐   ┌──────────────┐
//! │ Ratings │   │ Notification │
//! │consumers│   │   service    │
//! └─────────┘   └──────────────┘
//! ```
//!
//! A publish failure after a committed write is logged and counted by the
//! caller. It never undoes the write.
//!
//! # Implementations
//!
//! - `RecordingEventBus` (grade-testing) - records every publish for assertions
//! - `RedpandaEventBus` (grade-redpanda) - Kafka-compatible producer
//! - `RetryingEventBus` (grade-runtime) - retries transient failures of any bus

use crate::event::OutboundEvent;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Topic not found or invalid
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    /// Delivery was not confirmed within the producer timeout
    #[error("Publish to '{0}' timed out")]
    Timeout(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Generic error for other failures
    #[error("Event bus error: {0}")]
    Other(String),
}

impl EventBusError {
    /// Whether a retry of the same publish may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::PublishFailed { .. }
                | Self::Timeout(_)
                | Self::TransportError(_)
        )
    }
}

/// Trait for event bus implementations.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` rather than using `async fn` so the
/// workflow can hold an `Arc<dyn EventBus>`.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// Delivery is at-least-once: consumers may see the same event twice.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] (or another variant) if the
    /// broker did not acknowledge the event.
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        event: &'a OutboundEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + 'a>>;

    /// Wait until buffered events are delivered, at most `timeout`.
    ///
    /// Called once at shutdown. Buses without a send buffer keep the default.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::Timeout`] if events were still pending when
    /// the timeout expired.
    fn flush(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let _ = timeout;
        Box::pin(async { Ok(()) })
    }
}

impl<T: EventBus + ?Sized> EventBus for std::sync::Arc<T> {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        event: &'a OutboundEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + 'a>> {
        (**self).publish(topic, event)
    }

    fn flush(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        (**self).flush(timeout)
    }
}

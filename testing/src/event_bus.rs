//! Recording event bus.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use grade_core::event::{Event, OutboundEvent};
use grade_core::event_bus::{EventBus, EventBusError};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    /// Destination topic
    pub topic: String,
    /// The event as handed to the bus
    pub event: OutboundEvent,
}

/// [`EventBus`] that keeps every published event in memory.
///
/// Failed publishes are counted in [`attempts`](Self::attempts) but not
/// recorded as published.
///
/// # Example
///
/// ```
/// use grade_testing::RecordingEventBus;
/// use grade_core::event::{Event, RatingChanged};
/// use grade_core::event_bus::EventBus;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = RecordingEventBus::new();
/// let event = RatingChanged { id: "h-1".to_string(), rating: 4.0 };
/// bus.publish("host-rating.changed", &event.to_outbound("h-1")?).await?;
///
/// let seen: Vec<RatingChanged> = bus.decoded("host-rating.changed");
/// assert_eq!(seen, vec![event]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingEventBus {
    published: Arc<Mutex<Vec<PublishedEvent>>>,
    failing_topics: Arc<Mutex<HashSet<String>>>,
    fail_everything: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
    flushes: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl RecordingEventBus {
    /// Create a bus that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus that rejects every publish.
    #[must_use]
    pub fn failing() -> Self {
        let bus = Self::new();
        bus.set_failing(true);
        bus
    }

    /// Wait `delay` before answering each publish.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reject (or accept again) every publish.
    pub fn set_failing(&self, failing: bool) {
        self.fail_everything.store(failing, Ordering::SeqCst);
    }

    /// Reject publishes to one topic.
    pub fn fail_topic(&self, topic: &str) {
        self.failing_topics.lock().unwrap().insert(topic.to_string());
    }

    /// Every successful publish, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Events published to `topic`, in order.
    #[must_use]
    pub fn published_to(&self, topic: &str) -> Vec<OutboundEvent> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.event.clone())
            .collect()
    }

    /// Events published to `topic`, decoded as `E`. Undecodable payloads are skipped.
    #[must_use]
    pub fn decoded<E: Event + DeserializeOwned>(&self, topic: &str) -> Vec<E> {
        self.published_to(topic)
            .iter()
            .filter_map(|event| event.decode().ok())
            .collect()
    }

    /// Publish calls received, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Flush calls received.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Forget everything published so far.
    pub fn clear(&self) {
        self.published.lock().unwrap().clear();
    }

    fn record(&self, topic: &str, event: &OutboundEvent) -> Result<(), EventBusError> {
        if self.fail_everything.load(Ordering::SeqCst)
            || self.failing_topics.lock().unwrap().contains(topic)
        {
            return Err(EventBusError::PublishFailed {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }

        self.published.lock().unwrap().push(PublishedEvent {
            topic: topic.to_string(),
            event: event.clone(),
        });
        Ok(())
    }
}

impl EventBus for RecordingEventBus {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        event: &'a OutboundEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + 'a>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.record(topic, event)
        })
    }

    fn flush(
        &self,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grade_core::event::RatingChanged;

    fn rating(id: &str) -> OutboundEvent {
        RatingChanged {
            id: id.to_string(),
            rating: 2.0,
        }
        .to_outbound(id)
        .unwrap()
    }

    #[tokio::test]
    async fn records_by_topic() {
        let bus = RecordingEventBus::new();
        bus.publish("a", &rating("1")).await.unwrap();
        bus.publish("b", &rating("2")).await.unwrap();

        assert_eq!(bus.published().len(), 2);
        assert_eq!(bus.published_to("b"), vec![rating("2")]);
        assert!(bus.published_to("c").is_empty());
    }

    #[tokio::test]
    async fn failing_topic_is_not_recorded() {
        let bus = RecordingEventBus::new();
        bus.fail_topic("a");

        assert!(bus.publish("a", &rating("1")).await.is_err());
        assert!(bus.publish("b", &rating("1")).await.is_ok());
        assert_eq!(bus.attempts(), 2);
        assert_eq!(bus.published().len(), 1);
    }

    #[tokio::test]
    async fn abandoned_slow_publish_counts_as_attempt_only() {
        let bus = RecordingEventBus::new().with_delay(Duration::from_millis(200));
        let event = rating("1");

        let result =
            tokio::time::timeout(Duration::from_millis(10), bus.publish("a", &event)).await;

        assert!(result.is_err());
        assert_eq!(bus.attempts(), 1);
        assert!(bus.published().is_empty());
    }
}

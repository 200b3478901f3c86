//! Retrying decorators for the outbound collaborators.
//!
//! Each decorator wraps any implementation of the collaborator trait and is
//! itself an implementation, so the workflow never knows whether retries are
//! active. Success paths are passed through untouched.

use crate::retry::{RetryPolicy, retry_with_predicate};
use grade_core::eligibility::{EligibilityError, EligibilityOracle};
use grade_core::event::OutboundEvent;
use grade_core::event_bus::{EventBus, EventBusError};
use grade_core::review::ReviewType;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// [`EventBus`] that retries transient publish failures.
#[derive(Debug, Clone)]
pub struct RetryingEventBus<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: EventBus> RetryingEventBus<B> {
    /// Wrap `inner`, retrying according to `policy`.
    #[must_use]
    pub const fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped bus.
    #[must_use]
    pub const fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: EventBus> EventBus for RetryingEventBus<B> {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        event: &'a OutboundEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + 'a>> {
        Box::pin(retry_with_predicate(
            &self.policy,
            topic,
            move || self.inner.publish(topic, event),
            EventBusError::is_transient,
        ))
    }

    fn flush(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        self.inner.flush(timeout)
    }
}

/// [`EligibilityOracle`] that retries when no answer was obtained.
///
/// A definite answer (`Ok(true)` or `Ok(false)`) is never retried.
#[derive(Debug, Clone)]
pub struct RetryingEligibilityOracle<O> {
    inner: O,
    policy: RetryPolicy,
}

impl<O: EligibilityOracle> RetryingEligibilityOracle<O> {
    /// Wrap `inner`, retrying according to `policy`.
    #[must_use]
    pub const fn new(inner: O, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<O: EligibilityOracle> EligibilityOracle for RetryingEligibilityOracle<O> {
    fn has_completed_reservation<'a>(
        &'a self,
        review_type: ReviewType,
        reviewer_id: &'a str,
        subject_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, EligibilityError>> + Send + 'a>> {
        Box::pin(retry_with_predicate(
            &self.policy,
            "eligibility_check",
            move || {
                self.inner
                    .has_completed_reservation(review_type, reviewer_id, subject_id)
            },
            EligibilityError::is_transient,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(2)
            .initial_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(2))
            .build()
    }

    /// Bus that fails with scripted errors before succeeding.
    struct ScriptedBus {
        failures: Mutex<Vec<EventBusError>>,
        calls: AtomicUsize,
    }

    impl ScriptedBus {
        fn failing_with(failures: Vec<EventBusError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EventBus for ScriptedBus {
        fn publish<'a>(
            &'a self,
            _topic: &'a str,
            _event: &'a OutboundEvent,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.failures.lock().unwrap().pop();
            Box::pin(async move { next.map_or(Ok(()), Err) })
        }
    }

    struct FlakyOracle {
        answers: Mutex<Vec<Result<bool, EligibilityError>>>,
        calls: AtomicUsize,
    }

    impl EligibilityOracle for FlakyOracle {
        fn has_completed_reservation<'a>(
            &'a self,
            _review_type: ReviewType,
            _reviewer_id: &'a str,
            _subject_id: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<bool, EligibilityError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.answers.lock().unwrap().pop().unwrap_or(Ok(false));
            Box::pin(async move { next })
        }
    }

    fn event() -> OutboundEvent {
        OutboundEvent::new("RatingChanged.v1".to_string(), "host-1".to_string(), b"{}".to_vec())
    }

    #[tokio::test]
    async fn transient_publish_failure_is_retried() {
        let bus = RetryingEventBus::new(
            ScriptedBus::failing_with(vec![EventBusError::TransportError("reset".to_string())]),
            policy(),
        );

        bus.publish("host-rating.changed", &event()).await.unwrap();
        assert_eq!(bus.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_publish_failure_is_not_retried() {
        let bus = RetryingEventBus::new(
            ScriptedBus::failing_with(vec![EventBusError::InvalidTopic("nope".to_string())]),
            policy(),
        );

        let result = bus.publish("nope", &event()).await;
        assert!(matches!(result, Err(EventBusError::InvalidTopic(_))));
        assert_eq!(bus.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_gives_up_after_policy_is_exhausted() {
        let failures = (0..5)
            .map(|_| EventBusError::Timeout("t".to_string()))
            .collect();
        let bus = RetryingEventBus::new(ScriptedBus::failing_with(failures), policy());

        assert!(bus.publish("t", &event()).await.is_err());
        assert_eq!(bus.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn oracle_retries_transport_errors_only() {
        // answers are popped from the back
        let oracle = RetryingEligibilityOracle::new(
            FlakyOracle {
                answers: Mutex::new(vec![
                    Ok(true),
                    Err(EligibilityError::Transport("refused".to_string())),
                ]),
                calls: AtomicUsize::new(0),
            },
            policy(),
        );

        let eligible = oracle
            .has_completed_reservation(ReviewType::Host, "guest", "host")
            .await
            .unwrap();
        assert!(eligible);
        assert_eq!(oracle.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oracle_negative_answer_is_final() {
        let oracle = RetryingEligibilityOracle::new(
            FlakyOracle {
                answers: Mutex::new(vec![Ok(false)]),
                calls: AtomicUsize::new(0),
            },
            policy(),
        );

        let eligible = oracle
            .has_completed_reservation(ReviewType::Accommodation, "guest", "acc")
            .await
            .unwrap();
        assert!(!eligible);
        assert_eq!(oracle.inner.calls.load(Ordering::SeqCst), 1);
    }
}

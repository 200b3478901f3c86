//! Scripted eligibility oracle.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use grade_core::eligibility::{EligibilityError, EligibilityOracle};
use grade_core::review::ReviewType;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded eligibility question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityCall {
    /// Kind of subject asked about
    pub review_type: ReviewType,
    /// Reviewer asked about
    pub reviewer_id: String,
    /// Subject asked about
    pub subject_id: String,
}

#[derive(Debug, Clone)]
enum Script {
    AllowAll,
    DenyAll,
    Fail(EligibilityError),
    AllowList(HashSet<(ReviewType, String, String)>),
}

/// [`EligibilityOracle`] that answers from a script and records every call.
///
/// # Example
///
/// ```
/// use grade_testing::ScriptedEligibilityOracle;
/// use grade_core::eligibility::EligibilityOracle;
/// use grade_core::review::ReviewType;
///
/// # async fn example() {
/// let oracle = ScriptedEligibilityOracle::deny_all()
///     .allow(ReviewType::Host, "guest-1", "host-1");
///
/// assert_eq!(oracle.has_completed_reservation(ReviewType::Host, "guest-1", "host-1").await, Ok(true));
/// assert_eq!(oracle.has_completed_reservation(ReviewType::Host, "guest-2", "host-1").await, Ok(false));
/// assert_eq!(oracle.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedEligibilityOracle {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<EligibilityCall>>>,
    delay: Option<Duration>,
}

impl ScriptedEligibilityOracle {
    fn scripted(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Every reviewer is eligible.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::scripted(Script::AllowAll)
    }

    /// No reviewer is eligible.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::scripted(Script::DenyAll)
    }

    /// Every call fails with a transport error.
    #[must_use]
    pub fn failing() -> Self {
        Self::failing_with(EligibilityError::Transport(
            "booking service unreachable".to_string(),
        ))
    }

    /// Every call fails with `error`.
    #[must_use]
    pub fn failing_with(error: EligibilityError) -> Self {
        Self::scripted(Script::Fail(error))
    }

    /// Make one (type, reviewer, subject) combination eligible.
    ///
    /// Switches a deny-all or failing script to an allow list.
    #[must_use]
    pub fn allow(self, review_type: ReviewType, reviewer_id: &str, subject_id: &str) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            let entry = (review_type, reviewer_id.to_string(), subject_id.to_string());
            match &mut *script {
                Script::AllowAll => {}
                Script::AllowList(allowed) => {
                    allowed.insert(entry);
                }
                Script::DenyAll | Script::Fail(_) => {
                    *script = Script::AllowList(HashSet::from([entry]));
                }
            }
        }
        self
    }

    /// Wait `delay` before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<EligibilityCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer(
        &self,
        review_type: ReviewType,
        reviewer_id: &str,
        subject_id: &str,
    ) -> Result<bool, EligibilityError> {
        self.calls.lock().unwrap().push(EligibilityCall {
            review_type,
            reviewer_id: reviewer_id.to_string(),
            subject_id: subject_id.to_string(),
        });

        match &*self.script.lock().unwrap() {
            Script::AllowAll => Ok(true),
            Script::DenyAll => Ok(false),
            Script::Fail(error) => Err(error.clone()),
            Script::AllowList(allowed) => Ok(allowed.contains(&(
                review_type,
                reviewer_id.to_string(),
                subject_id.to_string(),
            ))),
        }
    }
}

impl EligibilityOracle for ScriptedEligibilityOracle {
    fn has_completed_reservation<'a>(
        &'a self,
        review_type: ReviewType,
        reviewer_id: &'a str,
        subject_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, EligibilityError>> + Send + 'a>> {
        let answer = self.answer(review_type, reviewer_id, subject_id);
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            answer
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allow_list_is_scoped_to_type_and_subject() {
        let oracle = ScriptedEligibilityOracle::deny_all().allow(ReviewType::Accommodation, "g", "acc-1");

        assert_eq!(
            oracle.has_completed_reservation(ReviewType::Accommodation, "g", "acc-1").await,
            Ok(true)
        );
        assert_eq!(
            oracle.has_completed_reservation(ReviewType::Host, "g", "acc-1").await,
            Ok(false)
        );
        assert_eq!(
            oracle.has_completed_reservation(ReviewType::Accommodation, "g", "acc-2").await,
            Ok(false)
        );
    }

    #[tokio::test]
    async fn failing_oracle_records_the_call() {
        let oracle = ScriptedEligibilityOracle::failing();

        let result = oracle.has_completed_reservation(ReviewType::Host, "g", "h").await;
        assert!(matches!(result, Err(EligibilityError::Transport(_))));
        assert_eq!(
            oracle.calls(),
            vec![EligibilityCall {
                review_type: ReviewType::Host,
                reviewer_id: "g".to_string(),
                subject_id: "h".to_string(),
            }]
        );
    }
}

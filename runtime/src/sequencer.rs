//! Per-subject sequencing of aggregate publication.
//!
//! Two writers on the same subject may finish "re-fetch, aggregate, publish"
//! in either order, so an older average can be published after a newer one.
//! Holding a [`SubjectGuard`] across that sequence makes publications for one
//! subject happen in the order their re-fetches did. Different subjects never
//! block each other.
//!
//! # Example
//!
//! ```rust
//! use grade_runtime::sequencer::SubjectSequencer;
//!
//! # async fn example() {
//! let sequencer = SubjectSequencer::new();
//! {
//!     let _guard = sequencer.lock("acc-1").await;
//!     // re-fetch, aggregate and publish while holding the guard
//! }
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type SubjectLocks = HashMap<String, Weak<AsyncMutex<()>>>;

/// Hands out one async lock per subject id.
///
/// Locks live only as long as someone holds or awaits them. Dead entries are
/// pruned whenever a new lock is created.
#[derive(Debug, Clone, Default)]
pub struct SubjectSequencer {
    locks: Arc<Mutex<SubjectLocks>>,
}

/// Exclusive access to one subject. Released on drop.
#[derive(Debug)]
pub struct SubjectGuard {
    _guard: OwnedMutexGuard<()>,
}

impl SubjectSequencer {
    /// Create an empty sequencer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `subject_id`.
    pub async fn lock(&self, subject_id: &str) -> SubjectGuard {
        let lock = self.lock_for(subject_id);
        SubjectGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of subjects with a live lock.
    #[must_use]
    pub fn active_subjects(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|lock| lock.strong_count() > 0).count()
    }

    fn lock_for(&self, subject_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = locks.get(subject_id).and_then(Weak::upgrade) {
            return existing;
        }

        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(subject_id.to_string(), Arc::downgrade(&lock));
        lock
    }
}

//! Shared change-detection state.

use crate::sampler::Snapshot;
use parking_lot::Mutex;

/// Result of comparing a clipboard sample against the last known content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A remote clip is being applied; the sample was not taken.
    Suppressed,
    /// The clipboard still holds the last known content (or is still empty).
    Unchanged,
    /// The clipboard was emptied. Clears are never propagated.
    Cleared,
    /// The clipboard holds new content; it is already recorded as last known.
    Changed(Snapshot),
}

#[derive(Debug, Default)]
struct Inner {
    last_known: Option<Snapshot>,
    suppressed: bool,
}

/// `last_known` and `suppressed`, guarded by a single lock.
///
/// The poll unit and the push-listener unit both go through this type, so
/// every check-then-update sequence is atomic with respect to the other unit.
#[derive(Debug, Default)]
pub struct AgentState {
    inner: Mutex<Inner>,
}

impl AgentState {
    /// Creates state with the given baseline content.
    pub fn new(baseline: Option<Snapshot>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                last_known: baseline,
                suppressed: false,
            }),
        }
    }

    /// Samples and compares in one critical section.
    ///
    /// `sample` is not called while suppressed. On a change the new content
    /// becomes `last_known` before this returns.
    pub fn detect_change<F>(&self, sample: F) -> Change
    where
        F: FnOnce() -> Option<Snapshot>,
    {
        let mut inner = self.inner.lock();
        if inner.suppressed {
            return Change::Suppressed;
        }

        match (sample(), &inner.last_known) {
            (None, None) => Change::Unchanged,
            (None, Some(_)) => Change::Cleared,
            (Some(current), Some(known)) if current == *known => Change::Unchanged,
            (Some(current), _) => {
                inner.last_known = Some(current.clone());
                Change::Changed(current)
            }
        }
    }

    /// Suppresses the poll unit while a remote clip is applied.
    pub fn suppress(&self) {
        self.inner.lock().suppressed = true;
    }

    /// Records content written by the push listener.
    pub fn record_applied(&self, snapshot: Snapshot) {
        self.inner.lock().last_known = Some(snapshot);
    }

    /// Lets the poll unit sample again.
    pub fn release(&self) {
        self.inner.lock().suppressed = false;
    }

    /// Returns true while suppressed.
    pub fn is_suppressed(&self) -> bool {
        self.inner.lock().suppressed
    }

    /// Returns the last known content.
    pub fn last_known(&self) -> Option<Snapshot> {
        self.inner.lock().last_known.clone()
    }
}

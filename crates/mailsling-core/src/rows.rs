//! Row bookkeeping for the triage list.
//!
//! Two independent facts are tracked here: what the rows *are* (a shared
//! list the screen replaces wholesale when the backend refreshes) and
//! which row is *active* (an index owned by list viewability, with one
//! correction channel for the dispatcher's fast-forward after a fired
//! action). Keeping them separate is what lets an activation resolve its
//! row at one instant and never chase layout afterwards.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::model::{EmailId, EmailRow};

/// Shared handle to the list of candidate rows.
///
/// Clones refer to the same list. The only write path is [`Self::replace`];
/// rows are immutable once published, so readers clone values out rather
/// than holding the lock.
#[derive(Debug, Clone, Default)]
pub struct RowListHandle {
    inner: Arc<RwLock<Vec<EmailRow>>>,
}

impl RowListHandle {
    /// Creates a handle over an initial list.
    #[must_use]
    pub fn new(rows: Vec<EmailRow>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(rows)),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<EmailRow>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the whole list, e.g. after a refresh or category switch.
    pub fn replace(&self, rows: Vec<EmailRow>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        debug!(old = guard.len(), new = rows.len(), "Row list replaced");
        *guard = rows;
    }

    /// Row at `index`, if the list is that long.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<EmailRow> {
        self.read().get(index).cloned()
    }

    /// Position of an email in the current list.
    #[must_use]
    pub fn index_of(&self, id: &EmailId) -> Option<usize> {
        self.read().iter().position(|row| &row.id == id)
    }

    /// Rows grouped under `category`, in list order.
    #[must_use]
    pub fn in_category(&self, category: &str) -> Vec<EmailRow> {
        self.read()
            .iter()
            .filter(|row| row.category == category)
            .cloned()
            .collect()
    }

    /// Current list length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current list.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EmailRow> {
        self.read().clone()
    }
}

#[derive(Debug, Default)]
struct RowIndexState {
    active: AtomicUsize,
    /// Set by [`RowIndexTracker::advance`]; cleared when the next
    /// viewability report arrives.
    awaiting_viewability: AtomicBool,
    /// Index the last advance moved away from. A viewability report for
    /// exactly this index while awaiting is the list echoing our own
    /// fast-forward and is dropped.
    advance_origin: AtomicUsize,
}

/// Tracker for which row the next activation applies to.
///
/// List viewability owns this value: every scroll report lands here. The
/// dispatcher's [`Self::advance`] after a fired action is the one
/// exception, and it wins any tie with the stale report the list emits
/// for the pre-advance layout.
///
/// Both writers live on the decision thread; the atomics exist so clones
/// of the handle can be read from anywhere, not for write contention.
#[derive(Debug, Clone, Default)]
pub struct RowIndexTracker {
    inner: Arc<RowIndexState>,
}

impl RowIndexTracker {
    /// Creates a tracker starting at row 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the row the next activation applies to.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.inner.active.load(Ordering::Relaxed)
    }

    /// Fast-forwards past the row just triaged. Returns the new index,
    /// which may point past the end of the list; dispatch treats that as
    /// "nothing left to act on".
    pub fn advance(&self) -> usize {
        let old = self.inner.active.load(Ordering::Relaxed);
        let new = old + 1;
        self.inner.advance_origin.store(old, Ordering::Relaxed);
        self.inner.active.store(new, Ordering::Relaxed);
        self.inner
            .awaiting_viewability
            .store(true, Ordering::Relaxed);
        debug!(from = old, to = new, "Active row advanced");
        new
    }

    /// Feeds a viewability report from the list.
    ///
    /// Returns `false` when the report was recognized as the stale echo of
    /// our own advance and dropped. Exactly one echo is absorbed per
    /// advance; after that, every report is authoritative again, so a user
    /// who genuinely scrolls back to the pre-advance row is honored.
    pub fn record_viewability(&self, index: usize) -> bool {
        if self.inner.awaiting_viewability.load(Ordering::Relaxed)
            && index == self.inner.advance_origin.load(Ordering::Relaxed)
        {
            self.inner
                .awaiting_viewability
                .store(false, Ordering::Relaxed);
            debug!(index, "Stale viewability echo dropped");
            return false;
        }
        self.inner
            .awaiting_viewability
            .store(false, Ordering::Relaxed);
        self.inner.active.store(index, Ordering::Relaxed);
        true
    }
}

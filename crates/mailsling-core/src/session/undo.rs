//! Undo bookkeeping.
//!
//! An undo entry stores the state an email was in *before* an advancing
//! action touched it, so reversing is a restore, not a guess. Entries
//! expire from the UI's point of view (the affordance is transient) but
//! the stack itself never drops them; [`UndoEntry::is_within`] is how the
//! presentation layer asks whether an entry is still fresh enough to
//! offer.

use chrono::{DateTime, Duration, Utc};

use crate::model::{ActionKind, EmailId};

/// Pre-action state of one email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoRecord {
    /// Email the action applied to.
    pub email_id: EmailId,
    /// Whether the email was punted before the action.
    pub was_punted: bool,
    /// Triage state before the action. `None` for the common case of a
    /// previously untouched email.
    pub previous_kind: Option<ActionKind>,
}

/// One undoable step: a single advancing action or a whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    /// Pre-action state of every email the step touched.
    pub records: Vec<UndoRecord>,
    /// When the step was taken.
    pub pushed_at: DateTime<Utc>,
}

impl UndoEntry {
    /// Entry for a single advancing action.
    #[must_use]
    pub fn single(record: UndoRecord) -> Self {
        Self {
            records: vec![record],
            pushed_at: Utc::now(),
        }
    }

    /// Entry for a batch step.
    #[must_use]
    pub fn batch(records: Vec<UndoRecord>) -> Self {
        Self {
            records,
            pushed_at: Utc::now(),
        }
    }

    /// How long ago the step was taken.
    #[must_use]
    pub fn age(&self) -> Duration {
        Utc::now() - self.pushed_at
    }

    /// Whether the step is recent enough for a transient undo affordance.
    #[must_use]
    pub fn is_within(&self, window: Duration) -> bool {
        self.age() <= window
    }

    /// Whether this entry covers the given email alone.
    #[must_use]
    pub fn is_single_for(&self, id: &EmailId) -> bool {
        matches!(self.records.as_slice(), [record] if &record.email_id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_is_within_a_generous_window() {
        let entry = UndoEntry::single(UndoRecord {
            email_id: EmailId::new("a"),
            was_punted: false,
            previous_kind: None,
        });
        assert!(entry.is_within(Duration::seconds(5)));
        assert!(!entry.is_within(Duration::seconds(-1)));
    }

    #[test]
    fn test_single_entry_identity() {
        let entry = UndoEntry::single(UndoRecord {
            email_id: EmailId::new("a"),
            was_punted: true,
            previous_kind: None,
        });
        assert!(entry.is_single_for(&EmailId::new("a")));
        assert!(!entry.is_single_for(&EmailId::new("b")));

        let batch = UndoEntry::batch(vec![
            UndoRecord {
                email_id: EmailId::new("a"),
                was_punted: false,
                previous_kind: None,
            },
            UndoRecord {
                email_id: EmailId::new("b"),
                was_punted: false,
                previous_kind: None,
            },
        ]);
        assert!(!batch.is_single_for(&EmailId::new("a")));
    }
}

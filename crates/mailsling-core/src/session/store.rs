//! Ephemeral triage session state.
//!
//! One store per triage screen. It owns the four collections that define
//! a session (punted, in-flight, triaged, undo) behind a single mutex,
//! and every mutation of them goes through the operations here; the
//! dispatcher and the UI never reach in directly. The mutex is never held
//! across an await: operations capture what they need, release, call the
//! backend, and re-acquire to resolve.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::model::{ActionKind, EmailId, TriageAction, TriageDisposition};
use crate::rows::RowListHandle;
use crate::service::{BatchItem, TriageBackend};
use crate::session::undo::{UndoEntry, UndoRecord};

#[derive(Debug, Default)]
struct SessionState {
    /// Emails flagged to resolve as reply-needed in the next batch.
    punted: HashSet<EmailId>,
    /// Emails with an unresolved optimistic mutation.
    in_flight: HashSet<EmailId>,
    /// Emails triaged this session, by action.
    triaged: HashMap<EmailId, ActionKind>,
    /// Reversal stack, most recent last.
    undo: Vec<UndoEntry>,
}

/// Read-only copy of the session collections, for rendering and tests.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Emails currently punted.
    pub punted: HashSet<EmailId>,
    /// Emails with an unresolved mutation.
    pub in_flight: HashSet<EmailId>,
    /// Emails triaged this session.
    pub triaged: HashMap<EmailId, ActionKind>,
    /// Depth of the undo stack.
    pub undo_depth: usize,
}

/// Result of a category-wide batch triage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Emails whose dispositions landed.
    pub succeeded: Vec<EmailId>,
    /// Emails the backend reported failures for; their optimistic state
    /// was rolled back.
    pub failed: Vec<EmailId>,
}

/// What the UI needs to offer a transient undo affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoPreview {
    /// When the most recent undoable step was taken.
    pub pushed_at: DateTime<Utc>,
    /// How many emails that step touched.
    pub actions: usize,
}

/// Session-scoped triage state and the operations that mutate it.
///
/// All operations take `&self`; the store is shared via [`Arc`] between
/// the dispatcher and the UI layer. Concurrent in-flight mutations for
/// *different* emails are expected; per email, [`Self::begin`] enforces
/// at most one outstanding mutation.
pub struct TriageSessionStore {
    state: Mutex<SessionState>,
    backend: Arc<dyn TriageBackend>,
    rows: RowListHandle,
}

impl std::fmt::Debug for TriageSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageSessionStore").finish_non_exhaustive()
    }
}

impl TriageSessionStore {
    /// Creates an empty session over the given rows and backend.
    #[must_use]
    pub fn new(backend: Arc<dyn TriageBackend>, rows: RowListHandle) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            backend,
            rows,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flips the punt flag for an email and returns the new value.
    ///
    /// Punting is local bookkeeping only; nothing is sent anywhere until
    /// the category is resolved by [`Self::mark_category_done`].
    pub fn toggle_punt(&self, id: &EmailId) -> bool {
        let mut state = self.state();
        let punted = if state.punted.remove(id) {
            false
        } else {
            state.punted.insert(id.clone());
            true
        };
        debug!(email = %id, punted, "Punt toggled");
        punted
    }

    /// Whether an email is currently punted.
    #[must_use]
    pub fn is_punted(&self, id: &EmailId) -> bool {
        self.state().punted.contains(id)
    }

    /// Whether an email has an unresolved mutation.
    #[must_use]
    pub fn is_in_flight(&self, id: &EmailId) -> bool {
        self.state().in_flight.contains(id)
    }

    /// Action an email was triaged with this session, if any.
    #[must_use]
    pub fn triaged_kind(&self, id: &EmailId) -> Option<ActionKind> {
        self.state().triaged.get(id).copied()
    }

    /// Copy of the current session collections.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            punted: state.punted.clone(),
            in_flight: state.in_flight.clone(),
            triaged: state.triaged.clone(),
            undo_depth: state.undo.len(),
        }
    }

    /// The most recent undoable step, if any.
    #[must_use]
    pub fn undo_preview(&self) -> Option<UndoPreview> {
        self.state().undo.last().map(|entry| UndoPreview {
            pushed_at: entry.pushed_at,
            actions: entry.records.len(),
        })
    }

    /// Claims an email for an advancing action and applies the optimistic
    /// update.
    ///
    /// Returns `false` without changing anything when the email already
    /// has an unresolved or recorded action; duplicate activations are
    /// absorbed here, not escalated.
    pub fn begin(&self, action: &TriageAction) -> bool {
        let mut state = self.state();
        if state.in_flight.contains(&action.email_id)
            || state.triaged.contains_key(&action.email_id)
        {
            debug!(
                email = %action.email_id,
                kind = %action.kind,
                "Duplicate activation absorbed"
            );
            return false;
        }

        let record = UndoRecord {
            email_id: action.email_id.clone(),
            was_punted: state.punted.contains(&action.email_id),
            previous_kind: None,
        };
        state.in_flight.insert(action.email_id.clone());
        state.triaged.insert(action.email_id.clone(), action.kind);
        state.undo.push(UndoEntry::single(record));
        debug!(email = %action.email_id, kind = %action.kind, "Optimistic update applied");
        true
    }

    /// Marks an in-flight mutation as landed.
    pub fn resolve_success(&self, id: &EmailId) {
        let mut state = self.state();
        state.in_flight.remove(id);
        state.punted.remove(id);
        debug!(email = %id, "Mutation landed");
    }

    /// Rolls back an in-flight mutation that failed.
    ///
    /// The email leaves both `in_flight` and `triaged`, its punt flag is
    /// untouched, and the undo entry pushed for it disappears; afterwards
    /// the row is indistinguishable from one never acted on.
    pub fn resolve_failure(&self, id: &EmailId) {
        let mut state = self.state();
        state.in_flight.remove(id);
        state.triaged.remove(id);
        if let Some(pos) = state.undo.iter().rposition(|entry| entry.is_single_for(id)) {
            state.undo.remove(pos);
        }
        warn!(email = %id, "Optimistic update rolled back");
    }

    /// Triages a single email as done, from a list affordance rather than
    /// a drag.
    ///
    /// Rows no longer in the list and emails already claimed are quiet
    /// no-ops, mirroring how dispatched activations behave.
    ///
    /// # Errors
    ///
    /// Returns the backend failure after rolling back the optimistic
    /// update.
    pub async fn mark_done(&self, id: &EmailId) -> Result<(), Error> {
        let Some(origin_index) = self.rows.index_of(id) else {
            debug!(email = %id, "mark_done for a row not in the list; ignoring");
            return Ok(());
        };
        let action = TriageAction {
            email_id: id.clone(),
            kind: ActionKind::Done,
            origin_index,
        };
        if !self.begin(&action) {
            return Ok(());
        }

        match self.backend.triage(id, TriageDisposition::Done).await {
            Ok(()) => {
                self.resolve_success(id);
                Ok(())
            }
            Err(e) => {
                self.resolve_failure(id);
                Err(e.into())
            }
        }
    }

    /// Resolves every untouched email in a category with one batched
    /// mutation: punted emails become reply-needed, the rest become done.
    ///
    /// Per-item failures are rolled back individually and reported; the
    /// items that landed stay triaged, have their punt flags cleared, and
    /// form a single undo entry.
    ///
    /// # Errors
    ///
    /// Returns the backend failure when the batch as a whole never
    /// landed; every optimistic update is rolled back first.
    pub async fn mark_category_done(&self, category: &str) -> Result<BatchReport, Error> {
        let candidates = self.rows.in_category(category);

        let (items, records) = {
            let mut state = self.state();
            let mut items = Vec::new();
            let mut records = Vec::new();
            for row in &candidates {
                if state.in_flight.contains(&row.id) || state.triaged.contains_key(&row.id) {
                    continue;
                }
                let punted = state.punted.contains(&row.id);
                let (disposition, kind) = if punted {
                    (TriageDisposition::ReplyNeeded, ActionKind::ReplyNeeded)
                } else {
                    (TriageDisposition::Done, ActionKind::Done)
                };
                items.push(BatchItem {
                    email_id: row.id.clone(),
                    action: disposition,
                });
                records.push(UndoRecord {
                    email_id: row.id.clone(),
                    was_punted: punted,
                    previous_kind: None,
                });
                state.in_flight.insert(row.id.clone());
                state.triaged.insert(row.id.clone(), kind);
            }
            (items, records)
        };

        if items.is_empty() {
            debug!(category, "No untouched rows to batch-triage");
            return Ok(BatchReport::default());
        }

        match self.backend.batch_triage(&items).await {
            Ok(outcome) => {
                let failed: HashSet<EmailId> = outcome.errors.iter().cloned().collect();
                let mut report = BatchReport::default();
                let mut kept = Vec::new();

                let mut state = self.state();
                for (item, record) in items.iter().zip(records) {
                    state.in_flight.remove(&item.email_id);
                    if failed.contains(&item.email_id) {
                        state.triaged.remove(&item.email_id);
                        report.failed.push(item.email_id.clone());
                    } else {
                        state.punted.remove(&item.email_id);
                        report.succeeded.push(item.email_id.clone());
                        kept.push(record);
                    }
                }
                if !kept.is_empty() {
                    state.undo.push(UndoEntry::batch(kept));
                }
                drop(state);

                if outcome.triaged_count != report.succeeded.len() {
                    warn!(
                        reported = outcome.triaged_count,
                        resolved = report.succeeded.len(),
                        "Batch count disagrees with per-item errors"
                    );
                }
                info!(
                    category,
                    succeeded = report.succeeded.len(),
                    failed = report.failed.len(),
                    "Category batch resolved"
                );
                Ok(report)
            }
            Err(e) => {
                let mut state = self.state();
                for item in &items {
                    state.in_flight.remove(&item.email_id);
                    state.triaged.remove(&item.email_id);
                }
                drop(state);
                warn!(category, "Batch triage failed, rolled back: {e}");
                Err(e.into())
            }
        }
    }

    /// Reverses one recorded triage.
    ///
    /// Pessimistic: the reversal is sent first and local state changes
    /// only once it lands, so the row never flickers back prematurely.
    /// An email with an unresolved mutation is absorbed as a no-op.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the email stays triaged locally.
    pub async fn untriage(&self, id: &EmailId) -> Result<(), Error> {
        {
            let state = self.state();
            if state.in_flight.contains(id) {
                debug!(email = %id, "Untriage while mutation in flight; ignoring");
                return Ok(());
            }
            if !state.triaged.contains_key(id) {
                debug!(email = %id, "Untriage for an untriaged email; ignoring");
                return Ok(());
            }
        }

        self.backend.untriage(id).await?;
        self.state().triaged.remove(id);
        debug!(email = %id, "Triage reversed");
        Ok(())
    }

    /// Reverses recorded triages for several emails in one request.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; local state is unchanged.
    pub async fn batch_untriage(&self, ids: &[EmailId]) -> Result<(), Error> {
        let targets: Vec<EmailId> = {
            let state = self.state();
            ids.iter()
                .filter(|id| state.triaged.contains_key(*id) && !state.in_flight.contains(*id))
                .cloned()
                .collect()
        };
        if targets.is_empty() {
            return Ok(());
        }

        self.backend.batch_untriage(&targets).await?;
        let mut state = self.state();
        for id in &targets {
            state.triaged.remove(id);
        }
        debug!(count = targets.len(), "Batch triage reversed");
        Ok(())
    }

    /// Pops the most recent undoable step and restores the state it
    /// recorded: reversal mutations are sent, then triage and punt flags
    /// snap back to their pre-action values.
    ///
    /// Returns the ids that were restored, or `None` when the stack is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the entry goes back on the stack so
    /// the user can retry.
    pub async fn undo(&self) -> Result<Option<Vec<EmailId>>, Error> {
        let Some(entry) = self.state().undo.pop() else {
            return Ok(None);
        };

        let to_reverse: Vec<EmailId> = {
            let state = self.state();
            entry
                .records
                .iter()
                .map(|r| r.email_id.clone())
                .filter(|id| state.triaged.contains_key(id))
                .collect()
        };

        let sent = match to_reverse.as_slice() {
            [] => Ok(()),
            [single] => self.backend.untriage(single).await,
            many => self.backend.batch_untriage(many).await,
        };
        if let Err(e) = sent {
            warn!("Undo failed, keeping the entry: {e}");
            self.state().undo.push(entry);
            return Err(e.into());
        }

        let restored: Vec<EmailId> = entry.records.iter().map(|r| r.email_id.clone()).collect();
        let mut state = self.state();
        for record in entry.records {
            match record.previous_kind {
                Some(kind) => {
                    state.triaged.insert(record.email_id.clone(), kind);
                }
                None => {
                    state.triaged.remove(&record.email_id);
                }
            }
            if record.was_punted {
                state.punted.insert(record.email_id);
            } else {
                state.punted.remove(&record.email_id);
            }
        }
        drop(state);

        info!(count = restored.len(), "Undo applied");
        Ok(Some(restored))
    }

    /// Drops all session state, e.g. when the screen is left.
    pub fn reset(&self) {
        let mut state = self.state();
        state.punted.clear();
        state.in_flight.clear();
        state.triaged.clear();
        state.undo.clear();
        debug!("Session state reset");
    }
}

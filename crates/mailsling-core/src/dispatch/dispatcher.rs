//! Turning activations into mutations.
//!
//! The dispatcher is the only place where a gesture event meets email
//! semantics. It resolves the fired row at one instant, claims it through
//! the session store, applies the optimistic UI moves (advance, origin
//! snap, haptic), and then settles the backend mutation. Failures on the
//! primary path roll back; failures on side channels degrade to notices.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use mailsling_gesture::{ActivationEvent, DragOrigin, GestureTracker};

use crate::dispatch::notice::{NoticeStream, TriageNotice, notice_channel};
use crate::error::Error;
use crate::model::{ActionKind, EmailId, TriageAction};
use crate::rows::{RowIndexTracker, RowListHandle};
use crate::service::{CalendarEventFields, Collaborators, FeedbackKind, UnsubscribeOutcome};
use crate::session::TriageSessionStore;

/// How one activation was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The fired row index points past the current list; nothing to do.
    OutOfRange,
    /// The email already has an unresolved or recorded action; the
    /// duplicate was absorbed.
    AlreadyPending,
    /// The mic target started a recording; the list did not advance.
    MicStarted,
    /// The mutation landed.
    Triaged,
    /// The mutation failed and the optimistic update was rolled back.
    RolledBack,
    /// The mutation failed because the session is no longer
    /// authenticated; rolled back, and the auth boundary was notified.
    AuthRequired,
}

/// Executes triage actions against the session store and collaborators.
#[derive(Debug)]
pub struct ActionDispatcher {
    rows: RowListHandle,
    row_index: RowIndexTracker,
    session: Arc<TriageSessionStore>,
    collaborators: Collaborators,
    tracker: GestureTracker,
    origin: DragOrigin,
    notices: mpsc::UnboundedSender<TriageNotice>,
}

impl ActionDispatcher {
    /// Wires a dispatcher to its surroundings and returns the stream its
    /// notices arrive on.
    #[must_use]
    pub fn new(
        rows: RowListHandle,
        row_index: RowIndexTracker,
        session: Arc<TriageSessionStore>,
        collaborators: Collaborators,
        tracker: GestureTracker,
        origin: DragOrigin,
    ) -> (Self, NoticeStream) {
        let (notices, stream) = notice_channel();
        (
            Self {
                rows,
                row_index,
                session,
                collaborators,
                tracker,
                origin,
                notices,
            },
            stream,
        )
    }

    /// Settles one activation, start to finish.
    ///
    /// The row is resolved from the event's stamped index once; if the
    /// list has shrunk past it, the activation is a quiet no-op. Advancing
    /// actions claim the email, move the list forward, snap the ball home
    /// by re-basing the drag origin, and then await the mutation. The mic
    /// target only starts a recording.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Voice`] when the mic target could not start
    /// recording. Backend failures never surface as errors here; they
    /// roll back and report through the notice stream.
    pub async fn on_activation(&self, event: &ActivationEvent) -> Result<DispatchOutcome, Error> {
        let Some(row) = self.rows.get(event.row) else {
            debug!(row = event.row, "Activation past the end of the list; ignoring");
            return Ok(DispatchOutcome::OutOfRange);
        };

        let kind = ActionKind::from(event.kind);
        let Some(disposition) = kind.disposition() else {
            // Mic: non-advancing, session untouched, cancellable later.
            self.collaborators.feedback.feedback(FeedbackKind::Medium);
            self.collaborators.voice.start_recording().await?;
            info!(email = %row.id, "Recording started");
            return Ok(DispatchOutcome::MicStarted);
        };

        let action = TriageAction {
            email_id: row.id.clone(),
            kind,
            origin_index: event.row,
        };
        if !self.session.begin(&action) {
            return Ok(DispatchOutcome::AlreadyPending);
        }

        // Optimistic moves, before the network is involved: the list
        // advances, the ball snaps home, the user feels the claim.
        self.row_index.advance();
        self.origin.capture(self.tracker.current_x());
        self.collaborators.feedback.feedback(FeedbackKind::Light);

        if kind == ActionKind::Unsubscribe {
            self.spawn_unsubscribe(row.id.clone());
        }

        match self.collaborators.backend.triage(&row.id, disposition).await {
            Ok(()) => {
                self.session.resolve_success(&row.id);
                self.collaborators.feedback.feedback(FeedbackKind::Success);
                info!(email = %row.id, %kind, "Triage landed");
                Ok(DispatchOutcome::Triaged)
            }
            Err(e) if e.is_auth() => {
                self.session.resolve_failure(&row.id);
                self.send(TriageNotice::MutationFailed {
                    email_id: row.id.clone(),
                    message: e.to_string(),
                });
                self.send(TriageNotice::AuthRequired);
                warn!(email = %row.id, "Triage hit an unauthenticated session");
                Ok(DispatchOutcome::AuthRequired)
            }
            Err(e) => {
                self.session.resolve_failure(&row.id);
                self.send(TriageNotice::MutationFailed {
                    email_id: row.id.clone(),
                    message: e.to_string(),
                });
                warn!(email = %row.id, "Triage failed and was rolled back: {e}");
                Ok(DispatchOutcome::RolledBack)
            }
        }
    }

    /// Creates a calendar event from an email, off the critical path.
    /// The outcome, good or bad, arrives as a notice.
    pub fn add_to_calendar(&self, email_id: EmailId, fields: CalendarEventFields) {
        let backend = Arc::clone(&self.collaborators.backend);
        let notices = self.notices.clone();
        tokio::spawn(async move {
            match backend.add_calendar_event(&email_id, &fields).await {
                Ok(link) => {
                    debug!(email = %email_id, "Calendar event created");
                    let _ = notices.send(TriageNotice::CalendarEventAdded {
                        email_id,
                        url: link.url,
                    });
                }
                Err(e) => {
                    warn!(email = %email_id, "Calendar side channel failed: {e}");
                    let _ = notices.send(TriageNotice::SideChannelFailed {
                        email_id,
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    /// Discards the recording in progress, if any. Infallible by
    /// contract; backing out always works.
    pub fn cancel_mic(&self) {
        self.collaborators.voice.cancel_recording();
        debug!("Recording cancelled");
    }

    /// Stops the recording in progress and returns the final transcript.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Voice`] when nothing was being recorded.
    pub async fn finish_mic(&self) -> Result<String, Error> {
        let transcript = self.collaborators.voice.stop_recording().await?;
        info!(chars = transcript.len(), "Recording finished");
        Ok(transcript)
    }

    /// Live transcript updates for the recording flow.
    #[must_use]
    pub fn transcript(&self) -> watch::Receiver<String> {
        self.collaborators.voice.transcript()
    }

    pub(crate) fn notify_mic_unavailable(&self, message: String) {
        self.send(TriageNotice::MicUnavailable { message });
    }

    fn send(&self, notice: TriageNotice) {
        if self.notices.send(notice).is_err() {
            debug!("Notice dropped; no listener");
        }
    }

    fn spawn_unsubscribe(&self, email_id: EmailId) {
        let backend = Arc::clone(&self.collaborators.backend);
        let notices = self.notices.clone();
        tokio::spawn(async move {
            match backend.unsubscribe(&email_id).await {
                Ok(UnsubscribeOutcome::Completed) => {
                    debug!(email = %email_id, "Unsubscribed");
                }
                Ok(UnsubscribeOutcome::ManualRequired) => {
                    let _ = notices.send(TriageNotice::UnsubscribeManualRequired { email_id });
                }
                Err(e) => {
                    warn!(email = %email_id, "Unsubscribe side channel failed: {e}");
                    let _ = notices.send(TriageNotice::SideChannelFailed {
                        email_id,
                        message: e.to_string(),
                    });
                }
            }
        });
    }
}

//! Backend mutation contract.
//!
//! Everything the triage flow asks of the server goes through
//! [`TriageBackend`]. Keeping it a trait object is what lets the whole
//! engine run against scripted fakes in tests and the replay tool;
//! `mailsling-api` provides the production implementation over HTTP.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{EmailId, TriageDisposition};

/// Errors a backend mutation can come back with.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The session is no longer authenticated. Surfaced to the app's
    /// authentication boundary rather than retried.
    #[error("Authentication required: {0}")]
    Auth(String),

    /// The backend understood and refused the mutation.
    #[error("Mutation rejected: {0}")]
    Rejected(String),

    /// The request never completed.
    #[error("Network failure: {0}")]
    Network(String),

    /// The response arrived but could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether this failure means the session needs to re-authenticate.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// One email inside a batched triage mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Email to triage.
    pub email_id: EmailId,
    /// Disposition to record for it.
    pub action: TriageDisposition,
}

/// What the backend reports for a batched triage mutation.
///
/// A batch is not transactional: some items can land while others fail,
/// and the failures come back listed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Number of items the backend recorded.
    pub triaged_count: usize,
    /// Ids the backend could not triage.
    pub errors: Vec<EmailId>,
}

/// How an unsubscribe request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    /// The backend completed the unsubscribe on the user's behalf.
    Completed,
    /// The sender offers no automatic path; the user has to finish in a
    /// browser.
    ManualRequired,
}

/// Fields for a calendar event extracted from an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventFields {
    /// Event title.
    pub title: String,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// End time, when the email specified one.
    pub ends_at: Option<DateTime<Utc>>,
    /// Venue or dial-in, when the email specified one.
    pub location: Option<String>,
}

/// Link to an event created in the user's calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventLink {
    /// URL opening the event in the user's calendar.
    pub url: String,
}

/// Server-side mutations behind the triage flow.
///
/// Implementations must be safe to call concurrently; the dispatcher
/// allows one outstanding mutation per email but several emails can be in
/// flight at once.
#[async_trait]
pub trait TriageBackend: Send + Sync {
    /// Records a disposition for one email.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the mutation did not land; the
    /// caller rolls back its optimistic state.
    async fn triage(
        &self,
        email_id: &EmailId,
        action: TriageDisposition,
    ) -> Result<(), BackendError>;

    /// Records dispositions for a batch of emails in one request.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] only when the request as a whole failed;
    /// per-item failures come back inside the [`BatchOutcome`].
    async fn batch_triage(&self, items: &[BatchItem]) -> Result<BatchOutcome, BackendError>;

    /// Reverses a previously recorded disposition.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the reversal did not land; the
    /// email stays triaged locally.
    async fn untriage(&self, email_id: &EmailId) -> Result<(), BackendError>;

    /// Reverses dispositions for a batch of emails in one request.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the reversal did not land.
    async fn batch_untriage(&self, email_ids: &[EmailId]) -> Result<(), BackendError>;

    /// Unsubscribes the user from the sender of `email_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the request failed outright;
    /// "the user has to finish manually" is a success variant, not an
    /// error.
    async fn unsubscribe(&self, email_id: &EmailId) -> Result<UnsubscribeOutcome, BackendError>;

    /// Creates a calendar event from an email.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the event was not created.
    async fn add_calendar_event(
        &self,
        email_id: &EmailId,
        event: &CalendarEventFields,
    ) -> Result<CalendarEventLink, BackendError>;
}

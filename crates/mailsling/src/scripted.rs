//! Scripted collaborators for dry runs.
//!
//! The replay tool's default backend records every call and answers
//! success, except for ids listed with `--fail`, which are rejected to
//! exercise the rollback path. The voice collaborator pretends to record
//! and returns a canned transcript.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use mailsling_core::{
    BackendError, BatchItem, BatchOutcome, CalendarEventFields, CalendarEventLink, EmailId,
    TriageBackend, TriageDisposition, UnsubscribeOutcome, VoiceCollaborator, VoiceError,
};

/// Backend that records calls and fails on request.
pub struct ScriptedBackend {
    fail: HashSet<EmailId>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Creates a backend rejecting mutations for the given ids.
    pub fn new(fail: impl IntoIterator<Item = EmailId>) -> Self {
        Self {
            fail: fail.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call made so far, in order, one line each.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: String) {
        info!(%call, "Backend call");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn verdict(&self, email_id: &EmailId) -> Result<(), BackendError> {
        if self.fail.contains(email_id) {
            Err(BackendError::Rejected(format!(
                "scripted failure for {email_id}"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TriageBackend for ScriptedBackend {
    async fn triage(
        &self,
        email_id: &EmailId,
        action: TriageDisposition,
    ) -> Result<(), BackendError> {
        self.record(format!("triage {email_id} {action}"));
        self.verdict(email_id)
    }

    async fn batch_triage(&self, items: &[BatchItem]) -> Result<BatchOutcome, BackendError> {
        let summary: Vec<String> = items
            .iter()
            .map(|item| format!("{}:{}", item.email_id, item.action))
            .collect();
        self.record(format!("batch_triage {}", summary.join(",")));
        let errors: Vec<EmailId> = items
            .iter()
            .map(|item| item.email_id.clone())
            .filter(|id| self.fail.contains(id))
            .collect();
        Ok(BatchOutcome {
            triaged_count: items.len() - errors.len(),
            errors,
        })
    }

    async fn untriage(&self, email_id: &EmailId) -> Result<(), BackendError> {
        self.record(format!("untriage {email_id}"));
        self.verdict(email_id)
    }

    async fn batch_untriage(&self, email_ids: &[EmailId]) -> Result<(), BackendError> {
        let ids: Vec<String> = email_ids.iter().map(ToString::to_string).collect();
        self.record(format!("batch_untriage {}", ids.join(",")));
        Ok(())
    }

    async fn unsubscribe(&self, email_id: &EmailId) -> Result<UnsubscribeOutcome, BackendError> {
        self.record(format!("unsubscribe {email_id}"));
        self.verdict(email_id)?;
        Ok(UnsubscribeOutcome::Completed)
    }

    async fn add_calendar_event(
        &self,
        email_id: &EmailId,
        event: &CalendarEventFields,
    ) -> Result<CalendarEventLink, BackendError> {
        self.record(format!("calendar {email_id} {}", event.title));
        self.verdict(email_id)?;
        Ok(CalendarEventLink {
            url: format!("https://calendar.example/created-for/{email_id}"),
        })
    }
}

/// Voice collaborator that pretends to record.
pub struct ScriptedVoice {
    transcript: watch::Sender<String>,
}

impl ScriptedVoice {
    /// Creates an idle scripted recorder.
    pub fn new() -> Self {
        let (transcript, _) = watch::channel(String::new());
        Self { transcript }
    }
}

impl Default for ScriptedVoice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceCollaborator for ScriptedVoice {
    async fn start_recording(&self) -> Result<(), VoiceError> {
        info!("Scripted recording started");
        let _ = self.transcript.send(String::new());
        Ok(())
    }

    async fn stop_recording(&self) -> Result<String, VoiceError> {
        let transcript = "scripted transcript".to_owned();
        let _ = self.transcript.send(transcript.clone());
        Ok(transcript)
    }

    fn cancel_recording(&self) {
        info!("Scripted recording cancelled");
    }

    fn transcript(&self) -> watch::Receiver<String> {
        self.transcript.subscribe()
    }
}

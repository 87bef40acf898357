//! Collaborator contracts for the triage flow.
//!
//! The engine talks to the outside world through three ports: the backend
//! that records mutations, the voice service behind the mic target, and
//! the haptic sink. All three are trait objects so platforms and tests
//! swap them freely.

mod backend;
mod feedback;
mod voice;

use std::sync::Arc;

pub use backend::{
    BackendError, BatchItem, BatchOutcome, CalendarEventFields, CalendarEventLink, TriageBackend,
    UnsubscribeOutcome,
};
pub use feedback::{FeedbackKind, FeedbackSink, NoopFeedback};
pub use voice::{VoiceCollaborator, VoiceError};

/// The set of collaborators a dispatcher works against.
#[derive(Clone)]
pub struct Collaborators {
    /// Server-side mutations.
    pub backend: Arc<dyn TriageBackend>,
    /// Recording and transcription.
    pub voice: Arc<dyn VoiceCollaborator>,
    /// Haptic and sound cues.
    pub feedback: Arc<dyn FeedbackSink>,
}

impl Collaborators {
    /// Bundles the three collaborator ports.
    #[must_use]
    pub fn new(
        backend: Arc<dyn TriageBackend>,
        voice: Arc<dyn VoiceCollaborator>,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Self {
        Self {
            backend,
            voice,
            feedback,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

//! Voice recording collaborator.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

/// Errors from the voice collaborator.
#[derive(Debug, Clone, Error)]
pub enum VoiceError {
    /// The user has not granted microphone access.
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// Recording hardware or service is unavailable.
    #[error("Recording unavailable: {0}")]
    Unavailable(String),

    /// Stop was requested with no recording in progress.
    #[error("No recording in progress")]
    NotRecording,
}

/// Recording and live transcription, as offered by the platform.
///
/// The mic target starts a recording; the surrounding flow decides when
/// to finalize or throw it away. Cancellation is deliberately infallible:
/// a user backing out must always succeed.
#[async_trait]
pub trait VoiceCollaborator: Send + Sync {
    /// Starts capturing audio.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::PermissionDenied`] when microphone access is
    /// missing; the caller surfaces it on the mic path, never as a triage
    /// failure.
    async fn start_recording(&self) -> Result<(), VoiceError>;

    /// Stops capturing and returns the final transcript.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::NotRecording`] when nothing was being
    /// captured.
    async fn stop_recording(&self) -> Result<String, VoiceError>;

    /// Discards the recording in progress, if any.
    fn cancel_recording(&self);

    /// Live transcript updates while a recording runs.
    fn transcript(&self) -> watch::Receiver<String>;
}

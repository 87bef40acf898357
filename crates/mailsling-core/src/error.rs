//! Error types for the core library.

use thiserror::Error;

/// Errors surfaced by the triage engine and its operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A backend mutation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] crate::service::BackendError),

    /// The voice collaborator failed.
    #[error("Voice error: {0}")]
    Voice(#[from] crate::service::VoiceError),

    /// The gesture configuration is contradictory.
    #[error("Configuration error: {0}")]
    Config(#[from] mailsling_gesture::ConfigError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

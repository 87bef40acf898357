//! Error types for the API client.

use mailsling_core::BackendError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors from talking to the Mailsling backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or decoding error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status {
        /// Response status code.
        status: StatusCode,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The client configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Maps this transport-level failure onto the backend error taxonomy
    /// the dispatcher acts on.
    ///
    /// 401 and 403 mean the session must re-authenticate; any other 4xx is
    /// a refusal the user has to hear about; 5xx and transport failures
    /// are network trouble worth retrying; a response that arrived but
    /// would not parse is a decode failure.
    #[must_use]
    pub fn into_backend(self) -> BackendError {
        match self {
            Self::Http(e) if e.is_decode() => BackendError::Decode(e.to_string()),
            Self::Http(e) => BackendError::Network(e.to_string()),
            Self::Status { status, body } => match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    BackendError::Auth(format!("{status}: {body}"))
                }
                s if s.is_client_error() => BackendError::Rejected(format!("{status}: {body}")),
                _ => BackendError::Network(format!("{status}: {body}")),
            },
            Self::Config(message) => BackendError::Rejected(message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> ApiError {
        ApiError::Status {
            status,
            body: "details".to_owned(),
        }
    }

    #[test]
    fn test_auth_statuses_map_to_auth() {
        assert!(status_error(StatusCode::UNAUTHORIZED)
            .into_backend()
            .is_auth());
        assert!(status_error(StatusCode::FORBIDDEN).into_backend().is_auth());
    }

    #[test]
    fn test_client_errors_map_to_rejected() {
        assert!(matches!(
            status_error(StatusCode::CONFLICT).into_backend(),
            BackendError::Rejected(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND).into_backend(),
            BackendError::Rejected(_)
        ));
    }

    #[test]
    fn test_server_errors_map_to_network() {
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY).into_backend(),
            BackendError::Network(_)
        ));
    }
}

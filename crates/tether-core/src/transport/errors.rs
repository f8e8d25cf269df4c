use crate::errors::TetherError;

/// Failure talking to the backend.
///
/// The poll loop folds every variant into "backend unreachable"; one-shot
/// chat operations surface them to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid backend URL '{url}'")]
    InvalidUrl { url: String },

    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("Request to backend failed: {message}")]
    Request { message: String },

    #[error("Request to backend timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from backend: {message}")]
    Decode { message: String },
}

impl TetherError for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            TransportError::InvalidUrl { .. } => "TRANSPORT_INVALID_URL",
            TransportError::ClientBuild { .. } => "TRANSPORT_CLIENT_BUILD_FAILED",
            TransportError::Request { .. } => "TRANSPORT_REQUEST_FAILED",
            TransportError::Timeout { .. } => "TRANSPORT_TIMEOUT",
            TransportError::Status { .. } => "TRANSPORT_BAD_STATUS",
            TransportError::Decode { .. } => "TRANSPORT_DECODE_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            TransportError::InvalidUrl { .. } => true,
            TransportError::Status { status, .. } => *status == 401 || *status == 403,
            TransportError::ClientBuild { .. }
            | TransportError::Request { .. }
            | TransportError::Timeout { .. }
            | TransportError::Decode { .. } => false,
        }
    }
}

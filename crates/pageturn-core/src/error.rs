// ── Core error types ──
//
// User-facing errors from pageturn-core. Dispatch and probe failures are
// folded into observable state and never returned from `press`; these
// surface from one-shot calls and settings operations.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid IP address or port")]
    InvalidEndpoint { host: String, port: u16 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Cannot connect to server: {message}")]
    ConnectionRefused { message: String },

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Unexpected error: {message}")]
    Unexpected { message: String },

    #[error("Settings unavailable: {message}")]
    SettingsUnavailable { message: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },
}

impl CoreError {
    /// Failures that happened on the wire.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionRefused { .. }
                | Self::HttpStatus { .. }
                | Self::Unexpected { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pageturn_api::Error> for CoreError {
    fn from(err: pageturn_api::Error) -> Self {
        match err {
            pageturn_api::Error::InvalidEndpoint { host, port } => {
                CoreError::InvalidEndpoint { host, port }
            }
            pageturn_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            pageturn_api::Error::ConnectionRefused { message } => {
                CoreError::ConnectionRefused { message }
            }
            pageturn_api::Error::HttpStatus { status, reason } => {
                CoreError::HttpStatus { status, reason }
            }
            pageturn_api::Error::Unexpected { message } => CoreError::Unexpected { message },
            pageturn_api::Error::Client { message } => CoreError::Unexpected {
                message: format!("HTTP client unavailable: {message}"),
            },
        }
    }
}

impl From<pageturn_api::EndpointFieldError> for CoreError {
    fn from(err: pageturn_api::EndpointFieldError) -> Self {
        CoreError::Validation {
            field: err.field().into(),
            message: err.message().into(),
        }
    }
}

use thiserror::Error;

/// Top-level error type for the `pageturn-api` crate.
///
/// Covers every failure mode of a single request against the reader:
/// endpoint validation, transport, and HTTP status. `pageturn-core` folds
/// these into user-facing feedback and connection status.
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// Host is not a dotted-quad IPv4 address or port is outside 1..=65535.
    /// Raised before any network I/O is attempted.
    #[error("Invalid IP address or port")]
    InvalidEndpoint { host: String, port: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// Connect, read, or overall request deadline elapsed.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Nothing accepted the TCP connection (refused, unreachable, DNS).
    #[error("Cannot connect to server: {message}")]
    ConnectionRefused { message: String },

    /// Any other transport failure.
    #[error("Unexpected error: {message}")]
    Unexpected { message: String },

    /// The HTTP client itself could not be built.
    #[error("Failed to build HTTP client: {message}")]
    Client { message: String },

    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a status the operation does not accept.
    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },
}

impl Error {
    /// Returns `true` for failures that happened on the wire (as opposed
    /// to local validation or client construction).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionRefused { .. }
                | Self::Unexpected { .. }
                | Self::HttpStatus { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a `reqwest` failure into one of the transport variants.
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else if err.is_connect() {
            Self::ConnectionRefused {
                message: root_cause(err),
            }
        } else {
            Self::Unexpected {
                message: root_cause(err),
            }
        }
    }
}

/// Walk the `source()` chain so messages read "Connection refused (os error 111)"
/// rather than reqwest's generic "error sending request".
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

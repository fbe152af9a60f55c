//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use pageturn_config::ConfigError;
use pageturn_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the reader")]
    #[diagnostic(
        code(pageturn::connection_failed),
        help(
            "Check that KOReader's HTTP server is enabled and on the same network.\n\
             Reason: {reason}\n\
             Current endpoint: pageturn config show"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(pageturn::timeout),
        help("Raise transport.request_timeout_secs in the config, or check the reader is awake.")
    )]
    Timeout { seconds: u64 },

    #[error("Reader rejected the request: HTTP {status} {reason}")]
    #[diagnostic(code(pageturn::rejected))]
    Rejected { status: u16, reason: String },

    // ── Endpoint ─────────────────────────────────────────────────────

    #[error("Invalid IP address or port: {endpoint}")]
    #[diagnostic(
        code(pageturn::invalid_endpoint),
        help("Set a valid one with: pageturn config set-endpoint <HOST> <PORT>")
    )]
    InvalidEndpoint { endpoint: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pageturn::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Settings unavailable: {message}")]
    #[diagnostic(
        code(pageturn::settings_unavailable),
        help("Fix or remove the config file at {path}")
    )]
    SettingsUnavailable { message: String, path: String },

    #[error(transparent)]
    #[diagnostic(code(pageturn::config))]
    Config(#[from] ConfigError),

    // ── Internal ─────────────────────────────────────────────────────

    #[error("Unexpected error: {message}")]
    #[diagnostic(code(pageturn::unexpected))]
    Unexpected { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(pageturn::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::InvalidEndpoint { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::SettingsUnavailable { .. } | Self::Config(_) => exit_code::CONFIG,
            Self::Rejected { .. } | Self::Unexpected { .. } | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidEndpoint { host, port } => CliError::InvalidEndpoint {
                endpoint: format!("{host}:{port}"),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ConnectionRefused { message } => CliError::ConnectionFailed { reason: message },

            CoreError::HttpStatus { status, reason } => CliError::Rejected { status, reason },

            CoreError::Unexpected { message } => CliError::Unexpected { message },

            CoreError::SettingsUnavailable { message } => CliError::SettingsUnavailable {
                message,
                path: pageturn_config::config_path().display().to_string(),
            },

            CoreError::Validation { field, message } => CliError::Validation {
                field,
                reason: message,
            },
        }
    }
}

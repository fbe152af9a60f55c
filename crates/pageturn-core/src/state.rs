// ── Observable dispatcher state ──
//
// One aggregate, one writer (the dispatcher). Observers only ever see
// whole values cloned out of the watch channel.

use std::fmt;

use crate::input::KeyCode;

/// Reachability of the reader, as of the last settled probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Error(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Connected => f.write_str("connected"),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// A transient result message. `id` is unique per settlement, so an
/// expiry timer can tell its own message from a newer identical one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub id: u64,
    pub message: String,
}

/// Live state once settings are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchState {
    pub connection_status: ConnectionStatus,
    /// Button currently held down, for UI highlighting.
    pub pressed_button: Option<KeyCode>,
    pub last_feedback: Option<Feedback>,
    /// A command request is in flight.
    pub is_busy: bool,
}

impl DispatchState {
    pub fn feedback_message(&self) -> Option<&str> {
        self.last_feedback.as_ref().map(|f| f.message.as_str())
    }
}

/// Top-level engine state observed by presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Settings have not been read yet.
    #[default]
    Loading,
    Ready(DispatchState),
    /// The settings store failed; nothing can be dispatched.
    Unavailable { reason: String },
}

impl EngineState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn dispatch(&self) -> Option<&DispatchState> {
        match self {
            Self::Ready(state) => Some(state),
            Self::Loading | Self::Unavailable { .. } => None,
        }
    }

    pub(crate) fn dispatch_mut(&mut self) -> Option<&mut DispatchState> {
        match self {
            Self::Ready(state) => Some(state),
            Self::Loading | Self::Unavailable { .. } => None,
        }
    }
}

/// What a button press did. Errors from the request itself surface later
/// through feedback, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Settings are not loaded (or failed to load); nothing happened.
    NotReady,
    /// No command is bound to the button.
    Unmapped,
    /// Another request is still in flight; no request was made.
    Busy,
    /// Too soon after the previous dispatch; swallowed as a key repeat.
    Debounced,
    /// A request for this command was issued.
    Dispatched(crate::command::LogicalCommand),
}

impl DispatchOutcome {
    /// Whether the input event should be treated as handled by the caller.
    pub fn is_consumed(self) -> bool {
        match self {
            Self::Busy | Self::Debounced | Self::Dispatched(_) => true,
            Self::NotReady | Self::Unmapped => false,
        }
    }
}

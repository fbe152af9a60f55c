// ── Dispatcher tuning ──
//
// Timing knobs for the dispatcher. Built by the CLI (or tests) and handed
// in; core never reads config files.

use std::time::Duration;

/// Timing configuration for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Presses closer than this to the previous dispatch start are swallowed.
    pub debounce: Duration,
    /// How long a feedback message stays visible.
    pub feedback_ttl: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            feedback_ttl: Duration::from_secs(2),
        }
    }
}

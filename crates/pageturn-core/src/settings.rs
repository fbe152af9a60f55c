// ── Settings provider seam ──
//
// The dispatcher never stores the endpoint itself. It reads the provider
// at the start of every request and watches it for changes.

use tokio::sync::watch;
use tracing::debug;

use pageturn_api::Endpoint;

use crate::error::CoreError;

/// What a settings store currently knows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingsState {
    /// The store has not been read yet.
    #[default]
    Loading,
    Loaded(Endpoint),
    /// The store exists but cannot be used (malformed, permission denied).
    Unavailable(String),
}

impl SettingsState {
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Self::Loaded(endpoint) => Some(endpoint),
            Self::Loading | Self::Unavailable(_) => None,
        }
    }
}

/// Source of the reader endpoint.
pub trait SettingsProvider: Send + Sync + 'static {
    /// Point-in-time read.
    fn current(&self) -> SettingsState;

    /// Change notifications; the receiver starts at the current value.
    fn subscribe(&self) -> watch::Receiver<SettingsState>;

    /// Persist a new endpoint. Saving the current value again is a no-op
    /// success.
    fn save(&self, endpoint: &Endpoint) -> Result<(), CoreError>;
}

/// In-process provider backed by a watch channel.
pub struct MemorySettings {
    state: watch::Sender<SettingsState>,
}

impl MemorySettings {
    /// A provider that is already loaded with `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_state(SettingsState::Loaded(endpoint))
    }

    /// A provider whose first read has not completed yet.
    pub fn loading() -> Self {
        Self::with_state(SettingsState::Loading)
    }

    pub fn with_state(state: SettingsState) -> Self {
        let (state, _) = watch::channel(state);
        Self { state }
    }

    /// Publish an arbitrary state, e.g. to simulate a load failure.
    pub fn publish(&self, state: SettingsState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new(Endpoint::default())
    }
}

impl SettingsProvider for MemorySettings {
    fn current(&self) -> SettingsState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SettingsState> {
        self.state.subscribe()
    }

    fn save(&self, endpoint: &Endpoint) -> Result<(), CoreError> {
        debug!(%endpoint, "saving endpoint in memory");
        self.publish(SettingsState::Loaded(endpoint.clone()));
        Ok(())
    }
}

impl<T: SettingsProvider> SettingsProvider for std::sync::Arc<T> {
    fn current(&self) -> SettingsState {
        (**self).current()
    }

    fn subscribe(&self) -> watch::Receiver<SettingsState> {
        (**self).subscribe()
    }

    fn save(&self, endpoint: &Endpoint) -> Result<(), CoreError> {
        (**self).save(endpoint)
    }
}

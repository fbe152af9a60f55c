// ── File-backed settings provider ──
//
// Serves the endpoint from the TOML config (plus env overrides) to the
// dispatcher, and writes endpoint changes back to the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pageturn_core::{CoreError, Endpoint, SettingsProvider, SettingsState};

use crate::{ConfigError, load_config_from, read_file_config, save_config_to};

/// `SettingsProvider` over a config file.
///
/// Starts in `Loading`. A missing or unreadable file loads as defaults; a
/// file that does not parse publishes `Unavailable` with the parse error.
pub struct FileSettings {
    path: PathBuf,
    state: watch::Sender<SettingsState>,
}

impl FileSettings {
    /// A provider for `path` that has not read it yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (state, _) = watch::channel(SettingsState::Loading);
        Self {
            path: path.into(),
            state,
        }
    }

    /// Create and read synchronously.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let settings = Self::new(path);
        settings.reload();
        settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and publish the result.
    pub fn reload(&self) -> SettingsState {
        let next = match load_config_from(&self.path) {
            Ok(cfg) => {
                info!(path = %self.path.display(), endpoint = %cfg.endpoint, "settings loaded");
                SettingsState::Loaded(cfg.endpoint)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "settings unavailable");
                SettingsState::Unavailable(e.to_string())
            }
        };
        self.publish(next.clone());
        next
    }

    /// Read the file on the blocking pool; subscribers see `Loading` until
    /// it completes.
    pub fn load_in_background(self: &Arc<Self>) -> JoinHandle<()> {
        let settings = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            settings.reload();
        })
    }

    fn publish(&self, next: SettingsState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl SettingsProvider for FileSettings {
    fn current(&self) -> SettingsState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SettingsState> {
        self.state.subscribe()
    }

    fn save(&self, endpoint: &Endpoint) -> Result<(), CoreError> {
        // Compare against the file itself; the published endpoint may carry
        // env overrides that were never written.
        let write = || -> Result<bool, ConfigError> {
            let mut cfg = read_file_config(&self.path)?;
            if cfg.endpoint == *endpoint && self.path.is_file() {
                return Ok(false);
            }
            cfg.endpoint = endpoint.clone();
            save_config_to(&self.path, &cfg)?;
            Ok(true)
        };
        let written = write().map_err(|e| CoreError::SettingsUnavailable {
            message: e.to_string(),
        })?;

        if written {
            info!(%endpoint, path = %self.path.display(), "endpoint written");
        } else {
            debug!(%endpoint, "endpoint unchanged; not rewriting config");
        }
        self.publish(SettingsState::Loaded(endpoint.clone()));
        Ok(())
    }
}

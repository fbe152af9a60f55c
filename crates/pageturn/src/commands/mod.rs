//! Command handlers and the context they share.

pub mod config_cmd;
pub mod listen;
pub mod mappings;
pub mod probe;
pub mod send;

use std::path::PathBuf;

use tracing::warn;

use pageturn_config::{Config, ConfigError, config_path, load_config_from};
use pageturn_core::{
    CoreError, Dispatcher, Endpoint, InputMapper, MemorySettings, RemoteClient,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Resolved config plus the flags every handler needs.
pub struct Context {
    pub path: PathBuf,
    pub config: Config,
    pub color: bool,
}

impl Context {
    /// Load config from `--config` (or the default path). A file that does
    /// not parse is an error.
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = config_file(global);
        let config = load_config_from(&path).map_err(|e| unavailable(&path, &e))?;
        Ok(Self::new(global, path, config))
    }

    /// Like [`load`](Self::load), but falls back to defaults when the file
    /// does not parse. The settings store reports the failure separately.
    pub fn load_lenient(global: &GlobalOpts) -> Self {
        let path = config_file(global);
        let config = load_config_from(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "config unusable; using defaults");
            Config::default()
        });
        Self::new(global, path, config)
    }

    fn new(global: &GlobalOpts, path: PathBuf, config: Config) -> Self {
        Self {
            path,
            config,
            color: output::should_color(&global.color),
        }
    }

    /// The endpoint from config, or from `--host` / `--port` when given.
    /// Flag values are validated like form input; config values are not,
    /// so a bad stored endpoint surfaces when a request is attempted.
    pub fn endpoint(&self, global: &GlobalOpts) -> Result<Endpoint, CliError> {
        if !global.overrides_endpoint() {
            return Ok(self.config.endpoint.clone());
        }
        let host = global
            .host
            .clone()
            .unwrap_or_else(|| self.config.endpoint.host.clone());
        let port = global
            .port
            .clone()
            .unwrap_or_else(|| self.config.endpoint.port.to_string());
        Ok(Endpoint::parse(&host, &port).map_err(CoreError::from)?)
    }

    pub fn client(&self) -> Result<RemoteClient, CliError> {
        let client = RemoteClient::new(&self.config.to_transport_config()).map_err(CoreError::from)?;
        Ok(client)
    }

    pub fn mapper(&self) -> Result<InputMapper, CliError> {
        Ok(self.config.build_mapper()?)
    }

    /// A dispatcher over a fixed endpoint, for single requests.
    pub fn one_shot(&self, global: &GlobalOpts) -> Result<Dispatcher<RemoteClient, MemorySettings>, CliError> {
        let settings = MemorySettings::new(self.endpoint(global)?);
        Ok(Dispatcher::with_mapper(
            self.client()?,
            settings,
            self.config.to_dispatch_config(),
            self.mapper()?,
        ))
    }
}

/// `--config`, or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

fn unavailable(path: &std::path::Path, err: &ConfigError) -> CliError {
    CliError::SettingsUnavailable {
        message: err.to_string(),
        path: path.display().to_string(),
    }
}

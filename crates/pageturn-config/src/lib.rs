//! Configuration for the pageturn CLI.
//!
//! TOML file plus `PAGETURN_` environment overrides, translation to the
//! core's `DispatchConfig` / `TransportConfig` / `InputMapper`, and
//! [`FileSettings`], the file-backed `SettingsProvider`.

mod store;

pub use store::FileSettings;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use pageturn_core::{
    DispatchConfig, Endpoint, GamepadButton, InputMapper, LogicalCommand, TransportConfig,
};

/// Mapping value that unbinds a button.
pub const UNBOUND: &str = "none";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the reader's HTTP server listens.
    pub endpoint: Endpoint,

    pub dispatch: DispatchSection,

    pub transport: TransportSection,

    /// Button id (`dpad_left`, `r1`, ...) to command id, or `"none"` to
    /// unbind. Applied on top of the built-in defaults.
    pub mappings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchSection {
    pub debounce_ms: u64,
    pub feedback_ttl_ms: u64,
}

impl Default for DispatchSection {
    fn default() -> Self {
        let defaults = DispatchConfig::default();
        Self {
            debounce_ms: duration_ms(defaults.debounce),
            feedback_ttl_ms: duration_ms(defaults.feedback_ttl),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportSection {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for TransportSection {
    fn default() -> Self {
        let defaults = TransportConfig::default();
        Self {
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            read_timeout_secs: defaults.read_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            debounce: Duration::from_millis(self.dispatch.debounce_ms),
            feedback_ttl: Duration::from_millis(self.dispatch.feedback_ttl_ms),
        }
    }

    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: Duration::from_secs(self.transport.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.transport.read_timeout_secs),
            request_timeout: Duration::from_secs(self.transport.request_timeout_secs),
        }
    }

    /// Parse the `[mappings]` table into typed overrides.
    pub fn mapping_overrides(&self) -> Result<Vec<(GamepadButton, Option<LogicalCommand>)>, ConfigError> {
        self.mappings
            .iter()
            .map(|(button, command)| {
                let button = GamepadButton::from_id(button).ok_or_else(|| ConfigError::Validation {
                    field: format!("mappings.{button}"),
                    reason: format!("unknown button '{button}'"),
                })?;
                Ok((button, parse_binding(button, command)?))
            })
            .collect()
    }

    /// Apply the `[mappings]` overrides to `mapper`. Nothing is applied if
    /// any entry is invalid.
    pub fn apply_mappings(&self, mapper: &InputMapper) -> Result<(), ConfigError> {
        let overrides = self.mapping_overrides()?;
        for (button, command) in overrides {
            mapper.set_mapping(button.key_code(), command);
        }
        Ok(())
    }

    /// Default bindings with this config's overrides applied.
    pub fn build_mapper(&self) -> Result<InputMapper, ConfigError> {
        let mapper = InputMapper::new();
        self.apply_mappings(&mapper)?;
        Ok(mapper)
    }

    /// Record a binding override for `button`.
    pub fn set_mapping(&mut self, button: GamepadButton, command: Option<LogicalCommand>) {
        let value = command.map_or(UNBOUND, LogicalCommand::id);
        self.mappings.insert(button.id().to_owned(), value.to_owned());
    }
}

fn parse_binding(button: GamepadButton, value: &str) -> Result<Option<LogicalCommand>, ConfigError> {
    if value == UNBOUND {
        return Ok(None);
    }
    LogicalCommand::from_id(value)
        .map(Some)
        .ok_or_else(|| ConfigError::Validation {
            field: format!("mappings.{}", button.id()),
            reason: format!("unknown command '{value}'"),
        })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "pageturn", "pageturn").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("pageturn");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from `path` + environment.
///
/// A missing or unreadable file counts as empty, so defaults apply. A file
/// that reads but does not parse is an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = read_or_empty(path);
    let config: Config = figment(&contents).extract()?;
    Ok(config)
}

fn figment(contents: &str) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(contents))
        .merge(Env::prefixed("PAGETURN_").split("__"))
}

pub(crate) fn read_or_empty(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            String::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config file unreadable; using defaults");
            String::new()
        }
    }
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent directories.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

/// The file's own contents, without environment overrides. Used when
/// rewriting the file so env values are never persisted.
pub fn read_file_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = read_or_empty(path);
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(&contents))
        .extract()?;
    Ok(config)
}

//! Dispatch engine between gamepad input and a remote KOReader instance.
//!
//! This crate owns the command registry, button bindings, and the reactive
//! state a presentation layer (CLI listener, TUI, GUI) renders:
//!
//! - **[`Dispatcher`]**: Central facade. Follows a [`SettingsProvider`],
//!   gates button presses (busy, then debounce), issues commands through a
//!   [`Remote`], probes reachability, and publishes [`EngineState`].
//!
//! - **[`InputMapper`]**: Concurrent key-code to [`LogicalCommand`] table
//!   with push-based snapshots of the current bindings.
//!
//! - **[`StateStream`]**: Subscription handle vended by the dispatcher.
//!   Exposes `current()` / `latest()` / `changed()` for reactive rendering.
//!
//! - **Input model** ([`input`]): The fourteen recognised gamepad buttons
//!   and their platform key codes. Anything else never reaches the engine.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod mapper;
pub mod remote;
pub mod settings;
pub mod state;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::LogicalCommand;
pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use error::CoreError;
pub use input::{ButtonAction, GamepadButton, InputEvent, KeyCode};
pub use mapper::{InputMapper, MappingSnapshot, default_mappings};
pub use remote::Remote;
pub use settings::{MemorySettings, SettingsProvider, SettingsState};
pub use state::{ConnectionStatus, DispatchOutcome, DispatchState, EngineState, Feedback};
pub use stream::{StateStream, StateWatchStream};

pub use pageturn_api::{Endpoint, RemoteClient, TransportConfig};

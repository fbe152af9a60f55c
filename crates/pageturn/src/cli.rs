//! Clap derive structures for the `pageturn` CLI.
//!
//! Defines the command tree, global flags, and value parsers for commands
//! and buttons.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use pageturn_core::{GamepadButton, LogicalCommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pageturn -- turn KOReader pages from a gamepad or the keyboard
#[derive(Debug, Parser)]
#[command(
    name = "pageturn",
    version,
    about = "Remote page turner for KOReader",
    long_about = "Sends page-turn commands to a KOReader instance over its HTTP\n\
        event interface. Use `listen` to drive it live from the keyboard with\n\
        gamepad-style bindings, or `send` for a single command.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "PAGETURN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Reader IPv4 address (overrides config)
    #[arg(long, short = 'H', env = "PAGETURN_HOST", global = true)]
    pub host: Option<String>,

    /// Reader HTTP port (overrides config)
    #[arg(long, short = 'P', env = "PAGETURN_PORT", global = true)]
    pub port: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "plain", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOpts {
    /// Whether `--host` or `--port` was given.
    pub fn overrides_endpoint(&self) -> bool {
        self.host.is_some() || self.port.is_some()
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Plain,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one command to the reader
    #[command(alias = "s")]
    Send(SendArgs),

    /// Check that the reader's HTTP server is reachable
    #[command(alias = "ping")]
    Probe,

    /// Read keys from the terminal and dispatch them as gamepad buttons
    #[command(alias = "l")]
    Listen(ListenArgs),

    /// Show which command each gamepad button triggers
    #[command(alias = "map")]
    Mappings,

    /// Inspect or edit the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Command to send (`next_page`, `previous_page`, or `next` / `prev`)
    #[arg(value_parser = parse_command)]
    pub command: LogicalCommand,
}

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Log file (the terminal is in raw mode while listening)
    #[arg(long, default_value_os_t = default_log_file())]
    pub log_file: PathBuf,
}

fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("pageturn.log")
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (file + environment)
    Show,

    /// Print the config file path
    Path,

    /// Validate and save the reader endpoint
    SetEndpoint {
        /// IPv4 address, e.g. 192.168.1.100
        host: String,

        /// Port, 1-65535
        port: String,
    },

    /// Bind a button to a command, or `none` to unbind it
    Map {
        /// Button id (`dpad_left`, `a`, `r1`, `start`, ...)
        #[arg(value_parser = parse_button)]
        button: GamepadButton,

        /// Command id, or `none`
        #[arg(value_parser = parse_binding)]
        command: Binding,
    },

    /// Drop all binding overrides
    ResetMappings,
}

/// A parsed binding target: a command, or explicitly nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding(pub Option<LogicalCommand>);

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('-', "_")
}

pub fn parse_command(raw: &str) -> Result<LogicalCommand, String> {
    let id = normalize(raw);
    let id = match id.as_str() {
        "next" => "next_page",
        "prev" | "previous" => "previous_page",
        other => other,
    };
    LogicalCommand::from_id(id).ok_or_else(|| {
        let known: Vec<_> = LogicalCommand::all().map(LogicalCommand::id).collect();
        format!("unknown command '{raw}' (expected one of: {})", known.join(", "))
    })
}

pub fn parse_button(raw: &str) -> Result<GamepadButton, String> {
    GamepadButton::from_id(&normalize(raw)).ok_or_else(|| {
        let known: Vec<_> = GamepadButton::all().map(GamepadButton::id).collect();
        format!("unknown button '{raw}' (expected one of: {})", known.join(", "))
    })
}

fn parse_binding(raw: &str) -> Result<Binding, String> {
    if normalize(raw) == pageturn_config::UNBOUND {
        return Ok(Binding(None));
    }
    parse_command(raw).map(|cmd| Binding(Some(cmd)))
}

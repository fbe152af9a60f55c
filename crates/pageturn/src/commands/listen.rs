//! `pageturn listen`: keyboard as a gamepad.
//!
//! Puts the terminal in raw mode, turns key events into gamepad buttons,
//! feeds them to the dispatcher, and prints a status line whenever the
//! engine state changes. Logs go to a file so they never interleave with
//! the status output.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::event::{
    Event, EventStream, KeyCode as Key, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use futures::StreamExt;
use tracing::{debug, info};

use pageturn_config::FileSettings;
use pageturn_core::{
    ButtonAction, ConnectionStatus, Dispatcher, EngineState, GamepadButton, InputEvent,
    MemorySettings, RemoteClient, SettingsProvider,
};

use crate::cli::{GlobalOpts, ListenArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

// ── Key translation ─────────────────────────────────────────────────

/// What a terminal key means to the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Button(GamepadButton, ButtonAction),
    Probe,
    Quit,
    Ignore,
}

fn translate(key: &KeyEvent) -> KeyAction {
    let action = match key.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => ButtonAction::Pressed,
        KeyEventKind::Release => ButtonAction::Released,
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match (key.code, action) {
            (Key::Char('c' | 'd'), ButtonAction::Pressed) => KeyAction::Quit,
            _ => KeyAction::Ignore,
        };
    }

    let button = match key.code {
        Key::Esc | Key::Char('q') => {
            return match action {
                ButtonAction::Pressed => KeyAction::Quit,
                ButtonAction::Released => KeyAction::Ignore,
            };
        }
        Key::Char('c') => {
            return match action {
                ButtonAction::Pressed => KeyAction::Probe,
                ButtonAction::Released => KeyAction::Ignore,
            };
        }
        Key::Up => GamepadButton::DpadUp,
        Key::Down => GamepadButton::DpadDown,
        Key::Left => GamepadButton::DpadLeft,
        Key::Right => GamepadButton::DpadRight,
        Key::Char('a') => GamepadButton::A,
        Key::Char('b') => GamepadButton::B,
        Key::Char('x') => GamepadButton::X,
        Key::Char('y') => GamepadButton::Y,
        Key::Char('[') => GamepadButton::L1,
        Key::Char(']') => GamepadButton::R1,
        Key::Char('{') => GamepadButton::L2,
        Key::Char('}') => GamepadButton::R2,
        Key::Char('-') => GamepadButton::Select,
        Key::Char('+' | '=') => GamepadButton::Start,
        _ => return KeyAction::Ignore,
    };
    KeyAction::Button(button, action)
}

// ── Status rendering ────────────────────────────────────────────────

fn render_state(state: &EngineState, color: bool) -> String {
    match state {
        EngineState::Loading => output::dim("loading settings...", color),
        EngineState::Unavailable { reason } => {
            output::status_line(false, &format!("settings unavailable: {reason}"), color)
        }
        EngineState::Ready(ds) => {
            let reader = match &ds.connection_status {
                ConnectionStatus::Unknown => output::dim("checking", color),
                ConnectionStatus::Connected => output::highlight("connected", color),
                ConnectionStatus::Error(reason) => format!("unreachable ({reason})"),
            };
            let button = ds
                .pressed_button
                .and_then(GamepadButton::from_key_code)
                .map_or("-", GamepadButton::display_name);
            let mut line = format!("reader: {reader} | button: {button}");
            if ds.is_busy {
                line.push_str(" | sending...");
            }
            if let Some(message) = ds.feedback_message() {
                line.push_str(" | ");
                line.push_str(message);
            }
            line
        }
    }
}

// ── Terminal guard ──────────────────────────────────────────────────

/// Raw mode (and key-release reporting where supported) for the guard's
/// lifetime.
struct TerminalGuard {
    reports_release: bool,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let reports_release = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if reports_release {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        Ok(Self { reports_release })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.reports_release {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

/// Raw mode needs explicit carriage returns.
fn emit(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{line}\r\n")?;
    stdout.flush()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(_args: &ListenArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::load_lenient(global);
    let client = ctx.client()?;
    let mapper = ctx.mapper()?;
    let dispatch_config = ctx.config.to_dispatch_config();

    if global.overrides_endpoint() {
        let settings = MemorySettings::new(ctx.endpoint(global)?);
        let dispatcher = Dispatcher::with_mapper(client, settings, dispatch_config, mapper);
        dispatcher.start();
        return run(&dispatcher, ctx.color).await;
    }

    let settings = Arc::new(FileSettings::new(&ctx.path));
    let dispatcher = Dispatcher::with_mapper(client, Arc::clone(&settings), dispatch_config, mapper);
    dispatcher.start();
    settings.load_in_background();
    run(&dispatcher, ctx.color).await
}

async fn run<S: SettingsProvider>(
    dispatcher: &Dispatcher<RemoteClient, S>,
    color: bool,
) -> Result<(), CliError> {
    let guard = TerminalGuard::enter()?;
    info!(reports_release = guard.reports_release, "listening for keys");

    emit(&output::dim(
        "arrows: d-pad  a/b/x/y  [ ] { }: shoulders  - +: select/start  c: re-check  q: quit",
        color,
    ))?;

    let mut keys = EventStream::new();
    let mut states = dispatcher.state().into_stream();
    let mut last_line = String::new();

    let result = loop {
        tokio::select! {
            event = keys.next() => {
                let key = match event {
                    Some(Ok(Event::Key(key))) => key,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Err(CliError::from(e)),
                    None => break Ok(()),
                };
                match translate(&key) {
                    KeyAction::Quit => break Ok(()),
                    KeyAction::Probe => dispatcher.check_connection(),
                    KeyAction::Button(button, action) => {
                        let consumed = dispatcher.handle(InputEvent { button, action });
                        debug!(%button, ?action, consumed, "key handled");
                        if !guard.reports_release && action == ButtonAction::Pressed {
                            dispatcher.release(button);
                        }
                    }
                    KeyAction::Ignore => {}
                }
            }
            Some(state) = states.next() => {
                let line = render_state(&state, color);
                if line != last_line {
                    if let Err(e) = emit(&line) {
                        break Err(e.into());
                    }
                    last_line = line;
                }
            }
        }
    };

    drop(guard);
    dispatcher.shutdown().await;
    result
}

// ── Dispatcher ──
//
// Turns button events into reader commands. Owns the observable state,
// gates presses (busy, then debounce), runs requests as background tasks,
// probes reachability, and follows the settings provider.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use pageturn_api::Endpoint;

use crate::command::LogicalCommand;
use crate::config::DispatchConfig;
use crate::error::CoreError;
use crate::input::{ButtonAction, GamepadButton, InputEvent, KeyCode};
use crate::mapper::{InputMapper, MappingSnapshot};
use crate::remote::Remote;
use crate::settings::{SettingsProvider, SettingsState};
use crate::state::{ConnectionStatus, DispatchOutcome, DispatchState, EngineState, Feedback};
use crate::stream::StateStream;

// ── Dispatcher ───────────────────────────────────────────────────

/// The input-to-command dispatch engine.
///
/// Cheaply cloneable via `Arc<DispatcherInner>`. Call [`start()`](Self::start)
/// to begin following the settings provider; until the first endpoint is
/// loaded every press reports [`DispatchOutcome::NotReady`].
pub struct Dispatcher<R: Remote, S: SettingsProvider> {
    inner: Arc<DispatcherInner<R, S>>,
}

impl<R: Remote, S: SettingsProvider> Clone for Dispatcher<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DispatcherInner<R, S> {
    remote: R,
    settings: S,
    mapper: InputMapper,
    config: DispatchConfig,
    state: watch::Sender<EngineState>,
    /// Start of the last request that passed both gates.
    last_dispatch: Mutex<Option<Instant>>,
    /// A command request is outstanding. Outlives `Ready` so a settings
    /// reload cannot reopen the busy gate. Only touched under the state lock.
    in_flight: AtomicBool,
    feedback_seq: AtomicU64,
    probe: Mutex<ProbeSlot>,
    cancel: CancellationToken,
    /// Requests, probes, and feedback timers.
    tasks: TaskTracker,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

/// The probe that is allowed to write `connection_status`.
#[derive(Default)]
struct ProbeSlot {
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl<R: Remote, S: SettingsProvider> Dispatcher<R, S> {
    /// Create a dispatcher with the default button mapping.
    pub fn new(remote: R, settings: S, config: DispatchConfig) -> Self {
        Self::with_mapper(remote, settings, config, InputMapper::new())
    }

    pub fn with_mapper(remote: R, settings: S, config: DispatchConfig, mapper: InputMapper) -> Self {
        let (state, _) = watch::channel(EngineState::Loading);
        Self {
            inner: Arc::new(DispatcherInner {
                remote,
                settings,
                mapper,
                config,
                state,
                last_dispatch: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                feedback_seq: AtomicU64::new(0),
                probe: Mutex::new(ProbeSlot::default()),
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
                watcher: Mutex::new(None),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the settings watcher. Each loaded endpoint makes the
    /// dispatcher ready (if it was not) and triggers a probe.
    ///
    /// Must be called from within a tokio runtime. Calling it twice is a no-op.
    pub fn start(&self) {
        let mut slot = lock(&self.inner.watcher);
        if slot.is_some() || self.inner.cancel.is_cancelled() {
            return;
        }

        let dispatcher = self.clone();
        let mut rx = self.inner.settings.subscribe();
        let cancel = self.inner.cancel.child_token();

        *slot = Some(tokio::spawn(async move {
            loop {
                let settings = rx.borrow_and_update().clone();
                dispatcher.apply_settings(settings);

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            debug!("settings provider dropped; watcher exiting");
                            break;
                        }
                    }
                }
            }
        }));
        debug!("settings watcher spawned");
    }

    /// Stop background work.
    ///
    /// Cancels the in-flight probe, the settings watcher, and pending
    /// feedback timers. In-flight command requests are not cancelled; this
    /// waits for them to settle so `is_busy` is always cleared.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let watcher = lock(&self.inner.watcher).take();
        if let Some(handle) = watcher {
            let _ = handle.await;
        }

        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        info!("dispatcher stopped");
    }

    fn apply_settings(&self, settings: SettingsState) {
        match settings {
            SettingsState::Loading => {
                debug!("settings still loading");
            }
            SettingsState::Loaded(endpoint) => {
                let became_ready = self.inner.state.send_if_modified(|state| {
                    if state.is_ready() {
                        false
                    } else {
                        *state = EngineState::Ready(DispatchState {
                            is_busy: self.inner.in_flight.load(Ordering::Relaxed),
                            ..DispatchState::default()
                        });
                        true
                    }
                });
                if became_ready {
                    info!(%endpoint, "settings loaded; dispatcher ready");
                } else {
                    info!(%endpoint, "endpoint changed");
                }
                self.check_connection();
            }
            SettingsState::Unavailable(reason) => {
                warn!(%reason, "settings unavailable");
                self.cancel_probe();
                self.inner
                    .state
                    .send_replace(EngineState::Unavailable { reason });
            }
        }
    }

    // ── Input ────────────────────────────────────────────────────

    /// Feed a filtered input event. Returns whether it was consumed.
    pub fn handle(&self, event: InputEvent) -> bool {
        match event.action {
            ButtonAction::Pressed => self.press(event.button).is_consumed(),
            ButtonAction::Released => {
                self.release(event.button);
                false
            }
        }
    }

    /// Handle a button going down.
    ///
    /// Marks the button as pressed, resolves its command, and passes it
    /// through the busy gate and then the debounce gate. Only a press that
    /// clears both issues a request.
    pub fn press(&self, button: GamepadButton) -> DispatchOutcome {
        if self.inner.cancel.is_cancelled() {
            return DispatchOutcome::NotReady;
        }

        let code = button.key_code();
        let now = Instant::now();
        let mut outcome = DispatchOutcome::NotReady;

        self.inner.state.send_if_modified(|state| {
            let Some(ds) = state.dispatch_mut() else {
                return false;
            };
            let was_pressed = ds.pressed_button.replace(code);
            outcome = match self.inner.mapper.resolve(code) {
                None => DispatchOutcome::Unmapped,
                Some(command) => self.inner.admit(ds, command, now),
            };
            was_pressed != Some(code) || matches!(outcome, DispatchOutcome::Dispatched(_))
        });

        match outcome {
            DispatchOutcome::Dispatched(command) => {
                debug!(%button, command = command.id(), "dispatching");
                self.spawn_dispatch(command);
            }
            DispatchOutcome::Busy => debug!(%button, "rejected: request in flight"),
            DispatchOutcome::Debounced => debug!(%button, "debounced"),
            DispatchOutcome::Unmapped => debug!(%button, "no command bound"),
            DispatchOutcome::NotReady => debug!(%button, "ignored: not ready"),
        }
        outcome
    }

    /// Handle a button going up. Only clears the highlight if this button
    /// is the one currently shown as pressed.
    pub fn release(&self, button: GamepadButton) {
        let code = button.key_code();
        self.inner.state.send_if_modified(|state| match state.dispatch_mut() {
            Some(ds) if ds.pressed_button == Some(code) => {
                ds.pressed_button = None;
                true
            }
            _ => false,
        });
    }

    fn spawn_dispatch(&self, command: LogicalCommand) {
        let inner = Arc::clone(&self.inner);
        self.inner.tasks.spawn(async move {
            let result = match inner.endpoint() {
                Ok(endpoint) => inner
                    .remote
                    .send_command(&endpoint, command)
                    .await
                    .map_err(CoreError::from),
                Err(e) => Err(e),
            };

            let message = match &result {
                Ok(()) => format!("{} - OK", command.display_name()),
                Err(e) => {
                    warn!(command = command.id(), error = %e, "command failed");
                    format!("{} - Failed: {e}", command.display_name())
                }
            };

            let id = inner.settle(message);

            tokio::select! {
                biased;
                () = inner.cancel.cancelled() => {}
                () = tokio::time::sleep(inner.config.feedback_ttl) => inner.expire_feedback(id),
            }
        });
    }

    // ── Connection probing ───────────────────────────────────────

    /// Probe the current endpoint, superseding any probe in flight.
    ///
    /// Only the most recent probe may update `connection_status`; an
    /// older one is cancelled and, if it finishes anyway, discarded.
    pub fn check_connection(&self) {
        if !self.inner.state.borrow().is_ready() || self.inner.cancel.is_cancelled() {
            debug!("probe skipped: not ready");
            return;
        }

        let token = self.inner.cancel.child_token();
        let generation = {
            let mut slot = lock(&self.inner.probe);
            if let Some(previous) = slot.cancel.replace(token.clone()) {
                previous.cancel();
            }
            slot.generation += 1;
            slot.generation
        };

        let inner = Arc::clone(&self.inner);
        self.inner.tasks.spawn(async move {
            let probe = async {
                let endpoint = inner.endpoint()?;
                debug!(%endpoint, generation, "probing");
                inner.remote.probe(&endpoint).await.map_err(CoreError::from)
            };

            let result = tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(generation, "probe superseded");
                    return;
                }
                result = probe => result,
            };

            let status = match result {
                Ok(()) => ConnectionStatus::Connected,
                Err(e) => {
                    warn!(error = %e, "connection check failed");
                    ConnectionStatus::Error(e.to_string())
                }
            };
            inner.apply_probe(generation, status);
        });
    }

    fn cancel_probe(&self) {
        let mut slot = lock(&self.inner.probe);
        if let Some(token) = slot.cancel.take() {
            token.cancel();
        }
        slot.generation += 1;
    }

    // ── Mapping ──────────────────────────────────────────────────

    /// Bind or unbind a key code. Applies to subsequent presses only.
    pub fn set_mapping(&self, code: KeyCode, command: Option<LogicalCommand>) {
        self.inner.mapper.set_mapping(code, command);
    }

    pub fn reset_mappings(&self) {
        self.inner.mapper.reset_defaults();
    }

    pub fn resolve(&self, code: KeyCode) -> Option<LogicalCommand> {
        self.inner.mapper.resolve(code)
    }

    pub fn mappings(&self) -> MappingSnapshot {
        self.inner.mapper.snapshot()
    }

    // ── Settings ─────────────────────────────────────────────────

    /// Validate and persist a new endpoint from text input. The watcher
    /// picks up the change and probes it.
    pub fn save_endpoint(&self, host: &str, port: &str) -> Result<Endpoint, CoreError> {
        let endpoint = Endpoint::parse(host, port)?;
        self.inner.settings.save(&endpoint)?;
        info!(%endpoint, "endpoint saved");
        Ok(endpoint)
    }

    // ── One-shot requests ────────────────────────────────────────

    /// Send a command immediately against the current endpoint, bypassing
    /// the input gates and leaving observable state untouched.
    pub async fn execute(&self, command: LogicalCommand) -> Result<(), CoreError> {
        let endpoint = self.inner.endpoint()?;
        self.inner.remote.send_command(&endpoint, command).await?;
        Ok(())
    }

    /// Probe the current endpoint once without touching observable state.
    pub async fn probe_once(&self) -> Result<(), CoreError> {
        let endpoint = self.inner.endpoint()?;
        self.inner.remote.probe(&endpoint).await?;
        Ok(())
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to state changes.
    pub fn state(&self) -> StateStream {
        StateStream::new(self.inner.state.subscribe())
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> EngineState {
        self.inner.state.borrow().clone()
    }
}

impl<R, S: SettingsProvider> DispatcherInner<R, S> {
    /// Busy gate, then debounce gate. Runs under the state lock.
    fn admit(&self, ds: &mut DispatchState, command: LogicalCommand, now: Instant) -> DispatchOutcome {
        if self.in_flight.load(Ordering::Relaxed) {
            return DispatchOutcome::Busy;
        }

        let mut last = lock(&self.last_dispatch);
        if last.is_some_and(|previous| now.saturating_duration_since(previous) < self.config.debounce) {
            return DispatchOutcome::Debounced;
        }
        *last = Some(now);
        self.in_flight.store(true, Ordering::Relaxed);
        ds.is_busy = true;
        DispatchOutcome::Dispatched(command)
    }

    /// Read the endpoint fresh from the provider.
    fn endpoint(&self) -> Result<Endpoint, CoreError> {
        match self.settings.current() {
            SettingsState::Loaded(endpoint) => Ok(endpoint),
            SettingsState::Loading => Err(CoreError::SettingsUnavailable {
                message: "settings are still loading".into(),
            }),
            SettingsState::Unavailable(message) => Err(CoreError::SettingsUnavailable { message }),
        }
    }

    /// Clear `is_busy` and publish feedback in one update. Returns the
    /// feedback id.
    fn settle(&self, message: String) -> u64 {
        let id = self.feedback_seq.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(id, %message, "request settled");
        self.state.send_modify(|state| {
            self.in_flight.store(false, Ordering::Relaxed);
            if let Some(ds) = state.dispatch_mut() {
                ds.is_busy = false;
                ds.last_feedback = Some(Feedback { id, message });
            }
        });
        id
    }

    /// Clear feedback `id` unless something newer has replaced it.
    fn expire_feedback(&self, id: u64) {
        self.state.send_if_modified(|state| match state.dispatch_mut() {
            Some(ds) if ds.last_feedback.as_ref().is_some_and(|f| f.id == id) => {
                ds.last_feedback = None;
                true
            }
            _ => false,
        });
    }

    fn apply_probe(&self, generation: u64, status: ConnectionStatus) {
        let slot = lock(&self.probe);
        if slot.generation != generation {
            debug!(generation, latest = slot.generation, "discarding stale probe result");
            return;
        }
        debug!(generation, %status, "probe settled");
        self.state.send_if_modified(|state| match state.dispatch_mut() {
            Some(ds) if ds.connection_status != status => {
                ds.connection_status = status;
                true
            }
            _ => false,
        });
    }
}

/// None of the guarded sections can leave their data half-written, so a
/// poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::Semaphore;

use pageturn_core::{
    ButtonAction, ConnectionStatus, CoreError, DispatchConfig, DispatchOutcome, Dispatcher,
    Endpoint, EngineState, GamepadButton, InputEvent, KeyCode, LogicalCommand, MemorySettings,
    Remote, SettingsProvider, SettingsState, StateStream,
};

// ── Scripted remote ─────────────────────────────────────────────────

#[derive(Default)]
struct FakeRemote {
    commands: Mutex<Vec<(Endpoint, LogicalCommand)>>,
    probes: Mutex<Vec<Endpoint>>,
    command_failures: Mutex<VecDeque<pageturn_api::Error>>,
    probe_script: Mutex<VecDeque<(Duration, Result<(), pageturn_api::Error>)>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeRemote {
    /// Every command blocks until the returned semaphore gets a permit.
    fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let remote = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (remote, gate)
    }

    fn fail_next_command(&self, err: pageturn_api::Error) {
        self.command_failures.lock().unwrap().push_back(err);
    }

    fn script_probe(&self, delay: Duration, result: Result<(), pageturn_api::Error>) {
        self.probe_script.lock().unwrap().push_back((delay, result));
    }

    fn commands(&self) -> Vec<(Endpoint, LogicalCommand)> {
        self.commands.lock().unwrap().clone()
    }

    fn probe_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }
}

impl Remote for FakeRemote {
    fn send_command(
        &self,
        endpoint: &Endpoint,
        command: LogicalCommand,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send {
        let endpoint = endpoint.clone();
        async move {
            self.commands.lock().unwrap().push((endpoint, command));
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            let failure = self.command_failures.lock().unwrap().pop_front();
            failure.map_or(Ok(()), Err)
        }
    }

    fn probe(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(), pageturn_api::Error>> + Send {
        let endpoint = endpoint.clone();
        async move {
            self.probes.lock().unwrap().push(endpoint);
            let step = self.probe_script.lock().unwrap().pop_front();
            let (delay, result) = step.unwrap_or((Duration::ZERO, Ok(())));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

type TestDispatcher = Dispatcher<Arc<FakeRemote>, Arc<MemorySettings>>;

fn reader() -> Endpoint {
    Endpoint::new("10.0.0.5", 8080)
}

fn build(remote: FakeRemote, settings: MemorySettings) -> (TestDispatcher, Arc<FakeRemote>, Arc<MemorySettings>) {
    let remote = Arc::new(remote);
    let settings = Arc::new(settings);
    let dispatcher = Dispatcher::new(
        Arc::clone(&remote),
        Arc::clone(&settings),
        DispatchConfig::default(),
    );
    dispatcher.start();
    (dispatcher, remote, settings)
}

async fn wait_until(stream: &mut StateStream, predicate: impl FnMut(&EngineState) -> bool) -> EngineState {
    tokio::time::timeout(Duration::from_secs(60), stream.wait_for(predicate))
        .await
        .expect("state never matched")
        .unwrap()
}

/// Wait for the settings load and the initial probe to settle.
async fn ready(dispatcher: &TestDispatcher) -> StateStream {
    let mut stream = dispatcher.state();
    wait_until(&mut stream, |s| {
        s.dispatch()
            .is_some_and(|d| d.connection_status != ConnectionStatus::Unknown)
    })
    .await;
    stream
}

async fn settled(stream: &mut StateStream) -> EngineState {
    wait_until(stream, |s| {
        s.dispatch()
            .is_some_and(|d| !d.is_busy && d.last_feedback.is_some())
    })
    .await
}

async fn flush() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn feedback(state: &EngineState) -> Option<String> {
    state
        .dispatch()
        .and_then(|d| d.feedback_message())
        .map(str::to_owned)
}

// ── Readiness ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn presses_are_ignored_until_settings_load() {
    let (dispatcher, remote, settings) = build(FakeRemote::default(), MemorySettings::loading());
    flush().await;

    assert_eq!(dispatcher.snapshot(), EngineState::Loading);
    assert_eq!(dispatcher.press(GamepadButton::DpadRight), DispatchOutcome::NotReady);
    assert!(remote.commands().is_empty());
    assert_eq!(remote.probe_count(), 0);

    settings.publish(SettingsState::Loaded(reader()));
    let mut stream = ready(&dispatcher).await;

    assert_eq!(
        dispatcher.press(GamepadButton::DpadRight),
        DispatchOutcome::Dispatched(LogicalCommand::NextPage)
    );
    settled(&mut stream).await;
    assert_eq!(remote.commands(), vec![(reader(), LogicalCommand::NextPage)]);
}

#[tokio::test(start_paused = true)]
async fn settings_failure_makes_engine_unavailable() {
    let (dispatcher, remote, settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    settings.publish(SettingsState::Unavailable("permission denied".into()));
    let state = wait_until(&mut stream, |s| !s.is_ready()).await;
    assert_eq!(
        state,
        EngineState::Unavailable {
            reason: "permission denied".into()
        }
    );

    assert_eq!(dispatcher.press(GamepadButton::DpadRight), DispatchOutcome::NotReady);
    assert!(remote.commands().is_empty());
}

// ── Dispatch ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn press_sends_bound_command_and_reports_success() {
    let (dispatcher, remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    let outcome = dispatcher.press(GamepadButton::DpadRight);
    assert_eq!(outcome, DispatchOutcome::Dispatched(LogicalCommand::NextPage));
    assert!(outcome.is_consumed());

    let during = dispatcher.snapshot();
    let ds = during.dispatch().unwrap();
    assert!(ds.is_busy);
    assert_eq!(ds.pressed_button, Some(KeyCode::DPAD_RIGHT));

    let state = settled(&mut stream).await;
    assert_eq!(feedback(&state).as_deref(), Some("Next Page - OK"));
    assert_eq!(state.dispatch().unwrap().connection_status, ConnectionStatus::Connected);
    assert_eq!(remote.commands(), vec![(reader(), LogicalCommand::NextPage)]);
}

#[tokio::test(start_paused = true)]
async fn failed_request_reports_error_text() {
    let remote = FakeRemote::default();
    remote.fail_next_command(pageturn_api::Error::HttpStatus {
        status: 500,
        reason: "Internal Server Error".into(),
    });
    let (dispatcher, _remote, _settings) = build(remote, MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    dispatcher.press(GamepadButton::DpadLeft);
    let state = settled(&mut stream).await;

    assert_eq!(
        feedback(&state).as_deref(),
        Some("Previous Page - Failed: HTTP 500: Internal Server Error")
    );
    assert!(!state.dispatch().unwrap().is_busy);
}

#[tokio::test(start_paused = true)]
async fn unmapped_button_is_highlighted_but_sends_nothing() {
    let (dispatcher, remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    ready(&dispatcher).await;

    let outcome = dispatcher.press(GamepadButton::A);
    assert_eq!(outcome, DispatchOutcome::Unmapped);
    assert!(!outcome.is_consumed());

    let state = dispatcher.snapshot();
    let ds = state.dispatch().unwrap();
    assert_eq!(ds.pressed_button, Some(KeyCode::BUTTON_A));
    assert!(!ds.is_busy);

    flush().await;
    assert!(remote.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn release_clears_only_the_highlighted_button() {
    let (dispatcher, _remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    ready(&dispatcher).await;

    dispatcher.press(GamepadButton::B);
    dispatcher.release(GamepadButton::X);
    assert_eq!(
        dispatcher.snapshot().dispatch().unwrap().pressed_button,
        Some(KeyCode::BUTTON_B)
    );

    dispatcher.release(GamepadButton::B);
    assert_eq!(dispatcher.snapshot().dispatch().unwrap().pressed_button, None);
}

#[tokio::test(start_paused = true)]
async fn handle_reports_consumption() {
    let (dispatcher, _remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    ready(&dispatcher).await;

    let press = InputEvent::from_raw(KeyCode::DPAD_RIGHT, ButtonAction::Pressed).unwrap();
    let release = InputEvent::from_raw(KeyCode::DPAD_RIGHT, ButtonAction::Released).unwrap();
    assert!(dispatcher.handle(press));
    assert!(!dispatcher.handle(release));

    // Keyboard keys and other devices never become input events.
    assert!(InputEvent::from_raw(KeyCode(66), ButtonAction::Pressed).is_none());
}

// ── Gating ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn presses_while_busy_are_rejected() {
    let (remote, gate) = FakeRemote::gated();
    let (dispatcher, remote, _settings) = build(remote, MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    assert_eq!(
        dispatcher.press(GamepadButton::DpadRight),
        DispatchOutcome::Dispatched(LogicalCommand::NextPage)
    );
    flush().await;
    assert_eq!(remote.commands().len(), 1);

    // Well past the debounce window, still blocked by the in-flight request.
    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(dispatcher.press(GamepadButton::DpadLeft), DispatchOutcome::Busy);
    assert_eq!(dispatcher.press(GamepadButton::DpadRight), DispatchOutcome::Busy);
    flush().await;
    assert_eq!(remote.commands().len(), 1);

    gate.add_permits(1);
    let state = settled(&mut stream).await;
    assert_eq!(feedback(&state).as_deref(), Some("Next Page - OK"));
    assert_eq!(remote.commands().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn busy_gate_survives_settings_reload() {
    let (remote, gate) = FakeRemote::gated();
    let (dispatcher, remote, settings) = build(remote, MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    assert_eq!(
        dispatcher.press(GamepadButton::DpadRight),
        DispatchOutcome::Dispatched(LogicalCommand::NextPage)
    );
    flush().await;

    settings.publish(SettingsState::Unavailable("file locked".into()));
    wait_until(&mut stream, |s| !s.is_ready()).await;
    settings.publish(SettingsState::Loaded(reader()));
    let state = wait_until(&mut stream, EngineState::is_ready).await;
    assert!(state.dispatch().unwrap().is_busy);

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(dispatcher.press(GamepadButton::DpadLeft), DispatchOutcome::Busy);
    flush().await;
    assert_eq!(remote.commands().len(), 1);

    gate.add_permits(1);
    let state = settled(&mut stream).await;
    assert_eq!(feedback(&state).as_deref(), Some("Next Page - OK"));

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(
        dispatcher.press(GamepadButton::DpadLeft),
        DispatchOutcome::Dispatched(LogicalCommand::PreviousPage)
    );
    gate.add_permits(1);
    settled(&mut stream).await;
    assert_eq!(remote.commands().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn request_settling_while_unavailable_reopens_the_gate() {
    let (remote, gate) = FakeRemote::gated();
    let (dispatcher, remote, settings) = build(remote, MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    dispatcher.press(GamepadButton::DpadRight);
    flush().await;

    settings.publish(SettingsState::Unavailable("file locked".into()));
    wait_until(&mut stream, |s| !s.is_ready()).await;
    gate.add_permits(1);
    flush().await;

    settings.publish(SettingsState::Loaded(reader()));
    let state = wait_until(&mut stream, EngineState::is_ready).await;
    assert!(!state.dispatch().unwrap().is_busy);

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(
        dispatcher.press(GamepadButton::DpadLeft),
        DispatchOutcome::Dispatched(LogicalCommand::PreviousPage)
    );
    gate.add_permits(1);
    settled(&mut stream).await;
    assert_eq!(remote.commands().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn presses_inside_debounce_window_are_swallowed() {
    let (dispatcher, remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    dispatcher.press(GamepadButton::DpadRight);
    settled(&mut stream).await;

    tokio::time::advance(Duration::from_millis(100)).await;
    assert_eq!(dispatcher.press(GamepadButton::DpadRight), DispatchOutcome::Debounced);
    assert!(dispatcher.press(GamepadButton::DpadRight).is_consumed());

    tokio::time::advance(Duration::from_millis(250)).await;
    assert_eq!(
        dispatcher.press(GamepadButton::DpadRight),
        DispatchOutcome::Dispatched(LogicalCommand::NextPage)
    );
    flush().await;
    assert_eq!(remote.commands().len(), 2);
}

// ── Feedback expiry ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn feedback_clears_after_ttl() {
    let (dispatcher, _remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    dispatcher.press(GamepadButton::DpadRight);
    settled(&mut stream).await;

    tokio::time::advance(Duration::from_millis(1_990)).await;
    flush().await;
    assert_eq!(feedback(&dispatcher.snapshot()).as_deref(), Some("Next Page - OK"));

    tokio::time::advance(Duration::from_millis(20)).await;
    let state = wait_until(&mut stream, |s| {
        s.dispatch().is_some_and(|d| d.last_feedback.is_none())
    })
    .await;
    assert_eq!(feedback(&state), None);
}

#[tokio::test(start_paused = true)]
async fn stale_timer_leaves_newer_identical_feedback() {
    let (dispatcher, _remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    dispatcher.press(GamepadButton::DpadRight);
    let first = settled(&mut stream).await;
    let first_id = first.dispatch().unwrap().last_feedback.as_ref().unwrap().id;

    tokio::time::advance(Duration::from_secs(1)).await;
    dispatcher.press(GamepadButton::DpadRight);
    let second = wait_until(&mut stream, |s| {
        s.dispatch()
            .and_then(|d| d.last_feedback.as_ref())
            .is_some_and(|f| f.id != first_id)
    })
    .await;
    let second = second.dispatch().unwrap().last_feedback.clone().unwrap();
    assert_eq!(second.message, "Next Page - OK");

    // The first timer fires here; the message text is identical but it is
    // not the one that timer owns.
    tokio::time::advance(Duration::from_millis(1_100)).await;
    flush().await;
    assert_eq!(
        dispatcher.snapshot().dispatch().unwrap().last_feedback,
        Some(second)
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    wait_until(&mut stream, |s| {
        s.dispatch().is_some_and(|d| d.last_feedback.is_none())
    })
    .await;
}

// ── Connection probing ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn latest_probe_wins() {
    let remote = FakeRemote::default();
    remote.script_probe(Duration::ZERO, Err(pageturn_api::Error::ConnectionRefused {
        message: "initial".into(),
    }));
    remote.script_probe(Duration::from_millis(1_500), Ok(()));
    remote.script_probe(
        Duration::from_millis(10),
        Err(pageturn_api::Error::ConnectionRefused {
            message: "refused".into(),
        }),
    );
    let (dispatcher, remote, _settings) = build(remote, MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    dispatcher.check_connection();
    flush().await;
    dispatcher.check_connection();

    wait_until(&mut stream, |s| {
        s.dispatch().is_some_and(|d| {
            d.connection_status == ConnectionStatus::Error("Cannot connect to server: refused".into())
        })
    })
    .await;

    // Past the point where the superseded probe would have finished.
    tokio::time::advance(Duration::from_secs(2)).await;
    flush().await;
    assert_eq!(
        dispatcher.snapshot().dispatch().unwrap().connection_status,
        ConnectionStatus::Error("Cannot connect to server: refused".into())
    );
    assert_eq!(remote.probe_count(), 3);
}

// ── Settings changes ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn saved_endpoint_is_probed_and_used_next() {
    let (dispatcher, remote, settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;
    assert_eq!(remote.probe_count(), 1);

    let saved = dispatcher.save_endpoint(" 10.0.0.6 ", "9090").unwrap();
    assert_eq!(saved, Endpoint::new("10.0.0.6", 9090));
    assert_eq!(settings.current(), SettingsState::Loaded(saved.clone()));

    flush().await;
    assert_eq!(remote.probe_count(), 2);

    dispatcher.press(GamepadButton::DpadLeft);
    settled(&mut stream).await;
    assert_eq!(remote.commands(), vec![(saved, LogicalCommand::PreviousPage)]);
}

#[tokio::test(start_paused = true)]
async fn save_endpoint_rejects_bad_fields() {
    let (dispatcher, _remote, settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    ready(&dispatcher).await;

    let err = dispatcher.save_endpoint("999.1.1.1", "8080").unwrap_err();
    assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "host"));

    let err = dispatcher.save_endpoint("10.0.0.6", "0").unwrap_err();
    assert_eq!(err.to_string(), "Invalid port: Port must be between 1-65535");

    assert_eq!(settings.current(), SettingsState::Loaded(reader()));
}

// ── Mapping ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn mapping_changes_apply_to_next_press() {
    let (dispatcher, remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    let mut stream = ready(&dispatcher).await;

    dispatcher.set_mapping(KeyCode::BUTTON_A, Some(LogicalCommand::NextPage));
    dispatcher.set_mapping(KeyCode::DPAD_RIGHT, None);
    assert_eq!(dispatcher.mappings().len(), 2);

    assert_eq!(dispatcher.press(GamepadButton::DpadRight), DispatchOutcome::Unmapped);
    assert_eq!(
        dispatcher.press(GamepadButton::A),
        DispatchOutcome::Dispatched(LogicalCommand::NextPage)
    );
    settled(&mut stream).await;

    dispatcher.reset_mappings();
    assert_eq!(dispatcher.resolve(KeyCode::BUTTON_A), None);
    assert_eq!(dispatcher.resolve(KeyCode::DPAD_RIGHT), Some(LogicalCommand::NextPage));
    assert_eq!(remote.commands().len(), 1);
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_inflight_request() {
    let (remote, gate) = FakeRemote::gated();
    let (dispatcher, _remote, _settings) = build(remote, MemorySettings::new(reader()));
    ready(&dispatcher).await;

    dispatcher.press(GamepadButton::DpadRight);
    flush().await;

    let stopping = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.shutdown().await }
    });
    flush().await;
    assert!(!stopping.is_finished());

    gate.add_permits(1);
    stopping.await.unwrap();

    let state = dispatcher.snapshot();
    let ds = state.dispatch().unwrap();
    assert!(!ds.is_busy);
    assert_eq!(ds.feedback_message(), Some("Next Page - OK"));

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(dispatcher.press(GamepadButton::DpadRight), DispatchOutcome::NotReady);
}

#[tokio::test(start_paused = true)]
async fn one_shot_calls_use_current_endpoint() {
    let (dispatcher, remote, _settings) = build(FakeRemote::default(), MemorySettings::new(reader()));
    ready(&dispatcher).await;

    dispatcher.execute(LogicalCommand::PreviousPage).await.unwrap();
    dispatcher.probe_once().await.unwrap();

    assert_eq!(remote.commands(), vec![(reader(), LogicalCommand::PreviousPage)]);
    assert_eq!(remote.probe_count(), 2);
    assert_eq!(dispatcher.snapshot().dispatch().unwrap().last_feedback, None);
}

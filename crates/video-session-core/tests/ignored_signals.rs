//! Signals without a transition leave the machine untouched

mod common;

use std::sync::atomic::Ordering;

use common::{init_tracing, MockPorts, ObserverCounts};
use engage_video_session_core::{
    Config, InteractionId, SessionState, Signal, SilentStopPolicy, StateMachine,
};
use serde_json::json;

/// Drive a fresh machine into `state`
async fn machine_in(state: SessionState, config: Config) -> (StateMachine, std::sync::Arc<MockPorts>) {
    let ports = MockPorts::new();
    let machine = StateMachine::with_config(ports.clone(), config).unwrap();

    let path = match state {
        SessionState::Idle => vec![],
        SessionState::MessengerInitialized => vec![Signal::InitializeMessengerRequest],
        SessionState::WaitingForPrecondition => {
            vec![Signal::InitializeMessengerRequest, Signal::start("session-1")]
        }
        SessionState::VideoSessionActive => vec![
            Signal::InitializeMessengerRequest,
            Signal::start("session-1"),
            Signal::PreconditionFulfilled,
        ],
    };

    for signal in path {
        machine.handle_signal(signal).await.unwrap();
    }
    assert_eq!(machine.state(), state);
    (machine, ports)
}

fn all_signals() -> Vec<Signal> {
    vec![
        Signal::InitializeMessengerRequest,
        Signal::start("other"),
        Signal::PreconditionFulfilled,
        Signal::stop(),
        Signal::stop_silently(),
    ]
}

#[tokio::test]
async fn stop_without_message_in_idle_is_ignored() {
    init_tracing();
    let (machine, ports) = machine_in(SessionState::Idle, Config::default()).await;
    let observers = ObserverCounts::attach(&machine);

    machine.handle_signal(Signal::stop_silently()).await.unwrap();

    assert_eq!(machine.state(), SessionState::Idle);
    assert_eq!(observers.stopped(), 0);
    assert_eq!(ports.collaborator_calls(), 0);
}

#[tokio::test]
async fn stop_without_message_after_messenger_init_is_ignored() {
    let (machine, ports) = machine_in(SessionState::MessengerInitialized, Config::default()).await;
    let observers = ObserverCounts::attach(&machine);
    let calls_before = ports.collaborator_calls();

    machine.handle_signal(Signal::stop_silently()).await.unwrap();

    assert_eq!(machine.state(), SessionState::MessengerInitialized);
    assert_eq!(observers.stopped(), 0);
    assert_eq!(ports.collaborator_calls(), calls_before);
}

#[tokio::test]
async fn every_unlisted_pair_is_a_noop() {
    init_tracing();
    let config = Config::default();

    for state in SessionState::ALL {
        for signal in all_signals() {
            let (machine, ports) = machine_in(state, config.clone()).await;
            if machine.table().has_transition(state, &signal) {
                continue;
            }

            let observers = ObserverCounts::attach(&machine);
            let id_before = machine.interaction_id();
            let calls_before = ports.collaborator_calls();

            let result = machine.handle_signal(signal.clone()).await.unwrap();

            assert!(!result.transition_applied, "{} + {}", state, signal);
            assert_eq!(machine.state(), state, "{} + {}", state, signal);
            assert_eq!(machine.interaction_id(), id_before, "{} + {}", state, signal);
            assert_eq!(ports.collaborator_calls(), calls_before, "{} + {}", state, signal);
            assert_eq!(observers.started() + observers.stopped(), 0, "{} + {}", state, signal);
        }
    }
}

#[tokio::test]
async fn repeated_precondition_does_not_refire_started() {
    let (machine, _ports) = machine_in(SessionState::VideoSessionActive, Config::default()).await;
    let observers = ObserverCounts::attach(&machine);

    machine.handle_signal(Signal::PreconditionFulfilled).await.unwrap();
    machine.handle_signal(Signal::PreconditionFulfilled).await.unwrap();

    assert_eq!(machine.state(), SessionState::VideoSessionActive);
    assert_eq!(observers.started(), 0);
}

#[tokio::test]
async fn second_start_keeps_first_interaction() {
    let (machine, ports) = machine_in(SessionState::WaitingForPrecondition, Config::default()).await;

    machine.handle_signal(Signal::start("intruder")).await.unwrap();

    assert_eq!(machine.interaction_id(), Some(InteractionId::from("session-1")));
    assert_eq!(ports.start_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn silent_stop_while_active_is_ignored_by_default() {
    let (machine, ports) = machine_in(SessionState::VideoSessionActive, Config::default()).await;
    let observers = ObserverCounts::attach(&machine);

    let result = machine.handle_signal(Signal::stop_silently()).await.unwrap();

    assert!(!result.transition_applied);
    assert_eq!(machine.state(), SessionState::VideoSessionActive);
    assert_eq!(observers.stopped(), 0);
    assert_eq!(ports.stop_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn silent_stop_can_end_session_locally() {
    let config = Config::default().with_silent_stop(SilentStopPolicy::EndLocally);
    let (machine, ports) = machine_in(SessionState::VideoSessionActive, config).await;
    let observers = ObserverCounts::attach(&machine);

    let result = machine.handle_signal(Signal::stop_silently()).await.unwrap();

    assert!(result.transition_applied);
    assert_eq!(machine.state(), SessionState::MessengerInitialized);
    assert_eq!(machine.interaction_id(), None);
    assert_eq!(ports.stop_calls.load(Ordering::SeqCst), 0);
    assert_eq!(observers.stopped(), 1);
    assert_eq!(*observers.last_stopped.lock(), Some(InteractionId::from("session-1")));
}

#[tokio::test]
async fn named_signals_drive_the_machine() {
    let ports = MockPorts::new();
    let machine = StateMachine::new(ports.clone());

    machine.handle_named("INITIALIZE_MESSENGER_REQUEST", None).await.unwrap();
    machine
        .handle_named("START_SESSION_REQUEST", Some(json!({ "interactionId": "123" })))
        .await
        .unwrap();
    machine.handle_named("PRECONDITION_FULFILLED", None).await.unwrap();
    assert_eq!(machine.state().as_str(), "VIDEO_SESSION_ACTIVE");

    machine
        .handle_named("STOP_SESSION_REQUEST", Some(json!({ "sendMessage": true })))
        .await
        .unwrap();
    assert_eq!(machine.state().as_str(), "MESSENGER_INITIALIZED");
    assert_eq!(*ports.started_ids.lock(), vec![InteractionId::from("123")]);
}

#[tokio::test]
async fn malformed_named_signals_are_ignored() {
    let (machine, ports) = machine_in(SessionState::MessengerInitialized, Config::default()).await;
    let calls_before = ports.collaborator_calls();

    for (name, payload) in [
        ("START_SESSION_REQUEST", None),
        ("START_SESSION_REQUEST", Some(json!({}))),
        ("START_SESSION_REQUEST", Some(json!({ "interactionId": "" }))),
        ("START_SESSION_REQUEST", Some(json!({ "interactionId": ["x"] }))),
        ("STOP_SESSION_REQUEST", Some(json!({ "sendMessage": "yes" }))),
        ("RESUME_SESSION_REQUEST", None),
        ("start_session_request", Some(json!({ "interactionId": "1" }))),
    ] {
        let result = machine.handle_named(name, payload).await.unwrap();
        assert!(!result.transition_applied, "{}", name);
    }

    assert_eq!(machine.state(), SessionState::MessengerInitialized);
    assert_eq!(ports.collaborator_calls(), calls_before);
    assert_eq!(machine.history_snapshot().ignored_signals, 7);
}

#[tokio::test]
async fn empty_interaction_id_is_ignored_on_both_entry_points() {
    init_tracing();
    let (machine, ports) = machine_in(SessionState::MessengerInitialized, Config::default()).await;
    let calls_before = ports.collaborator_calls();

    let typed = machine.handle_signal(Signal::start("")).await.unwrap();
    let named = machine
        .handle_named("START_SESSION_REQUEST", Some(json!({ "interactionId": "" })))
        .await
        .unwrap();

    assert_eq!(typed, named);
    assert!(!typed.transition_applied);
    assert_eq!(machine.state(), SessionState::MessengerInitialized);
    assert_eq!(machine.interaction_id(), None);
    assert_eq!(ports.start_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ports.collaborator_calls(), calls_before);
    assert_eq!(machine.history_snapshot().ignored_signals, 2);
}

use crate::config::SilentStopPolicy;
use crate::state_table::{Action, EventTemplate, SessionState, Signal, StateTableBuilder};

/// Add the video session lifecycle transitions to the table
pub fn add_video_session_transitions(builder: &mut StateTableBuilder, silent_stop: SilentStopPolicy) {
    // Idle -> MessengerInitialized: messenger comes up first
    builder.add_actions(
        SessionState::Idle,
        Signal::InitializeMessengerRequest,
        vec![Action::InitializeMessenger, Action::NotifyMessengerReady],
        SessionState::MessengerInitialized,
        vec![EventTemplate::StateChanged, EventTemplate::MessengerReady],
    );

    // MessengerInitialized -> WaitingForPrecondition: ask the video service to start
    builder.add_actions(
        SessionState::MessengerInitialized,
        Signal::start(""),
        vec![Action::StoreInteractionId, Action::SendStartVideoSessionMessage],
        SessionState::WaitingForPrecondition,
        vec![EventTemplate::StateChanged],
    );

    // WaitingForPrecondition -> VideoSessionActive: call leg is ready
    builder.add_actions(
        SessionState::WaitingForPrecondition,
        Signal::PreconditionFulfilled,
        vec![],
        SessionState::VideoSessionActive,
        vec![EventTemplate::StateChanged, EventTemplate::SessionStarted],
    );

    // VideoSessionActive -> MessengerInitialized: local hangup
    builder.add_actions(
        SessionState::VideoSessionActive,
        Signal::stop(),
        vec![Action::StopVideoSession, Action::ClearInteractionId],
        SessionState::MessengerInitialized,
        vec![EventTemplate::StateChanged, EventTemplate::SessionStopped],
    );

    match silent_stop {
        SilentStopPolicy::Ignore => {}
        SilentStopPolicy::EndLocally => {
            // Session already ended on the video service; do not send a stop message
            builder.add_actions(
                SessionState::VideoSessionActive,
                Signal::stop_silently(),
                vec![Action::ClearInteractionId],
                SessionState::MessengerInitialized,
                vec![EventTemplate::StateChanged, EventTemplate::SessionStopped],
            );
        }
    }
}

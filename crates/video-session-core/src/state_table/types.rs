use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::errors::SessionError;

/// Identifier of one state machine instance, used for log correlation
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MachineId(pub String);

impl MachineId {
    pub fn new() -> Self {
        Self(format!("video-session-{}", uuid::Uuid::new_v4()))
    }
}

impl std::fmt::Display for MachineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied correlation token for one video session.
///
/// The value is opaque to the state machine; it is only stored, handed to
/// the start-session port and reported to observers.
#[derive(Debug, Clone, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionId(pub String);

impl InteractionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for InteractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InteractionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InteractionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle states of a video session
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[default]
    Idle,
    MessengerInitialized,
    WaitingForPrecondition,
    VideoSessionActive,
}

impl SessionState {
    pub const ALL: [SessionState; 4] = [
        SessionState::Idle,
        SessionState::MessengerInitialized,
        SessionState::WaitingForPrecondition,
        SessionState::VideoSessionActive,
    ];

    /// The wire name of the state, as used in logs and by drivers
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::MessengerInitialized => "MESSENGER_INITIALIZED",
            SessionState::WaitingForPrecondition => "WAITING_FOR_PRECONDITION",
            SessionState::VideoSessionActive => "VIDEO_SESSION_ACTIVE",
        }
    }

    /// States in which an interaction ID is tracked
    pub fn holds_interaction(&self) -> bool {
        matches!(
            self,
            SessionState::WaitingForPrecondition | SessionState::VideoSessionActive
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| SessionError::config(format!("unknown session state '{}'", s)))
    }
}

/// Signals that drive the session lifecycle
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize)]
#[serde(tag = "signal", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    InitializeMessengerRequest,
    #[serde(rename_all = "camelCase")]
    StartSessionRequest { interaction_id: InteractionId },
    PreconditionFulfilled,
    #[serde(rename_all = "camelCase")]
    StopSessionRequest { send_message: bool },
}

impl Signal {
    pub const NAMES: [&'static str; 4] = [
        "INITIALIZE_MESSENGER_REQUEST",
        "START_SESSION_REQUEST",
        "PRECONDITION_FULFILLED",
        "STOP_SESSION_REQUEST",
    ];

    pub fn start(interaction_id: impl Into<InteractionId>) -> Self {
        Signal::StartSessionRequest {
            interaction_id: interaction_id.into(),
        }
    }

    /// Stop request that asks the video service to end the session
    pub fn stop() -> Self {
        Signal::StopSessionRequest { send_message: true }
    }

    /// Stop request for a session that already ended remotely
    pub fn stop_silently() -> Self {
        Signal::StopSessionRequest { send_message: false }
    }

    /// Get the wire name of this signal (without payload)
    pub fn type_name(&self) -> &'static str {
        match self {
            Signal::InitializeMessengerRequest => "INITIALIZE_MESSENGER_REQUEST",
            Signal::StartSessionRequest { .. } => "START_SESSION_REQUEST",
            Signal::PreconditionFulfilled => "PRECONDITION_FULFILLED",
            Signal::StopSessionRequest { .. } => "STOP_SESSION_REQUEST",
        }
    }

    /// Build a signal from its wire name and optional JSON payload.
    ///
    /// `START_SESSION_REQUEST` requires `interactionId` (string or number).
    /// `STOP_SESSION_REQUEST` takes an optional boolean `sendMessage`,
    /// defaulting to true.
    pub fn from_name(name: &str, payload: Option<&serde_json::Value>) -> Result<Self, SessionError> {
        match name {
            "INITIALIZE_MESSENGER_REQUEST" => Ok(Signal::InitializeMessengerRequest),
            "PRECONDITION_FULFILLED" => Ok(Signal::PreconditionFulfilled),
            "START_SESSION_REQUEST" => {
                let id = match payload.and_then(|p| p.get("interactionId")) {
                    Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                    Some(serde_json::Value::Number(n)) => n.to_string(),
                    Some(serde_json::Value::String(_)) => {
                        return Err(SessionError::invalid_signal(name, "interactionId is empty"));
                    }
                    Some(other) => {
                        return Err(SessionError::invalid_signal(
                            name,
                            format!("interactionId must be a string, got {}", other),
                        ));
                    }
                    None => {
                        return Err(SessionError::invalid_signal(name, "missing interactionId"));
                    }
                };
                Ok(Signal::start(id))
            }
            "STOP_SESSION_REQUEST" => {
                let send_message = match payload.and_then(|p| p.get("sendMessage")) {
                    None | Some(serde_json::Value::Null) => true,
                    Some(serde_json::Value::Bool(b)) => *b,
                    Some(other) => {
                        return Err(SessionError::invalid_signal(
                            name,
                            format!("sendMessage must be a boolean, got {}", other),
                        ));
                    }
                };
                Ok(Signal::StopSessionRequest { send_message })
            }
            _ => Err(SessionError::invalid_signal(name, "unknown signal name")),
        }
    }

    /// Normalize the signal for state table lookups.
    ///
    /// The interaction ID is a runtime value and is erased; `send_message`
    /// selects between distinct transitions and is kept.
    pub fn normalize(&self) -> Self {
        match self {
            Signal::StartSessionRequest { .. } => Signal::StartSessionRequest {
                interaction_id: InteractionId::default(),
            },
            _ => self.clone(),
        }
    }

    /// The interaction ID carried by this signal, if any
    pub fn interaction_id(&self) -> Option<&InteractionId> {
        match self {
            Signal::StartSessionRequest { interaction_id } => Some(interaction_id),
            _ => None,
        }
    }

    /// Check the payload of a signal built in code. Signals built by
    /// [`Signal::from_name`] already pass.
    pub fn validate(&self) -> Result<(), SessionError> {
        match self {
            Signal::StartSessionRequest { interaction_id } if interaction_id.is_empty() => Err(
                SessionError::invalid_signal(self.type_name(), "interactionId is empty"),
            ),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::StartSessionRequest { interaction_id } => {
                write!(f, "{}{{interactionId={}}}", self.type_name(), interaction_id)
            }
            Signal::StopSessionRequest { send_message } => {
                write!(f, "{}{{sendMessage={}}}", self.type_name(), send_message)
            }
            _ => f.write_str(self.type_name()),
        }
    }
}

/// Key for looking up transitions in the state table
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize)]
pub struct StateKey {
    pub state: SessionState,
    pub signal: Signal,
}

impl StateKey {
    pub fn new(state: SessionState, signal: &Signal) -> Self {
        Self {
            state,
            signal: signal.normalize(),
        }
    }
}

/// Transition definition - what happens when a signal arrives in a state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    /// Actions to execute, in order. Any failure aborts the transition.
    pub actions: Vec<Action>,

    /// Next state (if changing)
    pub next_state: Option<SessionState>,

    /// Events to publish after the new state is committed
    pub publish_events: Vec<EventTemplate>,
}

/// Actions to execute during a transition
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub enum Action {
    // Messenger
    InitializeMessenger,
    NotifyMessengerReady,

    // Session bookkeeping
    StoreInteractionId,
    ClearInteractionId,

    // Video service
    SendStartVideoSessionMessage,
    StopVideoSession,
}

impl Action {
    /// Name of the collaborator port this action calls, if any
    pub fn port_name(&self) -> Option<&'static str> {
        match self {
            Action::InitializeMessenger => Some("initialize_messenger"),
            Action::NotifyMessengerReady => Some("on_messenger_ready"),
            Action::SendStartVideoSessionMessage => Some("send_start_video_session_message"),
            Action::StopVideoSession => Some("stop_video_session"),
            Action::StoreInteractionId | Action::ClearInteractionId => None,
        }
    }
}

/// Event templates for publishing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub enum EventTemplate {
    StateChanged,
    MessengerReady,
    SessionStarted,
    SessionStopped,
}

/// State table containing all transitions of the video session lifecycle
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    transitions: HashMap<StateKey, Transition>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transition, returning the one it replaced
    pub fn insert(&mut self, key: StateKey, transition: Transition) -> Option<Transition> {
        let normalized_key = StateKey::new(key.state, &key.signal);
        self.transitions.insert(normalized_key, transition)
    }

    pub fn get(&self, state: SessionState, signal: &Signal) -> Option<&Transition> {
        self.transitions.get(&StateKey::new(state, signal))
    }

    pub fn has_transition(&self, state: SessionState, signal: &Signal) -> bool {
        self.get(state, signal).is_some()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Transition)> {
        self.transitions.iter()
    }

    /// Collect all states referenced in this state table
    pub fn collect_used_states(&self) -> HashSet<SessionState> {
        let mut states = HashSet::new();
        for (key, transition) in &self.transitions {
            states.insert(key.state);
            if let Some(next_state) = transition.next_state {
                states.insert(next_state);
            }
        }
        states
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let used_states = self.collect_used_states();

        if !used_states.contains(&SessionState::Idle) {
            errors.push("Initial state IDLE has no transitions".to_string());
        }

        for state in SessionState::ALL.iter().filter(|s| used_states.contains(s)) {
            let has_exit = self.transitions.iter().any(|(key, transition)| {
                key.state == *state && transition.next_state.is_some_and(|next| next != *state)
            });
            if !has_exit {
                errors.push(format!("State {} has no exit transitions", state));
            }

            if *state != SessionState::Idle {
                let reachable = self.transitions.iter().any(|(key, transition)| {
                    key.state != *state && transition.next_state == Some(*state)
                });
                if !reachable {
                    errors.push(format!("State {} is not reachable", state));
                }
            }
        }

        for (key, transition) in &self.transitions {
            let stores = transition.actions.contains(&Action::StoreInteractionId);
            if transition.actions.contains(&Action::SendStartVideoSessionMessage)
                && !stores
                && !key.state.holds_interaction()
            {
                errors.push(format!(
                    "{} + {} sends a start message without an interaction ID",
                    key.state,
                    key.signal.type_name()
                ));
            }

            if stores && key.signal.interaction_id().is_none() {
                errors.push(format!(
                    "{} + {} stores an interaction ID the signal does not carry",
                    key.state,
                    key.signal.type_name()
                ));
            }

            if let Some(next) = transition.next_state {
                let holds_after = next.holds_interaction();
                if holds_after && !stores && !key.state.holds_interaction() {
                    errors.push(format!(
                        "{} + {} enters {} without an interaction ID",
                        key.state,
                        key.signal.type_name(),
                        next
                    ));
                }
                if !holds_after
                    && key.state.holds_interaction()
                    && !transition.actions.contains(&Action::ClearInteractionId)
                {
                    errors.push(format!(
                        "{} + {} leaves {} without clearing the interaction ID",
                        key.state,
                        key.signal.type_name(),
                        key.state
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort();
            Err(errors)
        }
    }
}

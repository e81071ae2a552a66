//! State machine executor
//!
//! Looks up the transition for the current state and signal, runs its
//! actions against the collaborator ports, commits the next state and then
//! publishes the transition's events. One transition runs at a time per
//! machine; signals that arrive meanwhile queue on a FIFO async mutex.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::actions::{execute_action, TransitionContext};
use crate::adapters::VideoSessionPorts;
use crate::config::Config;
use crate::errors::{Result, SessionError};
use crate::observers::{ObserverId, ObserverKind, ObserverRegistry};
use crate::session_store::{SessionHistory, TransitionRecord};
use crate::state_table::{
    self, Action, EventTemplate, InteractionId, MachineId, SessionState, Signal, StateTable,
};
use crate::types::{SessionEvent, SessionSnapshot};

/// Outcome of one `handle_signal` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSignalResult {
    pub old_state: SessionState,
    pub next_state: SessionState,
    /// False when the signal had no transition in `old_state`
    pub transition_applied: bool,
    pub actions_executed: Vec<Action>,
    pub events_published: Vec<EventTemplate>,
}

impl ProcessSignalResult {
    fn ignored(state: SessionState) -> Self {
        Self {
            old_state: state,
            next_state: state,
            transition_applied: false,
            actions_executed: vec![],
            events_published: vec![],
        }
    }
}

/// Video session lifecycle state machine
pub struct StateMachine {
    machine_id: MachineId,
    table: Arc<StateTable>,
    ports: Arc<dyn VideoSessionPorts>,
    observers: ObserverRegistry,

    /// Held for the whole read-decide-await-write sequence of a transition
    transition_lock: tokio::sync::Mutex<()>,

    /// Committed state; only written while `transition_lock` is held
    current: RwLock<SessionSnapshot>,

    history: Mutex<SessionHistory>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl StateMachine {
    /// Create a machine with the default configuration
    pub fn new(ports: Arc<dyn VideoSessionPorts>) -> Self {
        let config = Config::default();
        Self::assemble(ports, &config, state_table::DEFAULT_TABLE.clone())
    }

    /// Create a machine, building the table for the configured stop policy
    pub fn with_config(ports: Arc<dyn VideoSessionPorts>, config: Config) -> Result<Self> {
        config.validate()?;
        let table = state_table::table_for(config.silent_stop)?;
        Ok(Self::assemble(ports, &config, table))
    }

    /// Create a machine that runs a caller-supplied table
    pub fn with_table(
        ports: Arc<dyn VideoSessionPorts>,
        config: Config,
        table: Arc<StateTable>,
    ) -> Result<Self> {
        config.validate()?;
        table.validate().map_err(SessionError::InvalidTable)?;
        Ok(Self::assemble(ports, &config, table))
    }

    fn assemble(ports: Arc<dyn VideoSessionPorts>, config: &Config, table: Arc<StateTable>) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        let machine_id = MachineId::new();
        debug!("Created state machine {}", machine_id);

        Self {
            machine_id,
            table,
            ports,
            observers: ObserverRegistry::new(),
            transition_lock: tokio::sync::Mutex::new(()),
            current: RwLock::new(SessionSnapshot::default()),
            history: Mutex::new(SessionHistory::new(config.history.clone())),
            event_tx,
        }
    }

    pub fn machine_id(&self) -> &MachineId {
        &self.machine_id
    }

    /// Current committed state. Never waits for an in-flight transition.
    pub fn state(&self) -> SessionState {
        self.current.read().state
    }

    /// Interaction ID of the current session, if one is tracked
    pub fn interaction_id(&self) -> Option<InteractionId> {
        self.current.read().interaction_id.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.current.read().clone()
    }

    pub fn table(&self) -> &Arc<StateTable> {
        &self.table
    }

    /// Register a callback for the edge entering `VIDEO_SESSION_ACTIVE`
    pub fn on_session_started<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&InteractionId) + Send + Sync + 'static,
    {
        self.observers.register(ObserverKind::SessionStarted, callback)
    }

    /// Register a callback for the edge leaving `VIDEO_SESSION_ACTIVE`
    pub fn on_session_stopped<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&InteractionId) + Send + Sync + 'static,
    {
        self.observers.register(ObserverKind::SessionStopped, callback)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Subscribe to the events published by this machine
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Recorded transitions, oldest first
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.history.lock().records()
    }

    pub fn history_snapshot(&self) -> SessionHistory {
        self.history.lock().clone()
    }

    /// Handle a signal given by its wire name and optional JSON payload.
    ///
    /// Unknown names and malformed payloads are logged and ignored like any
    /// other signal without a transition.
    pub async fn handle_named(
        &self,
        name: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<ProcessSignalResult> {
        match Signal::from_name(name, payload.as_ref()) {
            Ok(signal) => self.handle_signal(signal).await,
            Err(e) => Ok(self.ignore_invalid(&e)),
        }
    }

    /// Handle a signal.
    ///
    /// Returns an error only when a collaborator port fails; the transition
    /// is then aborted and state, interaction ID and observers are untouched.
    /// Dropping the returned future before it completes has the same effect.
    ///
    /// A signal with an invalid payload, such as a start request with an
    /// empty interaction ID, is logged and ignored.
    pub async fn handle_signal(&self, signal: Signal) -> Result<ProcessSignalResult> {
        if let Err(e) = signal.validate() {
            return Ok(self.ignore_invalid(&e));
        }

        let span = info_span!(
            "video_session",
            machine_id = %self.machine_id,
            signal = signal.type_name()
        );
        self.process_signal(signal).instrument(span).await
    }

    fn ignore_invalid(&self, error: &SessionError) -> ProcessSignalResult {
        warn!(machine_id = %self.machine_id, "Ignoring invalid signal: {}", error);
        self.history.lock().record_ignored();
        ProcessSignalResult::ignored(self.state())
    }

    async fn process_signal(&self, signal: Signal) -> Result<ProcessSignalResult> {
        let _guard = self.transition_lock.lock().await;

        let before = self.snapshot();
        let old_state = before.state;

        let Some(transition) = self.table.get(old_state, &signal) else {
            warn!("No transition for {} in state {}, ignoring", signal, old_state);
            self.history.lock().record_ignored();
            return Ok(ProcessSignalResult::ignored(old_state));
        };

        debug!("Found transition for {} in state {}: {:?}", signal, old_state, transition);

        let started = Instant::now();
        let mut ctx = TransitionContext {
            state: old_state,
            signal: &signal,
            interaction_id: before.interaction_id.clone(),
        };
        let mut actions_executed = Vec::with_capacity(transition.actions.len());

        for action in &transition.actions {
            if let Err(source) = execute_action(action, &mut ctx, self.ports.as_ref()).await {
                error!("Action {:?} failed in state {}: {}", action, old_state, source);
                self.history.lock().record_transition(TransitionRecord {
                    sequence: 0,
                    timestamp: Utc::now(),
                    from_state: old_state,
                    signal: signal.clone(),
                    to_state: None,
                    actions_executed,
                    events_published: vec![],
                    duration_ms: started.elapsed().as_millis() as u64,
                    error: Some(source.to_string()),
                });
                return Err(SessionError::Collaborator {
                    action: action.port_name().unwrap_or("internal").to_string(),
                    state: old_state,
                    source,
                });
            }
            actions_executed.push(*action);
        }

        let next_state = transition.next_state.unwrap_or(old_state);
        let after = SessionSnapshot {
            state: next_state,
            interaction_id: ctx.interaction_id,
        };
        *self.current.write() = after.clone();

        if next_state != old_state {
            info!("State transition: {} -> {} on {}", old_state, next_state, signal);
        }

        // Stop edges clear the ID before publishing; observers still get it
        let session_id = after.interaction_id.as_ref().or(before.interaction_id.as_ref());
        let mut events_published = Vec::with_capacity(transition.publish_events.len());
        for template in &transition.publish_events {
            if self.publish(*template, old_state, next_state, &signal, session_id) {
                events_published.push(*template);
            }
        }

        self.history.lock().record_transition(TransitionRecord {
            sequence: 0,
            timestamp: Utc::now(),
            from_state: old_state,
            signal: signal.clone(),
            to_state: Some(next_state),
            actions_executed: actions_executed.clone(),
            events_published: events_published.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            error: None,
        });

        Ok(ProcessSignalResult {
            old_state,
            next_state,
            transition_applied: true,
            actions_executed,
            events_published,
        })
    }

    /// Fire observers and broadcast the event for one template.
    /// Returns false if the template could not be published.
    fn publish(
        &self,
        template: EventTemplate,
        from: SessionState,
        to: SessionState,
        signal: &Signal,
        interaction_id: Option<&InteractionId>,
    ) -> bool {
        let event = match template {
            EventTemplate::StateChanged => SessionEvent::StateChanged {
                from,
                to,
                signal: signal.type_name().to_string(),
            },
            EventTemplate::MessengerReady => SessionEvent::MessengerReady,
            EventTemplate::SessionStarted | EventTemplate::SessionStopped => {
                let Some(id) = interaction_id else {
                    warn!("Cannot publish {:?} without an interaction ID", template);
                    return false;
                };
                let (kind, event) = if template == EventTemplate::SessionStarted {
                    (
                        ObserverKind::SessionStarted,
                        SessionEvent::SessionStarted { interaction_id: id.clone() },
                    )
                } else {
                    (
                        ObserverKind::SessionStopped,
                        SessionEvent::SessionStopped { interaction_id: id.clone() },
                    )
                };
                let fired = self.observers.notify(kind, id);
                debug!("Notified {} {:?} observers for interaction {}", fired, kind, id);
                event
            }
        };

        if self.event_tx.send(event).is_err() {
            debug!("No subscribers for {:?}", template);
        }
        true
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("machine_id", &self.machine_id)
            .field("current", &*self.current.read())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

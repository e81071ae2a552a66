//! Events and snapshots shared by the state machine and its consumers

use serde::Serialize;

pub use crate::state_table::types::{InteractionId, MachineId, SessionState, Signal};

/// Events published on the machine's broadcast feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The state changed
    StateChanged {
        from: SessionState,
        to: SessionState,
        signal: String,
    },
    /// The messenger finished initializing
    MessengerReady,
    /// The video session became active
    SessionStarted { interaction_id: InteractionId },
    /// The video session ended
    SessionStopped { interaction_id: InteractionId },
}

/// Point-in-time view of a machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub interaction_id: Option<InteractionId>,
}

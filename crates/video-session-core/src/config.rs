//! Configuration for video session state machines

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SessionError};
use crate::session_store::HistoryConfig;

/// What to do with `STOP_SESSION_REQUEST{sendMessage: false}` while a
/// video session is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SilentStopPolicy {
    /// Treat it like any other unmatched signal
    #[default]
    Ignore,
    /// End the session without calling the stop port
    EndLocally,
}

/// Configuration for a [`crate::StateMachine`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transition history kept per machine
    pub history: HistoryConfig,
    /// Capacity of the broadcast channel behind `subscribe()`
    pub event_channel_capacity: usize,
    pub silent_stop: SilentStopPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            event_channel_capacity: 64,
            silent_stop: SilentStopPolicy::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.event_channel_capacity == 0 {
            return Err(SessionError::config("event_channel_capacity must be greater than zero"));
        }
        if self.history.enabled && self.history.max_transitions == 0 {
            return Err(SessionError::config(
                "history.max_transitions must be greater than zero when history is enabled",
            ));
        }
        Ok(())
    }

    pub fn with_silent_stop(mut self, policy: SilentStopPolicy) -> Self {
        self.silent_stop = policy;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.history.enabled = false;
        self
    }
}

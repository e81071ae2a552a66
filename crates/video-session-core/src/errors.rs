//! Error types for the video session core

use crate::state_table::types::SessionState;

/// Error returned by a collaborator port
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for video session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Video session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A collaborator port failed while a transition was in flight.
    /// The transition was aborted and the machine state is unchanged.
    #[error("Collaborator call {action} failed in state {state}: {source}")]
    Collaborator {
        action: String,
        state: SessionState,
        #[source]
        source: PortError,
    },

    #[error("Invalid signal {signal}: {reason}")]
    InvalidSignal { signal: String, reason: String },

    #[error("Invalid state table: {}", .0.join("; "))]
    InvalidTable(Vec<String>),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SessionError {
    pub fn invalid_signal(signal: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSignal {
            signal: signal.into(),
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the error came from a collaborator and a retry may succeed
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Collaborator { .. })
    }
}

use tracing::warn;

use super::types::{Action, EventTemplate, SessionState, Signal, StateKey, StateTable, Transition};

/// Builder for assembling a [`StateTable`]
#[derive(Debug, Default)]
pub struct StateTableBuilder {
    table: StateTable,
}

impl StateTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transition. A later definition for the same key replaces the earlier one.
    pub fn add_transition(&mut self, state: SessionState, signal: Signal, transition: Transition) -> &mut Self {
        let key = StateKey::new(state, &signal);
        if self.table.insert(key, transition).is_some() {
            warn!("Transition {} + {} redefined", state, signal.type_name());
        }
        self
    }

    /// Add a pure state change with no actions
    pub fn add_state_change(
        &mut self,
        state: SessionState,
        signal: Signal,
        next_state: SessionState,
    ) -> &mut Self {
        self.add_transition(
            state,
            signal,
            Transition {
                actions: vec![],
                next_state: Some(next_state),
                publish_events: vec![EventTemplate::StateChanged],
            },
        )
    }

    /// Add a transition that runs `actions` and moves to `next_state`
    pub fn add_actions(
        &mut self,
        state: SessionState,
        signal: Signal,
        actions: Vec<Action>,
        next_state: SessionState,
        publish_events: Vec<EventTemplate>,
    ) -> &mut Self {
        self.add_transition(
            state,
            signal,
            Transition {
                actions,
                next_state: Some(next_state),
                publish_events,
            },
        )
    }

    pub fn build(self) -> StateTable {
        self.table
    }
}

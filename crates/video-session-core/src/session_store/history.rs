//! Bounded transition history for debugging and inspection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::state_table::{Action, EventTemplate, SessionState, Signal};

/// History tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Ring buffer size; oldest records are dropped first
    pub max_transitions: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_transitions: 50,
        }
    }
}

/// One applied or failed transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub from_state: SessionState,
    pub signal: Signal,
    /// `None` when the transition was aborted
    pub to_state: Option<SessionState>,
    pub actions_executed: Vec<Action>,
    pub events_published: Vec<EventTemplate>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl TransitionRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Ring buffer of transition records plus counters
#[derive(Debug, Clone)]
pub struct SessionHistory {
    config: HistoryConfig,
    records: VecDeque<TransitionRecord>,
    next_sequence: u64,
    pub total_transitions: u64,
    pub failed_transitions: u64,
    pub ignored_signals: u64,
    created_at: DateTime<Utc>,
}

impl SessionHistory {
    pub fn new(config: HistoryConfig) -> Self {
        let capacity = if config.enabled { config.max_transitions } else { 0 };
        Self {
            config,
            records: VecDeque::with_capacity(capacity),
            next_sequence: 0,
            total_transitions: 0,
            failed_transitions: 0,
            ignored_signals: 0,
            created_at: Utc::now(),
        }
    }

    /// Record a transition, assigning its sequence number
    pub fn record_transition(&mut self, mut record: TransitionRecord) {
        if record.succeeded() {
            self.total_transitions += 1;
        } else {
            self.failed_transitions += 1;
        }

        if !self.config.enabled || self.config.max_transitions == 0 {
            return;
        }

        record.sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.records.len() == self.config.max_transitions {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn record_ignored(&mut self) {
        self.ignored_signals += 1;
    }

    /// Most recent records, oldest first
    pub fn get_recent(&self, count: usize) -> Vec<TransitionRecord> {
        let skip = self.records.len().saturating_sub(count);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

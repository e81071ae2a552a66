//! Feeds JSON-lines signals into a state machine and reports the outcome
//!
//! Input, one signal per line:
//!
//! ```text
//! {"signal": "INITIALIZE_MESSENGER_REQUEST"}
//! {"signal": "START_SESSION_REQUEST", "payload": {"interactionId": "123"}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use engage_video_session_core::{InteractionId, SessionEvent, SessionState, StateMachine};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct SignalLine {
    signal: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

/// Result line written for every signal
#[derive(Debug, Serialize)]
struct SignalOutcome<'a> {
    line: usize,
    signal: &'a str,
    applied: bool,
    state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    interaction_id: Option<InteractionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventLine<'a> {
    line: usize,
    #[serde(flatten)]
    event: &'a SessionEvent,
}

/// Totals for one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub signals: usize,
    pub applied: usize,
    pub failed: usize,
    pub final_state: SessionState,
}

/// Drive `machine` with the signals read from `input`, writing one JSON line
/// per signal (and per published event) to `out`.
///
/// Malformed JSON stops the run with an error. Collaborator failures are
/// reported on the signal's line and the run continues.
pub async fn run<R, W>(machine: &StateMachine, input: R, out: &mut W) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut events = machine.subscribe();
    let mut lines = input.lines();
    let mut summary = RunSummary::default();
    let mut line_no = 0;

    while let Some(raw) = lines.next_line().await.context("reading signal input")? {
        line_no += 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parsed: SignalLine = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: not a signal object", line_no))?;
        summary.signals += 1;

        let (applied, error) = match machine.handle_named(&parsed.signal, parsed.payload).await {
            Ok(result) => (result.transition_applied, None),
            Err(e) => {
                warn!("line {}: {}", line_no, e);
                summary.failed += 1;
                (false, Some(e.to_string()))
            }
        };
        if applied {
            summary.applied += 1;
        }

        let snapshot = machine.snapshot();
        let outcome = SignalOutcome {
            line: line_no,
            signal: &parsed.signal,
            applied,
            state: snapshot.state,
            interaction_id: snapshot.interaction_id,
            error,
        };
        serde_json::to_writer(&mut *out, &outcome)?;
        writeln!(out)?;

        drain_events(&mut events, line_no, out)?;
    }

    summary.final_state = machine.state();
    out.flush()?;
    Ok(summary)
}

fn drain_events<W: Write>(
    events: &mut broadcast::Receiver<SessionEvent>,
    line: usize,
    out: &mut W,
) -> Result<()> {
    loop {
        match events.try_recv() {
            Ok(event) => {
                serde_json::to_writer(&mut *out, &EventLine { line, event: &event })?;
                writeln!(out)?;
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("Event feed lagged, {} events dropped", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
        }
    }
}

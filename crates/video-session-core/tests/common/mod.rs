#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use engage_video_session_core::{InteractionId, PortResult, VideoSessionPorts};
use parking_lot::Mutex;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Counting ports with optional latency and failure injection
#[derive(Default)]
pub struct MockPorts {
    pub initialize_messenger_calls: AtomicUsize,
    pub messenger_ready_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub started_ids: Mutex<Vec<InteractionId>>,
    pub fail_initialize: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub delay: Option<Duration>,
}

impl MockPorts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn collaborator_calls(&self) -> usize {
        self.initialize_messenger_calls.load(Ordering::SeqCst)
            + self.messenger_ready_calls.load(Ordering::SeqCst)
            + self.start_calls.load(Ordering::SeqCst)
            + self.stop_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl VideoSessionPorts for MockPorts {
    async fn initialize_messenger(&self) -> PortResult {
        self.initialize_messenger_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err("messenger unavailable".into());
        }
        Ok(())
    }

    fn on_messenger_ready(&self) {
        self.messenger_ready_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn send_start_video_session_message(&self, interaction_id: &InteractionId) -> PortResult {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_start.load(Ordering::SeqCst) {
            return Err("start message rejected".into());
        }
        self.started_ids.lock().push(interaction_id.clone());
        Ok(())
    }

    async fn stop_video_session(&self) -> PortResult {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err("stop failed".into());
        }
        Ok(())
    }
}

/// Observer counters for the started/stopped edges
#[derive(Default)]
pub struct ObserverCounts {
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    pub last_started: Mutex<Option<InteractionId>>,
    pub last_stopped: Mutex<Option<InteractionId>>,
}

impl ObserverCounts {
    pub fn attach(machine: &engage_video_session_core::StateMachine) -> Arc<Self> {
        let counts = Arc::new(Self::default());

        let started = counts.clone();
        machine.on_session_started(move |id| {
            started.started.fetch_add(1, Ordering::SeqCst);
            *started.last_started.lock() = Some(id.clone());
        });

        let stopped = counts.clone();
        machine.on_session_stopped(move |id| {
            stopped.stopped.fetch_add(1, Ordering::SeqCst);
            *stopped.last_stopped.lock() = Some(id.clone());
        });

        counts
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

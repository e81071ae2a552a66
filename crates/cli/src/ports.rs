use async_trait::async_trait;
use engage_video_session_core::{InteractionId, PortResult, VideoSessionPorts};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

use crate::config::PortsConfig;

/// Stand-in collaborators that log each call
#[derive(Debug, Clone, Default)]
pub struct LoggingPorts {
    delay: Duration,
    fail: HashSet<String>,
}

impl LoggingPorts {
    pub fn new(config: &PortsConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            fail: config.fail.iter().cloned().collect(),
        }
    }

    async fn call(&self, port: &str) -> PortResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.contains(port) {
            return Err(format!("{} failed (configured to fail)", port).into());
        }
        Ok(())
    }
}

#[async_trait]
impl VideoSessionPorts for LoggingPorts {
    async fn initialize_messenger(&self) -> PortResult {
        info!(port = "initialize_messenger", "Initializing messenger");
        self.call("initialize_messenger").await
    }

    fn on_messenger_ready(&self) {
        info!(port = "on_messenger_ready", "Messenger ready");
    }

    async fn send_start_video_session_message(&self, interaction_id: &InteractionId) -> PortResult {
        info!(
            port = "send_start_video_session_message",
            interaction_id = %interaction_id,
            "Sending start video session message"
        );
        self.call("send_start_video_session_message").await
    }

    async fn stop_video_session(&self) -> PortResult {
        info!(port = "stop_video_session", "Stopping video session");
        self.call("stop_video_session").await
    }
}

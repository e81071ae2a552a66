//! Collaborator ports
//!
//! The state machine never talks to the messenger or the video service
//! directly. Everything with a side effect goes through [`VideoSessionPorts`],
//! supplied once when the machine is constructed.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

use crate::errors::PortError;
use crate::state_table::types::InteractionId;

pub type PortResult = std::result::Result<(), PortError>;

/// Side-effecting operations owned outside the state machine
#[async_trait]
pub trait VideoSessionPorts: Send + Sync {
    /// Bring up the messaging channel
    async fn initialize_messenger(&self) -> PortResult;

    /// Synchronous notification that the messenger is usable
    fn on_messenger_ready(&self);

    /// Ask the video service to start a session for `interaction_id`
    async fn send_start_video_session_message(&self, interaction_id: &InteractionId) -> PortResult;

    /// Ask the video service to end the active session
    async fn stop_video_session(&self) -> PortResult;
}

type AsyncPort = Arc<dyn Fn() -> BoxFuture<'static, PortResult> + Send + Sync>;
type AsyncIdPort = Arc<dyn Fn(InteractionId) -> BoxFuture<'static, PortResult> + Send + Sync>;
type NotifyPort = Arc<dyn Fn() + Send + Sync>;

/// Ports assembled from closures.
///
/// Unset ports succeed immediately without doing anything.
///
/// ```
/// use engage_video_session_core::FnPorts;
///
/// let ports = FnPorts::new()
///     .with_initialize_messenger(|| async { Ok(()) })
///     .with_on_messenger_ready(|| println!("messenger ready"))
///     .with_send_start_video_session_message(|id| async move {
///         println!("starting {}", id);
///         Ok(())
///     });
/// ```
#[derive(Clone, Default)]
pub struct FnPorts {
    initialize_messenger: Option<AsyncPort>,
    on_messenger_ready: Option<NotifyPort>,
    send_start_video_session_message: Option<AsyncIdPort>,
    stop_video_session: Option<AsyncPort>,
}

impl FnPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initialize_messenger<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PortResult> + Send + 'static,
    {
        self.initialize_messenger = Some(Arc::new(move || f().boxed()));
        self
    }

    pub fn with_on_messenger_ready<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_messenger_ready = Some(Arc::new(f));
        self
    }

    pub fn with_send_start_video_session_message<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(InteractionId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PortResult> + Send + 'static,
    {
        self.send_start_video_session_message = Some(Arc::new(move |id| f(id).boxed()));
        self
    }

    pub fn with_stop_video_session<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PortResult> + Send + 'static,
    {
        self.stop_video_session = Some(Arc::new(move || f().boxed()));
        self
    }
}

impl std::fmt::Debug for FnPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPorts")
            .field("initialize_messenger", &self.initialize_messenger.is_some())
            .field("on_messenger_ready", &self.on_messenger_ready.is_some())
            .field(
                "send_start_video_session_message",
                &self.send_start_video_session_message.is_some(),
            )
            .field("stop_video_session", &self.stop_video_session.is_some())
            .finish()
    }
}

#[async_trait]
impl VideoSessionPorts for FnPorts {
    async fn initialize_messenger(&self) -> PortResult {
        match &self.initialize_messenger {
            Some(port) => port().await,
            None => Ok(()),
        }
    }

    fn on_messenger_ready(&self) {
        if let Some(port) = &self.on_messenger_ready {
            port();
        }
    }

    async fn send_start_video_session_message(&self, interaction_id: &InteractionId) -> PortResult {
        match &self.send_start_video_session_message {
            Some(port) => port(interaction_id.clone()).await,
            None => Ok(()),
        }
    }

    async fn stop_video_session(&self) -> PortResult {
        match &self.stop_video_session {
            Some(port) => port().await,
            None => Ok(()),
        }
    }
}

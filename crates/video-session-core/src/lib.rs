//! # engage-video-session-core
//!
//! State table-based lifecycle for a video session that rides on top of a
//! messaging channel. The messenger must be initialized before a session can
//! start, a started session only becomes active once the precondition is
//! fulfilled, and stopping it hands control back to the messenger.
//!
//! ```text
//! IDLE --INITIALIZE_MESSENGER_REQUEST--> MESSENGER_INITIALIZED
//! MESSENGER_INITIALIZED --START_SESSION_REQUEST--> WAITING_FOR_PRECONDITION
//! WAITING_FOR_PRECONDITION --PRECONDITION_FULFILLED--> VIDEO_SESSION_ACTIVE
//! VIDEO_SESSION_ACTIVE --STOP_SESSION_REQUEST--> MESSENGER_INITIALIZED
//! ```
//!
//! Every other (state, signal) pair is logged and ignored.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use engage_video_session_core::{FnPorts, SessionState, Signal, StateMachine};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let ports = FnPorts::new().with_send_start_video_session_message(|id| async move {
//!     println!("start video for {}", id);
//!     Ok(())
//! });
//! let machine = StateMachine::new(Arc::new(ports));
//! machine.on_session_started(|id| println!("session {} is live", id));
//!
//! machine.handle_signal(Signal::InitializeMessengerRequest).await?;
//! machine.handle_signal(Signal::start("123")).await?;
//! machine.handle_signal(Signal::PreconditionFulfilled).await?;
//! assert_eq!(machine.state(), SessionState::VideoSessionActive);
//! # Ok::<(), engage_video_session_core::SessionError>(())
//! # }).unwrap();
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod errors;
pub mod observers;
pub mod session_store;
pub mod state_machine;
pub mod state_table;
pub mod types;

pub use adapters::{FnPorts, PortResult, VideoSessionPorts};
pub use config::{Config, SilentStopPolicy};
pub use errors::{PortError, Result, SessionError};
pub use observers::{ObserverId, ObserverKind};
pub use session_store::{HistoryConfig, SessionHistory, TransitionRecord};
pub use state_machine::{ProcessSignalResult, StateMachine};
pub use state_table::{
    Action, EventTemplate, InteractionId, MachineId, SessionState, Signal, StateTable,
    StateTableBuilder,
};
pub use types::{SessionEvent, SessionSnapshot};

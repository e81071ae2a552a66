pub mod executor;
pub mod actions;

pub use executor::{StateMachine, ProcessSignalResult};

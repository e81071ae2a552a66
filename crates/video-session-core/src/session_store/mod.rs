pub mod history;

pub use history::{HistoryConfig, SessionHistory, TransitionRecord};

pub mod types;
pub mod builder;
pub mod tables;

pub use types::*;
pub use builder::StateTableBuilder;

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::config::SilentStopPolicy;
use crate::errors::{Result, SessionError};

/// The default video session table, shared by machines built with the default policy
pub static DEFAULT_TABLE: Lazy<Arc<StateTable>> = Lazy::new(build_default_table);

fn build_default_table() -> Arc<StateTable> {
    match build_table(SilentStopPolicy::default()) {
        Ok(table) => Arc::new(table),
        Err(e) => panic!("Invalid default video session table: {}", e),
    }
}

/// Build and validate the video session table for a stop policy
pub fn build_table(silent_stop: SilentStopPolicy) -> Result<StateTable> {
    let mut builder = StateTableBuilder::new();
    tables::add_video_session_transitions(&mut builder, silent_stop);
    let table = builder.build();

    if let Err(errors) = table.validate() {
        tracing::error!("Video session table validation failed: {:?}", errors);
        return Err(SessionError::InvalidTable(errors));
    }

    tracing::debug!(
        "Built video session table with {} transitions ({:?} silent stop)",
        table.transition_count(),
        silent_stop
    );
    Ok(table)
}

/// Table for a stop policy, reusing [`DEFAULT_TABLE`] when possible
pub fn table_for(silent_stop: SilentStopPolicy) -> Result<Arc<StateTable>> {
    if silent_stop == SilentStopPolicy::default() {
        Ok(DEFAULT_TABLE.clone())
    } else {
        build_table(silent_stop).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_the_validated_default_build() {
        let built = build_table(SilentStopPolicy::default()).unwrap();

        assert!(DEFAULT_TABLE.validate().is_ok());
        assert_eq!(DEFAULT_TABLE.transition_count(), built.transition_count());
        for (key, _) in built.iter() {
            assert!(DEFAULT_TABLE.has_transition(key.state, &key.signal));
        }

        let shared = table_for(SilentStopPolicy::default()).unwrap();
        assert!(Arc::ptr_eq(&shared, &*DEFAULT_TABLE));
        let end_locally = table_for(SilentStopPolicy::EndLocally).unwrap();
        assert!(!Arc::ptr_eq(&end_locally, &*DEFAULT_TABLE));
    }
}

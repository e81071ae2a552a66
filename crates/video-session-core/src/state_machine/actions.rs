use tracing::{debug, info};

use crate::adapters::VideoSessionPorts;
use crate::errors::PortError;
use crate::state_table::{Action, InteractionId, SessionState, Signal};

/// Staged view of the session while a transition runs.
///
/// Nothing here is visible outside the executor until every action has
/// succeeded and the transition is committed.
#[derive(Debug)]
pub struct TransitionContext<'a> {
    pub state: SessionState,
    pub signal: &'a Signal,
    pub interaction_id: Option<InteractionId>,
}

/// Execute an action from the state table
pub async fn execute_action(
    action: &Action,
    ctx: &mut TransitionContext<'_>,
    ports: &dyn VideoSessionPorts,
) -> Result<(), PortError> {
    debug!("Executing action: {:?}", action);

    match action {
        Action::InitializeMessenger => {
            info!("Initializing messenger");
            ports.initialize_messenger().await?;
        }
        Action::NotifyMessengerReady => {
            ports.on_messenger_ready();
        }
        Action::StoreInteractionId => {
            let id = ctx
                .signal
                .interaction_id()
                .cloned()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| format!("{} carries no interaction ID", ctx.signal.type_name()))?;
            debug!("Tracking interaction {}", id);
            ctx.interaction_id = Some(id);
        }
        Action::ClearInteractionId => {
            if let Some(id) = ctx.interaction_id.take() {
                debug!("Released interaction {}", id);
            }
        }
        Action::SendStartVideoSessionMessage => {
            let id = ctx
                .interaction_id
                .as_ref()
                .ok_or_else(|| format!("no interaction ID tracked in state {}", ctx.state))?;
            info!("Sending start video session message for interaction {}", id);
            ports.send_start_video_session_message(id).await?;
        }
        Action::StopVideoSession => {
            info!(
                "Stopping video session for interaction {}",
                ctx.interaction_id.as_ref().map(InteractionId::as_str).unwrap_or("<none>")
            );
            ports.stop_video_session().await?;
        }
    }

    Ok(())
}

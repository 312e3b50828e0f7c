use crate::error::NegotiationError;
use crate::session::{Step, StepDone, StepOutcome};
use crate::transport::NegotiationConnection;
use anyhow::Result;
use meshmeet_core::ParticipantId;
use std::sync::Arc;

/// Carries out one [`Step`] against the connection.
///
/// Runs outside the room loop; the outcome is posted back as a
/// `TransportEvent::StepFinished` so other room events are never blocked.
pub async fn run_step(
    connection: Arc<dyn NegotiationConnection>,
    peer: ParticipantId,
    step: Step,
) -> StepOutcome {
    let name = step.name();
    let result = execute(connection.as_ref(), step)
        .await
        .map_err(|e| NegotiationError::StepFailed {
            peer,
            step: name,
            reason: format!("{e:#}"),
        });

    StepOutcome { step: name, result }
}

async fn execute(connection: &dyn NegotiationConnection, step: Step) -> Result<StepDone> {
    match step {
        Step::CreateOffer => {
            let offer = connection.create_offer().await?;
            connection.set_local_description(offer.clone()).await?;
            Ok(StepDone::LocalDescription(offer))
        }
        Step::ApplyRemote(desc) => {
            let sdp_type = desc.sdp_type;
            connection.set_remote_description(desc).await?;
            Ok(StepDone::RemoteApplied(sdp_type))
        }
        Step::CreateAnswer => {
            let answer = connection.create_answer().await?;
            connection.set_local_description(answer.clone()).await?;
            Ok(StepDone::LocalDescription(answer))
        }
        Step::AddCandidate(candidate) => {
            connection.add_ice_candidate(candidate).await?;
            Ok(StepDone::CandidateAdded)
        }
    }
}

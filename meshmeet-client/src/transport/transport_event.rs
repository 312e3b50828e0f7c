use crate::media::RemoteTrack;
use crate::session::{SessionTag, StepOutcome};
use meshmeet_core::IceCandidate;
use serde::Serialize;

/// ICE/DTLS level state reported by the connection backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Everything a peer connection reports back to the room loop.
///
/// Events carry the [`SessionTag`] of the session that produced them, so
/// events from a torn-down session are recognised and dropped.
#[derive(Debug)]
pub enum TransportEvent {
    CandidateGenerated(SessionTag, IceCandidate),
    TrackReceived(SessionTag, RemoteTrack),
    StateChanged(SessionTag, PeerConnectionState),
    StepFinished(SessionTag, StepOutcome),
}

impl TransportEvent {
    pub fn tag(&self) -> &SessionTag {
        match self {
            TransportEvent::CandidateGenerated(tag, _)
            | TransportEvent::TrackReceived(tag, _)
            | TransportEvent::StateChanged(tag, _)
            | TransportEvent::StepFinished(tag, _) => tag,
        }
    }
}

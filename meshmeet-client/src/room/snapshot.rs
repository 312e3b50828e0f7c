use crate::session::{NegotiationState, PeerSession, Role};
use crate::transport::PeerConnectionState;
use meshmeet_core::{ParticipantId, TrackKind};
use serde::Serialize;

/// Read-only view of the room at one point in the event loop.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub local_id: ParticipantId,
    pub participants: Vec<ParticipantId>,
    pub count: usize,
    /// Sorted by peer id.
    pub sessions: Vec<SessionSnapshot>,
}

impl RoomSnapshot {
    pub fn session(&self, peer: &ParticipantId) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| &s.peer == peer)
    }

    pub fn state_of(&self, peer: &ParticipantId) -> Option<NegotiationState> {
        self.session(peer).map(|s| s.state)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub peer: ParticipantId,
    pub epoch: u64,
    pub role: Role,
    pub state: NegotiationState,
    pub connection_state: PeerConnectionState,
    pub queued_candidates: usize,
    /// Steps waiting behind the one running against the connection.
    pub queued_steps: usize,
    pub stalled: bool,
    pub last_error: Option<String>,
    pub remote_tracks: Vec<TrackKind>,
}

impl From<&PeerSession> for SessionSnapshot {
    fn from(session: &PeerSession) -> Self {
        let negotiation = session.negotiation();
        Self {
            peer: session.peer().clone(),
            epoch: session.tag().epoch,
            role: negotiation.role(),
            state: negotiation.state(),
            connection_state: session.connection_state(),
            queued_candidates: negotiation.queued_candidates(),
            queued_steps: session.queued_steps(),
            stalled: negotiation.is_stalled(),
            last_error: negotiation.last_error().map(ToString::to_string),
            remote_tracks: session.remote_tracks().iter().map(|t| t.kind).collect(),
        }
    }
}

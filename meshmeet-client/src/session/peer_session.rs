use crate::media::RemoteTrack;
use crate::session::{Negotiation, Role, Step};
use crate::transport::{NegotiationConnection, PeerConnectionState};
use meshmeet_core::ParticipantId;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Identifies one incarnation of a peer session.
///
/// A peer that leaves and rejoins gets a new epoch, so late events from the
/// old connection never touch the new session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTag {
    pub peer: ParticipantId,
    pub epoch: u64,
}

impl SessionTag {
    pub fn new(peer: ParticipantId, epoch: u64) -> Self {
        Self { peer, epoch }
    }
}

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.peer, self.epoch)
    }
}

/// Steps against one connection run strictly one after another, in the
/// order they were queued, so candidates are applied in arrival order.
#[derive(Debug, Default)]
struct StepQueue {
    running: bool,
    queued: VecDeque<Step>,
}

impl StepQueue {
    fn queue(&mut self, step: Step) -> Option<Step> {
        if self.running {
            self.queued.push_back(step);
            return None;
        }
        self.running = true;
        Some(step)
    }

    fn done(&mut self) -> Option<Step> {
        let next = self.queued.pop_front();
        self.running = next.is_some();
        next
    }
}

/// Everything the client holds for one remote participant.
pub struct PeerSession {
    tag: SessionTag,
    connection: Arc<dyn NegotiationConnection>,
    negotiation: Negotiation,
    connection_state: PeerConnectionState,
    remote_tracks: Vec<RemoteTrack>,
    steps: StepQueue,
}

impl PeerSession {
    pub fn new(tag: SessionTag, role: Role, connection: Arc<dyn NegotiationConnection>) -> Self {
        Self {
            negotiation: Negotiation::new(tag.peer.clone(), role),
            tag,
            connection,
            connection_state: PeerConnectionState::New,
            remote_tracks: Vec::new(),
            steps: StepQueue::default(),
        }
    }

    pub fn tag(&self) -> &SessionTag {
        &self.tag
    }

    pub fn peer(&self) -> &ParticipantId {
        &self.tag.peer
    }

    pub fn connection(&self) -> Arc<dyn NegotiationConnection> {
        Arc::clone(&self.connection)
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    pub fn negotiation_mut(&mut self) -> &mut Negotiation {
        &mut self.negotiation
    }

    pub fn connection_state(&self) -> PeerConnectionState {
        self.connection_state
    }

    pub fn set_connection_state(&mut self, state: PeerConnectionState) {
        self.connection_state = state;
    }

    pub fn add_remote_track(&mut self, track: RemoteTrack) {
        self.remote_tracks.push(track);
    }

    pub fn remote_tracks(&self) -> &[RemoteTrack] {
        &self.remote_tracks
    }

    /// Returns the step to start now, or `None` when it has to wait for the
    /// one already running against this connection.
    pub fn queue_step(&mut self, step: Step) -> Option<Step> {
        self.steps.queue(step)
    }

    /// Marks the running step finished and hands out the next queued one.
    pub fn step_done(&mut self) -> Option<Step> {
        self.steps.done()
    }

    pub fn queued_steps(&self) -> usize {
        self.steps.queued.len()
    }

    /// Moves the session to `closed` and releases the connection.
    pub async fn close(&mut self) {
        self.negotiation.close();
        self.steps.queued.clear();
        if let Err(e) = self.connection.close().await {
            warn!("Failed to close connection for {}: {:#}", self.tag, e);
        }
    }
}

impl fmt::Debug for PeerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerSession")
            .field("tag", &self.tag)
            .field("negotiation", &self.negotiation)
            .field("connection_state", &self.connection_state)
            .field("remote_tracks", &self.remote_tracks)
            .field("steps", &self.steps)
            .finish()
    }
}

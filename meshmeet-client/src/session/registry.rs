use crate::error::NegotiationError;
use crate::media::LocalMedia;
use crate::session::{PeerSession, Role, SessionTag};
use crate::transport::{ConnectionFactory, TransportEvent};
use meshmeet_core::ParticipantId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns at most one [`PeerSession`] per remote participant.
///
/// Only the room loop touches the registry and it awaits construction
/// inline, so two messages from the same unknown peer can never both
/// construct a session.
pub struct PeerSessionRegistry {
    sessions: HashMap<ParticipantId, PeerSession>,
    factory: Arc<dyn ConnectionFactory>,
    local_media: LocalMedia,
    events_tx: mpsc::Sender<TransportEvent>,
    next_epoch: u64,
}

impl PeerSessionRegistry {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        local_media: LocalMedia,
        events_tx: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            factory,
            local_media,
            events_tx,
            next_epoch: 0,
        }
    }

    /// Returns the session for `peer`, constructing it first if needed.
    /// The flag is `true` when this call constructed it.
    pub async fn get_or_create(
        &mut self,
        peer: &ParticipantId,
        role: Role,
    ) -> Result<(&mut PeerSession, bool), NegotiationError> {
        let created = if self.sessions.contains_key(peer) {
            false
        } else {
            let session = self.construct(peer, role).await?;
            self.sessions.insert(peer.clone(), session);
            true
        };

        let session = self
            .sessions
            .get_mut(peer)
            .ok_or_else(|| NegotiationError::SessionClosed(peer.clone()))?;
        Ok((session, created))
    }

    async fn construct(
        &mut self,
        peer: &ParticipantId,
        role: Role,
    ) -> Result<PeerSession, NegotiationError> {
        let tag = SessionTag::new(peer.clone(), self.next_epoch);
        self.next_epoch += 1;

        let connection = self
            .factory
            .create(tag.clone(), self.events_tx.clone())
            .await
            .map_err(|e| NegotiationError::ConnectionSetup {
                peer: peer.clone(),
                reason: format!("{e:#}"),
            })?;

        for track in self.local_media.tracks() {
            if let Err(e) = connection.add_local_track(track).await {
                if let Err(close_err) = connection.close().await {
                    warn!("Failed to close half-built connection for {}: {:#}", tag, close_err);
                }
                return Err(NegotiationError::ConnectionSetup {
                    peer: peer.clone(),
                    reason: format!("attaching {} track: {e:#}", track.kind()),
                });
            }
        }

        info!("Created {:?} session {}", role, tag);
        Ok(PeerSession::new(tag, role, connection))
    }

    /// Closes and drops the session for `peer`. Absent peers are a no-op.
    pub async fn remove(&mut self, peer: &ParticipantId) -> Option<PeerSession> {
        let Some(mut session) = self.sessions.remove(peer) else {
            debug!("No session to remove for {}", peer);
            return None;
        };
        session.close().await;
        info!("Removed session {}", session.tag());
        Some(session)
    }

    /// Closes every session, in no particular order.
    pub async fn clear(&mut self) -> Vec<PeerSession> {
        let mut closed = Vec::with_capacity(self.sessions.len());
        for (_, mut session) in self.sessions.drain() {
            session.close().await;
            closed.push(session);
        }
        closed
    }

    /// `true` when `tag` names the live incarnation of its peer's session.
    pub fn is_current(&self, tag: &SessionTag) -> bool {
        self.sessions
            .get(&tag.peer)
            .is_some_and(|s| s.tag().epoch == tag.epoch)
    }

    pub fn get(&self, peer: &ParticipantId) -> Option<&PeerSession> {
        self.sessions.get(peer)
    }

    pub fn get_mut(&mut self, peer: &ParticipantId) -> Option<&mut PeerSession> {
        self.sessions.get_mut(peer)
    }

    pub fn contains(&self, peer: &ParticipantId) -> bool {
        self.sessions.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &PeerSession> {
        self.sessions.values()
    }
}

use crate::error::RelayError;
use dashmap::DashMap;
use meshmeet_core::{ClientFrame, MeetingId, ParticipantId, ServerFrame, SignalMessage};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One WebSocket connection to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Membership {
    meeting_id: MeetingId,
    participant_id: ParticipantId,
}

struct HubInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<ServerFrame>>,
    memberships: DashMap<ConnectionId, Membership>,
    /// Members in join order. A meeting exists only while it has members.
    meetings: DashMap<MeetingId, Vec<ConnectionId>>,
}

/// Meeting-scoped broadcast hub.
///
/// The relay never looks inside signaling payloads; addressing is left to
/// the participants.
#[derive(Clone)]
pub struct RelayHub {
    inner: Arc<HubInner>,
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                connections: DashMap::new(),
                memberships: DashMap::new(),
                meetings: DashMap::new(),
            }),
        }
    }

    /// Frames for the new connection arrive on the returned receiver.
    pub fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerFrame>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.connections.insert(id, tx);
        debug!("Registered connection {}", id);
        (id, rx)
    }

    pub fn handle_frame(&self, conn: &ConnectionId, frame: ClientFrame) -> Result<(), RelayError> {
        if !self.inner.connections.contains_key(conn) {
            return Err(RelayError::UnknownConnection(*conn));
        }

        match frame {
            ClientFrame::Join {
                meeting_id,
                participant_id,
            } => self.join(conn, meeting_id, participant_id),
            ClientFrame::Leave { meeting_id, .. } => {
                let joined = self
                    .membership_of(conn)
                    .ok_or(RelayError::NotJoined("leave"))?;
                if joined.meeting_id != meeting_id {
                    return Err(RelayError::WrongMeeting {
                        joined: joined.meeting_id,
                        requested: meeting_id,
                    });
                }
                self.leave(conn);
                Ok(())
            }
            ClientFrame::Signal(msg) => self.signal(conn, msg),
        }
    }

    /// Implicit leave for a closed socket.
    pub fn disconnect(&self, conn: &ConnectionId) {
        self.leave(conn);
        self.inner.connections.remove(conn);
        debug!("Connection {} dropped", conn);
    }

    pub fn send_error(&self, conn: &ConnectionId, message: impl Into<String>) {
        self.send_to(
            conn,
            ServerFrame::Error {
                message: message.into(),
            },
        );
    }

    pub fn member_count(&self, meeting_id: &MeetingId) -> usize {
        self.inner.meetings.get(meeting_id).map_or(0, |m| m.len())
    }

    pub fn meeting_count(&self) -> usize {
        self.inner.meetings.len()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Participant ids are unique within a meeting; a second connection
    /// claiming a present id is turned away.
    fn join(
        &self,
        conn: &ConnectionId,
        meeting_id: MeetingId,
        participant_id: ParticipantId,
    ) -> Result<(), RelayError> {
        let taken = self
            .inner
            .meetings
            .get(&meeting_id)
            .is_some_and(|members| self.held_by_other(&members, conn, &participant_id));
        if taken {
            return Err(RelayError::ParticipantTaken {
                meeting_id,
                participant_id,
            });
        }

        if let Some(previous) = self.membership_of(conn) {
            if previous.meeting_id != meeting_id {
                info!(
                    "{} moves from meeting {} to {}",
                    previous.participant_id, previous.meeting_id, meeting_id
                );
                self.leave(conn);
            }
        }

        let mut members = self.inner.meetings.entry(meeting_id.clone()).or_default();
        // A concurrent join may have claimed the id since the check above.
        if self.held_by_other(&members, conn, &participant_id) {
            return Err(RelayError::ParticipantTaken {
                meeting_id,
                participant_id,
            });
        }
        self.inner.memberships.insert(
            *conn,
            Membership {
                meeting_id: meeting_id.clone(),
                participant_id: participant_id.clone(),
            },
        );
        if !members.contains(conn) {
            members.push(*conn);
        }
        let count = members.len();
        info!("{} joined meeting {} ({} present)", participant_id, meeting_id, count);

        let frame = ServerFrame::UserJoined {
            participant_id,
            participants: count,
        };
        for member in members.iter() {
            self.send_to(member, frame.clone());
        }
        Ok(())
    }

    fn held_by_other(
        &self,
        members: &[ConnectionId],
        conn: &ConnectionId,
        participant_id: &ParticipantId,
    ) -> bool {
        members.iter().filter(|m| *m != conn).any(|m| {
            self.inner
                .memberships
                .get(m)
                .is_some_and(|joined| &joined.participant_id == participant_id)
        })
    }

    fn leave(&self, conn: &ConnectionId) {
        let Some((_, membership)) = self.inner.memberships.remove(conn) else {
            return;
        };
        let Membership {
            meeting_id,
            participant_id,
        } = membership;

        if let Some(mut members) = self.inner.meetings.get_mut(&meeting_id) {
            members.retain(|m| m != conn);
            let count = members.len();
            info!("{} left meeting {} ({} present)", participant_id, meeting_id, count);

            let frame = ServerFrame::UserLeft {
                participant_id,
                participants: count,
            };
            for member in members.iter() {
                self.send_to(member, frame.clone());
            }
        }

        if self
            .inner
            .meetings
            .remove_if(&meeting_id, |_, members| members.is_empty())
            .is_some()
        {
            debug!("Meeting {} is empty and was dropped", meeting_id);
        }
    }

    fn signal(&self, conn: &ConnectionId, msg: SignalMessage) -> Result<(), RelayError> {
        let joined = self
            .membership_of(conn)
            .ok_or(RelayError::NotJoined("signal"))?;
        if joined.meeting_id != msg.meeting_id {
            return Err(RelayError::WrongMeeting {
                joined: joined.meeting_id,
                requested: msg.meeting_id,
            });
        }

        debug!(
            "Relaying {} {} -> {} in {}",
            msg.payload.kind(),
            msg.from,
            msg.to,
            msg.meeting_id
        );

        if let Some(members) = self.inner.meetings.get(&joined.meeting_id) {
            let frame = ServerFrame::Signal(msg);
            for member in members.iter().filter(|m| *m != conn) {
                self.send_to(member, frame.clone());
            }
        }
        Ok(())
    }

    fn membership_of(&self, conn: &ConnectionId) -> Option<Membership> {
        self.inner.memberships.get(conn).map(|m| m.value().clone())
    }

    fn send_to(&self, conn: &ConnectionId, frame: ServerFrame) {
        let Some(tx) = self.inner.connections.get(conn) else {
            warn!("Attempted to send to unknown connection {}", conn);
            return;
        };
        if tx.send(frame).is_err() {
            warn!("Connection {} is closing; frame dropped", conn);
        }
    }
}

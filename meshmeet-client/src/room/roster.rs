use meshmeet_core::ParticipantId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterChange {
    /// The relay echoed our own join back.
    SelfJoined,
    PeerJoined(ParticipantId),
    AlreadyPresent(ParticipantId),
}

/// Participants visible to the local user, in the order they appeared,
/// plus the count last reported by the relay.
///
/// The local participant is never part of the visible list.
#[derive(Debug, Clone)]
pub struct RoomRoster {
    local_id: ParticipantId,
    participants: Vec<ParticipantId>,
    count: usize,
}

impl RoomRoster {
    pub fn new(local_id: ParticipantId) -> Self {
        Self {
            local_id,
            participants: Vec::new(),
            count: 0,
        }
    }

    /// The count is taken from the notice even when it is our own echo.
    pub fn on_join(&mut self, participant: &ParticipantId, count: usize) -> RosterChange {
        self.count = count;

        if participant == &self.local_id {
            return RosterChange::SelfJoined;
        }
        if self.participants.contains(participant) {
            return RosterChange::AlreadyPresent(participant.clone());
        }
        self.participants.push(participant.clone());
        RosterChange::PeerJoined(participant.clone())
    }

    /// Returns whether the participant was visible.
    pub fn on_leave(&mut self, participant: &ParticipantId, count: usize) -> bool {
        self.count = count;
        let before = self.participants.len();
        self.participants.retain(|p| p != participant);
        before != self.participants.len()
    }

    /// Records a peer learned about from signaling rather than a join notice,
    /// i.e. someone who was already in the room when we joined.
    pub fn observe(&mut self, participant: &ParticipantId) -> bool {
        if participant == &self.local_id || self.participants.contains(participant) {
            return false;
        }
        self.participants.push(participant.clone());
        true
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }
}

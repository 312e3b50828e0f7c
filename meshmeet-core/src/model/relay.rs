use crate::model::meeting::MeetingId;
use crate::model::participant::ParticipantId;
use crate::model::signaling::SignalMessage;
use serde::{Deserialize, Serialize};

/// Frames a participant sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    Join {
        meeting_id: MeetingId,
        participant_id: ParticipantId,
    },
    Leave {
        meeting_id: MeetingId,
        participant_id: ParticipantId,
    },
    Signal(SignalMessage),
}

/// Frames the relay pushes to participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Broadcast to every member, the joiner included.
    UserJoined {
        participant_id: ParticipantId,
        participants: usize,
    },
    /// Broadcast to the members that remain.
    UserLeft {
        participant_id: ParticipantId,
        participants: usize,
    },
    Signal(SignalMessage),
    Error {
        message: String,
    },
}

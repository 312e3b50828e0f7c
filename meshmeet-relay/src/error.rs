use crate::hub::ConnectionId;
use meshmeet_core::{MeetingId, ParticipantId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    #[error("cannot {0} before joining a meeting")]
    NotJoined(&'static str),

    #[error("connection is in meeting {joined}, not {requested}")]
    WrongMeeting {
        joined: MeetingId,
        requested: MeetingId,
    },

    #[error("{participant_id} is already present in meeting {meeting_id}")]
    ParticipantTaken {
        meeting_id: MeetingId,
        participant_id: ParticipantId,
    },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

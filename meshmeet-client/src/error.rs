use crate::session::{NegotiationState, NegotiationStep};
use meshmeet_core::ParticipantId;
use thiserror::Error;

/// Local capture could not be started. Fatal to joining.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaAccessError {
    #[error("permission to capture {0} was denied")]
    PermissionDenied(String),

    #[error("no capture device available: {0}")]
    DeviceUnavailable(String),
}

/// A malformed or out-of-order description/candidate. Stalls one peer session only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("answer from {peer} arrived without an outstanding local offer (state: {state})")]
    UnexpectedAnswer {
        peer: ParticipantId,
        state: NegotiationState,
    },

    #[error("session for {0} is closed")]
    SessionClosed(ParticipantId),

    #[error("failed to {step} for {peer}: {reason}")]
    StepFailed {
        peer: ParticipantId,
        step: NegotiationStep,
        reason: String,
    },

    #[error("could not construct a connection for {peer}: {reason}")]
    ConnectionSetup { peer: ParticipantId, reason: String },
}

/// The relay did not accept an outbound frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelDeliveryError {
    #[error("signaling channel is closed")]
    Closed,

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("relay transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Media(#[from] MediaAccessError),

    #[error(transparent)]
    Channel(#[from] ChannelDeliveryError),

    #[error("meeting room event loop is no longer running")]
    RoomClosed,
}

pub type ClientResult<T> = Result<T, ClientError>;

mod media;
mod meeting;
mod participant;
mod relay;
mod signaling;

pub use media::TrackKind;
pub use meeting::MeetingId;
pub use participant::ParticipantId;
pub use relay::{ClientFrame, ServerFrame};
pub use signaling::{
    IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalMessage, SignalPayload,
};

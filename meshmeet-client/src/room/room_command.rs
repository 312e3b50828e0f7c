use crate::error::ChannelDeliveryError;
use crate::room::RoomSnapshot;
use meshmeet_core::TrackKind;
use tokio::sync::oneshot;

/// Requests from a [`MeetingHandle`](crate::room::MeetingHandle) to the room loop.
#[derive(Debug)]
pub enum RoomCommand {
    /// Replies with the number of tracks switched.
    SetTrackEnabled {
        kind: TrackKind,
        enabled: bool,
        reply: oneshot::Sender<usize>,
    },

    /// Replies with the new enabled flag.
    ToggleTrack {
        kind: TrackKind,
        reply: oneshot::Sender<bool>,
    },

    Snapshot { reply: oneshot::Sender<RoomSnapshot> },

    /// Tear everything down and stop the loop. Replies with the outcome of
    /// sending `leave` to the relay.
    Leave {
        reply: oneshot::Sender<Result<(), ChannelDeliveryError>>,
    },
}

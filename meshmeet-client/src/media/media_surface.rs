use crate::error::MediaAccessError;
use crate::media::{LocalMedia, RemoteTrack};
use async_trait::async_trait;
use meshmeet_core::utils::LOCAL_SLOT;
use meshmeet_core::{ParticipantId, TrackKind};
use std::fmt;

/// Where a stream is rendered: the local preview or one tile per peer.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum SlotId {
    Local,
    Peer(ParticipantId),
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Local => f.write_str(LOCAL_SLOT),
            SlotId::Peer(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub enum MediaStream {
    Local(LocalMedia),
    Remote(RemoteTrack),
}

/// Capture and rendering, implemented by the embedding application.
///
/// Rendering calls are made from the room event loop and must not block.
#[async_trait]
pub trait MediaSurface: Send + Sync {
    /// Start capture. Failure aborts joining the meeting.
    async fn acquire_local_media(&self) -> Result<LocalMedia, MediaAccessError>;

    /// Show `stream` in `slot`. Called once per remote track, so a peer's slot
    /// may receive several calls.
    fn render_stream(&self, slot: SlotId, stream: MediaStream);

    /// Drop whatever is rendered in `slot`. Must tolerate empty slots.
    fn release_slot(&self, slot: &SlotId);

    /// Mirror a local mute/unmute in the UI.
    fn set_local_track_enabled(&self, kind: TrackKind, enabled: bool);

    /// Visible participant list and the relay-reported count.
    fn update_roster(&self, _participants: &[ParticipantId], _count: usize) {}
}

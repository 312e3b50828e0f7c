use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::media::{MediaStream, MediaSurface, SlotId};
use crate::room::{MeetingRoom, RoomCommand, RoomSnapshot};
use crate::signaling::RelayLink;
use crate::transport::ConnectionFactory;
use meshmeet_core::{MeetingId, ParticipantId, TrackKind};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Joins `config.meeting_id` as `config.local_id`.
///
/// Local capture is acquired and rendered before anything is sent to the
/// relay, so a [`MediaAccessError`](crate::error::MediaAccessError) aborts
/// without the other participants ever seeing us.
pub async fn join_meeting(
    config: ClientConfig,
    link: RelayLink,
    surface: Arc<dyn MediaSurface>,
    factory: Arc<dyn ConnectionFactory>,
) -> ClientResult<MeetingHandle> {
    let local_media = surface.acquire_local_media().await?;
    surface.render_stream(SlotId::Local, MediaStream::Local(local_media.clone()));

    if let Err(e) = link
        .signaling
        .send_join(&config.meeting_id, &config.local_id)
        .await
    {
        warn!("Could not join meeting {}: {}", config.meeting_id, e);
        local_media.stop();
        surface.release_slot(&SlotId::Local);
        return Err(e.into());
    }
    info!("Sent join for {} to meeting {}", config.local_id, config.meeting_id);

    let (command_tx, command_rx) = mpsc::channel(32);
    let meeting_id = config.meeting_id.clone();
    let local_id = config.local_id.clone();

    let room = MeetingRoom::new(config, local_media, link, surface, factory, command_rx);
    let task = tokio::spawn(async move {
        room.run().await;
    });

    Ok(MeetingHandle {
        meeting_id,
        local_id,
        command_tx,
        task,
    })
}

/// Control surface of a joined meeting. Dropping it leaves the meeting.
#[derive(Debug)]
pub struct MeetingHandle {
    meeting_id: MeetingId,
    local_id: ParticipantId,
    command_tx: mpsc::Sender<RoomCommand>,
    task: JoinHandle<()>,
}

impl MeetingHandle {
    pub fn meeting_id(&self) -> &MeetingId {
        &self.meeting_id
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    /// Every session sees the change at once; nothing is renegotiated.
    pub async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> ClientResult<usize> {
        self.request(|reply| RoomCommand::SetTrackEnabled {
            kind,
            enabled,
            reply,
        })
        .await
    }

    /// Returns whether video is now enabled.
    pub async fn toggle_video(&self) -> ClientResult<bool> {
        self.request(|reply| RoomCommand::ToggleTrack {
            kind: TrackKind::Video,
            reply,
        })
        .await
    }

    /// Returns whether audio is now enabled.
    pub async fn toggle_audio(&self) -> ClientResult<bool> {
        self.request(|reply| RoomCommand::ToggleTrack {
            kind: TrackKind::Audio,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self) -> ClientResult<RoomSnapshot> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    /// Local teardown always completes; the error only reports that the
    /// relay could not be told.
    pub async fn leave(self) -> ClientResult<()> {
        let sent = self.request(|reply| RoomCommand::Leave { reply }).await?;
        if let Err(e) = self.task.await {
            warn!("Meeting event loop ended abnormally: {}", e);
        }
        sent.map_err(ClientError::from)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> ClientResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| ClientError::RoomClosed)?;
        reply_rx.await.map_err(|_| ClientError::RoomClosed)
    }
}

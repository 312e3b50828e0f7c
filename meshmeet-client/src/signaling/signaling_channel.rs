use crate::error::ChannelDeliveryError;
use async_trait::async_trait;
use meshmeet_core::{ClientFrame, MeetingId, ParticipantId, ServerFrame, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outbound half of the relay connection.
///
/// The relay is a room-wide broadcast bus; addressing is done by the `to`
/// field of each [`SignalMessage`].
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    async fn send_frame(&self, frame: ClientFrame) -> Result<(), ChannelDeliveryError>;

    async fn send_join(
        &self,
        meeting_id: &MeetingId,
        participant_id: &ParticipantId,
    ) -> Result<(), ChannelDeliveryError> {
        self.send_frame(ClientFrame::Join {
            meeting_id: meeting_id.clone(),
            participant_id: participant_id.clone(),
        })
        .await
    }

    async fn send_leave(
        &self,
        meeting_id: &MeetingId,
        participant_id: &ParticipantId,
    ) -> Result<(), ChannelDeliveryError> {
        self.send_frame(ClientFrame::Leave {
            meeting_id: meeting_id.clone(),
            participant_id: participant_id.clone(),
        })
        .await
    }

    async fn send_signal(&self, msg: SignalMessage) -> Result<(), ChannelDeliveryError> {
        self.send_frame(ClientFrame::Signal(msg)).await
    }
}

/// Both halves of a relay connection, handed to the meeting room.
pub struct RelayLink {
    pub signaling: Arc<dyn SignalingChannel>,
    pub inbound: mpsc::UnboundedReceiver<ServerFrame>,
}

impl RelayLink {
    pub fn new(
        signaling: Arc<dyn SignalingChannel>,
        inbound: mpsc::UnboundedReceiver<ServerFrame>,
    ) -> Self {
        Self { signaling, inbound }
    }
}

use crate::media::LocalTrack;
use crate::session::SessionTag;
use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use meshmeet_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One peer connection as seen by the negotiation engine.
///
/// Implementations report discovered candidates, remote tracks and state
/// changes through the event sender given to [`ConnectionFactory::create`].
#[async_trait]
pub trait NegotiationConnection: Send + Sync {
    async fn add_local_track(&self, track: &LocalTrack) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(
        &self,
        tag: SessionTag,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn NegotiationConnection>>;
}

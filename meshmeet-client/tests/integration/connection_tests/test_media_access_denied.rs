use std::sync::Arc;

use meshmeet_client::{ClientConfig, ClientError, MediaAccessError, join_meeting};
use meshmeet_core::MeetingId;
use meshmeet_relay::RelayHub;

use crate::integration::init_tracing;
use crate::utils::{HubSignaling, MEETING, MockConnectionFactory, RecordingMediaSurface, ScriptedPeer};

#[tokio::test]
async fn test_media_access_denied_aborts_join() {
    init_tracing();

    let hub = RelayHub::new();
    let mut bob = ScriptedPeer::join(&hub, "bob");

    let (signaling, link) = HubSignaling::connect(&hub);
    let surface = RecordingMediaSurface::denying(MediaAccessError::PermissionDenied("camera".into()));
    let factory = MockConnectionFactory::new("alice");

    let result = join_meeting(
        ClientConfig::new(MEETING, "alice"),
        link,
        Arc::new(surface.clone()),
        Arc::new(factory.clone()),
    )
    .await;

    assert!(matches!(
        result,
        Err(ClientError::Media(MediaAccessError::PermissionDenied(_)))
    ));
    assert!(signaling.sent().is_empty());
    assert!(surface.events().is_empty());
    assert!(factory.built().is_empty());
    assert_eq!(hub.member_count(&MeetingId::from(MEETING)), 1);
    assert!(bob.next_signal(200).await.is_none());
}

use meshmeet_client::NegotiationState;
use meshmeet_core::TrackKind;
use meshmeet_relay::RelayHub;

use crate::integration::{chatty, init_tracing, join_with_mocks};
use crate::utils::{MockCall, NEGOTIATION_TIMEOUT_MS, SurfaceEvent, wait_for_snapshot};

#[tokio::test]
async fn test_toggle_local_tracks_reaches_every_session() {
    init_tracing();

    let hub = RelayHub::new();
    let alice = join_with_mocks(&hub, "alice", chatty()).await;
    let bob = join_with_mocks(&hub, "bob", chatty()).await;
    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&bob.id) == Some(NegotiationState::Connected)
    })
    .await;

    let media = alice.surface.local_media().unwrap();

    assert!(!alice.handle.toggle_video().await.unwrap());
    assert!(!media.is_enabled(TrackKind::Video));
    assert!(media.is_enabled(TrackKind::Audio));

    assert_eq!(alice.handle.set_track_enabled(TrackKind::Audio, false).await.unwrap(), 1);
    assert!(!media.is_enabled(TrackKind::Audio));

    assert!(alice.handle.toggle_video().await.unwrap());
    assert!(media.is_enabled(TrackKind::Video));

    let toggles: Vec<SurfaceEvent> = alice
        .surface
        .events()
        .into_iter()
        .filter(|e| matches!(e, SurfaceEvent::LocalToggled(..)))
        .collect();
    assert_eq!(
        toggles,
        vec![
            SurfaceEvent::LocalToggled(TrackKind::Video, false),
            SurfaceEvent::LocalToggled(TrackKind::Audio, false),
            SurfaceEvent::LocalToggled(TrackKind::Video, true),
        ]
    );

    // Tracks were attached once; toggling never renegotiates.
    let to_bob = alice.factory.connection_to(&bob.id);
    assert_eq!(to_bob.count(&MockCall::AddTrack(TrackKind::Video)), 1);
    assert_eq!(to_bob.count(&MockCall::CreateOffer), 1);
}

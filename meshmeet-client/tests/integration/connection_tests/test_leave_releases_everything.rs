use meshmeet_client::{NegotiationState, SlotId};
use meshmeet_core::ClientFrame;
use meshmeet_relay::RelayHub;

use crate::integration::{chatty, init_tracing, join_with_mocks};
use crate::utils::{NEGOTIATION_TIMEOUT_MS, wait_for_snapshot};

#[tokio::test]
async fn test_leave_releases_everything() {
    init_tracing();

    let hub = RelayHub::new();
    let alice = join_with_mocks(&hub, "alice", chatty()).await;
    let bob = join_with_mocks(&hub, "bob", chatty()).await;

    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&bob.id) == Some(NegotiationState::Connected)
    })
    .await;
    wait_for_snapshot(&bob.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&alice.id) == Some(NegotiationState::Connected)
    })
    .await;

    let bob_id = bob.id.clone();
    let bob_surface = bob.surface.clone();
    let bob_signaling = bob.signaling.clone();
    let bob_side = bob.factory.connection_to(&alice.id);
    bob.handle.leave().await.expect("Leave failed");

    assert!(matches!(
        bob_signaling.sent().last(),
        Some(ClientFrame::Leave { .. })
    ));
    assert!(bob_side.is_closed());
    assert!(bob_surface.was_released(&SlotId::Local));
    assert!(bob_surface.was_released(&SlotId::Peer(alice.id.clone())));
    let media = bob_surface.local_media().unwrap();
    assert!(media.tracks().iter().all(|t| t.is_stopped()));

    let alice_view = wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.session(&bob_id).is_none()
    })
    .await;
    assert_eq!(alice_view.count, 1);
    assert!(alice_view.participants.is_empty());
    assert!(alice.factory.connection_to(&bob_id).is_closed());
    assert!(alice.surface.was_released(&SlotId::Peer(bob_id.clone())));
    assert_eq!(alice.surface.last_roster(), Some((Vec::new(), 1)));
    assert_eq!(hub.member_count(&meshmeet_core::MeetingId::from(crate::utils::MEETING)), 1);
}

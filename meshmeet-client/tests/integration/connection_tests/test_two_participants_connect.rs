use meshmeet_client::NegotiationState;
use meshmeet_client::SlotId;
use meshmeet_client::session::Role;
use meshmeet_core::{SdpType, TrackKind};
use meshmeet_relay::RelayHub;

use crate::integration::{chatty, init_tracing, join_with_mocks};
use crate::utils::{MockCall, NEGOTIATION_TIMEOUT_MS, wait_for_snapshot, wait_until};

#[tokio::test]
async fn test_two_participants_connect() {
    init_tracing();

    let hub = RelayHub::new();
    let alice = join_with_mocks(&hub, "alice", chatty()).await;
    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| s.count == 1).await;

    let bob = join_with_mocks(&hub, "bob", chatty()).await;

    let alice_view = wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&bob.id) == Some(NegotiationState::Connected)
    })
    .await;
    let bob_view = wait_for_snapshot(&bob.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&alice.id) == Some(NegotiationState::Connected)
    })
    .await;

    assert_eq!(alice_view.count, 2);
    assert_eq!(alice_view.participants, vec![bob.id.clone()]);
    assert_eq!(alice_view.session(&bob.id).unwrap().role, Role::Caller);
    assert_eq!(bob_view.participants, vec![alice.id.clone()]);
    assert_eq!(bob_view.session(&alice.id).unwrap().role, Role::Callee);

    let to_bob = alice.factory.connection_to(&bob.id);
    let to_alice = bob.factory.connection_to(&alice.id);

    wait_until(NEGOTIATION_TIMEOUT_MS, "candidate exchange", || {
        to_bob.candidates_added().len() == 2 && to_alice.candidates_added().len() == 2
    })
    .await;

    assert_eq!(to_bob.count(&MockCall::CreateOffer), 1);
    assert_eq!(to_bob.count(&MockCall::SetRemote(SdpType::Answer)), 1);
    assert_eq!(to_bob.count(&MockCall::AddTrack(TrackKind::Audio)), 1);
    assert_eq!(to_bob.count(&MockCall::AddTrack(TrackKind::Video)), 1);
    assert_eq!(to_alice.count(&MockCall::SetRemote(SdpType::Offer)), 1);
    assert_eq!(to_alice.count(&MockCall::CreateAnswer), 1);
    assert!(to_alice.candidates_added().iter().all(|c| c.starts_with("candidate:alice-bob")));

    // Only the caller offers.
    assert_eq!(alice.signaling.sent_signals("offer").len(), 1);
    assert!(bob.signaling.sent_signals("offer").is_empty());
    assert_eq!(bob.signaling.sent_signals("answer").len(), 1);

    wait_until(NEGOTIATION_TIMEOUT_MS, "remote media rendering", || {
        alice.surface.rendered_remote(&SlotId::Peer(bob.id.clone())).len() == 2
    })
    .await;
}

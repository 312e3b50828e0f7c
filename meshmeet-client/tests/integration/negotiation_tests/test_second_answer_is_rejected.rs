use meshmeet_client::NegotiationState;
use meshmeet_core::SdpType;
use meshmeet_relay::RelayHub;

use crate::integration::{init_tracing, join_with_mocks};
use crate::utils::{MockBehavior, MockCall, NEGOTIATION_TIMEOUT_MS, ScriptedPeer, wait_for_snapshot};

#[tokio::test]
async fn test_second_answer_is_rejected() {
    init_tracing();

    let hub = RelayHub::new();
    let alice = join_with_mocks(&hub, "alice", MockBehavior::default()).await;
    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| s.count == 1).await;

    let mut bob = ScriptedPeer::join(&hub, "bob");
    let offer = bob.expect_signal("offer", NEGOTIATION_TIMEOUT_MS).await;
    assert_eq!(offer.from, alice.id);

    bob.send_answer(&alice.id);
    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&bob.id) == Some(NegotiationState::Connected)
    })
    .await;

    bob.send_answer(&alice.id);
    let view = wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.session(&bob.id).is_some_and(|session| session.last_error.is_some())
    })
    .await;

    let session = view.session(&bob.id).unwrap();
    assert_eq!(session.state, NegotiationState::Connected);
    assert!(session.last_error.as_ref().unwrap().contains("without an outstanding local offer"));

    let to_bob = alice.factory.connection_to(&bob.id);
    assert_eq!(to_bob.count(&MockCall::SetRemote(SdpType::Answer)), 1);
}

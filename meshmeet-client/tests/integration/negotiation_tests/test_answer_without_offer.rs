use meshmeet_client::NegotiationState;
use meshmeet_client::session::Role;
use meshmeet_core::SdpType;
use meshmeet_relay::RelayHub;

use crate::integration::{init_tracing, join_with_mocks};
use crate::utils::{MockBehavior, MockCall, NEGOTIATION_TIMEOUT_MS, ScriptedPeer, wait_for_snapshot};

#[tokio::test]
async fn test_answer_without_offer_keeps_state() {
    init_tracing();

    let hub = RelayHub::new();
    // Carol is already in the room, so alice never offers to her.
    let carol = ScriptedPeer::join(&hub, "carol");
    let alice = join_with_mocks(&hub, "alice", MockBehavior::default()).await;
    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| s.count == 2).await;

    carol.send_answer(&alice.id);

    let view = wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.session(&carol.id).is_some_and(|session| session.last_error.is_some())
    })
    .await;
    let session = view.session(&carol.id).unwrap();
    assert_eq!(session.role, Role::Callee);
    assert_eq!(session.state, NegotiationState::New);
    assert!(!session.stalled);

    let to_carol = alice.factory.connection_to(&carol.id);
    assert_eq!(to_carol.count(&MockCall::SetRemote(SdpType::Answer)), 0);

    // The session is still usable for a proper offer.
    carol.send_offer(&alice.id);
    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&carol.id) == Some(NegotiationState::Connected)
    })
    .await;
}

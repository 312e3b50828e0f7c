use meshmeet_client::NegotiationState;
use meshmeet_core::SdpType;
use meshmeet_relay::RelayHub;

use crate::integration::{init_tracing, join_with_mocks};
use crate::utils::{MockBehavior, MockCall, NEGOTIATION_TIMEOUT_MS, ScriptedPeer, wait_for_snapshot};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_candidates_before_offer_are_queued() {
    init_tracing();

    let hub = RelayHub::new();
    let mut carol = ScriptedPeer::join(&hub, "carol");
    let alice = join_with_mocks(&hub, "alice", MockBehavior::default()).await;
    wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| s.count == 2).await;

    carol.send_candidate(&alice.id, "candidate:1");
    carol.send_candidate(&alice.id, "candidate:2");

    let view = wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.session(&carol.id).is_some_and(|session| session.queued_candidates == 2)
    })
    .await;
    assert_eq!(view.state_of(&carol.id), Some(NegotiationState::New));
    assert_eq!(view.participants, vec![carol.id.clone()]);
    assert!(alice.factory.connection_to(&carol.id).candidates_added().is_empty());

    carol.send_offer(&alice.id);
    carol.send_candidate(&alice.id, "candidate:3");

    let answer = carol.expect_signal("answer", NEGOTIATION_TIMEOUT_MS).await;
    assert_eq!(answer.from, alice.id);

    let view = wait_for_snapshot(&alice.handle, NEGOTIATION_TIMEOUT_MS, |s| {
        s.state_of(&carol.id) == Some(NegotiationState::Connected)
    })
    .await;
    assert_eq!(view.session(&carol.id).unwrap().queued_candidates, 0);

    // Offer, two queued candidates and a late one all hit one connection.
    let to_carol = alice.factory.connection_to(&carol.id);
    crate::utils::wait_until(NEGOTIATION_TIMEOUT_MS, "all candidates added", || {
        to_carol.candidates_added().len() == 3
    })
    .await;

    let calls = to_carol.calls();
    let remote_at = calls
        .iter()
        .position(|c| *c == MockCall::SetRemote(SdpType::Offer))
        .unwrap();
    let first_candidate_at = calls
        .iter()
        .position(|c| matches!(c, MockCall::AddCandidate(_)))
        .unwrap();
    assert!(remote_at < first_candidate_at);

    assert_eq!(to_carol.candidates_added(), vec!["candidate:1", "candidate:2", "candidate:3"]);
}

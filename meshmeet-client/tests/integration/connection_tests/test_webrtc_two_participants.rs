use std::sync::Arc;

use meshmeet_client::{
    ClientConfig, NegotiationState, TransportConfig, WebrtcConnectionFactory, join_meeting,
};
use meshmeet_relay::RelayHub;

use crate::integration::init_tracing;
use crate::utils::{HubSignaling, MEETING, RecordingMediaSurface, WEBRTC_TIMEOUT_MS, wait_for_snapshot};

#[tokio::test]
async fn test_webrtc_two_participants_negotiate() {
    init_tracing();

    let hub = RelayHub::new();
    let mut handles = Vec::new();
    let mut signalings = Vec::new();

    for id in ["alice", "bob"] {
        let (signaling, link) = HubSignaling::connect(&hub);
        let factory = WebrtcConnectionFactory::new(TransportConfig::host_only())
            .expect("Failed to build WebRTC API");
        let handle = join_meeting(
            ClientConfig::new(MEETING, id).with_transport(TransportConfig::host_only()),
            link,
            Arc::new(RecordingMediaSurface::new()),
            Arc::new(factory),
        )
        .await
        .expect("Failed to join");
        wait_for_snapshot(&handle, WEBRTC_TIMEOUT_MS, |s| s.count == handles.len() + 1).await;
        handles.push(handle);
        signalings.push(signaling);
    }

    let (alice, bob) = (&handles[0], &handles[1]);

    let alice_view = wait_for_snapshot(alice, WEBRTC_TIMEOUT_MS, |s| {
        s.state_of(bob.local_id()) == Some(NegotiationState::Connected)
    })
    .await;
    wait_for_snapshot(bob, WEBRTC_TIMEOUT_MS, |s| {
        s.state_of(alice.local_id()) == Some(NegotiationState::Connected)
    })
    .await;

    let session = alice_view.session(bob.local_id()).unwrap();
    assert!(!session.stalled, "{:?}", session.last_error);

    let offer = &signalings[0].sent_signals("offer")[0];
    let meshmeet_core::SignalPayload::Offer(desc) = &offer.payload else {
        panic!("not an offer");
    };
    assert!(desc.sdp.contains("m=audio"));
    assert!(desc.sdp.contains("m=video"));

    for handle in handles {
        handle.leave().await.unwrap();
    }
}

use async_trait::async_trait;
use meshmeet_client::{ChannelDeliveryError, RelayLink, SignalingChannel};
use meshmeet_core::{
    ClientFrame, IceCandidate, MeetingId, ParticipantId, ServerFrame, SessionDescription,
    SignalMessage, SignalPayload,
};
use meshmeet_relay::{ConnectionId, RelayHub};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const MEETING: &str = "standup";

/// SignalingChannel wired straight into an in-process RelayHub.
/// Records every outbound frame and can be told to fail some signal kinds.
pub struct HubSignaling {
    hub: RelayHub,
    conn: ConnectionId,
    sent: Mutex<Vec<ClientFrame>>,
    failing_kinds: Mutex<HashSet<&'static str>>,
}

impl HubSignaling {
    pub fn connect(hub: &RelayHub) -> (Arc<Self>, RelayLink) {
        let (conn, inbound) = hub.register();
        let signaling = Arc::new(Self {
            hub: hub.clone(),
            conn,
            sent: Mutex::new(Vec::new()),
            failing_kinds: Mutex::new(HashSet::new()),
        });
        let link = RelayLink::new(signaling.clone(), inbound);
        (signaling, link)
    }

    /// Signals of this kind ("offer", "answer", "candidate") fail to deliver.
    pub fn fail_signals_of(&self, kind: &'static str) {
        self.failing_kinds.lock().unwrap().insert(kind);
    }

    pub fn sent(&self) -> Vec<ClientFrame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_signals(&self, kind: &str) -> Vec<SignalMessage> {
        self.sent()
            .into_iter()
            .filter_map(|f| match f {
                ClientFrame::Signal(msg) if msg.payload.kind() == kind => Some(msg),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SignalingChannel for HubSignaling {
    async fn send_frame(&self, frame: ClientFrame) -> Result<(), ChannelDeliveryError> {
        tracing::debug!("[HubSignaling] {:?}", frame);
        self.sent.lock().unwrap().push(frame.clone());

        if let ClientFrame::Signal(msg) = &frame {
            if self.failing_kinds.lock().unwrap().contains(msg.payload.kind()) {
                return Err(ChannelDeliveryError::Transport("injected failure".to_owned()));
            }
        }

        self.hub
            .handle_frame(&self.conn, frame)
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))
    }
}

/// A participant driven by hand from the test, talking to the hub directly.
pub struct ScriptedPeer {
    pub id: ParticipantId,
    hub: RelayHub,
    conn: ConnectionId,
    inbound: mpsc::UnboundedReceiver<ServerFrame>,
}

impl ScriptedPeer {
    pub fn join(hub: &RelayHub, id: &str) -> Self {
        let (conn, inbound) = hub.register();
        let peer = Self {
            id: ParticipantId::from(id),
            hub: hub.clone(),
            conn,
            inbound,
        };
        peer.send(ClientFrame::Join {
            meeting_id: MeetingId::from(MEETING),
            participant_id: peer.id.clone(),
        });
        peer
    }

    pub fn send(&self, frame: ClientFrame) {
        self.hub.handle_frame(&self.conn, frame).unwrap();
    }

    pub fn leave(&self) {
        self.send(ClientFrame::Leave {
            meeting_id: MeetingId::from(MEETING),
            participant_id: self.id.clone(),
        });
    }

    pub fn signal(&self, to: &ParticipantId, payload: SignalPayload) {
        self.send(ClientFrame::Signal(SignalMessage {
            meeting_id: MeetingId::from(MEETING),
            to: to.clone(),
            from: self.id.clone(),
            payload,
        }));
    }

    pub fn send_offer(&self, to: &ParticipantId) {
        self.signal(to, SignalPayload::Offer(SessionDescription::offer(format!("offer from {}", self.id))));
    }

    pub fn send_answer(&self, to: &ParticipantId) {
        self.signal(to, SignalPayload::Answer(SessionDescription::answer(format!("answer from {}", self.id))));
    }

    pub fn send_candidate(&self, to: &ParticipantId, candidate: &str) {
        self.signal(to, SignalPayload::Candidate(IceCandidate::new(candidate)));
    }

    /// Next signal addressed to this peer, skipping roster frames and
    /// signals meant for others.
    pub async fn next_signal(&mut self, timeout_ms: u64) -> Option<SignalMessage> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let frame = tokio::time::timeout_at(deadline, self.inbound.recv()).await.ok()??;
            if let ServerFrame::Signal(msg) = frame {
                if msg.is_addressed_to(&self.id) {
                    return Some(msg);
                }
            }
        }
    }

    /// Next signal of `kind` addressed to this peer.
    pub async fn expect_signal(&mut self, kind: &str, timeout_ms: u64) -> SignalMessage {
        loop {
            let msg = self
                .next_signal(timeout_ms)
                .await
                .unwrap_or_else(|| panic!("{} never received a {}", self.id, kind));
            if msg.payload.kind() == kind {
                return msg;
            }
        }
    }
}

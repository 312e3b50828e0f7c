use meshmeet_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use meshmeet_core::{IceServerConfig, MeetingId, ParticipantId};

/// WebRTC settings shared by every peer connection of a client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl TransportConfig {
    /// Host candidates only. Enough for peers on the same machine or LAN.
    pub fn host_only() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub meeting_id: MeetingId,
    pub local_id: ParticipantId,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn new(meeting_id: impl Into<MeetingId>, local_id: impl Into<ParticipantId>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            local_id: local_id.into(),
            transport: TransportConfig::default(),
        }
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

pub use meshmeet_core::model::{MeetingId, ParticipantId};

pub mod model {
    pub use meshmeet_core::model::*;
    pub use meshmeet_core::utils::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshmeet_client::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use meshmeet_relay::*;
}

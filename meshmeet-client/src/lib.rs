pub mod config;
pub mod error;
pub mod media;
pub mod room;
pub mod session;
pub mod signaling;
pub mod transport;

pub use config::{ClientConfig, TransportConfig};
pub use error::{ChannelDeliveryError, ClientError, ClientResult, MediaAccessError, NegotiationError};
pub use media::{LocalMedia, LocalTrack, MediaStream, MediaSurface, RemoteTrack, SlotId};
pub use room::{MeetingHandle, RoomSnapshot, SessionSnapshot, join_meeting};
pub use session::{NegotiationState, Role};
pub use signaling::{RelayLink, SignalingChannel, WsSignaling};
pub use transport::{ConnectionFactory, NegotiationConnection, WebrtcConnectionFactory};

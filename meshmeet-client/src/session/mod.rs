mod negotiation;
mod peer_session;
mod registry;
mod step;

pub use negotiation::*;
pub use peer_session::*;
pub use registry::*;
pub use step::*;

pub mod config;
pub mod error;
pub mod hub;
pub mod server;
pub mod signaling;

pub use config::RelayConfig;
pub use error::RelayError;
pub use hub::*;
pub use server::*;
pub use signaling::*;

use clap::Parser;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "meshmeet-relay", about = "WebSocket relay for meshmeet meetings")]
pub struct RelayConfig {
    /// Address the WebSocket endpoint listens on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
        }
    }
}

use crate::error::ChannelDeliveryError;
use crate::signaling::{RelayLink, SignalingChannel};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshmeet_core::{ClientFrame, ServerFrame};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Relay connection over a WebSocket, speaking JSON frames.
pub struct WsSignaling {
    outbound: mpsc::UnboundedSender<Message>,
}

impl WsSignaling {
    /// Connects to `url` (e.g. `ws://127.0.0.1:5000/ws`) and starts the socket pumps.
    pub async fn connect(url: &str) -> Result<RelayLink, ChannelDeliveryError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerFrame>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ServerFrame>(text.as_str()) {
                        Ok(frame) => {
                            if in_tx.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid frame from relay: {:?}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Relay connection closed");
        });

        let signaling = Arc::new(WsSignaling { outbound: out_tx });
        Ok(RelayLink::new(signaling, in_rx))
    }
}

#[async_trait]
impl SignalingChannel for WsSignaling {
    async fn send_frame(&self, frame: ClientFrame) -> Result<(), ChannelDeliveryError> {
        let json = serde_json::to_string(&frame)
            .map_err(|e| ChannelDeliveryError::Encode(e.to_string()))?;
        debug!("WS OUT: {}", json);
        self.outbound
            .send(Message::text(json))
            .map_err(|_| ChannelDeliveryError::Closed)
    }
}

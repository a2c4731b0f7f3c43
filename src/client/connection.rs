//! Client Transport
//!
//! WebSocket plumbing for the headless client: one reader task parsing
//! server messages into an inbound queue, one writer loop draining an
//! outbound queue. No reconnection — a dropped connection leaves the
//! cached opponent view stale until the embedding shell gives up.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, warn};

use crate::network::protocol::{ClientMessage, ServerMessage};

/// Queue depth for each direction.
const QUEUE_DEPTH: usize = 64;

/// Connection errors.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// WebSocket handshake or transport failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The connection tasks have shut down.
    #[error("connection closed")]
    Closed,
}

/// A live connection to the relay server.
pub struct DuelConnection {
    outbound: mpsc::Sender<ClientMessage>,
    inbound: mpsc::Receiver<ServerMessage>,
}

impl DuelConnection {
    /// Connect to `url` (e.g. `ws://127.0.0.1:3001`) and spawn the
    /// reader and writer tasks.
    pub async fn connect(url: &str) -> Result<Self, ConnectionError> {
        let (ws_stream, _) = connect_async(url).await?;
        debug!("connected to {url}");

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<ClientMessage>(QUEUE_DEPTH);
        let (inbound_tx, inbound_rx) = mpsc::channel::<ServerMessage>(QUEUE_DEPTH);

        // Reader: parse server messages into the inbound queue.
        tokio::spawn(async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => match ServerMessage::from_json(&text) {
                        Ok(message) => {
                            if inbound_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("unparseable server message: {e}"),
                    },
                    Ok(Message::Close(_)) => {
                        debug!("server closed connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("websocket read error: {e}");
                        break;
                    }
                }
            }
        });

        // Writer: drain the outbound queue into the socket.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let text = match message.to_json() {
                    Ok(t) => t,
                    Err(e) => {
                        error!("failed to serialize client message: {e}");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }

    /// Queue a message for the server.
    pub async fn send(&self, message: ClientMessage) -> Result<(), ConnectionError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| ConnectionError::Closed)
    }

    /// Wait for the next server message. `None` once the connection is
    /// gone.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.inbound.recv().await
    }

    /// Drain any messages that arrived since the last frame, without
    /// blocking the frame loop.
    pub fn poll(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.inbound.try_recv() {
            out.push(msg);
        }
        out
    }
}

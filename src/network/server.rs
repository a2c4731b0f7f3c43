//! WebSocket Relay Server
//!
//! Async WebSocket listener for duel connections. Each connection gets
//! a uuid, a writer task draining its outbound queue, and a reader loop
//! forwarding decoded messages to the relay actor. A plain HTTP
//! `GET /health` on the same port answers a liveness probe instead of
//! upgrading.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::game::score::DEFAULT_WIN_THRESHOLD;
use crate::game::state::PlayerId;
use crate::network::protocol::ClientMessage;
use crate::network::relay::{Relay, RelayConfig, RelayEvent, RelayHandle, OUTBOUND_QUEUE_DEPTH};

/// Port used when the `PORT` environment variable is absent.
pub const DEFAULT_PORT: u16 = 3001;

/// Liveness probe response body.
const HEALTH_BODY: &str = "Server is running";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Hits needed to win a round.
    pub win_threshold: u32,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            win_threshold: DEFAULT_WIN_THRESHOLD,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Build a config from the environment (`PORT`). Unparseable values
    /// fall back to the default port.
    pub fn from_env() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], resolve_port(std::env::var("PORT").ok()))),
            ..Default::default()
        }
    }
}

/// Parse a port override, falling back to [`DEFAULT_PORT`].
pub fn resolve_port(var: Option<String>) -> u16 {
    match var.as_deref().map(str::parse) {
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            warn!("invalid PORT value, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }
        None => DEFAULT_PORT,
    }
}

/// Relay server errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayServerError {
    /// Failed to bind to address.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// Lifecycle of one connection. Disconnected is terminal; there is no
/// timeout-based eviction, so a silent peer stays Active until the
/// transport reports the close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionPhase {
    /// TCP accepted, handshake not finished.
    Connecting,
    /// Registered with the relay.
    Active,
    /// Deregistered; entered exactly once.
    Disconnected,
}

/// The relay server: accept loop plus per-connection tasks.
pub struct RelayServer {
    config: ServerConfig,
}

impl RelayServer {
    /// Create a server from config.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(&self) -> Result<(), RelayServerError> {
        let relay = Relay::spawn(RelayConfig {
            win_threshold: self.config.win_threshold,
        });

        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "duel relay v{} listening on {}",
            self.config.version, self.config.bind_addr
        );

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("new connection from {addr}");
                    let relay = relay.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, addr, relay).await;
                    });
                }
                Err(e) => error!("accept error: {e}"),
            }
        }
    }
}

/// Drive one TCP connection: health probe or WebSocket session.
pub(crate) async fn handle_connection(mut stream: TcpStream, addr: SocketAddr, relay: RelayHandle) {
    let mut phase = ConnectionPhase::Connecting;

    // A liveness probe is plain HTTP on the same port. Peek so the
    // WebSocket handshake still sees the full request otherwise.
    let mut probe = [0u8; 16];
    match stream.peek(&mut probe).await {
        Ok(n) if probe[..n].starts_with(b"GET /health") => {
            answer_health_probe(&mut stream).await;
            return;
        }
        Ok(_) => {}
        Err(e) => {
            debug!("peek failed for {addr}: {e}");
            return;
        }
    }

    debug!("handshaking {addr} ({phase:?})");
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("websocket handshake failed for {addr}: {e}");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (msg_tx, mut msg_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);

    let id = PlayerId::generate();
    relay
        .submit(RelayEvent::Connect { id, sender: msg_tx })
        .await;
    phase = ConnectionPhase::Active;
    info!("{addr} registered as {id} ({phase:?})");

    // Writer task: drain the outbound queue into the socket.
    let writer_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            let text = match msg.to_json() {
                Ok(t) => t,
                Err(e) => {
                    error!("failed to serialize message: {e}");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Reader loop: decode and forward to the relay actor.
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match ClientMessage::from_json(&text) {
                Ok(message) => relay.submit(RelayEvent::Message { id, message }).await,
                Err(e) => debug!("invalid message from {id}: {e}"),
            },
            Ok(Message::Close(_)) => {
                debug!("{id} sent close");
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(_) => {}
            Err(e) => {
                // Transport failure: log and fall through to cleanup.
                error!("websocket error for {id}: {e}");
                break;
            }
        }
    }

    writer_task.abort();
    relay.submit(RelayEvent::Disconnect { id }).await;
    phase = ConnectionPhase::Disconnected;
    info!("{id} cleaned up ({phase:?})");
}

/// Answer `GET /health` with a 200 and close.
async fn answer_health_probe(stream: &mut TcpStream) {
    // Consume the request before responding.
    let mut request = [0u8; 512];
    let _ = stream.read(&mut request).await;
    let response = health_response();
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("health probe write failed: {e}");
    }
    let _ = stream.shutdown().await;
}

/// The full HTTP response for the liveness probe.
fn health_response() -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        HEALTH_BODY.len(),
        HEALTH_BODY
    )
}

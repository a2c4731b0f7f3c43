//! Network Layer
//!
//! WebSocket transport and the relay actor. Everything here is
//! non-deterministic plumbing; the rules live in `game/`.

pub mod protocol;
pub mod relay;
pub mod server;

pub use protocol::{ClientMessage, HitReport, Hitter, PlayerUpdate, ServerMessage};
pub use relay::{Relay, RelayConfig, RelayEvent, RelayHandle};
pub use server::{RelayServer, RelayServerError, ServerConfig};

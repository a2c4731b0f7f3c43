//! # Sword Duel Relay
//!
//! Match core for a two-player real-time sword duel: an authoritative
//! relay server plus the headless client simulation it pairs with.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SWORD DUEL SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Duel logic (transport-free)               │
//! │  ├── combat.rs   - Attack/block state machine with timers    │
//! │  ├── state.rs    - Participant registry and transforms       │
//! │  ├── hit.rs      - Range + direction hit adjudication        │
//! │  └── score.rs    - Scores, win detection, round reset        │
//! │                                                              │
//! │  network/        - Relay transport                           │
//! │  ├── protocol.rs - JSON wire messages                        │
//! │  ├── relay.rs    - Single-actor match state machine          │
//! │  └── server.rs   - WebSocket listener + health probe         │
//! │                                                              │
//! │  client/         - Headless client                           │
//! │  ├── simulation.rs - Local prediction and hit reporting      │
//! │  └── connection.rs - WebSocket client plumbing               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Trust Model
//!
//! The server is a relay, not a referee: it forwards each combatant's
//! self-reported state to the other side and scores self-reported hits
//! at face value. Both sides run the same `game/` adjudication locally;
//! the server only tracks scores, detects the win threshold, and resets
//! rounds. All mutation happens on a single actor task, so every
//! inbound event's mutate-then-broadcast sequence is atomic without
//! locks.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod client;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use client::{DuelConnection, DuelSimulation, FrameInput};
pub use game::{CombatState, Direction, GameRegistry, PlayerId, Vec3};
pub use network::{ClientMessage, RelayServer, ServerConfig, ServerMessage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

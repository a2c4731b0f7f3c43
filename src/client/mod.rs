//! Headless Client
//!
//! The prediction/reconciliation side of the duel, minus rendering:
//! local input is simulated immediately, opponent state is whatever the
//! relay last said, and local adjudication decides when to report hits.
//! A rendered shell drives [`DuelSimulation::frame`] once per frame and
//! pumps [`DuelConnection`] between frames.

pub mod connection;
pub mod simulation;

pub use connection::{ConnectionError, DuelConnection};
pub use simulation::{DuelSimulation, FrameInput, FrameOutput, LocalPlayer, ARENA_SIZE, MOVE_SPEED};

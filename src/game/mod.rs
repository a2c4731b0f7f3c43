//! Duel Logic Module
//!
//! Transport-free game logic, shared by the relay server and the
//! headless client simulation.
//!
//! ## Module Structure
//!
//! - `combat`: attack/block state machine with countdown timers
//! - `state`: participant identity, transforms, session registry
//! - `hit`: range + direction hit adjudication
//! - `score`: per-participant scores and win detection

pub mod combat;
pub mod hit;
pub mod score;
pub mod state;

// Re-export key types
pub use combat::{CombatState, Direction, ACTION_DURATION_SECS};
pub use hit::MELEE_RANGE;
pub use score::{ScoreBoard, DEFAULT_WIN_THRESHOLD};
pub use state::{GameRegistry, Participant, ParticipantUpdate, PlayerId, RegistryError, Vec3};

//! Combat State
//!
//! The attack/block sub-state machine every participant carries,
//! mirrored on client and server. Two channels (attack, block), but the
//! guards keep at most one non-idle at a time, so the composite state is
//! effectively idle | attacking(dir) | blocking(dir) with a timed return
//! to idle.

use serde::{Deserialize, Serialize};

/// How long a swing or a block holds, in seconds.
pub const ACTION_DURATION_SECS: f32 = 0.5;

// =============================================================================
// DIRECTION
// =============================================================================

/// Direction of an attack or a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Swing or guard to the left.
    Left,
    /// Swing or guard to the right.
    Right,
    /// Overhead swing or high guard.
    Up,
    /// Low swing or low guard.
    Down,
}

impl Direction {
    /// The direction that blocks this one. Fixed pairing:
    /// left ↔ right, up ↔ down.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// All four directions, for tests and input mapping.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];
}

// =============================================================================
// COMBAT STATE
// =============================================================================

/// Attack/block state with countdown timers.
///
/// Invariant: `attack` and `block` are never both `Some` — both setters
/// are guarded on the composite state being idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    /// Active attack direction, if mid-swing.
    pub attack: Option<Direction>,
    /// Active block direction, if guarding.
    pub block: Option<Direction>,
    /// Seconds left on the current swing.
    #[serde(skip)]
    pub attack_timer: f32,
    /// Seconds left on the current guard.
    #[serde(skip)]
    pub block_timer: f32,
}

impl CombatState {
    /// Create an idle combat state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a swing. No-op unless idle — an active swing or guard is
    /// not interruptible.
    pub fn attack(&mut self, direction: Direction) {
        if self.attack.is_none() && self.block.is_none() {
            self.attack = Some(direction);
            self.attack_timer = ACTION_DURATION_SECS;
        }
    }

    /// Raise a guard. Same guard as [`CombatState::attack`].
    pub fn block(&mut self, direction: Direction) {
        if self.attack.is_none() && self.block.is_none() {
            self.block = Some(direction);
            self.block_timer = ACTION_DURATION_SECS;
        }
    }

    /// Advance timers by `dt` seconds. A timer reaching zero clears its
    /// channel back to idle; further ticks are no-ops.
    pub fn tick(&mut self, dt: f32) {
        if self.attack.is_some() {
            self.attack_timer -= dt;
            if self.attack_timer <= 0.0 {
                self.attack = None;
                self.attack_timer = 0.0;
            }
        }
        if self.block.is_some() {
            self.block_timer -= dt;
            if self.block_timer <= 0.0 {
                self.block = None;
                self.block_timer = 0.0;
            }
        }
    }

    /// Is a swing in progress?
    #[inline]
    pub fn is_attacking(&self) -> bool {
        self.attack.is_some()
    }

    /// Is a guard up?
    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.block.is_some()
    }

    /// True iff the current guard is the fixed opposite of
    /// `incoming`. False when not guarding at all.
    pub fn blocks_correctly(&self, incoming: Direction) -> bool {
        self.block == Some(incoming.opposite())
    }

    /// Drop back to idle immediately (round reset).
    pub fn clear(&mut self) {
        self.attack = None;
        self.block = None;
        self.attack_timer = 0.0;
        self.block_timer = 0.0;
    }

    /// Overwrite both channels from a relayed snapshot. Timers are not
    /// carried on the wire; the remote side owns its own countdowns.
    pub fn apply_snapshot(&mut self, attack: Option<Direction>, block: Option<Direction>) {
        self.attack = attack;
        self.block = block;
    }
}

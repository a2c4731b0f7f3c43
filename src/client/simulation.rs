//! Local Duel Simulation
//!
//! Client-side prediction: input is applied to the local combatant
//! immediately, with no server round-trip. The opponent is never
//! predicted — the last relayed snapshot simply overwrites the cached
//! view. Hits are adjudicated locally each frame and reported upward;
//! the server takes those reports at face value.

use std::collections::BTreeMap;

use crate::game::combat::{CombatState, Direction};
use crate::game::hit;
use crate::game::state::{Participant, PlayerId, Vec3};
use crate::network::protocol::{ClientMessage, HitReport, Hitter, PlayerUpdate, ServerMessage};

/// Movement speed in units per second.
pub const MOVE_SPEED: f32 = 5.0;

/// Arena side length; combatants are clamped to ±half of this on x/z.
pub const ARENA_SIZE: f32 = 50.0;

/// One frame of player input, already mapped from whatever input
/// device the embedding shell uses.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    /// Move toward negative z.
    pub forward: bool,
    /// Move toward positive z.
    pub backward: bool,
    /// Strafe toward negative x.
    pub left: bool,
    /// Strafe toward positive x.
    pub right: bool,
    /// Requested swing direction, if any.
    pub attack: Option<Direction>,
    /// Requested guard direction, if any.
    pub block: Option<Direction>,
}

/// The locally simulated combatant.
#[derive(Clone, Debug)]
pub struct LocalPlayer {
    /// Current position.
    pub position: Vec3,
    /// Current facing; owned by the camera collaborator, relayed as-is.
    pub rotation: Vec3,
    /// Local combat state machine.
    pub combat: CombatState,
}

impl LocalPlayer {
    /// Spawn at the duel start position.
    pub fn new() -> Self {
        Self {
            position: Vec3::new(-5.0, 1.0, 0.0),
            rotation: Vec3::default(),
            combat: CombatState::new(),
        }
    }

    /// Apply one frame of movement and combat input.
    fn apply_input(&mut self, dt: f32, input: &FrameInput) {
        if input.forward {
            self.position.z -= MOVE_SPEED * dt;
        }
        if input.backward {
            self.position.z += MOVE_SPEED * dt;
        }
        if input.left {
            self.position.x -= MOVE_SPEED * dt;
        }
        if input.right {
            self.position.x += MOVE_SPEED * dt;
        }

        // Block wins when both are held, matching original key handling
        // (shift + direction means guard, not swing).
        if let Some(direction) = input.block {
            self.combat.block(direction);
        } else if let Some(direction) = input.attack {
            self.combat.attack(direction);
        }

        self.combat.tick(dt);
        self.clamp_to_arena();
    }

    fn clamp_to_arena(&mut self) {
        let half = ARENA_SIZE / 2.0;
        self.position.x = self.position.x.clamp(-half, half);
        self.position.z = self.position.z.clamp(-half, half);
    }
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages the simulation wants sent this frame.
#[derive(Debug, Default)]
pub struct FrameOutput {
    /// The per-frame state report (absent until `welcome` arrives).
    pub update: Option<ClientMessage>,
    /// Hit reports decided by local adjudication, at most one per side.
    pub hit_reports: Vec<ClientMessage>,
}

/// Headless counterpart of the rendered game loop: local prediction,
/// cached opponent view, score mirror.
#[derive(Debug, Default)]
pub struct DuelSimulation {
    id: Option<PlayerId>,
    player: LocalPlayer,
    opponent: Option<Participant>,
    scores: BTreeMap<PlayerId, u32>,
    last_winner: Option<PlayerId>,
    // One report per swing per side; cleared when the swing ends.
    own_swing_reported: bool,
    opponent_swing_reported: bool,
}

impl DuelSimulation {
    /// Create a simulation waiting for its `welcome`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id assigned by the server, once known.
    pub fn id(&self) -> Option<PlayerId> {
        self.id
    }

    /// The local combatant.
    pub fn player(&self) -> &LocalPlayer {
        &self.player
    }

    /// Mutable local combatant (camera writes rotation here).
    pub fn player_mut(&mut self) -> &mut LocalPlayer {
        &mut self.player
    }

    /// Last relayed opponent snapshot, if one has arrived.
    pub fn opponent(&self) -> Option<&Participant> {
        self.opponent.as_ref()
    }

    /// Mirrored score for a participant.
    pub fn score_of(&self, id: &PlayerId) -> u32 {
        self.scores.get(id).copied().unwrap_or(0)
    }

    /// Winner of the last finished round, if any.
    pub fn last_winner(&self) -> Option<PlayerId> {
        self.last_winner
    }

    /// Advance one frame: read input, mutate local state, adjudicate
    /// hits against the cached opponent, and emit outbound messages.
    pub fn frame(&mut self, dt: f32, input: &FrameInput) -> FrameOutput {
        self.player.apply_input(dt, input);

        let mut output = FrameOutput::default();
        let Some(id) = self.id else {
            // Not welcomed yet: simulate locally, say nothing.
            return output;
        };

        let me = Participant {
            id,
            position: self.player.position,
            rotation: self.player.rotation,
            combat: self.player.combat,
        };

        if let Some(opponent) = &self.opponent {
            let (i_land, they_land) = hit::exchange(&me, opponent);

            if i_land && !self.own_swing_reported {
                self.own_swing_reported = true;
                output.hit_reports.push(ClientMessage::Hit(HitReport {
                    id,
                    hitter: Hitter::Player,
                }));
            }
            if they_land && !self.opponent_swing_reported {
                self.opponent_swing_reported = true;
                output.hit_reports.push(ClientMessage::Hit(HitReport {
                    id,
                    hitter: Hitter::Opponent,
                }));
            }

            if !me.combat.is_attacking() {
                self.own_swing_reported = false;
            }
            if !opponent.combat.is_attacking() {
                self.opponent_swing_reported = false;
            }
        }

        output.update = Some(ClientMessage::PlayerUpdate(PlayerUpdate::from_participant(
            &me,
        )));
        output
    }

    /// Fold a relayed server message into local state. Opponent
    /// snapshots are last-write-wins; there is no reconciliation
    /// because the opponent is never predicted.
    pub fn apply_server_message(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::Welcome { id, players } => {
                self.id = Some(*id);
                self.opponent = players
                    .iter()
                    .find(|p| p.id != *id)
                    .map(snapshot_to_participant);
            }
            ServerMessage::OpponentUpdate(update) => {
                if Some(update.id) != self.id {
                    self.opponent = Some(snapshot_to_participant(update));
                }
            }
            ServerMessage::ScoreUpdate { scores } => {
                self.scores = scores.clone();
            }
            ServerMessage::GameOver { winner } => {
                // Mirror the server's round reset.
                self.last_winner = Some(*winner);
                self.scores.values_mut().for_each(|s| *s = 0);
                self.player.combat.clear();
                if let Some(opponent) = &mut self.opponent {
                    opponent.combat.clear();
                }
                self.own_swing_reported = false;
                self.opponent_swing_reported = false;
            }
        }
    }
}

fn snapshot_to_participant(update: &PlayerUpdate) -> Participant {
    let mut combat = CombatState::new();
    combat.apply_snapshot(update.attack_state, update.block_state);
    Participant {
        id: update.id,
        position: update.position,
        rotation: update.rotation,
        combat,
    }
}

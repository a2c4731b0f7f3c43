//! Duel State Definitions
//!
//! Participant identity, transforms, and the session registry — the
//! authoritative set of connected combatants. Uses BTreeMap for
//! deterministic iteration order (opponent lookup, winner tie-breaks).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::{CombatState, Direction};
use crate::game::score::ScoreBoard;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique participant identifier, scoped to one connection.
///
/// Serializes as a hyphenated UUID string so it can key JSON maps on
/// the wire. Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Generate a fresh random id for a new connection.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from raw bytes (tests and deterministic fixtures).
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// TRANSFORM
// =============================================================================

/// Three-component vector for positions and Euler rotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point, all three axes.
    pub fn distance_to(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Default spawn transform: standing at the arena center, one unit up.
pub fn spawn_position() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// One connected combatant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant id.
    pub id: PlayerId,
    /// Current position.
    pub position: Vec3,
    /// Current facing (Euler angles).
    pub rotation: Vec3,
    /// Attack/block state as last reported.
    pub combat: CombatState,
}

impl Participant {
    /// Create a participant at the default spawn.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            position: spawn_position(),
            rotation: Vec3::default(),
            combat: CombatState::new(),
        }
    }
}

/// Partial state carried by a `playerUpdate` — everything the client
/// reports each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticipantUpdate {
    /// Reported position.
    pub position: Vec3,
    /// Reported rotation.
    pub rotation: Vec3,
    /// Reported attack direction, if swinging.
    pub attack: Option<Direction>,
    /// Reported block direction, if guarding.
    pub block: Option<Direction>,
}

// =============================================================================
// SESSION REGISTRY
// =============================================================================

/// Registry errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A participant with this id is already registered. Defensive —
    /// ids are connection-scoped, so this should be unreachable.
    #[error("participant {0} already registered")]
    DuplicateId(PlayerId),
}

/// Authoritative set of connected participants with their scores.
///
/// Invariant: the participant table and the score table always hold the
/// same key set — insert and remove touch both or neither.
#[derive(Debug, Default)]
pub struct GameRegistry {
    players: BTreeMap<PlayerId, Participant>,
    scores: ScoreBoard,
}

impl GameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new participant at the default spawn with score 0.
    /// Returns a snapshot of the full roster for initial broadcasts.
    pub fn add_player(&mut self, id: PlayerId) -> Result<Vec<Participant>, RegistryError> {
        if self.players.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        self.players.insert(id, Participant::new(id));
        self.scores.insert(id);
        Ok(self.players.values().cloned().collect())
    }

    /// Deregister a participant and its score entry. Idempotent — a
    /// disconnect can race a cleanup pass.
    pub fn remove_player(&mut self, id: &PlayerId) {
        self.players.remove(id);
        self.scores.remove(id);
    }

    /// Overwrite a participant's reported state. Unknown ids are
    /// ignored — updates can arrive after a disconnect.
    pub fn update_player(&mut self, id: &PlayerId, update: &ParticipantUpdate) {
        if let Some(player) = self.players.get_mut(id) {
            player.position = update.position;
            player.rotation = update.rotation;
            player.combat.apply_snapshot(update.attack, update.block);
        }
    }

    /// The lowest other registered id, or None with fewer than two
    /// participants. With 3+ connected this stays deterministic:
    /// always the first other id in registry order.
    pub fn opponent_of(&self, id: &PlayerId) -> Option<PlayerId> {
        self.players.keys().find(|other| *other != id).copied()
    }

    /// Look up a participant.
    pub fn get_player(&self, id: &PlayerId) -> Option<&Participant> {
        self.players.get(id)
    }

    /// Number of connected participants.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// All registered ids in registry order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    /// Scoreboard access for the relay.
    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    /// Mutable scoreboard access for the relay.
    pub fn scores_mut(&mut self) -> &mut ScoreBoard {
        &mut self.scores
    }

    /// Start the next round: zero all scores, clear all combat state.
    /// Identities and positions persist; nobody is re-paired.
    pub fn reset_round(&mut self) {
        self.scores.reset();
        for player in self.players.values_mut() {
            player.combat.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> PlayerId {
        PlayerId::from_bytes([byte; 16])
    }

    #[test]
    fn add_player_spawns_with_defaults() {
        let mut registry = GameRegistry::new();
        let roster = registry.add_player(id(1)).unwrap();
        assert_eq!(roster.len(), 1);
        let player = registry.get_player(&id(1)).unwrap();
        assert_eq!(player.position, spawn_position());
        assert_eq!(registry.scores().get(&id(1)), Some(0));
    }

    #[test]
    fn add_player_duplicate_is_error() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(1)).unwrap();
        assert_eq!(
            registry.add_player(id(1)),
            Err(RegistryError::DuplicateId(id(1)))
        );
        assert_eq!(registry.player_count(), 1);
    }

    #[test]
    fn remove_player_drops_both_tables() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(1)).unwrap();
        registry.remove_player(&id(1));
        assert!(registry.get_player(&id(1)).is_none());
        assert_eq!(registry.scores().get(&id(1)), None);
        assert_eq!(registry.player_count(), registry.scores().len());
    }

    #[test]
    fn remove_player_is_idempotent() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(1)).unwrap();
        registry.add_player(id(2)).unwrap();
        registry.remove_player(&id(1));
        registry.remove_player(&id(1));
        assert_eq!(registry.player_count(), 1);
        assert_eq!(registry.scores().len(), 1);
    }

    #[test]
    fn update_unknown_id_is_ignored() {
        let mut registry = GameRegistry::new();
        let update = ParticipantUpdate {
            position: Vec3::new(1.0, 1.0, 1.0),
            ..Default::default()
        };
        registry.update_player(&id(9), &update);
        assert_eq!(registry.player_count(), 0);
    }

    #[test]
    fn update_overwrites_reported_state() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(1)).unwrap();
        let update = ParticipantUpdate {
            position: Vec3::new(3.0, 1.0, -2.0),
            rotation: Vec3::new(0.0, 1.5, 0.0),
            attack: Some(Direction::Left),
            block: None,
        };
        registry.update_player(&id(1), &update);
        let player = registry.get_player(&id(1)).unwrap();
        assert_eq!(player.position, Vec3::new(3.0, 1.0, -2.0));
        assert_eq!(player.combat.attack, Some(Direction::Left));
    }

    #[test]
    fn opponent_of_requires_two_players() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(1)).unwrap();
        assert_eq!(registry.opponent_of(&id(1)), None);
        registry.add_player(id(2)).unwrap();
        assert_eq!(registry.opponent_of(&id(1)), Some(id(2)));
        assert_eq!(registry.opponent_of(&id(2)), Some(id(1)));
    }

    #[test]
    fn opponent_of_three_players_picks_lowest_other() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(3)).unwrap();
        registry.add_player(id(1)).unwrap();
        registry.add_player(id(2)).unwrap();
        assert_eq!(registry.opponent_of(&id(1)), Some(id(2)));
        assert_eq!(registry.opponent_of(&id(2)), Some(id(1)));
        assert_eq!(registry.opponent_of(&id(3)), Some(id(1)));
    }

    #[test]
    fn opponent_of_survives_removal() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(1)).unwrap();
        registry.add_player(id(2)).unwrap();
        registry.remove_player(&id(1));
        // No dangling pairing: lookup re-derives from the live table.
        assert_eq!(registry.opponent_of(&id(2)), None);
    }

    #[test]
    fn reset_round_keeps_identities_and_positions() {
        let mut registry = GameRegistry::new();
        registry.add_player(id(1)).unwrap();
        registry.add_player(id(2)).unwrap();
        let update = ParticipantUpdate {
            position: Vec3::new(4.0, 1.0, 4.0),
            rotation: Vec3::default(),
            attack: Some(Direction::Up),
            block: None,
        };
        registry.update_player(&id(1), &update);
        registry.scores_mut().record_hit(&id(1));

        registry.reset_round();

        let player = registry.get_player(&id(1)).unwrap();
        assert_eq!(player.position, Vec3::new(4.0, 1.0, 4.0));
        assert!(player.combat.attack.is_none());
        assert_eq!(registry.scores().get(&id(1)), Some(0));
        assert_eq!(registry.player_count(), 2);
    }
}

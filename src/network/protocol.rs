//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! JSON text frames with an internal `type` tag; payload field names
//! are camelCase to match the original event schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::combat::Direction;
use crate::game::state::{Participant, ParticipantUpdate, PlayerId, Vec3};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Per-frame position/action report for the sending participant.
    PlayerUpdate(PlayerUpdate),

    /// Self-reported hit. The server trusts this at face value.
    Hit(HitReport),
}

/// Position/action snapshot of one participant. Sent by clients as
/// `playerUpdate` and relayed to everyone else as `opponentUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    /// Reporting participant.
    pub id: PlayerId,
    /// Current position.
    pub position: Vec3,
    /// Current facing (Euler angles).
    pub rotation: Vec3,
    /// Active attack direction, if any.
    pub attack_state: Option<Direction>,
    /// Active block direction, if any.
    pub block_state: Option<Direction>,
}

impl PlayerUpdate {
    /// Build the wire snapshot for a registered participant.
    pub fn from_participant(player: &Participant) -> Self {
        Self {
            id: player.id,
            position: player.position,
            rotation: player.rotation,
            attack_state: player.combat.attack,
            block_state: player.combat.block,
        }
    }

    /// Registry-side view of this payload.
    pub fn to_update(&self) -> ParticipantUpdate {
        ParticipantUpdate {
            position: self.position,
            rotation: self.rotation,
            attack: self.attack_state,
            block: self.block_state,
        }
    }
}

/// Who scored, from the reporting client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hitter {
    /// The sender landed a hit on their opponent.
    Player,
    /// The sender was hit: credit goes to their opponent.
    Opponent,
}

/// Hit report payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HitReport {
    /// Reporting participant.
    pub id: PlayerId,
    /// Which side of the duel scored.
    pub hitter: Hitter,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Connection bootstrap: the assigned id plus the current roster.
    Welcome {
        /// Id assigned to the receiving connection.
        id: PlayerId,
        /// Snapshot of everyone currently registered (receiver included).
        players: Vec<PlayerUpdate>,
    },

    /// Another participant's state report, relayed verbatim. Never sent
    /// back to the original sender.
    OpponentUpdate(PlayerUpdate),

    /// Authoritative scores after a hit, broadcast to all.
    ScoreUpdate {
        /// Score per participant id.
        scores: BTreeMap<PlayerId, u32>,
    },

    /// A participant reached the win threshold. The server resets the
    /// round immediately after broadcasting this.
    GameOver {
        /// The round winner.
        winner: PlayerId,
    },
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

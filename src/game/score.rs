//! Score Tracker
//!
//! Per-participant scores, win-threshold detection, and round reset.
//! Uses BTreeMap so "first participant by iteration order" is a
//! deterministic, id-ordered policy rather than hash-map luck.

use std::collections::BTreeMap;

use crate::game::state::PlayerId;

/// Score needed to win a round unless configured otherwise.
pub const DEFAULT_WIN_THRESHOLD: u32 = 3;

/// Scoreboard for all registered participants.
///
/// Entries are created and removed by the registry in lockstep with
/// participant lifecycle — a score never outlives its participant.
#[derive(Clone, Debug, Default)]
pub struct ScoreBoard {
    scores: BTreeMap<PlayerId, u32>,
}

impl ScoreBoard {
    /// Create an empty scoreboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant at score 0. Overwrites any stale entry.
    pub fn insert(&mut self, id: PlayerId) {
        self.scores.insert(id, 0);
    }

    /// Remove a participant's entry. No-op if absent.
    pub fn remove(&mut self, id: &PlayerId) {
        self.scores.remove(id);
    }

    /// Credit one hit to `id`. Unknown ids are dropped silently —
    /// a hit report can race a disconnect.
    pub fn record_hit(&mut self, id: &PlayerId) {
        if let Some(score) = self.scores.get_mut(id) {
            *score += 1;
        }
    }

    /// Current score for `id`, if registered.
    pub fn get(&self, id: &PlayerId) -> Option<u32> {
        self.scores.get(id).copied()
    }

    /// First participant (in id order) at or above `threshold`.
    ///
    /// When simultaneous hits push both scores across in the same tick,
    /// exactly one winner is reported: the earlier-iterated id.
    pub fn winner(&self, threshold: u32) -> Option<PlayerId> {
        self.scores
            .iter()
            .find(|(_, score)| **score >= threshold)
            .map(|(id, _)| *id)
    }

    /// Zero every score for the next round. Entries are kept.
    pub fn reset(&mut self) {
        for score in self.scores.values_mut() {
            *score = 0;
        }
    }

    /// Snapshot for the `scoreUpdate` broadcast.
    pub fn snapshot(&self) -> BTreeMap<PlayerId, u32> {
        self.scores.clone()
    }

    /// Number of score entries (must match registered participants).
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Is the board empty?
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> PlayerId {
        PlayerId::from_bytes([byte; 16])
    }

    #[test]
    fn record_hit_increments_by_one() {
        let mut board = ScoreBoard::new();
        board.insert(id(1));
        board.record_hit(&id(1));
        board.record_hit(&id(1));
        assert_eq!(board.get(&id(1)), Some(2));
    }

    #[test]
    fn record_hit_unknown_id_is_dropped() {
        let mut board = ScoreBoard::new();
        board.insert(id(1));
        board.record_hit(&id(9));
        assert_eq!(board.get(&id(1)), Some(0));
        assert_eq!(board.get(&id(9)), None);
    }

    #[test]
    fn winner_requires_threshold() {
        let mut board = ScoreBoard::new();
        board.insert(id(1));
        board.insert(id(2));
        board.record_hit(&id(2));
        board.record_hit(&id(2));
        assert_eq!(board.winner(3), None);
        board.record_hit(&id(2));
        assert_eq!(board.winner(3), Some(id(2)));
    }

    #[test]
    fn winner_no_cap_above_threshold() {
        let mut board = ScoreBoard::new();
        board.insert(id(1));
        for _ in 0..5 {
            board.record_hit(&id(1));
        }
        assert_eq!(board.get(&id(1)), Some(5));
        assert_eq!(board.winner(3), Some(id(1)));
    }

    #[test]
    fn double_cross_picks_lowest_id() {
        // Both cross the threshold in the same tick: the
        // earlier-iterated (lowest) id is the single reported winner.
        let mut board = ScoreBoard::new();
        board.insert(id(7));
        board.insert(id(2));
        for _ in 0..3 {
            board.record_hit(&id(7));
            board.record_hit(&id(2));
        }
        assert_eq!(board.winner(3), Some(id(2)));
    }

    #[test]
    fn reset_clears_winner_for_any_threshold() {
        let mut board = ScoreBoard::new();
        board.insert(id(1));
        board.insert(id(2));
        for _ in 0..4 {
            board.record_hit(&id(1));
        }
        board.reset();
        for threshold in 1..=5 {
            assert_eq!(board.winner(threshold), None);
        }
        assert_eq!(board.get(&id(1)), Some(0));
        assert_eq!(board.get(&id(2)), Some(0));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut board = ScoreBoard::new();
        board.insert(id(1));
        board.remove(&id(1));
        board.remove(&id(1));
        assert!(board.is_empty());
    }
}

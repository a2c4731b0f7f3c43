//! Hit Adjudicator
//!
//! Range gating and attack-vs-block resolution. Pure functions — score
//! mutation belongs to the Score Tracker, notification to the relay.

use crate::game::combat::Direction;
use crate::game::state::Participant;

/// Maximum distance (spatial units) at which a swing can land. Full
/// 3-D distance; there is no vertical exclusion.
pub const MELEE_RANGE: f32 = 2.0;

/// Are the two combatants close enough for either to land a hit?
#[inline]
pub fn in_range(a: &Participant, b: &Participant) -> bool {
    a.position.distance_to(&b.position) < MELEE_RANGE
}

/// Does `attacker`'s swing in `direction` land on `defender`?
///
/// A hit lands iff the attacker is actually mid-swing in that
/// direction, the pair is within [`MELEE_RANGE`], and the defender is
/// not guarding with the opposite direction.
pub fn evaluate_hit(attacker: &Participant, defender: &Participant, direction: Direction) -> bool {
    if !in_range(attacker, defender) {
        return false;
    }
    attacker.combat.attack == Some(direction) && !defender.combat.blocks_correctly(direction)
}

/// Evaluate one simulation tick symmetrically.
///
/// Returns `(a_lands_on_b, b_lands_on_a)`. Each side is judged
/// independently — either, neither, or both may land in the same tick,
/// and simultaneous hits are both scored.
pub fn exchange(a: &Participant, b: &Participant) -> (bool, bool) {
    let a_lands = a
        .combat
        .attack
        .map(|dir| evaluate_hit(a, b, dir))
        .unwrap_or(false);
    let b_lands = b
        .combat
        .attack
        .map(|dir| evaluate_hit(b, a, dir))
        .unwrap_or(false);
    (a_lands, b_lands)
}

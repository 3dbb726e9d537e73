//! Stateless combat rolls.

use rand::Rng;
use rand::rngs::StdRng;

use mv_core::Opponent;

/// Miss and critical-hit probabilities for one attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatOdds {
    /// Probability that an attack misses outright.
    pub miss_chance: f64,
    /// Probability that a landed attack doubles its base damage.
    pub crit_chance: f64,
}

impl Default for CombatOdds {
    fn default() -> Self {
        Self {
            miss_chance: 0.10,
            crit_chance: 0.15,
        }
    }
}

impl CombatOdds {
    /// Same crit chance with extra miss chance (clamped to 1).
    pub fn with_extra_miss(self, extra: f64) -> Self {
        Self {
            miss_chance: (self.miss_chance + extra).clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Outcome of [`roll_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRoll {
    /// Damage dealt; 0 on a miss, at least 1 otherwise.
    pub damage: i32,
    /// The hit was critical.
    pub crit: bool,
    /// The attack missed.
    pub miss: bool,
}

/// Roll one attack.
///
/// Crit and miss are both sampled, in that order, on every call so the
/// RNG stream does not depend on the outcome. A landed hit deals a
/// uniform amount in `max(1, base/2)..=base` where
/// `base = max(1, atk - def)`, doubled on a crit.
pub fn roll_damage(rng: &mut StdRng, atk: i32, def: i32, odds: CombatOdds) -> DamageRoll {
    let crit = rng.random::<f64>() < odds.crit_chance;
    let miss = rng.random::<f64>() < odds.miss_chance;
    if miss {
        return DamageRoll {
            damage: 0,
            crit: false,
            miss: true,
        };
    }
    let mut base = (atk - def).max(1);
    if crit {
        base *= 2;
    }
    let low = (base / 2).max(1);
    DamageRoll {
        damage: rng.random_range(low..=base),
        crit,
        miss: false,
    }
}

/// With probability `chance`, stun `target` for 1-3 turns. An existing
/// longer stun is kept. Returns the stun length after a successful roll.
pub fn try_stun(rng: &mut StdRng, target: &mut Opponent, chance: f64) -> Option<u32> {
    if rng.random::<f64>() >= chance {
        return None;
    }
    let turns = rng.random_range(1..=3);
    target.stunned_turns = target.stunned_turns.max(turns);
    Some(target.stunned_turns)
}

/// Suffix appended to a hit line when the target got stunned.
pub fn stun_suffix(turns: Option<u32>) -> String {
    match turns {
        Some(1) => " It is stunned for 1 turn.".to_string(),
        Some(n) => format!(" It is stunned for {n} turns."),
        None => String::new(),
    }
}

/// Index of the first living opponent.
pub fn primary_opponent_index(opponents: &[Opponent]) -> Option<usize> {
    opponents.iter().position(Opponent::is_alive)
}

/// Uniform roll in `low..=high`, tolerating `high < low`.
pub fn roll_between(rng: &mut StdRng, low: u32, high: u32) -> u32 {
    if high <= low {
        return low;
    }
    rng.random_range(low..=high)
}

//! Spell definitions and the rank rule.

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Highest spell rank.
pub const MAX_RANK: u32 = 3;

/// What a spell does when cast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellKind {
    /// Damages opponents.
    #[default]
    Elemental,
    /// Raises a teammate's HP and temporary max HP.
    Healing,
    /// Raises a teammate's temporary attack and defense.
    Strength,
}

/// Extra conditions that make a spell available beyond its level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnlockRule {
    /// Any of these player flags unlocks the spell.
    #[serde(default)]
    pub flags_any: Vec<String>,
    /// Having any of these items equipped unlocks the spell.
    #[serde(default)]
    pub items_any: Vec<String>,
}

fn default_mp_cost() -> i32 {
    2
}

fn default_atk_bonus() -> i32 {
    2
}

const DEFAULT_RANK3_MULT: f64 = 1.25;

fn default_stun_chance() -> f64 {
    0.4
}

fn default_rank3_stun_bonus() -> f64 {
    0.1
}

/// Static definition of a spell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellDef {
    /// Display name.
    pub name: String,
    /// Effect class.
    #[serde(default)]
    pub kind: SpellKind,
    /// Element; wand charges of this element pay for the cast.
    #[serde(default)]
    pub element: Option<Element>,
    /// MP per rank.
    #[serde(default = "default_mp_cost")]
    pub mp_cost: i32,
    /// Player level at which rank 1 is reached.
    #[serde(default)]
    pub level_required: u32,
    /// Flat attack added to the caster's attack.
    #[serde(default = "default_atk_bonus")]
    pub atk_bonus: i32,
    /// Damage multiplier for rank-3 player casts and follower wand casts.
    #[serde(default)]
    pub rank3_damage_mult: Option<f64>,
    /// Chance to stun a surviving target.
    #[serde(default = "default_stun_chance")]
    pub stun_chance: f64,
    /// Added to the stun chance at rank 3.
    #[serde(default = "default_rank3_stun_bonus")]
    pub rank3_stun_bonus: f64,
    /// Whether rank-1 casts pick a single target.
    #[serde(default = "default_true")]
    pub requires_target: bool,
    /// Extra availability rule.
    #[serde(default)]
    pub unlock: Option<UnlockRule>,
}

fn default_true() -> bool {
    true
}

impl SpellDef {
    /// Rank for a caster of `level`: `1 + (level - required) / 2`, clamped
    /// to `0..=3`; 0 when the caster is below the requirement.
    pub fn rank_for(&self, level: u32) -> u32 {
        if level < self.level_required {
            return 0;
        }
        (1 + (level - self.level_required) / 2).min(MAX_RANK)
    }

    /// Returns true for healing and strength spells.
    pub fn is_support(&self) -> bool {
        !matches!(self.kind, SpellKind::Elemental)
    }

    /// Player damage multiplier at rank 3, 1.25 unless the spell sets one.
    pub fn rank3_mult(&self) -> f64 {
        self.rank3_damage_mult.unwrap_or(DEFAULT_RANK3_MULT)
    }

    /// Multiplier on follower wand casts: 1.0 unless the spell sets one.
    pub fn wand_mult(&self) -> f64 {
        self.rank3_damage_mult.unwrap_or(1.0)
    }

    /// MP cost of a cast at `rank`.
    pub fn cost_at(&self, rank: u32) -> i32 {
        self.mp_cost * rank.max(1) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(level_required: u32) -> SpellDef {
        serde_json::from_value(serde_json::json!({
            "name": "Spark",
            "level_required": level_required,
        }))
        .unwrap()
    }

    #[test]
    fn defaults_fill_in() {
        let s = spell(1);
        assert_eq!(s.mp_cost, 2);
        assert_eq!(s.atk_bonus, 2);
        assert!((s.rank3_mult() - 1.25).abs() < f64::EPSILON);
        assert!((s.wand_mult() - 1.0).abs() < f64::EPSILON);
        assert!(s.requires_target);
        assert!(!s.is_support());
    }

    #[test]
    fn rank_grows_every_two_levels() {
        let s = spell(3);
        assert_eq!(s.rank_for(2), 0);
        assert_eq!(s.rank_for(3), 1);
        assert_eq!(s.rank_for(4), 1);
        assert_eq!(s.rank_for(5), 2);
        assert_eq!(s.rank_for(7), 3);
        assert_eq!(s.rank_for(40), 3);
    }

    #[test]
    fn cost_scales_with_rank() {
        let s = spell(1);
        assert_eq!(s.cost_at(0), 2);
        assert_eq!(s.cost_at(3), 6);
    }
}

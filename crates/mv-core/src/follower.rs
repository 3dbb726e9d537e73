//! Followers, their templates and fusion promotions.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::element::{Element, Stat};
use crate::gauge::Gauge;
use crate::gear::{GearArena, GearId, GearInstance, GearSlot};

/// Stable follower identifier, unique within one player's roster history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowerId(pub u32);

impl fmt::Display for FollowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Stat points granted per follower level.
pub const FOLLOWER_POINTS_PER_LEVEL: u32 = 10;

/// XP needed for a follower to leave `level`: `100 * 2^(level-1)`.
pub fn follower_xp_threshold(level: u32) -> u32 {
    100u32.saturating_mul(1u32 << level.saturating_sub(1).min(24))
}

/// Type-level defaults for a follower kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowerTemplate {
    /// Default display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Ability ids.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Preferred active ability; defaults to the first.
    #[serde(default)]
    pub active_ability: Option<String>,
    /// Support spells the follower knows.
    #[serde(default)]
    pub spells: Vec<String>,
    /// Wands handed out on recruitment; one is picked at random.
    #[serde(default)]
    pub starter_wands: Vec<String>,
}

/// A fusion promotion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionRule {
    /// Follower type produced.
    pub into: String,
    /// Name of the promoted follower.
    #[serde(default)]
    pub name: Option<String>,
    /// A fused-away follower with this name passes it on.
    #[serde(default)]
    pub keep_name: Option<String>,
}

/// Follower templates and fusion rules keyed by type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowerCatalog {
    /// Templates by follower type.
    #[serde(default)]
    pub templates: BTreeMap<String, FollowerTemplate>,
    /// Promotions by source type.
    #[serde(default)]
    pub fusions: BTreeMap<String, FusionRule>,
}

impl FollowerCatalog {
    /// Template for `kind`, if any.
    pub fn template(&self, kind: &str) -> Option<&FollowerTemplate> {
        self.templates.get(kind)
    }

    /// Promotion rule for `kind`, if any.
    pub fn fusion(&self, kind: &str) -> Option<&FusionRule> {
        self.fusions.get(kind)
    }
}

/// Title-case a type id: `mushroom_teen` becomes `Mushroom Teen`.
pub fn kind_title(kind: &str) -> String {
    kind.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Levels gained from one XP award, however many there were.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowerLevelUp {
    /// New level.
    pub level: u32,
    /// Points that went into HP, MP, ATK and DEF across every level gained.
    pub gains: [u32; 4],
}

/// A party member fighting alongside the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follower {
    /// Stable id.
    pub id: FollowerId,
    /// Type id (e.g. `mushroom_baby`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Level.
    pub level: u32,
    /// XP toward the next level.
    pub xp: u32,
    /// Level cap.
    pub max_level: u32,
    /// Base attack.
    pub atk: i32,
    /// Base defense.
    pub defense: i32,
    /// Hit points.
    pub hp: Gauge,
    /// Magic points.
    pub mp: Gauge,
    /// Temporary attack bonus; decays each round.
    #[serde(default)]
    pub temp_atk_bonus: i32,
    /// Temporary defense bonus; decays each round.
    #[serde(default)]
    pub temp_def_bonus: i32,
    /// Temporary max-HP bonus; decays each round.
    #[serde(default)]
    pub temp_hp_bonus: i32,
    #[serde(default)]
    pub(crate) equipment: BTreeMap<GearSlot, GearId>,
    /// Known abilities.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Ability used at end of round.
    #[serde(default)]
    pub active_ability: String,
    /// Known support spells.
    #[serde(default)]
    pub spells: Vec<String>,
}

impl Follower {
    /// A level-1 follower with default stats.
    pub fn new(id: FollowerId, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            name: name.into(),
            level: 1,
            xp: 0,
            max_level: 5,
            atk: 4,
            defense: 2,
            hp: Gauge::new(12),
            mp: Gauge::new(6),
            temp_atk_bonus: 0,
            temp_def_bonus: 0,
            temp_hp_bonus: 0,
            equipment: BTreeMap::new(),
            abilities: Vec::new(),
            active_ability: String::new(),
            spells: Vec::new(),
        }
    }

    /// Copy abilities and spells from a template.
    pub fn apply_template(&mut self, template: &FollowerTemplate) {
        self.abilities = template.abilities.clone();
        self.spells = template.spells.clone();
        self.active_ability = template
            .active_ability
            .clone()
            .or_else(|| self.abilities.first().cloned())
            .unwrap_or_default();
    }

    /// Returns true while HP is above zero.
    pub fn is_alive(&self) -> bool {
        self.hp.current > 0
    }

    /// Equipped gear ids by slot.
    pub fn equipment(&self) -> &BTreeMap<GearSlot, GearId> {
        &self.equipment
    }

    /// Equipped gear in `slot`.
    pub fn gear<'a>(&self, arena: &'a GearArena, slot: GearSlot) -> Option<&'a GearInstance> {
        self.equipment.get(&slot).and_then(|id| arena.get(id))
    }

    /// Attack including gear and temporary bonus.
    pub fn total_atk(&self, arena: &GearArena) -> i32 {
        let gear: i32 = self.equipped(arena).map(|g| g.atk).sum();
        self.atk + gear + self.temp_atk_bonus
    }

    /// Defense including gear and temporary bonus.
    pub fn total_defense(&self, arena: &GearArena) -> i32 {
        let gear: i32 = self.equipped(arena).map(|g| g.defense).sum();
        self.defense + gear + self.temp_def_bonus
    }

    /// Max HP including the temporary bonus.
    pub fn total_max_hp(&self) -> i32 {
        self.hp.max + self.temp_hp_bonus
    }

    /// Points of `element` summed over equipped gear.
    pub fn element_points(&self, arena: &GearArena, element: Element) -> i32 {
        self.equipped(arena)
            .map(|g| g.elem_points.get(&element).copied().unwrap_or(0))
            .sum()
    }

    fn equipped<'a>(&'a self, arena: &'a GearArena) -> impl Iterator<Item = &'a GearInstance> + 'a {
        self.equipment.values().filter_map(|id| arena.get(id))
    }

    /// Drop each temporary bonus by one toward zero and re-clamp HP.
    pub fn decay_temp_bonuses(&mut self) {
        self.temp_atk_bonus = (self.temp_atk_bonus - 1).max(0);
        self.temp_def_bonus = (self.temp_def_bonus - 1).max(0);
        self.temp_hp_bonus = (self.temp_hp_bonus - 1).max(0);
        let ceiling = self.total_max_hp();
        self.hp.clamp_to(ceiling);
    }

    /// Add XP and level up while over the doubling threshold, spreading
    /// ten random stat points per level. Returns one summary covering
    /// every level gained, or `None` if the follower did not level.
    pub fn gain_xp<R: Rng>(&mut self, amount: u32, rng: &mut R) -> Option<FollowerLevelUp> {
        if self.level >= self.max_level {
            return None;
        }
        self.xp += amount;
        let start = self.level;
        let mut gains = [0u32; 4];
        while self.level < self.max_level {
            let threshold = follower_xp_threshold(self.level);
            if self.xp < threshold {
                break;
            }
            self.xp -= threshold;
            self.level += 1;
            for _ in 0..FOLLOWER_POINTS_PER_LEVEL {
                let pick = rng.random_range(0..Stat::ALL.len());
                gains[pick] += 1;
                match Stat::ALL[pick] {
                    Stat::Hp => {
                        self.hp.max += 1;
                        self.hp.current = (self.hp.current + 1).min(self.hp.max);
                    }
                    Stat::Mp => {
                        self.mp.max += 1;
                        self.mp.current = (self.mp.current + 1).min(self.mp.max);
                    }
                    Stat::Atk => self.atk += 1,
                    Stat::Def => self.defense += 1,
                }
            }
        }
        (self.level > start).then_some(FollowerLevelUp {
            level: self.level,
            gains,
        })
    }
}

impl FollowerLevelUp {
    /// Announcement line, e.g. `Mushy leveled up to 2! HP+3 ATK+7`.
    /// Stats that gained nothing are left out.
    pub fn message(&self, name: &str) -> String {
        let parts: Vec<String> = Stat::ALL
            .iter()
            .zip(self.gains)
            .filter(|(_, n)| *n > 0)
            .map(|(stat, n)| format!("{stat}+{n}"))
            .collect();
        let bonus = if parts.is_empty() {
            "No stats".to_string()
        } else {
            parts.join(" ")
        };
        format!("{name} leveled up to {}! {bonus}", self.level)
    }
}

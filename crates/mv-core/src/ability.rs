use serde::{Deserialize, Serialize};

use crate::player::TeamMode;

/// What an ability does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Restore the player's HP by a level-scaled amount.
    #[default]
    Heal,
    /// Restore the player's MP by a level-scaled amount.
    Mana,
    /// Use an item on the most depleted teammate.
    Item,
}

/// When an ability fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityTiming {
    /// After every combat round.
    #[default]
    EndRound,
    /// Only during the follower's own turn (tea brewers).
    Turn,
}

fn default_level() -> u32 {
    1
}

/// Static definition of a follower ability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Display label used in messages.
    pub label: String,
    /// Effect.
    #[serde(default, rename = "type")]
    pub kind: AbilityKind,
    /// When it fires.
    #[serde(default)]
    pub timing: AbilityTiming,
    /// Follower level needed.
    #[serde(default = "default_level")]
    pub min_level: u32,
    /// Low end of the restore roll at level 1.
    #[serde(default)]
    pub base_min: i32,
    /// High end of the restore roll at level 1.
    #[serde(default)]
    pub base_max: i32,
    /// Added to both ends per level above 1.
    #[serde(default)]
    pub per_level_bonus: i32,
    /// Trigger chance for item abilities.
    #[serde(default)]
    pub chance: Option<f64>,
    /// Item used by item abilities.
    #[serde(default)]
    pub item_id: Option<String>,
    /// Gauge(s) considered when picking a target.
    #[serde(default)]
    pub target: TeamMode,
}

impl AbilityDef {
    /// Restore range for a follower at `level`: `(min, max)` with `max >= min`.
    pub fn roll_range(&self, level: u32) -> (i32, i32) {
        let bonus = self.per_level_bonus * (level.max(1) as i32 - 1);
        let low = self.base_min + bonus;
        let high = (self.base_max + bonus).max(low);
        (low, high)
    }
}

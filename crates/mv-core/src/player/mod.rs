//! The player entity.
//!
//! The gear arena, equipment map and follower roster are private so the
//! gear owner index can only change through the methods in [`gear`] and
//! [`party`]. Everything else is plain data.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::follower::Follower;
use crate::gauge::Gauge;
use crate::gear::{GearArena, GearId, GearSlot};
use crate::quest::QuestState;

/// Equipment, gear fusion and wand charges.
pub mod gear;
/// Follower roster and fusion.
pub mod party;
/// XP, levels and stat allocation.
pub mod progression;
/// Team targeting and consumables.
pub mod team;

pub use progression::{LevelUpChoice, xp_threshold};
pub use team::{TeamMode, TeamTarget};

/// Name used when none was chosen.
pub const DEFAULT_NAME: &str = "WARRIOR";

/// Animation pacing preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleSpeed {
    /// Short pauses.
    Fast,
    /// Default pacing.
    #[default]
    Normal,
    /// Long pauses.
    Slow,
}

impl BattleSpeed {
    /// Next speed in the fast, normal, slow cycle.
    pub fn next(self) -> Self {
        match self {
            BattleSpeed::Fast => BattleSpeed::Normal,
            BattleSpeed::Normal => BattleSpeed::Slow,
            BattleSpeed::Slow => BattleSpeed::Fast,
        }
    }

    /// Pause between combat beats, in seconds.
    pub fn delay_secs(self) -> f64 {
        match self {
            BattleSpeed::Fast => 0.2,
            BattleSpeed::Normal => 0.45,
            BattleSpeed::Slow => 0.75,
        }
    }
}

impl fmt::Display for BattleSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BattleSpeed::Fast => "fast",
            BattleSpeed::Normal => "normal",
            BattleSpeed::Slow => "slow",
        })
    }
}

/// Starting wealth picked during character creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fortune {
    /// 10 GP.
    Poor,
    /// 100 GP.
    WellOff,
    /// 1000 GP.
    Royalty,
}

impl Fortune {
    /// All fortunes in menu order.
    pub const ALL: [Fortune; 3] = [Fortune::Poor, Fortune::WellOff, Fortune::Royalty];

    /// Starting gold.
    pub fn gold(self) -> u32 {
        match self {
            Fortune::Poor => 10,
            Fortune::WellOff => 100,
            Fortune::Royalty => 1000,
        }
    }

    /// Uppercase id used in `FORTUNE_<ID>` commands.
    pub fn id(self) -> &'static str {
        match self {
            Fortune::Poor => "POOR",
            Fortune::WellOff => "WELL_OFF",
            Fortune::Royalty => "ROYALTY",
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Fortune::Poor => "Poor (10 GP)",
            Fortune::WellOff => "Well-off (100 GP)",
            Fortune::Royalty => "Royalty (1000 GP)",
        }
    }
}

/// Flags set by quests and unlocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFlags {
    /// Boolean flags that are set.
    #[serde(default)]
    pub set: BTreeSet<String>,
    /// When non-empty, only these follower types can be recruited.
    #[serde(default)]
    pub recruit_only_types: Vec<String>,
    /// Overrides the follower limit.
    #[serde(default)]
    pub follower_cap: Option<u32>,
}

impl PlayerFlags {
    /// Returns true if `flag` is set.
    pub fn is_set(&self, flag: &str) -> bool {
        self.set.contains(flag)
    }

    /// Set `flag`.
    pub fn raise(&mut self, flag: impl Into<String>) {
        self.set.insert(flag.into());
    }
}

fn default_elements() -> BTreeSet<Element> {
    BTreeSet::from([Element::Base])
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Name.
    pub name: String,
    /// Level.
    pub level: u32,
    /// Cumulative XP.
    pub xp: u32,
    /// Unspent stat points.
    pub stat_points: u32,
    /// Gold pieces.
    pub gold: u32,
    /// Animation pacing.
    #[serde(default)]
    pub battle_speed: BattleSpeed,
    /// Hit points.
    pub hp: Gauge,
    /// Magic points.
    pub mp: Gauge,
    /// Base attack.
    pub atk: i32,
    /// Base defense.
    pub defense: i32,
    /// Temporary attack bonus; decays each round.
    #[serde(default)]
    pub temp_atk_bonus: i32,
    /// Temporary defense bonus; decays each round.
    #[serde(default)]
    pub temp_def_bonus: i32,
    /// Temporary max-HP bonus; decays each round.
    #[serde(default)]
    pub temp_hp_bonus: i32,
    /// Stackable items by id.
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    #[serde(default)]
    gear: GearArena,
    #[serde(default)]
    equipment: BTreeMap<GearSlot, GearId>,
    #[serde(default)]
    followers: Vec<Follower>,
    #[serde(default)]
    next_follower_id: u32,
    #[serde(default = "default_elements")]
    elements: BTreeSet<Element>,
    #[serde(default)]
    current_element: Element,
    /// Quest and unlock flags; persisted beside the player.
    #[serde(skip)]
    pub flags: PlayerFlags,
    /// Quest progress; persisted beside the player.
    #[serde(skip)]
    pub quests: BTreeMap<String, QuestState>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(DEFAULT_NAME, 10)
    }
}

impl Player {
    /// A fresh level-1 character.
    pub fn new(name: impl Into<String>, gold: u32) -> Self {
        Self {
            name: name.into(),
            level: 1,
            xp: 0,
            stat_points: 0,
            gold,
            battle_speed: BattleSpeed::Normal,
            hp: Gauge::new(50),
            mp: Gauge::new(10),
            atk: 5,
            defense: 5,
            temp_atk_bonus: 0,
            temp_def_bonus: 0,
            temp_hp_bonus: 0,
            inventory: BTreeMap::new(),
            gear: GearArena::new(),
            equipment: BTreeMap::new(),
            followers: Vec::new(),
            next_follower_id: 1,
            elements: default_elements(),
            current_element: Element::Base,
            flags: PlayerFlags::default(),
            quests: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Vitals
    // -----------------------------------------------------------------------

    /// Attack from equipped gear.
    pub fn gear_atk(&self) -> i32 {
        self.equipped_gear().map(|g| g.atk).sum()
    }

    /// Defense from equipped gear.
    pub fn gear_defense(&self) -> i32 {
        self.equipped_gear().map(|g| g.defense).sum()
    }

    /// Attack including gear and temporary bonus.
    pub fn total_atk(&self) -> i32 {
        self.atk + self.gear_atk() + self.temp_atk_bonus
    }

    /// Defense including gear and temporary bonus.
    pub fn total_defense(&self) -> i32 {
        self.defense + self.gear_defense() + self.temp_def_bonus
    }

    /// Max HP including the temporary bonus.
    pub fn total_max_hp(&self) -> i32 {
        self.hp.max + self.temp_hp_bonus
    }

    /// Returns true while HP is above zero.
    pub fn is_alive(&self) -> bool {
        self.hp.current > 0
    }

    /// Full HP/MP restore that also clears temporary bonuses.
    pub fn rest(&mut self) {
        self.clear_temp_bonuses();
        self.hp.fill();
        self.mp.fill();
    }

    /// Zero every temporary bonus.
    pub fn clear_temp_bonuses(&mut self) {
        self.temp_atk_bonus = 0;
        self.temp_def_bonus = 0;
        self.temp_hp_bonus = 0;
        self.hp.clamp_to(self.hp.max);
    }

    /// Drop each temporary bonus by one toward zero and re-clamp HP.
    pub fn decay_temp_bonuses(&mut self) {
        self.temp_atk_bonus = (self.temp_atk_bonus - 1).max(0);
        self.temp_def_bonus = (self.temp_def_bonus - 1).max(0);
        self.temp_hp_bonus = (self.temp_hp_bonus - 1).max(0);
        let ceiling = self.total_max_hp();
        self.hp.clamp_to(ceiling);
    }

    // -----------------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------------

    /// Unlocked elements in canonical order; never empty.
    pub fn elements(&self) -> &BTreeSet<Element> {
        &self.elements
    }

    /// The active element; always one of [`Player::elements`].
    pub fn current_element(&self) -> Element {
        self.current_element
    }

    /// Switch the active element. Returns false if it is not unlocked.
    pub fn set_current_element(&mut self, element: Element) -> bool {
        if !self.elements.contains(&element) {
            return false;
        }
        self.current_element = element;
        true
    }

    /// Replace the unlocked set, keeping it non-empty and the current
    /// element valid.
    pub fn sync_elements(&mut self, unlocked: BTreeSet<Element>) {
        self.elements = if unlocked.is_empty() {
            default_elements()
        } else {
            unlocked
        };
        if !self.elements.contains(&self.current_element) {
            self.current_element = self.elements.first().copied().unwrap_or_default();
        }
    }

    // -----------------------------------------------------------------------
    // Stack inventory
    // -----------------------------------------------------------------------

    /// Add `amount` of a stackable item.
    pub fn add_item(&mut self, key: impl Into<String>, amount: u32) {
        *self.inventory.entry(key.into()).or_insert(0) += amount;
    }

    /// How many of `key` the player holds.
    pub fn item_count(&self, key: &str) -> u32 {
        self.inventory.get(key).copied().unwrap_or(0)
    }

    /// Remove one `key`. Returns false if none were held.
    pub fn take_item(&mut self, key: &str) -> bool {
        match self.inventory.get_mut(key) {
            Some(n) if *n > 0 => {
                *n -= 1;
                if *n == 0 {
                    self.inventory.remove(key);
                }
                true
            }
            _ => false,
        }
    }

    /// Returns true if any stackable item is held.
    pub fn has_items(&self) -> bool {
        self.inventory.values().any(|n| *n > 0)
    }

    /// Restore invariants after deserialization: rebuild the gear owner
    /// index, drop dangling equipment and repair the element set.
    pub fn restore_after_load(&mut self) {
        self.reindex_gear();
        let elements = std::mem::take(&mut self.elements);
        self.sync_elements(elements);
        self.next_follower_id = self
            .next_follower_id
            .max(self.followers.iter().map(|f| f.id.0 + 1).max().unwrap_or(1));
    }
}

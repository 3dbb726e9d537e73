//! Opponent templates, elemental variants and live opponents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::gauge::Gauge;

fn default_level() -> u32 {
    1
}

fn default_hp() -> i32 {
    10
}

fn default_stat() -> i32 {
    5
}

fn default_one() -> f64 {
    1.0
}

fn default_arrival() -> String {
    "appears".to_string()
}

/// Which damaged ally a support opponent heals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealTarget {
    /// The first damaged ally in encounter order.
    #[default]
    First,
    /// The ally missing the most HP.
    MostMissingHp,
}

/// Optional non-default opponent behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpponentAi {
    /// Heal a damaged ally with an item some of the time, otherwise attack.
    SupportHealThenAttack {
        /// Chance to heal when an ally is damaged.
        #[serde(default)]
        heal_chance: f64,
        /// Item whose HP value is restored.
        #[serde(default)]
        heal_item_id: String,
        /// Ally selection rule.
        #[serde(default)]
        heal_target: HealTarget,
    },
}

/// Static opponent definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentTemplate {
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub desc: String,
    /// Level; spawning keeps the summed level within the player's.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Max HP.
    #[serde(default = "default_hp")]
    pub hp: i32,
    /// Attack.
    #[serde(default = "default_stat")]
    pub atk: i32,
    /// Defense.
    #[serde(default = "default_stat")]
    pub defense: i32,
    /// Probability of acting on a turn.
    #[serde(default = "default_one")]
    pub action_chance: f64,
    /// Verb used in the arrival line, e.g. "appears".
    #[serde(default = "default_arrival")]
    pub arrival: String,
    /// Element of this variant.
    #[serde(default)]
    pub element: Option<Element>,
    /// Whether SOCIALIZE can recruit it.
    #[serde(default)]
    pub recruitable: bool,
    /// GP paid on a recruit attempt.
    #[serde(default)]
    pub recruit_cost: u32,
    /// Recruit success probability.
    #[serde(default)]
    pub recruit_chance: f64,
    /// Follower type produced on recruitment.
    #[serde(default)]
    pub follower_type: Option<String>,
    /// Name pool for recruited followers.
    #[serde(default)]
    pub follower_names: Vec<String>,
    /// Special behavior.
    #[serde(default)]
    pub ai: Option<OpponentAi>,
}

/// Per-element stat multipliers for variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatMultipliers {
    /// HP multiplier.
    #[serde(default = "default_one")]
    pub hp: f64,
    /// Attack multiplier.
    #[serde(default = "default_one")]
    pub atk: f64,
    /// Defense multiplier.
    #[serde(default = "default_one")]
    pub defense: f64,
    /// Action chance multiplier.
    #[serde(default = "default_one")]
    pub speed: f64,
}

impl Default for StatMultipliers {
    fn default() -> Self {
        Self {
            hp: 1.0,
            atk: 1.0,
            defense: 1.0,
            speed: 1.0,
        }
    }
}

/// Variant tuning shared by all elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantMeta {
    /// Level offset per element.
    #[serde(default)]
    pub level_offsets: BTreeMap<Element, i32>,
    /// Stat multipliers per element.
    #[serde(default)]
    pub stat_multipliers: BTreeMap<Element, StatMultipliers>,
}

/// Elemental variant table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantTable {
    /// Offsets and multipliers.
    #[serde(default)]
    pub meta: VariantMeta,
    /// Name overrides keyed by `<base>_<element>`.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
    /// Description overrides keyed by `<base>_<element>`.
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
}

/// The opponent catalog: base templates plus elemental variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentCatalog {
    /// Base templates by id.
    #[serde(default)]
    pub base_opponents: BTreeMap<String, OpponentTemplate>,
    /// Elemental variant rules.
    #[serde(default)]
    pub element_variants: VariantTable,
}

impl OpponentCatalog {
    /// Apply the element's offsets, multipliers and overrides to a base template.
    pub fn build_variant(&self, base_id: &str, element: Element) -> Option<OpponentTemplate> {
        let mut t = self.base_opponents.get(base_id)?.clone();
        let meta = &self.element_variants.meta;
        let offset = meta.level_offsets.get(&element).copied().unwrap_or(0);
        let mult = meta.stat_multipliers.get(&element).copied().unwrap_or_default();
        t.level = (t.level as i32 + offset).max(1) as u32;
        t.hp = ((f64::from(t.hp) * mult.hp) as i32).max(1);
        t.atk = ((f64::from(t.atk) * mult.atk) as i32).max(1);
        t.defense = ((f64::from(t.defense) * mult.defense) as i32).max(0);
        t.action_chance *= mult.speed;
        t.element = Some(element);
        let key = format!("{base_id}_{element}");
        if let Some(name) = self.element_variants.names.get(&key) {
            t.name = name.clone();
        }
        if let Some(desc) = self.element_variants.descriptions.get(&key) {
            t.desc = desc.clone();
        }
        Some(t)
    }

    /// Variants of every base template for `element`, in id order.
    pub fn variants_for(&self, element: Element) -> Vec<OpponentTemplate> {
        self.base_opponents
            .keys()
            .filter_map(|id| self.build_variant(id, element))
            .collect()
    }
}

/// A live opponent in an encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    /// Display name.
    pub name: String,
    /// Element of the variant.
    pub element: Element,
    /// Level.
    pub level: u32,
    /// Hit points.
    pub hp: Gauge,
    /// Attack.
    pub atk: i32,
    /// Defense.
    pub defense: i32,
    /// Turns left before it acts again.
    pub stunned_turns: u32,
    /// Probability of acting on a turn.
    pub action_chance: f64,
    /// Set once the defeat has been handed to the renderer.
    pub melted: bool,
    /// Arrival verb.
    pub arrival: String,
    /// Recruitable via SOCIALIZE.
    pub recruitable: bool,
    /// GP paid on a recruit attempt.
    pub recruit_cost: u32,
    /// Recruit success probability.
    pub recruit_chance: f64,
    /// Follower type produced on recruitment.
    pub follower_type: Option<String>,
    /// Name pool for recruited followers.
    pub follower_names: Vec<String>,
    /// Special behavior.
    pub ai: Option<OpponentAi>,
}

impl Opponent {
    /// Spawn a live opponent from a template.
    pub fn from_template(t: &OpponentTemplate) -> Self {
        Self {
            name: t.name.clone(),
            element: t.element.unwrap_or(Element::Base),
            level: t.level,
            hp: Gauge::new(t.hp),
            atk: t.atk,
            defense: t.defense,
            stunned_turns: 0,
            action_chance: t.action_chance,
            melted: false,
            arrival: t.arrival.clone(),
            recruitable: t.recruitable,
            recruit_cost: t.recruit_cost,
            recruit_chance: t.recruit_chance,
            follower_type: t.follower_type.clone(),
            follower_names: t.follower_names.clone(),
            ai: t.ai.clone(),
        }
    }

    /// Returns true while HP is above zero.
    pub fn is_alive(&self) -> bool {
        self.hp.current > 0
    }

    /// Returns true if it has been defeated but not yet handed off as melted.
    pub fn is_newly_defeated(&self) -> bool {
        !self.is_alive() && !self.melted
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::gear::GearSlot;

/// Broad item category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Stackable item consumed on use.
    #[default]
    Consumable,
    /// Equippable gear; each copy becomes a unique instance.
    Gear,
}

/// Static definition of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Category.
    #[serde(default, rename = "type")]
    pub kind: ItemKind,
    /// Slot for gear items.
    #[serde(default)]
    pub slot: Option<GearSlot>,
    /// Attack bonus (gear).
    #[serde(default)]
    pub atk: i32,
    /// Defense bonus (gear).
    #[serde(default)]
    pub defense: i32,
    /// HP restored (consumables).
    #[serde(default)]
    pub hp: i32,
    /// MP restored (consumables).
    #[serde(default)]
    pub mp: i32,
    /// Shop price in GP.
    #[serde(default)]
    pub price: u32,
    /// Single element shorthand for gear without a point map.
    #[serde(default)]
    pub element: Option<Element>,
    /// Elemental point distribution (gear).
    #[serde(default)]
    pub elem_points: BTreeMap<Element, i32>,
    /// Spells granted while equipped.
    #[serde(default)]
    pub grants_spells: Vec<String>,
}

impl ItemDef {
    /// The gear slot, if this is equippable.
    pub fn gear_slot(&self) -> Option<GearSlot> {
        match self.kind {
            ItemKind::Gear => self.slot,
            ItemKind::Consumable => None,
        }
    }

    /// Returns true if using this item restores HP or MP.
    pub fn restores(&self) -> bool {
        self.hp > 0 || self.mp > 0
    }

    /// Price a shop pays for this item.
    pub fn sale_price(&self) -> u32 {
        self.price / 2
    }
}

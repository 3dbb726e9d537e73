//! Town venues: their services, shop stock and info sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::CommandDef;
use crate::element::Element;

/// The behavior family of a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    /// Buy and sell items.
    Shop,
    /// Information hall with switchable sections.
    Hall,
    /// Rest, meals and wand overcharge.
    Inn,
    /// Gear fusion.
    Alchemist,
    /// Follower fusion.
    Temple,
    /// Smithy.
    Smithy,
    /// Continent travel.
    Portal,
}

/// The kind of service an inn offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Full HP/MP restore, clears temporary bonuses.
    Rest,
    /// Restore the HP/MP of an item definition.
    Meal,
    /// Fill the equipped wand to 1.5x charge capacity.
    Overcharge,
}

/// A paid venue service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDef {
    /// Service type.
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    /// GP cost.
    #[serde(default)]
    pub cost: u32,
    /// Item whose HP/MP a meal restores.
    #[serde(default)]
    pub item_id: Option<String>,
    /// Success message.
    #[serde(default)]
    pub message: Option<String>,
    /// Shown when HP and MP are already full.
    #[serde(default)]
    pub full_message: Option<String>,
    /// Shown when used outside town.
    #[serde(default)]
    pub location_message: Option<String>,
    /// Shown when the player cannot pay.
    #[serde(default)]
    pub insufficient_message: Option<String>,
    /// Shown when overcharge finds no wand.
    #[serde(default)]
    pub no_wand_message: Option<String>,
}

/// One slot in a shop's stock list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopEntry {
    /// Item sold.
    pub item_id: String,
}

/// A switchable hall section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoSection {
    /// Section key.
    pub key: String,
    /// Command that selects it (`NUM1`, `NUM2`, ...).
    pub command: String,
    /// Text shown.
    pub message: String,
}

/// Static definition of a venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueDef {
    /// Behavior family.
    pub kind: VenueKind,
    /// Display name.
    pub name: String,
    /// Message on entry.
    #[serde(default)]
    pub welcome_message: Option<String>,
    /// Message on leaving.
    #[serde(default)]
    pub leave_message: Option<String>,
    /// Services by id.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDef>,
    /// Shop stock per continent; `base` is the fallback.
    #[serde(default)]
    pub inventory_sets: BTreeMap<Element, Vec<ShopEntry>>,
    /// Hall sections.
    #[serde(default)]
    pub info_sections: Vec<InfoSection>,
    /// Venue command list.
    #[serde(default)]
    pub commands: Vec<CommandDef>,
}

impl VenueDef {
    /// Shop stock for the current continent, falling back to `base`.
    pub fn stock_for(&self, element: Element) -> &[ShopEntry] {
        self.inventory_sets
            .get(&element)
            .or_else(|| self.inventory_sets.get(&Element::Base))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Welcome message, or a generic one.
    pub fn welcome(&self) -> String {
        self.welcome_message
            .clone()
            .unwrap_or_else(|| format!("You enter the {}.", self.name))
    }

    /// Leave message, or a generic one.
    pub fn farewell(&self) -> String {
        self.leave_message
            .clone()
            .unwrap_or_else(|| "You leave the venue.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_falls_back_to_base() {
        let venue: VenueDef = serde_json::from_value(serde_json::json!({
            "kind": "shop",
            "name": "Shop",
            "inventory_sets": {
                "base": [{ "item_id": "potion" }],
                "fire": [{ "item_id": "ember_ring" }]
            }
        }))
        .unwrap();
        assert_eq!(venue.stock_for(Element::Fire)[0].item_id, "ember_ring");
        assert_eq!(venue.stock_for(Element::Ice)[0].item_id, "potion");
        assert_eq!(venue.farewell(), "You leave the venue.");
        assert_eq!(venue.welcome(), "You enter the Shop.");
    }
}

//! Gear instances and the arena that owns them.
//!
//! Every piece of gear the party carries lives in one [`GearArena`].
//! Equipment maps (on the player and on followers) refer to gear by
//! [`GearId`]; the arena keeps a reverse index from id to [`GearOwner`]
//! that is updated on every assign/unassign and rebuilt after loading.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::CoreError;
use crate::follower::FollowerId;
use crate::item::ItemDef;

/// Equipment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearSlot {
    /// Weapon.
    Sword,
    /// Off-hand.
    Shield,
    /// Body armor.
    Armor,
    /// Ring.
    Ring,
    /// Wand; carries elemental charges.
    Wand,
}

impl GearSlot {
    /// All slots in display order.
    pub const ALL: [GearSlot; 5] = [
        GearSlot::Sword,
        GearSlot::Shield,
        GearSlot::Armor,
        GearSlot::Ring,
        GearSlot::Wand,
    ];

    /// Lowercase slot id.
    pub fn id(self) -> &'static str {
        match self {
            GearSlot::Sword => "sword",
            GearSlot::Shield => "shield",
            GearSlot::Armor => "armor",
            GearSlot::Ring => "ring",
            GearSlot::Wand => "wand",
        }
    }

    /// Capitalized slot name.
    pub fn title(self) -> &'static str {
        match self {
            GearSlot::Sword => "Sword",
            GearSlot::Shield => "Shield",
            GearSlot::Armor => "Armor",
            GearSlot::Ring => "Ring",
            GearSlot::Wand => "Wand",
        }
    }
}

impl fmt::Display for GearSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GearSlot {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        GearSlot::ALL
            .into_iter()
            .find(|slot| slot.id() == lower)
            .ok_or_else(|| CoreError::UnknownSlot(s.to_string()))
    }
}

/// Identifier of a gear instance, formatted `g<n>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GearId(String);

impl GearId {
    /// Build the id for sequence number `n`.
    pub fn from_index(n: u32) -> Self {
        Self(format!("g{n}"))
    }

    /// The numeric part of a well-formed id.
    pub fn index(&self) -> Option<u32> {
        self.0.strip_prefix('g').and_then(|n| n.parse().ok())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GearId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who currently has a gear instance equipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GearOwner {
    /// Equipped by the player.
    Player,
    /// Equipped by the follower with this id.
    Follower(FollowerId),
}

/// Compute wand charges from element points: `max(1, pts/3)` when positive.
pub fn charges_from_points(points: &BTreeMap<Element, i32>) -> BTreeMap<Element, i32> {
    points
        .iter()
        .map(|(el, pts)| {
            let charge = if *pts > 0 { (*pts / 3).max(1) } else { 0 };
            (*el, charge)
        })
        .collect()
}

/// A unique piece of gear created from an item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearInstance {
    /// Arena id.
    pub id: GearId,
    /// Item definition this gear was created from.
    pub item_id: String,
    /// Display name (fusion prefixes included).
    pub name: String,
    /// Slot this gear occupies.
    pub slot: GearSlot,
    /// Attack bonus.
    #[serde(default)]
    pub atk: i32,
    /// Defense bonus.
    #[serde(default)]
    pub defense: i32,
    /// Elemental point distribution.
    #[serde(default)]
    pub elem_points: BTreeMap<Element, i32>,
    /// Shop price; selling yields half.
    #[serde(default)]
    pub price: u32,
    /// Number of alchemist fusions this gear has been through.
    #[serde(default)]
    pub fuse_rank: u32,
    /// Remaining wand charges per element.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub charges: BTreeMap<Element, i32>,
    /// Charge capacity per element after a normal recharge.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub max_charges: BTreeMap<Element, i32>,
    /// Spells granted while equipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants_spells: Vec<String>,
}

impl GearInstance {
    /// Build an instance from an item definition.
    ///
    /// Items without explicit element points get `{element: 1}` when
    /// they name an element. Wands start fully charged.
    pub fn from_item(id: GearId, item_id: &str, item: &ItemDef, slot: GearSlot) -> Self {
        let mut elem_points: BTreeMap<Element, i32> = item
            .elem_points
            .iter()
            .map(|(el, pts)| (*el, (*pts).max(0)))
            .collect();
        if elem_points.is_empty() {
            elem_points.extend(item.element.map(|el| (el, 1)));
        }
        let name = if item.name.is_empty() {
            item_id.to_string()
        } else {
            item.name.clone()
        };
        let mut gear = Self {
            id,
            item_id: item_id.to_string(),
            name,
            slot,
            atk: item.atk,
            defense: item.defense,
            elem_points,
            price: item.price,
            fuse_rank: 0,
            charges: BTreeMap::new(),
            max_charges: BTreeMap::new(),
            grants_spells: item.grants_spells.clone(),
        };
        gear.recharge(false);
        gear
    }

    /// Sum of all element points.
    pub fn element_total(&self) -> i32 {
        self.elem_points.values().sum()
    }

    /// Comparison score for auto-equip: atk + def + element points.
    pub fn score(&self) -> i32 {
        self.atk + self.defense + self.element_total()
    }

    /// The element with the most points; the earliest element wins ties.
    pub fn dominant_element(&self) -> Option<Element> {
        let mut best: Option<(Element, i32)> = None;
        for (el, pts) in &self.elem_points {
            if best.is_none_or(|(_, top)| *pts > top) {
                best = Some((*el, *pts));
            }
        }
        best.map(|(el, _)| el)
    }

    /// Remaining charges for `element`.
    pub fn charge(&self, element: Element) -> i32 {
        self.charges.get(&element).copied().unwrap_or(0)
    }

    /// Spend one charge of `element`. Returns false if none remain.
    pub fn consume_charge(&mut self, element: Element) -> bool {
        match self.charges.get_mut(&element) {
            Some(c) if *c > 0 => {
                *c -= 1;
                true
            }
            _ => false,
        }
    }

    /// Refill wand charges. Overcharge sets each pool to 1.5x capacity.
    /// Non-wand gear is left untouched.
    pub fn recharge(&mut self, overcharge: bool) {
        if self.slot != GearSlot::Wand {
            return;
        }
        let max = charges_from_points(&self.elem_points);
        self.charges = if overcharge {
            max.iter().map(|(el, c)| (*el, *c * 3 / 2)).collect()
        } else {
            max.clone()
        };
        self.max_charges = max;
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Owns every gear instance and indexes which ones are equipped by whom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GearArena {
    items: Vec<GearInstance>,
    #[serde(skip)]
    owners: HashMap<GearId, GearOwner>,
}

impl GearArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free id: one past the highest `g<n>` in the arena.
    pub fn next_id(&self) -> GearId {
        let top = self.items.iter().filter_map(|g| g.id.index()).max().unwrap_or(0);
        GearId::from_index(top + 1)
    }

    /// Add an instance. It starts unowned.
    pub fn insert(&mut self, gear: GearInstance) {
        self.items.push(gear);
    }

    /// Remove an instance and any ownership record for it.
    pub fn remove(&mut self, id: &GearId) -> Option<GearInstance> {
        let pos = self.items.iter().position(|g| &g.id == id)?;
        self.owners.remove(id);
        Some(self.items.remove(pos))
    }

    /// Look up an instance.
    pub fn get(&self, id: &GearId) -> Option<&GearInstance> {
        self.items.iter().find(|g| &g.id == id)
    }

    /// Look up an instance mutably.
    pub fn get_mut(&mut self, id: &GearId) -> Option<&mut GearInstance> {
        self.items.iter_mut().find(|g| &g.id == id)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GearInstance> {
        self.items.iter()
    }

    /// Iterate mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GearInstance> {
        self.items.iter_mut()
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the arena holds no gear.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current owner of `id`, if equipped.
    pub fn owner(&self, id: &GearId) -> Option<GearOwner> {
        self.owners.get(id).copied()
    }

    /// Record that `owner` has equipped `id`.
    pub fn set_owner(&mut self, id: &GearId, owner: GearOwner) {
        self.owners.insert(id.clone(), owner);
    }

    /// Forget the ownership of `id`.
    pub fn clear_owner(&mut self, id: &GearId) {
        self.owners.remove(id);
    }

    /// Gear equipped by nobody.
    pub fn unowned(&self) -> impl Iterator<Item = &GearInstance> {
        self.items.iter().filter(|g| !self.owners.contains_key(&g.id))
    }

    /// Snapshot of the owner index, for consistency checks.
    pub fn owner_entries(&self) -> Vec<(GearId, GearOwner)> {
        let mut entries: Vec<_> = self.owners.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Replace the owner index wholesale.
    pub fn rebuild_owners(&mut self, entries: impl IntoIterator<Item = (GearId, GearOwner)>) {
        self.owners = entries
            .into_iter()
            .filter(|(id, _)| self.items.iter().any(|g| &g.id == id))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wand(points: i32) -> GearInstance {
        let item = ItemDef {
            name: "Fire Wand".into(),
            slot: Some(GearSlot::Wand),
            elem_points: BTreeMap::from([(Element::Fire, points)]),
            ..ItemDef::default()
        };
        GearInstance::from_item(GearId::from_index(1), "fire_wand", &item, GearSlot::Wand)
    }

    #[test]
    fn gear_id_index() {
        assert_eq!(GearId::from_index(12).index(), Some(12));
        assert_eq!(GearId::from("bogus").index(), None);
    }

    #[test]
    fn charges_follow_points() {
        let map = BTreeMap::from([(Element::Fire, 7), (Element::Ice, 1), (Element::Dark, 0)]);
        let charges = charges_from_points(&map);
        assert_eq!(charges[&Element::Fire], 2);
        assert_eq!(charges[&Element::Ice], 1);
        assert_eq!(charges[&Element::Dark], 0);
    }

    #[test]
    fn element_defaults_to_single_point() {
        let item = ItemDef {
            name: "Ember Ring".into(),
            slot: Some(GearSlot::Ring),
            element: Some(Element::Fire),
            ..ItemDef::default()
        };
        let gear = GearInstance::from_item(GearId::from_index(1), "ember_ring", &item, GearSlot::Ring);
        assert_eq!(gear.elem_points, BTreeMap::from([(Element::Fire, 1)]));
        assert!(gear.charges.is_empty());
    }

    #[test]
    fn wand_charges_consume_and_overcharge() {
        let mut w = wand(6);
        assert_eq!(w.charge(Element::Fire), 2);
        assert!(w.consume_charge(Element::Fire));
        assert!(w.consume_charge(Element::Fire));
        assert!(!w.consume_charge(Element::Fire));
        w.recharge(true);
        assert_eq!(w.charge(Element::Fire), 3);
        assert_eq!(w.max_charges[&Element::Fire], 2);
    }

    #[test]
    fn dominant_element_prefers_earliest_on_tie() {
        let mut w = wand(3);
        w.elem_points.insert(Element::Earth, 3);
        assert_eq!(w.dominant_element(), Some(Element::Earth));
        w.elem_points.insert(Element::Ice, 4);
        assert_eq!(w.dominant_element(), Some(Element::Ice));
    }

    #[test]
    fn arena_ids_and_owners() {
        let mut arena = GearArena::new();
        assert_eq!(arena.next_id(), GearId::from_index(1));
        arena.insert(wand(3));
        assert_eq!(arena.next_id(), GearId::from_index(2));

        let id = GearId::from_index(1);
        assert_eq!(arena.unowned().count(), 1);
        arena.set_owner(&id, GearOwner::Player);
        assert_eq!(arena.owner(&id), Some(GearOwner::Player));
        assert_eq!(arena.unowned().count(), 0);

        let removed = arena.remove(&id);
        assert!(removed.is_some());
        assert_eq!(arena.owner(&id), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn owner_index_is_not_serialized() {
        let mut arena = GearArena::new();
        arena.insert(wand(3));
        arena.set_owner(&GearId::from_index(1), GearOwner::Player);
        let json = serde_json::to_string(&arena).unwrap();
        let back: GearArena = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.owner(&GearId::from_index(1)), None);
    }
}

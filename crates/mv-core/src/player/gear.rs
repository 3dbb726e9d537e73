//! Equipment on the player and followers.
//!
//! All gear lives in the player's [`GearArena`]. Both the player's
//! equipment map and each follower's map hold ids into it, and the arena's
//! owner index mirrors those maps. Every assignment goes through
//! [`Player::bind_gear`] / [`Player::release_gear`] so the index never
//! drifts.

use std::collections::BTreeMap;

use crate::element::Element;
use crate::follower::Follower;
use crate::gear::{GearArena, GearId, GearInstance, GearOwner, GearSlot};
use crate::item::ItemDef;

use super::Player;

/// Titles for fusion ranks 1..; higher ranks reuse the last one.
pub const FUSION_TITLES: [&str; 6] = [
    "Fused",
    "Empowered",
    "Mythic",
    "Legendary",
    "Godly",
    "Omnipotent",
];

/// Most gear entries listed by the alchemist.
pub const MAX_FUSION_LISTING: usize = 9;

fn fusion_base_name(name: &str) -> &str {
    for title in FUSION_TITLES {
        if let Some(rest) = name.strip_prefix(title).and_then(|r| r.strip_prefix(' ')) {
            let rest = rest.trim();
            return if rest.is_empty() { "Gear" } else { rest };
        }
    }
    if name.is_empty() { "Gear" } else { name }
}

impl Player {
    // -----------------------------------------------------------------------
    // Arena access
    // -----------------------------------------------------------------------

    /// The gear arena.
    pub fn gear(&self) -> &GearArena {
        &self.gear
    }

    /// Look up one gear instance.
    pub fn gear_instance(&self, id: &GearId) -> Option<&GearInstance> {
        self.gear.get(id)
    }

    /// Player equipment by slot.
    pub fn equipment(&self) -> &BTreeMap<GearSlot, GearId> {
        &self.equipment
    }

    /// Gear the player has in `slot`.
    pub fn equipped_in(&self, slot: GearSlot) -> Option<&GearInstance> {
        self.equipment.get(&slot).and_then(|id| self.gear.get(id))
    }

    /// Gear currently equipped by the player.
    pub fn equipped_gear(&self) -> impl Iterator<Item = &GearInstance> {
        self.equipment.values().filter_map(|id| self.gear.get(id))
    }

    /// Returns true if the player has `id` equipped.
    pub fn is_equipped(&self, id: &GearId) -> bool {
        self.gear.owner(id) == Some(GearOwner::Player)
    }

    /// Item ids of the player's equipped gear.
    pub fn equipped_item_ids(&self) -> Vec<&str> {
        self.equipped_gear().map(|g| g.item_id.as_str()).collect()
    }

    /// Spells granted by the player's equipped gear.
    pub fn granted_spells(&self) -> Vec<&str> {
        self.equipped_gear()
            .flat_map(|g| g.grants_spells.iter().map(String::as_str))
            .collect()
    }

    /// Number of filled player equipment slots.
    pub fn filled_slots(&self) -> usize {
        self.equipment.len()
    }

    // -----------------------------------------------------------------------
    // Owner index
    // -----------------------------------------------------------------------

    /// Detach `id` from whoever has it equipped.
    fn release_gear(&mut self, id: &GearId) {
        match self.gear.owner(id) {
            Some(GearOwner::Player) => {
                self.equipment.retain(|_, g| g != id);
            }
            Some(GearOwner::Follower(fid)) => {
                if let Some(f) = self.followers.iter_mut().find(|f| f.id == fid) {
                    f.equipment.retain(|_, g| g != id);
                }
            }
            None => {}
        }
        self.gear.clear_owner(id);
    }

    /// Put `id` into `owner`'s `slot`, displacing whatever was there.
    fn bind_gear(&mut self, id: &GearId, slot: GearSlot, owner: GearOwner) {
        self.release_gear(id);
        let displaced = match owner {
            GearOwner::Player => self.equipment.insert(slot, id.clone()),
            GearOwner::Follower(fid) => self
                .followers
                .iter_mut()
                .find(|f| f.id == fid)
                .and_then(|f| f.equipment.insert(slot, id.clone())),
        };
        if let Some(old) = displaced {
            self.gear.clear_owner(&old);
        }
        self.gear.set_owner(id, owner);
    }

    /// Release every piece of gear a follower holds.
    pub(crate) fn release_follower_gear(&mut self, idx: usize) {
        let ids: Vec<GearId> = match self.followers.get(idx) {
            Some(f) => f.equipment.values().cloned().collect(),
            None => return,
        };
        for id in &ids {
            self.release_gear(id);
        }
    }

    /// Rebuild the owner index from the equipment maps, dropping entries
    /// that point at missing or mismatched gear.
    pub(crate) fn reindex_gear(&mut self) {
        let arena = &self.gear;
        let valid = |slot: &GearSlot, id: &GearId| arena.get(id).is_some_and(|g| g.slot == *slot);
        self.equipment.retain(|s, id| valid(s, id));
        let mut entries: Vec<(GearId, GearOwner)> = self
            .equipment
            .values()
            .map(|id| (id.clone(), GearOwner::Player))
            .collect();
        for f in &mut self.followers {
            f.equipment.retain(|s, id| valid(s, id));
            f.equipment
                .retain(|_, id| !entries.iter().any(|(taken, _)| taken == id));
            entries.extend(
                f.equipment
                    .values()
                    .map(|id| (id.clone(), GearOwner::Follower(f.id))),
            );
        }
        self.gear.rebuild_owners(entries);
    }

    /// Returns true if the owner index matches the equipment maps exactly.
    pub fn owner_index_consistent(&self) -> bool {
        let mut expected: Vec<(GearId, GearOwner)> = self
            .equipment
            .values()
            .map(|id| (id.clone(), GearOwner::Player))
            .collect();
        for f in &self.followers {
            expected.extend(
                f.equipment
                    .values()
                    .map(|id| (id.clone(), GearOwner::Follower(f.id))),
            );
        }
        expected.sort_by(|a, b| a.0.cmp(&b.0));
        expected == self.gear.owner_entries()
    }

    // -----------------------------------------------------------------------
    // Player equipment
    // -----------------------------------------------------------------------

    /// Create gear from an item definition and auto-equip it if it is at
    /// least as good as what the player wears. Returns the new id, or
    /// `None` if the item has no slot.
    pub fn add_gear(&mut self, item_id: &str, item: &ItemDef) -> Option<GearId> {
        let slot = item.gear_slot()?;
        let id = self.gear.next_id();
        self.gear
            .insert(GearInstance::from_item(id.clone(), item_id, item, slot));
        self.auto_equip_if_best(&id);
        Some(id)
    }

    /// Remove gear from the arena, unequipping it first.
    pub fn remove_gear(&mut self, id: &GearId) -> Option<GearInstance> {
        self.release_gear(id);
        self.gear.remove(id)
    }

    /// Toggle `id` on the player.
    pub fn equip_gear(&mut self, id: &GearId) -> String {
        let Some(gear) = self.gear.get(id) else {
            return "That gear is not available.".to_string();
        };
        let (slot, name) = (gear.slot, gear.name.clone());
        if self.equipment.get(&slot) == Some(id) {
            self.release_gear(id);
            return format!("Unequipped {name}.");
        }
        self.bind_gear(id, slot, GearOwner::Player);
        format!("Equipped {name}.")
    }

    /// Equip `id` unless the player's current gear in that slot scores
    /// strictly higher. Returns true if equipped.
    pub fn auto_equip_if_best(&mut self, id: &GearId) -> bool {
        let Some(gear) = self.gear.get(id) else {
            return false;
        };
        let (slot, score) = (gear.slot, gear.score());
        if self
            .equipped_in(slot)
            .is_some_and(|current| score < current.score())
        {
            return false;
        }
        self.bind_gear(id, slot, GearOwner::Player);
        true
    }

    // -----------------------------------------------------------------------
    // Elemental points and wands
    // -----------------------------------------------------------------------

    /// Element points of the gear in one player slot.
    pub fn slot_points(&self, slot: GearSlot) -> BTreeMap<Element, i32> {
        self.equipped_in(slot)
            .map(|g| g.elem_points.clone())
            .unwrap_or_default()
    }

    /// Points of `element` summed over the given slots (all when `None`).
    pub fn element_points_total(&self, element: Element, slots: Option<&[GearSlot]>) -> i32 {
        let pick = |slot: &GearSlot| slots.is_none_or(|s| s.contains(slot));
        self.equipment
            .iter()
            .filter(|(slot, _)| pick(slot))
            .filter_map(|(_, id)| self.gear.get(id))
            .map(|g| g.elem_points.get(&element).copied().unwrap_or(0))
            .sum()
    }

    /// Returns true if the player has a wand equipped.
    pub fn has_wand(&self) -> bool {
        self.equipped_in(GearSlot::Wand).is_some()
    }

    /// Remaining charges of the player's wand.
    pub fn wand_charges(&self) -> BTreeMap<Element, i32> {
        self.equipped_in(GearSlot::Wand)
            .map(|g| g.charges.clone())
            .unwrap_or_default()
    }

    /// Spend one charge of `element` from the player's wand.
    pub fn consume_wand_charge(&mut self, element: Element) -> bool {
        let Some(id) = self.equipment.get(&GearSlot::Wand).cloned() else {
            return false;
        };
        self.gear
            .get_mut(&id)
            .is_some_and(|g| g.consume_charge(element))
    }

    /// Refill the player's wand.
    pub fn recharge_wands(&mut self, overcharge: bool) {
        let Some(id) = self.equipment.get(&GearSlot::Wand).cloned() else {
            return;
        };
        if let Some(g) = self.gear.get_mut(&id) {
            g.recharge(overcharge);
        }
    }

    /// Refill every wand a follower has equipped.
    pub fn recharge_follower_wands(&mut self) {
        let ids: Vec<GearId> = self
            .followers
            .iter()
            .filter_map(|f| f.equipment.get(&GearSlot::Wand).cloned())
            .collect();
        for id in ids {
            if let Some(g) = self.gear.get_mut(&id) {
                g.recharge(false);
            }
        }
    }

    /// Spend one wand charge of `element` from a follower's wand.
    pub fn consume_follower_wand_charge(&mut self, idx: usize, element: Element) -> bool {
        let Some(id) = self
            .followers
            .get(idx)
            .and_then(|f| f.equipment.get(&GearSlot::Wand).cloned())
        else {
            return false;
        };
        self.gear
            .get_mut(&id)
            .is_some_and(|g| g.consume_charge(element))
    }

    // -----------------------------------------------------------------------
    // Alchemist fusion
    // -----------------------------------------------------------------------

    /// Gear that can be fused: items whose slot holds at least two
    /// pieces, capped for listing. With `first`, only partners in the same
    /// slot other than `first` itself.
    pub fn fusable_gear(&self, first: Option<&GearId>) -> Vec<&GearInstance> {
        let anchor = first.and_then(|id| self.gear.get(id));
        let mut out: Vec<&GearInstance> = match anchor {
            Some(a) => self
                .gear
                .iter()
                .filter(|g| g.slot == a.slot && g.id != a.id)
                .collect(),
            None => self
                .gear
                .iter()
                .filter(|g| self.gear.iter().filter(|o| o.slot == g.slot).count() >= 2)
                .collect(),
        };
        out.truncate(MAX_FUSION_LISTING);
        out
    }

    /// Fuse two distinct gear instances into one stronger piece.
    pub fn fuse_gear(&mut self, a: &GearId, b: &GearId) -> Option<GearId> {
        if a == b {
            return None;
        }
        let first = self.gear.get(a)?.clone();
        let second = self.gear.get(b)?.clone();
        let rank = first.fuse_rank.max(second.fuse_rank) + 1;
        let title = FUSION_TITLES[(rank as usize - 1).min(FUSION_TITLES.len() - 1)];
        let mut points = first.elem_points.clone();
        for (el, pts) in &second.elem_points {
            *points.entry(*el).or_insert(0) += pts;
        }
        let id = self.gear.next_id();
        let mut fused = GearInstance {
            id: id.clone(),
            item_id: first.item_id.clone(),
            name: format!("{title} {}", fusion_base_name(&first.name)),
            slot: first.slot,
            atk: first.atk + second.atk,
            defense: first.defense + second.defense,
            elem_points: points,
            price: first.price + second.price,
            fuse_rank: rank,
            charges: BTreeMap::new(),
            max_charges: BTreeMap::new(),
            grants_spells: first.grants_spells.clone(),
        };
        for spell in second.grants_spells {
            if !fused.grants_spells.contains(&spell) {
                fused.grants_spells.push(spell);
            }
        }
        fused.recharge(false);
        self.remove_gear(a);
        self.remove_gear(b);
        self.gear.insert(fused);
        self.auto_equip_if_best(&id);
        Some(id)
    }

    // -----------------------------------------------------------------------
    // Follower equipment
    // -----------------------------------------------------------------------

    /// Move `id` onto follower `idx`, taking it from anyone who wears it.
    /// Returns false for unknown follower or gear.
    pub fn assign_gear_to_follower(&mut self, idx: usize, id: &GearId) -> bool {
        let Some(fid) = self.followers.get(idx).map(|f| f.id) else {
            return false;
        };
        let Some(slot) = self.gear.get(id).map(|g| g.slot) else {
            return false;
        };
        self.bind_gear(id, slot, GearOwner::Follower(fid));
        true
    }

    /// Strip every piece of gear from follower `idx`.
    pub fn unequip_follower(&mut self, idx: usize) -> bool {
        if idx >= self.followers.len() {
            return false;
        }
        self.release_follower_gear(idx);
        true
    }

    /// Gear a follower has in `slot`.
    pub fn follower_gear(&self, follower: &Follower, slot: GearSlot) -> Option<&GearInstance> {
        follower.gear(&self.gear, slot)
    }
}

//! Follower roster.

use crate::follower::{Follower, FollowerCatalog, FollowerId, kind_title};
use crate::gauge::Gauge;

use super::Player;

/// Follower limit when no quest overrides it.
pub const DEFAULT_FOLLOWER_LIMIT: u32 = 5;

/// Followers consumed by one fusion.
pub const FUSION_SIZE: usize = 3;

impl Player {
    /// Roster size cap: the quest override if set, else five.
    pub fn follower_limit(&self) -> u32 {
        self.flags.follower_cap.unwrap_or(DEFAULT_FOLLOWER_LIMIT)
    }

    /// Free roster slots.
    pub fn follower_slots_remaining(&self) -> u32 {
        self.follower_limit()
            .saturating_sub(self.followers.len() as u32)
    }

    /// The roster in recruitment order.
    pub fn followers(&self) -> &[Follower] {
        &self.followers
    }

    /// One follower by roster index.
    pub fn follower(&self, idx: usize) -> Option<&Follower> {
        self.followers.get(idx)
    }

    /// One follower by roster index, mutably.
    ///
    /// Equipment is not reachable through this handle; use the gear
    /// methods on [`Player`] for that.
    pub fn follower_mut(&mut self, idx: usize) -> Option<&mut Follower> {
        self.followers.get_mut(idx)
    }

    /// Iterate followers mutably.
    pub fn followers_mut(&mut self) -> impl Iterator<Item = &mut Follower> {
        self.followers.iter_mut()
    }

    /// Reserve a fresh follower id.
    pub fn next_follower_id(&mut self) -> FollowerId {
        let id = FollowerId(self.next_follower_id.max(1));
        self.next_follower_id = id.0 + 1;
        id
    }

    /// Add a follower with a fresh id and no equipment. Returns false if
    /// the roster is full.
    pub fn add_follower(&mut self, mut follower: Follower) -> bool {
        if self.follower_slots_remaining() == 0 {
            return false;
        }
        follower.id = self.next_follower_id();
        follower.equipment.clear();
        self.followers.push(follower);
        true
    }

    /// Remove follower `idx`, returning its gear to the pool.
    pub fn dismiss_follower(&mut self, idx: usize) -> Option<Follower> {
        if idx >= self.followers.len() {
            return None;
        }
        self.release_follower_gear(idx);
        Some(self.followers.remove(idx))
    }

    /// Number of followers of `kind`.
    pub fn follower_count(&self, kind: &str) -> usize {
        self.followers.iter().filter(|f| f.kind == kind).count()
    }

    /// First type (in roster order) with at least `count` members and a
    /// fusion rule.
    pub fn fusable_follower_kind(&self, count: usize, catalog: &FollowerCatalog) -> Option<String> {
        self.followers
            .iter()
            .map(|f| f.kind.as_str())
            .find(|kind| catalog.fusion(kind).is_some() && self.follower_count(kind) >= count)
            .map(str::to_string)
    }

    /// Fuse the first `count` followers of `kind` into one promoted
    /// follower. Returns the new follower's roster index.
    pub fn fuse_followers(
        &mut self,
        kind: &str,
        count: usize,
        catalog: &FollowerCatalog,
    ) -> Option<usize> {
        let rule = catalog.fusion(kind)?;
        if count == 0 || self.follower_count(kind) < count {
            return None;
        }
        let mut consumed = Vec::with_capacity(count);
        while consumed.len() < count {
            let idx = self.followers.iter().position(|f| f.kind == kind)?;
            if let Some(f) = self.dismiss_follower(idx) {
                consumed.push(f);
            }
        }

        let template = catalog.template(&rule.into);
        let kept = rule
            .keep_name
            .as_ref()
            .filter(|keep| consumed.iter().any(|f| &f.name == *keep));
        let name = kept
            .cloned()
            .or_else(|| rule.name.clone())
            .or_else(|| template.and_then(|t| t.name.clone()))
            .unwrap_or_else(|| kind_title(&rule.into));

        let mut promoted = Follower::new(FollowerId(0), rule.into.clone(), name);
        promoted.level = consumed.iter().map(|f| f.level).max().unwrap_or(1);
        promoted.max_level = consumed.iter().map(|f| f.max_level).max().unwrap_or(5);
        promoted.atk = consumed.iter().map(|f| f.atk).max().unwrap_or(promoted.atk);
        promoted.defense = consumed
            .iter()
            .map(|f| f.defense)
            .max()
            .unwrap_or(promoted.defense);
        promoted.hp = Gauge::new(consumed.iter().map(|f| f.hp.max).max().unwrap_or(12));
        promoted.mp = Gauge::new(consumed.iter().map(|f| f.mp.max).max().unwrap_or(6));
        if let Some(t) = template {
            promoted.apply_template(t);
        }
        self.followers.push(promoted);
        let idx = self.followers.len() - 1;
        self.followers[idx].id = self.next_follower_id();
        Some(idx)
    }

    /// Restore every follower's MP to full.
    pub fn restore_follower_mp(&mut self) {
        for f in &mut self.followers {
            f.mp.fill();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::follower::{FollowerTemplate, FusionRule};
    use crate::gear::GearSlot;
    use crate::item::{ItemDef, ItemKind};

    fn catalog() -> FollowerCatalog {
        FollowerCatalog {
            templates: BTreeMap::from([(
                "mushroom_teen".to_string(),
                FollowerTemplate {
                    abilities: vec!["mushroom_tea_brew".into()],
                    ..FollowerTemplate::default()
                },
            )]),
            fusions: BTreeMap::from([(
                "mushroom_baby".to_string(),
                FusionRule {
                    into: "mushroom_teen".into(),
                    name: None,
                    keep_name: Some("Mushy".into()),
                },
            )]),
        }
    }

    fn baby(name: &str) -> Follower {
        Follower::new(FollowerId(0), "mushroom_baby", name)
    }

    #[test]
    fn roster_respects_limit() {
        let mut p = Player::default();
        p.flags.follower_cap = Some(1);
        assert!(p.add_follower(baby("A")));
        assert!(!p.add_follower(baby("B")));
        assert_eq!(p.follower_slots_remaining(), 0);
        p.flags.follower_cap = None;
        assert_eq!(p.follower_limit(), 5);
    }

    #[test]
    fn ids_are_unique() {
        let mut p = Player::default();
        p.add_follower(baby("A"));
        p.add_follower(baby("B"));
        assert_ne!(p.followers()[0].id, p.followers()[1].id);
    }

    #[test]
    fn fusing_three_babies() {
        let mut p = Player::default();
        p.add_follower(Follower::new(FollowerId(0), "wolf", "Fang"));
        for n in ["A", "B", "C"] {
            p.add_follower(baby(n));
        }
        let cat = catalog();
        assert_eq!(p.fusable_follower_kind(3, &cat).as_deref(), Some("mushroom_baby"));
        let idx = p.fuse_followers("mushroom_baby", 3, &cat).unwrap();
        assert_eq!(p.followers().len(), 2);
        assert_eq!(p.followers()[idx].kind, "mushroom_teen");
        assert_eq!(p.followers()[idx].name, "Mushroom Teen");
        assert_eq!(p.followers()[idx].active_ability, "mushroom_tea_brew");
        assert_eq!(p.follower_count("mushroom_baby"), 0);
    }

    #[test]
    fn fusion_keeps_special_name() {
        let mut p = Player::default();
        for n in ["A", "Mushy", "C"] {
            p.add_follower(baby(n));
        }
        let idx = p.fuse_followers("mushroom_baby", 3, &catalog()).unwrap();
        assert_eq!(p.followers()[idx].name, "Mushy");
    }

    #[test]
    fn fusion_needs_rule_and_count() {
        let mut p = Player::default();
        for n in ["A", "B"] {
            p.add_follower(baby(n));
        }
        assert!(p.fuse_followers("mushroom_baby", 3, &catalog()).is_none());
        assert_eq!(p.followers().len(), 2);
        assert!(p.fusable_follower_kind(3, &catalog()).is_none());
    }

    #[test]
    fn dismiss_and_fuse_release_gear() {
        let mut p = Player::default();
        for n in ["A", "B", "C"] {
            p.add_follower(baby(n));
        }
        let item = ItemDef {
            name: "Ring".into(),
            kind: ItemKind::Gear,
            slot: Some(GearSlot::Ring),
            defense: 1,
            ..ItemDef::default()
        };
        let ring = p.add_gear("ring", &item).unwrap();
        assert!(p.assign_gear_to_follower(1, &ring));
        p.fuse_followers("mushroom_baby", 3, &catalog()).unwrap();
        assert_eq!(p.gear().owner(&ring), None);
        assert!(p.gear_instance(&ring).is_some());
        assert!(p.owner_index_consistent());

        p.add_follower(baby("D"));
        assert!(p.assign_gear_to_follower(1, &ring));
        let gone = p.dismiss_follower(1).unwrap();
        assert_eq!(gone.name, "D");
        assert_eq!(p.gear().owner(&ring), None);
        assert!(p.owner_index_consistent());
    }
}

//! Spell availability, cast ranks, support effects and level-up notes.

use std::collections::{BTreeMap, BTreeSet};

use mv_core::spell::{SpellDef, SpellKind};
use mv_core::{Catalogs, Element, Player, TeamTarget};

/// Returns true if the player can use `spell` right now.
///
/// The level requirement always applies. A spell with an unlock rule
/// additionally needs one of its flags, one of its items equipped, or a
/// piece of equipped gear that grants it.
pub fn is_available(player: &Player, id: &str, spell: &SpellDef) -> bool {
    if player.level < spell.level_required {
        return false;
    }
    let Some(rule) = &spell.unlock else {
        return true;
    };
    let equipped = player.equipped_item_ids();
    rule.flags_any.iter().any(|f| player.flags.is_set(f))
        || rule.items_any.iter().any(|i| equipped.contains(&i.as_str()))
        || player.granted_spells().contains(&id)
}

/// Available spells ordered by level requirement, then id.
pub fn available_spells<'a>(player: &Player, catalogs: &'a Catalogs) -> Vec<(&'a str, &'a SpellDef)> {
    let mut out: Vec<(&str, &SpellDef)> = catalogs
        .spells
        .iter()
        .filter(|(id, spell)| is_available(player, id, spell))
        .map(|(id, spell)| (id.as_str(), spell))
        .collect();
    out.sort_by(|a, b| (a.1.level_required, a.0).cmp(&(b.1.level_required, b.0)));
    out
}

/// How a cast will be paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastPlan {
    /// Rank the spell resolves at.
    pub rank: u32,
    /// A wand charge pays instead of MP.
    pub use_charge: bool,
    /// MP spent when no charge is used.
    pub cost: i32,
}

fn has_charge(player: &Player, spell: &SpellDef) -> bool {
    spell
        .element
        .is_some_and(|el| player.wand_charges().get(&el).is_some_and(|n| *n > 0))
}

/// Highest rank the player can pay for right now, 0 if none.
///
/// A matching wand charge pays for the full rank. Otherwise elemental
/// spells stop at the highest rank whose MP cost fits; support spells
/// cost their base MP at any rank.
pub fn max_cast_rank(player: &Player, spell: &SpellDef) -> u32 {
    let rank = spell.rank_for(player.level);
    if rank == 0 || has_charge(player, spell) {
        return rank;
    }
    if spell.is_support() {
        return if player.mp.current >= spell.mp_cost { rank } else { 0 };
    }
    (1..=rank)
        .rev()
        .find(|r| spell.cost_at(*r) <= player.mp.current)
        .unwrap_or(0)
}

/// Work out rank and payment for the player casting `spell`, or `None`
/// if it cannot be afforded. A `requested` rank is clamped into
/// `1..=max_cast_rank`; without one the highest affordable rank is used.
pub fn plan_cast(player: &Player, spell: &SpellDef, requested: Option<u32>) -> Option<CastPlan> {
    let top = max_cast_rank(player, spell);
    if top == 0 {
        return None;
    }
    let rank = requested.map_or(top, |r| r.clamp(1, top));
    let use_charge = has_charge(player, spell);
    let cost = if use_charge {
        0
    } else if spell.is_support() {
        spell.mp_cost
    } else {
        spell.cost_at(rank)
    };
    Some(CastPlan {
        rank,
        use_charge,
        cost,
    })
}

/// Spend what `plan` says.
pub fn pay_cast(player: &mut Player, spell: &SpellDef, plan: CastPlan) {
    if plan.use_charge {
        if let Some(el) = spell.element {
            player.consume_wand_charge(el);
        }
        return;
    }
    player.mp.drain(plan.cost);
}

/// Apply a support spell to one team member. The per-cast gain is
/// `10 * rank`, and the temporary bonus stacks up to five casts' worth.
/// Returns the bonus actually added.
pub fn apply_support(player: &mut Player, kind: SpellKind, rank: u32, target: TeamTarget) -> i32 {
    let per_cast = 10 * rank as i32;
    let max_stack = per_cast * 5;
    match target {
        TeamTarget::Player => match kind {
            SpellKind::Healing => {
                let gain = per_cast.min((max_stack - player.temp_hp_bonus).max(0));
                player.temp_hp_bonus += gain;
                let ceiling = player.total_max_hp();
                player.hp.restore_within(gain, ceiling);
                gain
            }
            SpellKind::Strength => {
                let current = player.temp_atk_bonus.min(player.temp_def_bonus);
                let gain = per_cast.min((max_stack - current).max(0));
                player.temp_atk_bonus += gain;
                player.temp_def_bonus += gain;
                gain
            }
            SpellKind::Elemental => 0,
        },
        TeamTarget::Follower(idx) => {
            let Some(f) = player.follower_mut(idx) else {
                return 0;
            };
            match kind {
                SpellKind::Healing => {
                    let gain = per_cast.min((max_stack - f.temp_hp_bonus).max(0));
                    f.temp_hp_bonus += gain;
                    let ceiling = f.total_max_hp();
                    f.hp.restore_within(gain, ceiling);
                    gain
                }
                SpellKind::Strength => {
                    let current = f.temp_atk_bonus.min(f.temp_def_bonus);
                    let gain = per_cast.min((max_stack - current).max(0));
                    f.temp_atk_bonus += gain;
                    f.temp_def_bonus += gain;
                    gain
                }
                SpellKind::Elemental => 0,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Level-up notes
// ---------------------------------------------------------------------------

/// Spell ranks and unlocked elements captured before XP is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    ranks: BTreeMap<String, u32>,
    elements: BTreeSet<Element>,
}

impl ProgressSnapshot {
    /// Capture the player's current spell ranks and elements.
    pub fn take(player: &Player, catalogs: &Catalogs) -> Self {
        Self {
            ranks: available_spells(player, catalogs)
                .into_iter()
                .map(|(id, spell)| (id.to_string(), spell.rank_for(player.level)))
                .collect(),
            elements: player.elements().clone(),
        }
    }

    /// Compare against the player's state now, unlock any continents the
    /// new level reaches and describe what changed.
    pub fn notes(&self, player: &mut Player, catalogs: &Catalogs) -> Vec<String> {
        let mut notes = Vec::new();
        for (id, spell) in available_spells(player, catalogs) {
            let now = spell.rank_for(player.level);
            match self.ranks.get(id).copied().unwrap_or(0) {
                0 if now > 0 => notes.push(format!("New spell: {} (Rank {now})", spell.name)),
                before if now > before => {
                    notes.push(format!("{} rank up: {before} → {now}", spell.name))
                }
                _ => {}
            }
        }
        let mut unlocked = catalogs.continents.unlocked_at(player.level);
        unlocked.extend(player.elements().iter().copied());
        for el in catalogs.continents.order() {
            if unlocked.contains(&el) && !self.elements.contains(&el) {
                notes.push(format!("Portal Unlocked: {}", catalogs.continents.name_of(el)));
            }
        }
        player.sync_elements(unlocked);
        notes
    }
}

#[cfg(test)]
mod tests {
    use mv_core::Follower;
    use mv_core::follower::FollowerId;

    use super::*;

    fn catalogs() -> Catalogs {
        Catalogs::builtin().unwrap()
    }

    #[test]
    fn level_gates_availability() {
        let cat = catalogs();
        let mut p = Player::default();
        let ids: Vec<&str> = available_spells(&p, &cat).iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["healing", "spark"]);
        p.level = 4;
        let ids: Vec<&str> = available_spells(&p, &cat).iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["healing", "spark", "boulder", "tornado", "fireblast"]);
    }

    #[test]
    fn unlock_rule_needs_flag_or_item() {
        let cat = catalogs();
        let mut p = Player::default();
        p.level = 5;
        let strength = cat.spell("strength").unwrap();
        assert!(!is_available(&p, "strength", strength));
        p.flags.raise("sage_blessing");
        assert!(is_available(&p, "strength", strength));

        let mut q = Player::default();
        q.level = 5;
        q.add_gear("sage_ring", cat.item("sage_ring").unwrap());
        assert!(is_available(&q, "strength", strength));
    }

    #[test]
    fn cast_rank_drops_to_what_mp_affords() {
        let cat = catalogs();
        let spark = cat.spell("spark").unwrap();
        let mut p = Player::default();
        p.level = 5;
        assert_eq!(spark.rank_for(5), 3);
        p.mp.current = 5;
        assert_eq!(
            plan_cast(&p, spark, None),
            Some(CastPlan {
                rank: 2,
                use_charge: false,
                cost: 4
            })
        );
        p.mp.current = 1;
        assert_eq!(plan_cast(&p, spark, None), None);
    }

    #[test]
    fn chosen_rank_is_clamped_to_what_is_affordable() {
        let cat = catalogs();
        let spark = cat.spell("spark").unwrap();
        let mut p = Player::default();
        p.level = 5;
        p.mp.current = 5;
        assert_eq!(max_cast_rank(&p, spark), 2);
        let low = plan_cast(&p, spark, Some(1)).unwrap();
        assert_eq!((low.rank, low.cost), (1, 2));
        assert_eq!(plan_cast(&p, spark, Some(3)).unwrap().rank, 2);
        assert_eq!(plan_cast(&p, spark, Some(0)).unwrap().rank, 1);
    }

    #[test]
    fn wand_charge_pays_full_rank() {
        let cat = catalogs();
        let spark = cat.spell("spark").unwrap();
        let mut p = Player::default();
        p.level = 5;
        p.mp.current = 0;
        p.add_gear("lightning_wand", cat.item("lightning_wand").unwrap());
        let plan = plan_cast(&p, spark, None).unwrap();
        assert!(plan.use_charge);
        assert_eq!(plan.rank, 3);
        let before = p.wand_charges()[&Element::Lightning];
        pay_cast(&mut p, spark, plan);
        assert_eq!(p.wand_charges()[&Element::Lightning], before - 1);
        assert_eq!(p.mp.current, 0);
    }

    #[test]
    fn support_stacks_to_five_casts() {
        let mut p = Player::default();
        p.hp.current = 10;
        for _ in 0..7 {
            apply_support(&mut p, SpellKind::Healing, 1, TeamTarget::Player);
        }
        assert_eq!(p.temp_hp_bonus, 50);
        assert_eq!(p.hp.current, 60);
        assert_eq!(apply_support(&mut p, SpellKind::Healing, 1, TeamTarget::Player), 0);

        assert_eq!(apply_support(&mut p, SpellKind::Strength, 2, TeamTarget::Player), 20);
        assert_eq!((p.temp_atk_bonus, p.temp_def_bonus), (20, 20));
    }

    #[test]
    fn support_on_follower() {
        let mut p = Player::default();
        p.add_follower(Follower::new(FollowerId(0), "fairy", "Pip"));
        let gain = apply_support(&mut p, SpellKind::Strength, 1, TeamTarget::Follower(0));
        assert_eq!(gain, 10);
        assert_eq!(p.followers()[0].temp_atk_bonus, 10);
        assert_eq!(apply_support(&mut p, SpellKind::Strength, 1, TeamTarget::Follower(4)), 0);
    }

    #[test]
    fn notes_cover_spells_and_portals() {
        let cat = catalogs();
        let mut p = Player::default();
        let snap = ProgressSnapshot::take(&p, &cat);
        p.gain_xp(150);
        assert_eq!(p.level, 4);
        let notes = snap.notes(&mut p, &cat);
        assert!(notes.contains(&"New spell: Boulder (Rank 2)".to_string()), "{notes:?}");
        assert!(notes.contains(&"Spark rank up: 1 → 2".to_string()), "{notes:?}");
        assert!(notes.iter().any(|n| n.starts_with("Portal Unlocked: ")), "{notes:?}");
        assert!(p.elements().len() > 1);
    }
}

//! Follower turns and end-of-round abilities.
//!
//! Each follower picks one action per round:
//!
//! * brewers (no spells, a turn-timed item ability) may restore the
//!   neediest team member, otherwise they hit the weakest opponent;
//! * everyone else supports the player with Healing or Strength if they
//!   know it and it is needed, then casts their wand's signature spell,
//!   then attacks the first living opponent.

use rand::Rng;
use rand::rngs::StdRng;

use mv_core::ability::{AbilityDef, AbilityKind, AbilityTiming};
use mv_core::spell::{SpellDef, SpellKind};
use mv_core::{Element, Follower, GearSlot, Player, TeamMode, TeamTarget};

use super::{BattleEvent, CombatContext, Encounter, bank_loot};
use crate::math::{primary_opponent_index, roll_damage, stun_suffix, try_stun};
use crate::spells::apply_support;

pub(super) fn take_turns(
    hero: &mut Player,
    encounter: &mut Encounter,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
    events: &mut Vec<BattleEvent>,
) {
    for idx in 0..hero.followers().len() {
        if !encounter.any_alive() {
            return;
        }
        let Some(follower) = hero.follower(idx).cloned() else {
            continue;
        };
        let line = match turn_ability(&follower, ctx) {
            Some(ability) => brew(hero, &follower, ability, encounter, ctx, rng),
            None => support(hero, idx, &follower, ctx)
                .or_else(|| wand_spell(hero, idx, &follower, encounter, ctx, rng))
                .or_else(|| {
                    let target = primary_opponent_index(&encounter.opponents)?;
                    Some(melee(hero, &follower, encounter, target, ctx, rng))
                }),
        };
        if let Some(line) = line {
            events.push(BattleEvent::Message(line));
        }
    }
}

/// The turn-timed item ability of a spell-less follower.
fn turn_ability<'a>(follower: &Follower, ctx: &CombatContext<'a>) -> Option<&'a AbilityDef> {
    if !follower.spells.is_empty() {
        return None;
    }
    follower
        .abilities
        .iter()
        .filter_map(|id| ctx.catalogs.ability(id))
        .find(|a| a.timing == AbilityTiming::Turn && a.kind == AbilityKind::Item)
}

fn brew(
    hero: &mut Player,
    follower: &Follower,
    ability: &AbilityDef,
    encounter: &mut Encounter,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> Option<String> {
    let chance = ability.chance.unwrap_or(0.2);
    if hero.select_team_target(TeamMode::Combined).is_some() && rng.random::<f64>() < chance {
        if let Some(line) = use_item_ability(hero, &follower.name, ability, TeamMode::Combined, ctx) {
            return Some(line);
        }
    }
    let target = (0..encounter.opponents.len())
        .filter(|i| encounter.opponents[*i].is_alive())
        .min_by_key(|i| encounter.opponents[*i].hp.current)?;
    Some(melee(hero, follower, encounter, target, ctx, rng))
}

/// Restore the neediest member under `mode` with the ability's item.
fn use_item_ability(
    hero: &mut Player,
    name: &str,
    ability: &AbilityDef,
    mode: TeamMode,
    ctx: &CombatContext<'_>,
) -> Option<String> {
    let item = ability.item_id.as_deref().and_then(|id| ctx.catalogs.item(id))?;
    let target = hero.select_team_target(mode)?;
    let (hp, mp) = hero.restore_member(target, item.hp, item.mp);
    if hp <= 0 && mp <= 0 {
        return None;
    }
    let mut parts = Vec::new();
    if hp > 0 {
        parts.push(format!("{hp} HP"));
    }
    if mp > 0 {
        parts.push(format!("{mp} MP"));
    }
    let who = match target {
        TeamTarget::Player => "you",
        TeamTarget::Follower(_) => hero.member_name(target),
    };
    Some(format!(
        "{name} uses {} on {who}, restoring {}.",
        ability.label,
        parts.join(" and ")
    ))
}

/// Whether `follower` can pay for `spell`, and whether a wand charge
/// would pay.
fn can_cast(hero: &Player, follower: &Follower, spell: &SpellDef) -> Option<bool> {
    let charged = spell.element.is_some_and(|el| {
        hero.follower_gear(follower, GearSlot::Wand)
            .is_some_and(|w| w.charge(el) > 0)
    });
    if charged {
        return Some(true);
    }
    (follower.mp.current >= spell.mp_cost).then_some(false)
}

fn support(hero: &mut Player, idx: usize, follower: &Follower, ctx: &CombatContext<'_>) -> Option<String> {
    for kind in [SpellKind::Healing, SpellKind::Strength] {
        let needed = match kind {
            SpellKind::Healing => hero.hp.current < hero.total_max_hp(),
            _ => hero.temp_atk_bonus <= 0 || hero.temp_def_bonus <= 0,
        };
        if !needed {
            continue;
        }
        let Some(spell) = follower
            .spells
            .iter()
            .filter_map(|id| ctx.catalogs.spell(id))
            .find(|s| s.kind == kind)
        else {
            continue;
        };
        let Some(charged) = can_cast(hero, follower, spell) else {
            continue;
        };
        if !charged {
            if let Some(f) = hero.follower_mut(idx) {
                f.mp.drain(spell.mp_cost);
            }
        }
        apply_support(hero, kind, 1, TeamTarget::Player);
        return Some(format!("{} casts {}.", follower.name, spell.name));
    }
    None
}

fn wand_spell(
    hero: &mut Player,
    idx: usize,
    follower: &Follower,
    encounter: &mut Encounter,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> Option<String> {
    let element: Element = hero
        .follower_gear(follower, GearSlot::Wand)?
        .dominant_element()?;
    let spell = element.signature_spell().and_then(|id| ctx.catalogs.spell(id))?;
    let charged = can_cast(hero, follower, spell)?;
    let target = primary_opponent_index(&encounter.opponents)?;
    if charged {
        hero.consume_follower_wand_charge(idx, element);
    } else if let Some(f) = hero.follower_mut(idx) {
        f.mp.drain(spell.mp_cost);
    }

    let atk = follower.total_atk(hero.gear()) + spell.atk_bonus + follower.element_points(hero.gear(), element);
    let opponent = &mut encounter.opponents[target];
    let roll = roll_damage(rng, atk, opponent.defense, ctx.odds);
    let (name, spell_name) = (&follower.name, &spell.name);
    if roll.miss {
        return Some(format!("{name}'s {spell_name} misses the {}.", opponent.name));
    }
    let damage = (roll.damage as f64 * spell.wand_mult()) as i32;
    opponent.hp.drain(damage);
    if !opponent.is_alive() {
        let line = format!("{name}'s {spell_name} fells the {}.", opponent.name);
        bank_loot(&mut encounter.loot, &encounter.opponents[target], rng);
        return Some(line);
    }
    let stunned = if spell.stun_chance > 0.0 {
        try_stun(rng, opponent, spell.stun_chance)
    } else {
        None
    };
    let hit = if roll.crit {
        format!("{name} lands a critical {spell_name} for {damage}.")
    } else {
        format!("{name} hits the {} with {spell_name} for {damage}.", opponent.name)
    };
    Some(format!("{hit}{}", stun_suffix(stunned)))
}

fn melee(
    hero: &Player,
    follower: &Follower,
    encounter: &mut Encounter,
    target: usize,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> String {
    let atk = follower.total_atk(hero.gear());
    let name = &follower.name;
    let opponent = &mut encounter.opponents[target];
    let roll = roll_damage(rng, atk, opponent.defense, ctx.odds);
    if roll.miss {
        return format!("{name} misses the {}.", opponent.name);
    }
    opponent.hp.drain(roll.damage);
    if !opponent.is_alive() {
        let line = format!("{name} strikes down the {}.", opponent.name);
        bank_loot(&mut encounter.loot, &encounter.opponents[target], rng);
        return line;
    }
    if roll.crit {
        format!("Critical hit! {name} hits the {} for {}.", opponent.name, roll.damage)
    } else {
        format!("{name} hits the {} for {}.", opponent.name, roll.damage)
    }
}

// ---------------------------------------------------------------------------
// End of round
// ---------------------------------------------------------------------------

/// The end-of-round ability a follower uses: the active one if known,
/// falling back to the first ability its level allows.
fn end_round_ability<'a>(follower: &mut Follower, ctx: &CombatContext<'a>) -> Option<&'a AbilityDef> {
    if !follower.abilities.contains(&follower.active_ability) {
        follower.active_ability = follower.abilities.first().cloned().unwrap_or_default();
    }
    let active = ctx.catalogs.ability(&follower.active_ability)?;
    if active.timing != AbilityTiming::EndRound {
        return None;
    }
    if follower.level >= active.min_level {
        return Some(active);
    }
    let (id, fallback) = follower
        .abilities
        .iter()
        .filter_map(|id| ctx.catalogs.ability(id).map(|a| (id, a)))
        .find(|(_, a)| follower.level >= a.min_level)?;
    follower.active_ability = id.clone();
    Some(fallback)
}

pub(super) fn end_of_round(
    hero: &mut Player,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
    events: &mut Vec<BattleEvent>,
) {
    for idx in 0..hero.followers().len() {
        let Some(follower) = hero.follower_mut(idx) else {
            continue;
        };
        let Some(ability) = end_round_ability(follower, ctx) else {
            continue;
        };
        let (name, level) = (follower.name.clone(), follower.level);
        let line = match ability.kind {
            AbilityKind::Heal | AbilityKind::Mana => {
                let (low, high) = ability.roll_range(level);
                if high <= 0 {
                    continue;
                }
                let amount = rng.random_range(low..=high);
                let (restored, unit) = if ability.kind == AbilityKind::Heal {
                    if hero.hp.current >= hero.total_max_hp() {
                        continue;
                    }
                    let ceiling = hero.total_max_hp();
                    (hero.hp.restore_within(amount, ceiling), "HP")
                } else {
                    if hero.mp.is_full() {
                        continue;
                    }
                    (hero.mp.restore(amount), "MP")
                };
                format!("{name} uses {} and restores {restored} {unit}.", ability.label)
            }
            AbilityKind::Item => {
                if rng.random::<f64>() > ability.chance.unwrap_or(1.0) {
                    continue;
                }
                match use_item_ability(hero, &name, ability, ability.target, ctx) {
                    Some(line) => line,
                    None => continue,
                }
            }
        };
        events.push(BattleEvent::Message(line));
    }
}

//! Opponent turns.

use rand::Rng;
use rand::rngs::StdRng;

use mv_core::opponent::{HealTarget, OpponentAi};
use mv_core::{Element, GearSlot, Player};

use super::{BattleEvent, CombatContext, Encounter};
use crate::math::roll_damage;

/// Every living opponent acts once, in encounter order. Returns the
/// defeat event if the player falls, after which nobody else acts.
pub(super) fn take_turns(
    hero: &mut Player,
    encounter: &mut Encounter,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
    events: &mut Vec<BattleEvent>,
) -> Option<BattleEvent> {
    let acting: Vec<usize> = (0..encounter.opponents.len())
        .filter(|i| encounter.opponents[*i].is_alive())
        .collect();
    for idx in acting {
        let opponent = &mut encounter.opponents[idx];
        if opponent.stunned_turns > 0 {
            opponent.stunned_turns -= 1;
            events.push(BattleEvent::Message(format!("The {} is stunned.", opponent.name)));
            continue;
        }
        if rng.random::<f64>() > opponent.action_chance {
            events.push(BattleEvent::Message(format!("The {} hesitates.", opponent.name)));
            continue;
        }
        if let Some(line) = try_support_heal(encounter, idx, ctx, rng) {
            events.push(BattleEvent::Message(line));
            continue;
        }
        events.push(BattleEvent::Message(strike(hero, encounter, idx, ctx, rng)));
        if !hero.is_alive() {
            return Some(defeat(hero, encounter));
        }
    }
    None
}

/// A support opponent may heal the neediest damaged ally instead of
/// attacking.
fn try_support_heal(
    encounter: &mut Encounter,
    idx: usize,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> Option<String> {
    let Some(OpponentAi::SupportHealThenAttack {
        heal_chance,
        heal_item_id,
        heal_target,
    }) = encounter.opponents[idx].ai.clone()
    else {
        return None;
    };
    if heal_item_id.is_empty() || heal_chance <= 0.0 {
        return None;
    }
    let damaged: Vec<usize> = (0..encounter.opponents.len())
        .filter(|i| {
            let o = &encounter.opponents[*i];
            o.is_alive() && !o.hp.is_full()
        })
        .collect();
    if damaged.is_empty() || rng.random::<f64>() >= heal_chance {
        return None;
    }
    let item = ctx.catalogs.item(&heal_item_id)?;
    if item.hp <= 0 {
        return None;
    }
    let pick = match heal_target {
        HealTarget::First => damaged[0],
        // max_by_key keeps the last maximum; reverse so ties go to the first
        HealTarget::MostMissingHp => damaged
            .iter()
            .rev()
            .copied()
            .max_by_key(|i| encounter.opponents[*i].hp.missing())
            .unwrap_or(damaged[0]),
    };
    let healed = encounter.opponents[pick].hp.restore(item.hp);
    let label = if item.name.is_empty() { "Item" } else { &item.name };
    Some(format!(
        "The {} uses {label} on the {}, restoring {healed} HP.",
        encounter.opponents[idx].name, encounter.opponents[pick].name
    ))
}

fn strike(
    hero: &mut Player,
    encounter: &Encounter,
    idx: usize,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> String {
    let opponent = &encounter.opponents[idx];
    let (defense, evasion) = encounter
        .stance
        .map(|s| (s.defense, s.evasion))
        .unwrap_or((0, 0.0));
    let odds = ctx.odds.with_extra_miss(evasion);
    let roll = roll_damage(rng, opponent.atk, hero.total_defense() + defense, odds);
    if roll.miss {
        return format!("The {} misses you.", opponent.name);
    }
    let mut damage = roll.damage;
    if opponent.element != Element::Base {
        let block = hero.element_points_total(
            opponent.element,
            Some(&[GearSlot::Shield, GearSlot::Armor][..]),
        );
        damage = (damage - block).max(1);
    }
    hero.hp.drain(damage);
    if roll.crit {
        format!("Critical hit! The {} hits you for {damage}.", opponent.name)
    } else {
        format!("The {} hits you for {damage}.", opponent.name)
    }
}

/// The player wakes at the inn: half the gold is lost, HP and MP are
/// restored and the encounter ends.
fn defeat(hero: &mut Player, encounter: &mut Encounter) -> BattleEvent {
    let gold_lost = hero.gold / 2;
    hero.gold -= gold_lost;
    hero.rest();
    encounter.clear();
    tracing::info!(gold_lost, "player defeated");
    BattleEvent::PlayerDefeated { gold_lost }
}

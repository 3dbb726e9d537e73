//! The player's half of a round.

use rand::Rng;
use rand::rngs::StdRng;

use mv_core::spell::SpellDef;
use mv_core::{GearSlot, Player, TeamTarget};

use super::{Action, BattleEvent, CombatContext, DefendStance, Encounter, bank_loot};
use crate::math::{roll_damage, stun_suffix, try_stun};
use crate::quest::{self, QuestEvent};
use crate::spells::{apply_support, is_available, pay_cast, plan_cast};

/// Refusal text for an action that did not happen.
type Refusal = String;

/// Carry out `action`. `Err` holds the refusal message when nothing
/// was changed.
pub(super) fn act(
    hero: &mut Player,
    encounter: &mut Encounter,
    action: &Action,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> Result<Vec<BattleEvent>, Refusal> {
    let line = match action {
        Action::Attack { target } => attack(hero, encounter, *target, ctx, rng)?,
        Action::Defend => defend(hero, encounter),
        Action::Flee => flee(hero, encounter, rng)?,
        Action::Socialize { target } => socialize(hero, encounter, *target, ctx, rng)?,
        Action::Cast {
            spell,
            target,
            team_target,
            rank,
        } => {
            let Some(def) = ctx.catalogs.spell(spell) else {
                return Err(format!("Unknown spell: {spell}."));
            };
            if !is_available(hero, spell, def) {
                return Err(format!("You have not learned {}.", def.name));
            }
            if def.is_support() {
                encounter.last_spell_targets.clear();
                cast_support(hero, def, *team_target, *rank)?
            } else {
                cast_elemental(hero, encounter, def, *target, *rank, ctx, rng)?
            }
        }
    };
    Ok(vec![BattleEvent::Message(line)])
}

fn attack(
    hero: &mut Player,
    encounter: &mut Encounter,
    target: Option<usize>,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> Result<String, Refusal> {
    let Some(idx) = encounter.resolve_target(target) else {
        return Err("There is nothing to attack.".to_string());
    };
    let sword_points: i32 = hero.slot_points(GearSlot::Sword).values().sum();
    let opponent = &mut encounter.opponents[idx];
    let roll = roll_damage(rng, hero.total_atk() + sword_points, opponent.defense, ctx.odds);
    if roll.miss {
        return Ok(format!("You miss the {}.", opponent.name));
    }
    opponent.hp.drain(roll.damage);
    if !opponent.is_alive() {
        let line = format!("You strike down the {}.", opponent.name);
        bank_loot(&mut encounter.loot, &encounter.opponents[idx], rng);
        return Ok(line);
    }
    Ok(if roll.crit {
        format!("Critical hit! You hit the {} for {}.", opponent.name, roll.damage)
    } else {
        format!("You hit the {} for {}.", opponent.name, roll.damage)
    })
}

fn defend(hero: &Player, encounter: &mut Encounter) -> String {
    let highest = encounter
        .opponents
        .iter()
        .filter(|o| o.is_alive())
        .map(|o| o.level)
        .max()
        .unwrap_or(hero.level);
    encounter.stance = Some(DefendStance {
        defense: (hero.total_defense() / 2).max(2),
        evasion: if highest < hero.level { 0.15 } else { 0.05 },
    });
    encounter.last_spell_targets.clear();
    "You brace for impact.".to_string()
}

fn flee(hero: &Player, encounter: &mut Encounter, rng: &mut StdRng) -> Result<String, Refusal> {
    let Some(highest) = encounter
        .opponents
        .iter()
        .filter(|o| o.is_alive())
        .map(|o| o.level)
        .max()
    else {
        return Err("There is nothing to flee from.".to_string());
    };
    let diff = hero.level as f64 - highest as f64;
    let chance = (0.5 + diff * 0.08).clamp(0.1, 0.9);
    if rng.random::<f64>() > chance {
        return Ok("You fail to flee.".to_string());
    }
    encounter.clear();
    Ok("You flee to safety.".to_string())
}

fn socialize(
    hero: &mut Player,
    encounter: &mut Encounter,
    target: Option<usize>,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> Result<String, Refusal> {
    let Some(idx) = encounter.resolve_target(target) else {
        return Err("There is no one to socialize with.".to_string());
    };
    let opponent = &encounter.opponents[idx];
    let only = &hero.flags.recruit_only_types;
    if !only.is_empty()
        && !opponent
            .follower_type
            .as_ref()
            .is_some_and(|t| only.contains(t))
    {
        return Err("Why would I want to join your group?".to_string());
    }
    if !opponent.recruitable {
        return Err(format!("The {} shows no interest.", opponent.name));
    }
    if hero.follower_slots_remaining() == 0 {
        return Err("You cannot lead more followers.".to_string());
    }
    if hero.gold < opponent.recruit_cost {
        return Err("Not enough GP.".to_string());
    }
    hero.gold -= opponent.recruit_cost;
    if rng.random::<f64>() > opponent.recruit_chance {
        return Ok(format!("The {} refuses your offer.", opponent.name));
    }
    let Some((name, kind)) = super::recruit_follower(hero, opponent, ctx.catalogs, rng) else {
        return Ok("You cannot lead more followers.".to_string());
    };
    let opponent = &mut encounter.opponents[idx];
    opponent.hp.current = 0;
    opponent.melted = true;
    tracing::info!(follower = %name, %kind, "recruited follower");

    let mut line = format!("{name} joins your party.");
    let notes = quest::handle_event(
        hero,
        ctx.catalogs,
        &QuestEvent::RecruitFollower {
            follower_type: kind,
            count: 1,
        },
    );
    for note in notes {
        line.push(' ');
        line.push_str(&note);
    }
    Ok(line)
}

fn cast_elemental(
    hero: &mut Player,
    encounter: &mut Encounter,
    spell: &SpellDef,
    target: Option<usize>,
    rank: Option<u32>,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> Result<String, Refusal> {
    let Some(plan) = plan_cast(hero, spell, rank) else {
        return Err(format!("Not enough MP to cast {}.", spell.name));
    };
    let targets: Vec<usize> = if plan.rank >= 2 {
        (0..encounter.opponents.len())
            .filter(|i| encounter.opponents[*i].is_alive())
            .collect()
    } else {
        encounter.resolve_target(target).into_iter().collect()
    };
    if targets.is_empty() {
        return Err("There is nothing to target.".to_string());
    }
    pay_cast(hero, spell, plan);

    let ring = spell
        .element
        .map(|el| hero.element_points_total(el, Some(&[GearSlot::Ring][..])))
        .unwrap_or(0);
    let atk = hero.total_atk() + spell.atk_bonus + ring;
    let (mult, stun_chance) = if plan.rank >= 3 {
        (
            spell.rank3_mult(),
            (spell.stun_chance + spell.rank3_stun_bonus).min(0.95),
        )
    } else {
        (1.0, spell.stun_chance)
    };

    let name = &spell.name;
    let mut lines = Vec::with_capacity(targets.len());
    for idx in &targets {
        let opponent = &mut encounter.opponents[*idx];
        let roll = roll_damage(rng, atk, opponent.defense, ctx.odds);
        if roll.miss {
            lines.push(format!("Your {name} misses the {}.", opponent.name));
            continue;
        }
        let damage = (roll.damage as f64 * mult) as i32;
        opponent.hp.drain(damage);
        if !opponent.is_alive() {
            lines.push(format!("Your {name} fells the {}.", opponent.name));
            bank_loot(&mut encounter.loot, &encounter.opponents[*idx], rng);
            continue;
        }
        let stunned = try_stun(rng, opponent, stun_chance);
        let hit = if roll.crit {
            format!("Critical {name}! You hit the {} for {damage}.", opponent.name)
        } else {
            format!("You hit the {} with {name} for {damage}.", opponent.name)
        };
        lines.push(format!("{hit}{}", stun_suffix(stunned)));
    }
    encounter.last_spell_targets = targets;
    Ok(lines.join(" "))
}

/// Cast a support spell on one team member, in or out of battle.
///
/// Without an explicit `team_target` the member missing the most HP and
/// MP is chosen, and without a `rank` the highest affordable one is
/// used. `Err` holds the refusal when nothing was spent.
pub fn cast_support(
    hero: &mut Player,
    spell: &SpellDef,
    team_target: Option<TeamTarget>,
    rank: Option<u32>,
) -> Result<String, String> {
    let Some(plan) = plan_cast(hero, spell, rank) else {
        return Err(format!("Not enough MP to cast {}.", spell.name));
    };
    let chosen = team_target.filter(|t| match t {
        TeamTarget::Player => true,
        TeamTarget::Follower(idx) => hero.follower(*idx).is_some(),
    });
    let Some(target) = chosen.or_else(|| hero.select_team_target(mv_core::TeamMode::Combined)) else {
        return Err("HP and MP are already full.".to_string());
    };
    pay_cast(hero, spell, plan);
    apply_support(hero, spell.kind, plan.rank, target);
    let who = match target {
        TeamTarget::Player => "you".to_string(),
        TeamTarget::Follower(_) => hero.member_name(target).to_string(),
    };
    Ok(format!("You cast {} on {who}.", spell.name))
}

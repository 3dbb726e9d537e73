//! Victory payout and recruitment.

use rand::Rng;
use rand::rngs::StdRng;

use mv_core::{Catalogs, Follower, FollowerId, Gauge, Opponent, Player};

use super::{BattleEvent, CombatContext, Encounter};
use crate::quest;
use crate::spells::ProgressSnapshot;

/// End the battle: clear the field and, if anything was banked, pay out
/// XP and gold to the player and half the XP to each follower.
pub(super) fn finish_battle(
    hero: &mut Player,
    encounter: &mut Encounter,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
    events: &mut Vec<BattleEvent>,
) {
    let loot = encounter.loot;
    encounter.clear();
    events.push(BattleEvent::BattleWon);
    if loot.is_empty() {
        events.push(BattleEvent::AllClear);
        return;
    }

    let snapshot = ProgressSnapshot::take(hero, ctx.catalogs);
    let levels = hero.gain_xp(loot.xp);
    hero.gold += loot.gold;
    let share = loot.xp / 2;
    if share > 0 {
        for f in hero.followers_mut() {
            if let Some(up) = f.gain_xp(share, rng) {
                events.push(BattleEvent::Message(up.message(&f.name)));
            }
        }
    }
    tracing::info!(xp = loot.xp, gold = loot.gold, levels, "battle won");
    events.push(BattleEvent::Victory {
        xp: loot.xp,
        gold: loot.gold,
    });
    if levels > 0 {
        let notes = snapshot.notes(hero, ctx.catalogs);
        events.push(BattleEvent::LevelUp { levels, notes });
    }
    for line in quest::evaluate(hero, ctx.catalogs) {
        events.push(BattleEvent::QuestCompleted(line));
    }
    events.push(BattleEvent::AllClear);
}

/// Build a follower from a recruited opponent and add it to the party.
///
/// The follower inherits the opponent's attack, defense and max HP, gets
/// `6 + 2 * level` MP and its type's template. A template with starter
/// wands hands one of them over at random. Returns the new follower's
/// name and type, or `None` when the roster is full.
pub fn recruit_follower(
    hero: &mut Player,
    opponent: &Opponent,
    catalogs: &Catalogs,
    rng: &mut StdRng,
) -> Option<(String, String)> {
    let kind = opponent
        .follower_type
        .clone()
        .unwrap_or_else(|| opponent.name.to_lowercase());
    let name = if opponent.follower_names.is_empty() {
        opponent.name.clone()
    } else {
        opponent.follower_names[rng.random_range(0..opponent.follower_names.len())].clone()
    };
    let mut follower = Follower::new(FollowerId(0), kind.clone(), name.clone());
    follower.atk = opponent.atk;
    follower.defense = opponent.defense;
    follower.hp = Gauge::new(opponent.hp.max);
    follower.mp = Gauge::new(6 + 2 * opponent.level as i32);
    let template = catalogs.followers.template(&kind);
    if let Some(t) = template {
        follower.apply_template(t);
    }
    if !hero.add_follower(follower) {
        return None;
    }

    let idx = hero.followers().len() - 1;
    let wands = template.map(|t| t.starter_wands.as_slice()).unwrap_or_default();
    if !wands.is_empty() {
        let wand_id = &wands[rng.random_range(0..wands.len())];
        if let Some(item) = catalogs.item(wand_id) {
            if let Some(gear) = hero.add_gear(wand_id, item) {
                hero.assign_gear_to_follower(idx, &gear);
            }
        }
    }
    Some((name, kind))
}

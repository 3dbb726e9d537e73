//! Combat rounds and the spellbook.

use mv_core::CommandId;
use mv_mechanics::engine::cast_support;
use mv_mechanics::spells::is_available;
use mv_mechanics::{Action, BattleEvent, CombatContext, resolve_round};

use super::{Invocation, RouterContext};
use crate::mode::{Location, Mode};
use crate::state::GameState;

/// ATTACK, DEFEND, FLEE or SOCIALIZE.
pub(super) fn act(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let target = inv.opponent_index().or(state.target_index);
    let action = match inv.id {
        CommandId::Attack => Action::Attack { target },
        CommandId::Defend => Action::Defend,
        CommandId::Flee => Action::Flee,
        CommandId::Socialize => Action::Socialize { target },
        _ => return false,
    };
    run_round(&action, state, ctx)
}

pub(super) fn spellbook(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    match &inv.id {
        CommandId::BKey => {
            state.close_panel();
            state.say("Closed spellbook.");
            true
        }
        CommandId::Cast(id) => cast(id, inv, state, ctx),
        _ => false,
    }
}

fn cast(id: &str, inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let Some(spell) = ctx.catalogs.spell(id) else {
        return false;
    };
    if !is_available(&state.player, id, spell) {
        return false;
    }
    let rank = match state.mode {
        Mode::Spellbook { rank, .. } => rank,
        _ => None,
    };
    if state.in_battle() {
        let action = Action::Cast {
            spell: id.to_string(),
            target: inv.opponent_index().or(state.target_index),
            team_target: None,
            rank,
        };
        state.close_panel();
        return run_round(&action, state, ctx);
    }
    if !spell.is_support() {
        state.say("There is nothing to target.");
        return true;
    }
    match cast_support(&mut state.player, spell, None, rank) {
        Ok(message) => {
            state.say(message);
            ctx.save(state);
        }
        Err(refusal) => state.say(refusal),
    }
    true
}

/// Resolve one round and fold its events into the state in order.
fn run_round(action: &Action, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let combat = CombatContext::new(ctx.catalogs).with_odds(ctx.odds);
    let outcome = match resolve_round(&mut state.player, &mut state.encounter, action, &combat, ctx.rng) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "combat action rejected");
            return false;
        }
    };
    state.defeated.clear();
    state.offensive = outcome.performed && action.is_offensive(ctx.catalogs);
    if !outcome.performed {
        for line in outcome.messages() {
            state.say(line);
        }
        return true;
    }

    let mut leveling = None;
    for event in outcome.events {
        let line = event.message();
        match event {
            BattleEvent::OpponentsDefeated(fallen) => state.defeated.extend(fallen),
            BattleEvent::PlayerDefeated { gold_lost } => {
                tracing::info!(gold_lost, "player defeated");
                state.move_to(Location::Town);
                leveling = None;
            }
            BattleEvent::BattleWon => state.log.clear(),
            BattleEvent::LevelUp { levels, notes } => {
                tracing::info!(levels, level = state.player.level, "level up");
                leveling = Some(notes);
            }
            BattleEvent::Message(_)
            | BattleEvent::Victory { .. }
            | BattleEvent::QuestCompleted(_)
            | BattleEvent::AllClear => {}
        }
        if let Some(line) = line {
            state.say(line);
        }
    }

    let target_alive = state
        .target_index
        .is_some_and(|i| state.encounter.opponents.get(i).is_some_and(|o| o.is_alive()));
    if !target_alive {
        state.target_index = None;
    }
    if let Some(notes) = leveling {
        if state.player.needs_level_up() {
            state.mode = Mode::Leveling { cursor: 0, notes };
        }
    }
    ctx.save(state);
    true
}

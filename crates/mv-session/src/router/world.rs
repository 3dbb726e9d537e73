//! Town and forest: scene travel, venue entry and combat actions.

use mv_core::CommandId;
use mv_mechanics::quest::QuestEvent;
use mv_mechanics::spawn::arrival_message;
use mv_mechanics::{Encounter, spawn_encounter};

use super::{Invocation, RouterContext, battle, quest_event, with_notes};
use crate::menu::find_enabled;
use crate::mode::{Location, Mode, VenueState};
use crate::state::GameState;

pub(super) fn handle(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    match inv.id {
        CommandId::EnterScene => {
            let cmds = ctx.commands(state);
            let Some(scene) = find_enabled(&cmds, &inv.id, inv.target.as_deref()).and_then(|d| d.target.clone())
            else {
                return false;
            };
            match scene.as_str() {
                "town" => enter_town(state, ctx),
                "forest" => enter_forest(state, ctx),
                other => {
                    tracing::warn!(scene = other, "no such scene");
                    false
                }
            }
        }
        CommandId::EnterVenue => {
            let cmds = ctx.commands(state);
            let Some(id) = find_enabled(&cmds, &inv.id, inv.target.as_deref()).and_then(|d| d.target.clone())
            else {
                return false;
            };
            enter_venue(&id, state, ctx)
        }
        CommandId::Attack | CommandId::Defend | CommandId::Flee | CommandId::Socialize => {
            if state.mode != Mode::Battle {
                return false;
            }
            let cmds = ctx.commands(state);
            if find_enabled(&cmds, &inv.id, None).is_none() {
                return false;
            }
            battle::act(inv, state, ctx)
        }
        _ => false,
    }
}

/// Return to town. The encounter ends and every panel closes.
pub(crate) fn enter_town(state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if state.location == Location::Town {
        state.say("You are already in town.");
        return true;
    }
    state.encounter.clear();
    state.move_to(Location::Town);
    state.say("You return to town.");
    ctx.save(state);
    true
}

/// Head into the forest and meet whatever lives there.
///
/// With a living opponent already present nothing changes except the
/// message.
pub(crate) fn enter_forest(state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if state.location == Location::Forest {
        if let Some(foe) = state.encounter.opponents.iter().find(|o| o.is_alive()) {
            state.message = format!("You are already facing a {}.", foe.name);
            return true;
        }
    }
    let arriving = state.location != Location::Forest;
    if arriving {
        state.encounter.clear();
        state.move_to(Location::Forest);
    } else {
        state.close_panel();
    }
    let opponents = spawn_encounter(
        &ctx.catalogs.opponents,
        state.player.level,
        state.player.current_element(),
        ctx.rng,
    );
    let arrival = if opponents.is_empty() {
        "All is quiet. No enemies in sight.".to_string()
    } else {
        arrival_message(&opponents)
    };
    state.encounter = Encounter::new(opponents);
    state.log.clear();
    state.target_index = None;
    let notes = if arriving {
        quest_event(
            state,
            ctx,
            QuestEvent::VisitScene {
                scene_id: Location::Forest.scene_id().to_string(),
            },
        )
    } else {
        Vec::new()
    };
    state.say(with_notes(arrival, notes));
    ctx.save(state);
    true
}

fn enter_venue(id: &str, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if state.location != Location::Town {
        return false;
    }
    let Some(def) = ctx.catalogs.venue(id) else {
        tracing::warn!(venue = id, "command names an unknown venue");
        return false;
    };
    state.mode = Mode::Venue(VenueState::new(id, def.kind));
    state.say(def.welcome());
    true
}

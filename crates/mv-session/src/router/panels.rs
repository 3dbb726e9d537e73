//! Panels reached from the options menu: inventory, stats, elements and
//! the options menu itself, plus the level-up screen.

use mv_core::player::LevelUpChoice;
use mv_core::{CommandId, Stat, TeamMode, TeamTarget};

use super::{Invocation, RouterContext, settle_quests, with_notes};
use crate::menu::{
    InventoryEntry, element_list, find_enabled, inventory_entries, menu_open_message, options_entries,
};
use crate::mode::{FollowersView, Mode, QuestView};
use crate::state::GameState;

/// Open a panel or run an options entry from any mode that allows it.
///
/// SPELLBOOK and OPTIONS are always offered; the options entries are
/// checked against the options menu's filtered list.
pub(super) fn open(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if matches!(state.mode, Mode::Title(_) | Mode::Leveling { .. }) {
        return false;
    }
    match inv.id {
        CommandId::Spellbook => {
            state.mode = Mode::Spellbook { cursor: 0, rank: None };
            state.say(menu_open_message(ctx.catalogs, "spellbook", "Open spellbook."));
            return true;
        }
        CommandId::Options => {
            if matches!(state.mode, Mode::Options { .. }) {
                state.close_panel();
                state.say("Closed options.");
            } else {
                state.mode = Mode::Options { cursor: 0 };
                state.say(menu_open_message(ctx.catalogs, "options", "Options menu."));
            }
            return true;
        }
        _ => {}
    }

    let entries = options_entries(state, ctx.catalogs, ctx.saves.exists(None));
    if find_enabled(&entries, &inv.id, None).is_none() {
        return false;
    }
    match inv.id {
        CommandId::Inventory => {
            if inventory_entries(&state.player, ctx.catalogs).is_empty() {
                state.say("Inventory is empty.");
            } else {
                state.mode = Mode::Inventory { cursor: 0 };
                state.say("Choose an item.");
            }
        }
        CommandId::Stats => {
            state.mode = Mode::Stats { cursor: 0 };
            state.say(menu_open_message(ctx.catalogs, "stats", "View stats and spend points."));
        }
        CommandId::Followers => {
            state.mode = Mode::Followers(FollowersView::default());
            state.say(menu_open_message(ctx.catalogs, "followers", "View your followers."));
        }
        CommandId::Quest => {
            let notes = settle_quests(state, ctx);
            let current = state.player.current_element();
            let continent = element_list(&state.player, ctx.catalogs)
                .iter()
                .position(|el| *el == current)
                .unwrap_or(0);
            state.mode = Mode::QuestBrowser(QuestView {
                continent,
                ..QuestView::default()
            });
            state.say(with_notes("Your quests await.", notes));
            ctx.save(state);
        }
        CommandId::Elements => {
            let current = state.player.current_element();
            let cursor = element_list(&state.player, ctx.catalogs)
                .iter()
                .position(|el| *el == current)
                .unwrap_or(0);
            state.mode = Mode::Elements { cursor };
            state.say("Select an element.");
        }
        CommandId::ToggleSpeed => {
            state.player.battle_speed = state.player.battle_speed.next();
            state.say(format!("Battle speed: {}.", state.player.battle_speed));
            ctx.save(state);
        }
        CommandId::Quit => {
            state.quit_requested = true;
            state.say("Farewell.");
            ctx.save(state);
        }
        _ => return false,
    }
    true
}

/// Inventory, stats, elements and options.
pub(super) fn handle(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if inv.id == CommandId::BKey {
        let closed = match state.mode {
            Mode::Inventory { .. } => "Closed inventory.",
            Mode::Stats { .. } => "Closed stats.",
            Mode::Elements { .. } => "Closed elements.",
            _ => "Closed options.",
        };
        state.close_panel();
        state.say(closed);
        return true;
    }
    match (state.mode.id(), &inv.id) {
        ("inventory", CommandId::Num(n)) => use_entry(usize::from(*n), state, ctx),
        ("stats", CommandId::Spend(_) | CommandId::StatBalanced | CommandId::StatRandom) => {
            spend(&inv.id, state, ctx)
        }
        ("elements", CommandId::SetElement(el)) => {
            let el = *el;
            if !state.player.set_current_element(el) {
                return false;
            }
            state.close_panel();
            state.say(format!("Element set to {}.", el.title()));
            ctx.save(state);
            true
        }
        _ => false,
    }
}

fn use_entry(n: usize, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let entries = inventory_entries(&state.player, ctx.catalogs);
    let Some(entry) = n.checked_sub(1).and_then(|i| entries.get(i)) else {
        return false;
    };
    let message = match entry {
        InventoryEntry::Item { key, .. } => {
            let item = ctx.catalogs.item(key);
            let restores = item.is_some_and(|i| i.restores());
            let target = if restores && !state.player.followers().is_empty() {
                state
                    .player
                    .select_team_target(TeamMode::Combined)
                    .unwrap_or(TeamTarget::Player)
            } else {
                TeamTarget::Player
            };
            state.player.use_item(key, item, target)
        }
        InventoryEntry::Gear { id, .. } => {
            let message = state.player.equip_gear(id);
            with_notes(message, settle_quests(state, ctx))
        }
    };
    state.say(message);
    if inventory_entries(&state.player, ctx.catalogs).is_empty() {
        state.close_panel();
    }
    ctx.save(state);
    true
}

fn spend(id: &CommandId, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if state.player.stat_points == 0 {
        state.say("No stat points to spend.");
        return true;
    }
    let message = match id {
        CommandId::Spend(stat) => {
            state.player.spend_stat_point(*stat);
            format!("{stat} increased by 1.")
        }
        CommandId::StatBalanced => {
            state.player.allocate_balanced();
            "Balanced allocation complete.".to_string()
        }
        CommandId::StatRandom => {
            state.player.allocate_random(&mut *ctx.rng);
            "Random allocation complete.".to_string()
        }
        _ => return false,
    };
    state.say(message);
    ctx.save(state);
    true
}

/// The level-up screen. Nothing else is accepted until it closes.
pub(super) fn leveling(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let choice = match inv.id {
        CommandId::Num(n) => match usize::from(n).checked_sub(1).and_then(|i| Stat::ALL.get(i)) {
            Some(stat) => LevelUpChoice::Spend(*stat),
            None => return false,
        },
        CommandId::Spend(stat) => LevelUpChoice::Spend(stat),
        CommandId::BKey | CommandId::StatBalanced => LevelUpChoice::Balanced,
        CommandId::XKey | CommandId::StatRandom => LevelUpChoice::Random,
        CommandId::Bank => LevelUpChoice::Bank,
        _ => return false,
    };
    let (message, done) = state.player.handle_level_up_input(Some(choice), &mut *ctx.rng);
    if done {
        state.close_panel();
    }
    state.say(message);
    ctx.save(state);
    true
}

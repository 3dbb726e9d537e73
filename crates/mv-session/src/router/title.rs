//! Title screen and character creation.

use mv_core::player::DEFAULT_NAME;
use mv_core::{CommandId, Player};

use super::{Invocation, RouterContext, sync_elements};
use crate::menu::find_enabled;
use crate::mode::{Location, Mode, TitleStep};
use crate::names::{clip_name, random_name};
use crate::state::GameState;

pub(super) fn handle(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let Mode::Title(step) = &state.mode else {
        return false;
    };
    match step.clone() {
        TitleStep::Menu => menu(inv, state, ctx),
        TitleStep::SlotSelect => match &inv.id {
            CommandId::TitleSlot(n) => continue_from(u32::from(*n), state, ctx),
            CommandId::TitleSlotBack => step_to(state, TitleStep::Menu),
            _ => false,
        },
        TitleStep::ConfirmOverwrite { slot } => match inv.id {
            CommandId::TitleConfirmYes => {
                ctx.saves.delete(slot);
                step_to(state, TitleStep::NameSelect { slot })
            }
            CommandId::TitleConfirmNo => step_to(state, TitleStep::Menu),
            _ => false,
        },
        TitleStep::NameSelect { slot } => match &inv.id {
            CommandId::TitleNameRandom => {
                let taken = ctx.saves.existing_player_names();
                let name = random_name(&mut *ctx.rng, &taken);
                step_to(state, TitleStep::Fortune { slot, name })
            }
            CommandId::TitleNameCustom => step_to(
                state,
                TitleStep::NameInput {
                    slot,
                    name: String::new(),
                    cursor: (1, 0),
                    shift: true,
                },
            ),
            CommandId::TitleName(name) => {
                let name = chosen_name(name);
                step_to(state, TitleStep::Fortune { slot, name })
            }
            CommandId::TitleNameBack => step_to(state, TitleStep::Menu),
            _ => false,
        },
        TitleStep::NameInput { slot, .. } => match &inv.id {
            CommandId::TitleName(name) => {
                let name = chosen_name(name);
                step_to(state, TitleStep::Fortune { slot, name })
            }
            CommandId::TitleNameBack => step_to(state, TitleStep::NameSelect { slot }),
            _ => false,
        },
        TitleStep::Fortune { slot, name } => match inv.id {
            CommandId::Fortune(fortune) => step_to(state, TitleStep::StartConfirm { slot, name, fortune }),
            CommandId::TitleFortuneBack => step_to(state, TitleStep::NameSelect { slot }),
            _ => false,
        },
        TitleStep::StartConfirm { slot, name, fortune } => match inv.id {
            CommandId::TitleStartConfirmYes => {
                if let Err(e) = ctx.saves.set_current_slot(slot) {
                    tracing::warn!(error = %e, slot, "cannot start in slot");
                    return false;
                }
                state.player = Player::new(name, fortune.gold());
                sync_elements(state, ctx.catalogs);
                arrive(state);
                ctx.save(state);
                tracing::info!(slot, fortune = fortune.id(), "new game started");
                true
            }
            CommandId::TitleStartConfirmNo => step_to(state, TitleStep::Fortune { slot, name }),
            _ => false,
        },
    }
}

fn menu(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let cmds = ctx.commands(state);
    if find_enabled(&cmds, &inv.id, None).is_none() {
        return false;
    }
    match inv.id {
        CommandId::TitleNew => {
            let step = match ctx.saves.next_empty_slot() {
                Some(slot) => TitleStep::NameSelect { slot },
                None => TitleStep::ConfirmOverwrite {
                    slot: ctx.saves.last_played_slot().unwrap_or(1),
                },
            };
            step_to(state, step)
        }
        CommandId::TitleContinue => step_to(state, TitleStep::SlotSelect),
        CommandId::Quit => {
            state.quit_requested = true;
            state.say("Farewell.");
            true
        }
        _ => false,
    }
}

fn continue_from(slot: u32, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if slot == 0 || slot > ctx.saves.max_slots() {
        return false;
    }
    if !ctx.saves.exists(Some(slot)) {
        state.say("That slot is empty.");
        return true;
    }
    let Some(player) = ctx.saves.load_player(slot) else {
        state.say("That save could not be read.");
        return true;
    };
    if let Err(e) = ctx.saves.set_current_slot(slot) {
        tracing::warn!(error = %e, slot, "cannot continue from slot");
        return false;
    }
    state.player = player;
    sync_elements(state, ctx.catalogs);
    arrive(state);
    tracing::info!(slot, "game loaded");
    true
}

fn arrive(state: &mut GameState) {
    state.encounter.clear();
    state.move_to(Location::Town);
    state.say("You arrive in town.");
}

fn chosen_name(raw: &str) -> String {
    let name = clip_name(raw);
    if name.is_empty() { DEFAULT_NAME.to_string() } else { name }
}

fn step_to(state: &mut GameState, step: TitleStep) -> bool {
    state.mode = Mode::Title(step);
    true
}

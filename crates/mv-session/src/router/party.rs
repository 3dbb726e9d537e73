//! The follower roster: dismissal, gear and active abilities.

use mv_core::{CommandId, TeamTarget};

use super::{Invocation, RouterContext, settle_quests, with_notes};
use crate::mode::{FollowersView, Mode};
use crate::state::GameState;

pub(super) fn handle(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let Mode::Followers(view) = &state.mode else {
        return false;
    };
    let view = view.clone();
    match &inv.id {
        CommandId::BKey => {
            if view.dismiss_pending.is_some() {
                state.mode = Mode::Followers(FollowersView {
                    dismiss_pending: None,
                    ..view
                });
                state.say("Dismissal cancelled.");
            } else {
                state.close_panel();
                state.say("Closed followers.");
            }
            true
        }
        CommandId::FollowerDismiss(n) => dismiss(usize::from(*n), view, state, ctx),
        CommandId::FollowerUnequip(n) => {
            let Some(idx) = roster_index(state, *n) else {
                return false;
            };
            if !state.player.unequip_follower(idx) {
                return false;
            }
            let name = state.player.member_name(TeamTarget::Follower(idx)).to_string();
            state.say(format!("{name} unequips everything."));
            ctx.save(state);
            true
        }
        CommandId::FollowerEquip(n, gear) => {
            let Some(idx) = roster_index(state, *n) else {
                return false;
            };
            let Some(gear_name) = state.player.gear_instance(gear).map(|g| g.name.clone()) else {
                return false;
            };
            if !state.player.assign_gear_to_follower(idx, gear) {
                return false;
            }
            let name = state.player.member_name(TeamTarget::Follower(idx)).to_string();
            let message = format!("{name} equips {gear_name}.");
            let notes = settle_quests(state, ctx);
            state.say(with_notes(message, notes));
            ctx.save(state);
            true
        }
        CommandId::FollowerAbility(n, ability) => {
            let Some(idx) = roster_index(state, *n) else {
                return false;
            };
            let label = ctx
                .catalogs
                .ability(ability)
                .map(|a| a.label.clone())
                .unwrap_or_else(|| ability.clone());
            let Some(follower) = state.player.follower_mut(idx) else {
                return false;
            };
            if !follower.abilities.contains(ability) {
                return false;
            }
            follower.active_ability = ability.clone();
            let message = format!("{} will use {label}.", follower.name);
            state.say(message);
            ctx.save(state);
            true
        }
        _ => false,
    }
}

fn roster_index(state: &GameState, n: u8) -> Option<usize> {
    usize::from(n)
        .checked_sub(1)
        .filter(|idx| state.player.follower(*idx).is_some())
}

/// Dismissing takes two picks of the same follower.
fn dismiss(n: usize, view: FollowersView, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let Some(idx) = n.checked_sub(1) else {
        return false;
    };
    let Some(name) = state.player.follower(idx).map(|f| f.name.clone()) else {
        return false;
    };
    if view.dismiss_pending != Some(idx) {
        state.mode = Mode::Followers(FollowersView {
            cursor: idx,
            dismiss_pending: Some(idx),
        });
        state.say(format!("Dismiss {name}? Choose again to confirm."));
        return true;
    }
    state.player.dismiss_follower(idx);
    let remaining = state.player.followers().len();
    state.mode = Mode::Followers(FollowersView {
        cursor: view.cursor.min(remaining.saturating_sub(1)),
        dismiss_pending: None,
    });
    tracing::info!(follower = %name, "follower dismissed");
    state.say(format!("{name} leaves your party."));
    ctx.save(state);
    true
}

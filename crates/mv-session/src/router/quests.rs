//! The quest browser: list, dialog pages and starting a quest.

use mv_core::CommandId;
use mv_mechanics::quest::start_quest;

use super::{Invocation, RouterContext};
use crate::menu::quest_rows;
use crate::mode::{Mode, QuestDetail, QuestView};
use crate::state::GameState;

pub(super) fn handle(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let Mode::QuestBrowser(view) = &state.mode else {
        return false;
    };
    let view = view.clone();
    match (&view.detail, &inv.id) {
        (None, CommandId::BKey) => {
            state.close_panel();
            state.say("Closed quests.");
            true
        }
        (Some(_), CommandId::BKey) => {
            set_detail(state, &view, None);
            state.say("Your quests await.");
            true
        }
        (None, CommandId::Num(n)) => {
            let rows = quest_rows(&state.player, ctx.catalogs, view.continent);
            let Some(row) = usize::from(*n).checked_sub(1).and_then(|i| rows.get(i)) else {
                return false;
            };
            let first_page = ctx
                .catalogs
                .quests
                .get(&row.id)
                .and_then(|q| q.dialog.first().cloned())
                .unwrap_or_else(|| row.title.clone());
            set_detail(
                state,
                &view,
                Some(QuestDetail {
                    id: row.id.clone(),
                    page: 0,
                }),
            );
            state.say(first_page);
            true
        }
        (Some(detail), CommandId::Num(1)) => {
            let next = detail.page + 1;
            let Some(page) = ctx
                .catalogs
                .quests
                .get(&detail.id)
                .and_then(|q| q.dialog.get(next).cloned())
            else {
                return false;
            };
            set_detail(
                state,
                &view,
                Some(QuestDetail {
                    id: detail.id.clone(),
                    page: next,
                }),
            );
            state.say(page);
            true
        }
        (Some(detail), CommandId::QuestStart(id)) => {
            if &detail.id != id {
                return false;
            }
            let pages = ctx.catalogs.quests.get(id).map_or(0, |q| q.dialog.len());
            if detail.page + 1 < pages {
                return false;
            }
            match start_quest(&mut state.player, ctx.catalogs, id) {
                Ok(message) => {
                    tracing::debug!(quest = %id, %message, "quest start attempted");
                    set_detail(state, &view, None);
                    state.say(message);
                    ctx.save(state);
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "quest start rejected");
                    false
                }
            }
        }
        _ => false,
    }
}

fn set_detail(state: &mut GameState, view: &QuestView, detail: Option<QuestDetail>) {
    state.mode = Mode::QuestBrowser(QuestView {
        continent: view.continent,
        cursor: view.cursor,
        detail,
    });
}

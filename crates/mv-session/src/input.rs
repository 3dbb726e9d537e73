//! Maps directional input onto commands.
//!
//! The command grid fills three rows column by column. Cursor moves skip
//! disabled entries. Confirming ATTACK, or a low-rank targeted spell,
//! with opponents present starts target selection instead of acting:
//! left and right cycle living opponents, confirm commits and back
//! aborts without touching anything else. In the spellbook, left and
//! right pick the cast rank of the highlighted spell instead.

use std::str::FromStr;

use mv_core::command::AvailableCommand;
use mv_core::{Catalogs, CommandId};
use mv_mechanics::spells::{max_cast_rank, plan_cast};

use crate::error::SessionError;
use crate::menu::{available_commands, element_list};
use crate::mode::{Mode, TargetSelect, TitleStep};
use crate::names::{self, Key};
use crate::persistence::SaveSlots;
use crate::router::Invocation;
use crate::state::GameState;

/// Rows in the command grid.
pub const GRID_ROWS: usize = 3;

/// A controller or keyboard press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Cursor up.
    Up,
    /// Cursor down.
    Down,
    /// Cursor left.
    Left,
    /// Cursor right.
    Right,
    /// Accept the highlighted entry.
    Confirm,
    /// Back out of the current view.
    Back,
    /// Toggle the options menu.
    Start,
}

impl FromStr for InputEvent {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "w" => Ok(InputEvent::Up),
            "down" | "s" => Ok(InputEvent::Down),
            "left" | "a" => Ok(InputEvent::Left),
            "right" | "d" => Ok(InputEvent::Right),
            "confirm" | "enter" | "z" => Ok(InputEvent::Confirm),
            "back" | "esc" | "x" => Ok(InputEvent::Back),
            "start" | "tab" => Ok(InputEvent::Start),
            other => Err(SessionError::UnknownKey(other.to_string())),
        }
    }
}

/// Grid columns for `count` entries.
pub fn grid_columns(count: usize) -> usize {
    match count {
        0..=3 => 1,
        4..=6 => 2,
        _ => 3,
    }
}

/// Apply `event` to cursors and selections. Returns the command to route,
/// if the press produced one.
pub fn map_input(
    event: InputEvent,
    state: &mut GameState,
    catalogs: &Catalogs,
    saves: &SaveSlots,
) -> Option<Invocation> {
    if state.target_select.is_some() {
        return target_input(event, state);
    }
    if matches!(state.mode, Mode::Title(TitleStep::NameInput { .. })) {
        return keyboard_input(event, state);
    }
    if matches!(state.mode, Mode::Title(TitleStep::SlotSelect)) {
        return slot_input(event, state, saves);
    }
    match event {
        InputEvent::Start => match state.mode {
            Mode::Title(_) | Mode::Leveling { .. } => None,
            _ => Some(Invocation::new(CommandId::Options)),
        },
        InputEvent::Back => back_command(&state.mode).map(Invocation::new),
        InputEvent::Left | InputEvent::Right if cycles_continents(state) => {
            let count = element_list(&state.player, catalogs).len().max(1);
            if let Mode::QuestBrowser(view) = &mut state.mode {
                view.continent = if event == InputEvent::Right {
                    (view.continent + 1) % count
                } else {
                    (view.continent + count - 1) % count
                };
                view.cursor = 0;
            }
            None
        }
        InputEvent::Left | InputEvent::Right if matches!(state.mode, Mode::Spellbook { .. }) => {
            let (chosen, top) = cast_rank_choice(state, catalogs, saves)?;
            let next = if event == InputEvent::Right {
                (chosen + 1).min(top)
            } else {
                chosen.saturating_sub(1).max(1)
            };
            if let Mode::Spellbook { rank, .. } = &mut state.mode {
                *rank = Some(next);
            }
            None
        }
        InputEvent::Up | InputEvent::Down | InputEvent::Left | InputEvent::Right => {
            let cmds = available_commands(state, catalogs, saves.exists(None));
            let cursor = cursor_mut(state);
            *cursor = move_cursor(&cmds, *cursor, event);
            if let Mode::Spellbook { rank, .. } = &mut state.mode {
                *rank = None;
            }
            None
        }
        InputEvent::Confirm => {
            let cmds = available_commands(state, catalogs, saves.exists(None));
            let cursor = *cursor_mut(state);
            let entry = cmds.get(cursor).filter(|c| c.enabled)?;
            confirm(entry, state, catalogs)
        }
    }
}

fn confirm(entry: &AvailableCommand, state: &mut GameState, catalogs: &Catalogs) -> Option<Invocation> {
    let def = &entry.def;
    if needs_target(&def.command, state, catalogs) {
        let living = state.living_opponents();
        let index = state
            .target_index
            .filter(|i| living.contains(i))
            .or_else(|| living.first().copied())?;
        state.target_select = Some(TargetSelect {
            command: def.command.clone(),
            index,
        });
        return None;
    }
    let mut inv = Invocation::new(def.command.clone());
    inv.target = def.target.clone().or_else(|| def.service_id.clone());
    Some(inv)
}

fn needs_target(id: &CommandId, state: &GameState, catalogs: &Catalogs) -> bool {
    if !state.in_battle() || state.living_opponents().len() < 2 {
        return false;
    }
    match id {
        CommandId::Attack => true,
        CommandId::Cast(spell) => catalogs.spell(spell).is_some_and(|s| {
            let rank = match state.mode {
                Mode::Spellbook { rank, .. } => rank,
                _ => None,
            };
            s.requires_target && plan_cast(&state.player, s, rank).is_some_and(|p| p.rank < 2)
        }),
        _ => false,
    }
}

fn target_input(event: InputEvent, state: &mut GameState) -> Option<Invocation> {
    let living = state.living_opponents();
    let select = state.target_select.as_mut()?;
    match event {
        InputEvent::Left | InputEvent::Right | InputEvent::Up | InputEvent::Down => {
            if living.is_empty() {
                return None;
            }
            let at = living.iter().position(|i| *i == select.index).unwrap_or(0);
            let forward = matches!(event, InputEvent::Right | InputEvent::Down);
            let next = if forward {
                (at + 1) % living.len()
            } else {
                (at + living.len() - 1) % living.len()
            };
            select.index = living[next];
            None
        }
        InputEvent::Confirm => {
            let select = state.target_select.take()?;
            state.target_index = Some(select.index);
            Some(Invocation::new(select.command).with_target((select.index + 1).to_string()))
        }
        InputEvent::Back => {
            state.target_select = None;
            None
        }
        InputEvent::Start => None,
    }
}

fn keyboard_input(event: InputEvent, state: &mut GameState) -> Option<Invocation> {
    let Mode::Title(TitleStep::NameInput {
        name, cursor, shift, ..
    }) = &mut state.mode
    else {
        return None;
    };
    let (row, col) = *cursor;
    match event {
        InputEvent::Up | InputEvent::Down => {
            let rows = names::rows();
            let row = if event == InputEvent::Down {
                (row + 1) % rows
            } else {
                (row + rows - 1) % rows
            };
            let col = col.min(names::row_len(row).saturating_sub(1));
            *cursor = (row, col);
            None
        }
        InputEvent::Left | InputEvent::Right => {
            let len = names::row_len(row).max(1);
            let col = if event == InputEvent::Right {
                (col + 1) % len
            } else {
                (col + len - 1) % len
            };
            *cursor = (row, col);
            None
        }
        InputEvent::Confirm => match names::key_at(row, col)? {
            Key::Shift => {
                *shift = !*shift;
                None
            }
            Key::Done => Some(Invocation::new(CommandId::TitleName(name.clone()))),
            Key::Cancel => Some(Invocation::new(CommandId::TitleNameBack)),
            key => {
                names::type_key(name, key, *shift);
                None
            }
        },
        InputEvent::Back => {
            if name.is_empty() {
                Some(Invocation::new(CommandId::TitleNameBack))
            } else {
                name.pop();
                None
            }
        }
        InputEvent::Start => Some(Invocation::new(CommandId::TitleName(name.clone()))),
    }
}

fn slot_input(event: InputEvent, state: &mut GameState, saves: &SaveSlots) -> Option<Invocation> {
    let slots = saves.occupied();
    match event {
        InputEvent::Up | InputEvent::Left if !slots.is_empty() => {
            state.action_cursor = (state.action_cursor + slots.len() - 1) % slots.len();
            None
        }
        InputEvent::Down | InputEvent::Right if !slots.is_empty() => {
            state.action_cursor = (state.action_cursor + 1) % slots.len();
            None
        }
        InputEvent::Confirm => {
            let slot = slots.get(state.action_cursor).copied()?;
            let slot = u8::try_from(slot).ok()?;
            Some(Invocation::new(CommandId::TitleSlot(slot)))
        }
        InputEvent::Back => Some(Invocation::new(CommandId::TitleSlotBack)),
        _ => None,
    }
}

fn cycles_continents(state: &GameState) -> bool {
    matches!(&state.mode, Mode::QuestBrowser(view) if view.detail.is_none())
}

/// What back means in each mode.
fn back_command(mode: &Mode) -> Option<CommandId> {
    match mode {
        Mode::Town | Mode::Battle | Mode::Leveling { .. } => None,
        Mode::Title(step) => match step {
            TitleStep::Menu | TitleStep::NameInput { .. } => None,
            TitleStep::SlotSelect => Some(CommandId::TitleSlotBack),
            TitleStep::ConfirmOverwrite { .. } => Some(CommandId::TitleConfirmNo),
            TitleStep::NameSelect { .. } => Some(CommandId::TitleNameBack),
            TitleStep::Fortune { .. } => Some(CommandId::TitleFortuneBack),
            TitleStep::StartConfirm { .. } => Some(CommandId::TitleStartConfirmNo),
        },
        _ => Some(CommandId::BKey),
    }
}

/// The cast rank picked for the highlighted spellbook entry and the
/// highest rank the player can afford for it. `None` outside the
/// spellbook or when the spell cannot be cast at all.
pub fn cast_rank_choice(state: &GameState, catalogs: &Catalogs, saves: &SaveSlots) -> Option<(u32, u32)> {
    let Mode::Spellbook { cursor, rank } = &state.mode else {
        return None;
    };
    let cmds = available_commands(state, catalogs, saves.exists(None));
    let CommandId::Cast(id) = &cmds.get(*cursor)?.def.command else {
        return None;
    };
    let spell = catalogs.spell(id)?;
    let top = max_cast_rank(&state.player, spell);
    if top == 0 {
        return None;
    }
    Some((rank.map_or(top, |r| r.clamp(1, top)), top))
}

/// The highlighted entry of the current mode's command list.
pub fn active_cursor(state: &GameState) -> usize {
    match &state.mode {
        Mode::Spellbook { cursor, .. }
        | Mode::Inventory { cursor }
        | Mode::Stats { cursor }
        | Mode::Elements { cursor }
        | Mode::Options { cursor }
        | Mode::Leveling { cursor, .. } => *cursor,
        Mode::Venue(venue) => venue.cursor,
        Mode::Followers(view) => view.cursor,
        Mode::QuestBrowser(view) => view.cursor,
        Mode::Title(_) | Mode::Town | Mode::Battle => state.action_cursor,
    }
}

/// The cursor the current mode navigates with.
fn cursor_mut(state: &mut GameState) -> &mut usize {
    match &mut state.mode {
        Mode::Spellbook { cursor, .. }
        | Mode::Inventory { cursor }
        | Mode::Stats { cursor }
        | Mode::Elements { cursor }
        | Mode::Options { cursor }
        | Mode::Leveling { cursor, .. } => cursor,
        Mode::Venue(venue) => &mut venue.cursor,
        Mode::Followers(view) => &mut view.cursor,
        Mode::QuestBrowser(view) => &mut view.cursor,
        Mode::Title(_) | Mode::Town | Mode::Battle => &mut state.action_cursor,
    }
}

/// Move through the grid, skipping disabled entries. A move with no
/// enabled entry in that direction stays put.
fn move_cursor(cmds: &[AvailableCommand], cursor: usize, event: InputEvent) -> usize {
    if cmds.is_empty() {
        return 0;
    }
    let cursor = cursor.min(cmds.len() - 1);
    let enabled = |i: usize| cmds.get(i).is_some_and(|c| c.enabled);
    let columns = grid_columns(cmds.len());
    match event {
        InputEvent::Up | InputEvent::Down => {
            let n = cmds.len();
            let forward = event == InputEvent::Down;
            (1..n)
                .map(|step| if forward { (cursor + step) % n } else { (cursor + n - step) % n })
                .find(|i| enabled(*i))
                .unwrap_or(cursor)
        }
        InputEvent::Left | InputEvent::Right => {
            if columns == 1 {
                return cursor;
            }
            let forward = event == InputEvent::Right;
            let mut at = cursor;
            loop {
                let next = if forward {
                    at.checked_add(GRID_ROWS).filter(|i| *i < cmds.len())
                } else {
                    at.checked_sub(GRID_ROWS)
                };
                match next {
                    Some(i) if enabled(i) => return i,
                    Some(i) => at = i,
                    None => return cursor,
                }
            }
        }
        _ => cursor,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use mv_core::opponent::OpponentTemplate;
    use mv_core::{Opponent, Player};
    use mv_mechanics::Encounter;

    use super::*;
    use crate::mode::Location;

    fn catalogs() -> Catalogs {
        Catalogs::builtin().unwrap()
    }

    fn slime(recruitable: bool) -> Opponent {
        let t: OpponentTemplate = serde_json::from_value(serde_json::json!({
            "name": "Slime", "hp": 8, "atk": 1, "defense": 1, "recruitable": recruitable
        }))
        .unwrap();
        Opponent::from_template(&t)
    }

    fn fight(opponents: usize) -> GameState {
        let mut state = GameState::new(7);
        state.player = Player::new("Tess", 10);
        state.move_to(Location::Forest);
        state.encounter = Encounter::new((0..opponents).map(|_| slime(false)).collect());
        state
    }

    #[test]
    fn key_names() {
        assert_eq!("Enter".parse::<InputEvent>().unwrap(), InputEvent::Confirm);
        assert_eq!("esc".parse::<InputEvent>().unwrap(), InputEvent::Back);
        assert!("jump".parse::<InputEvent>().is_err());
    }

    #[test]
    fn grid_width_grows_with_entries() {
        assert_eq!(grid_columns(3), 1);
        assert_eq!(grid_columns(4), 2);
        assert_eq!(grid_columns(6), 2);
        assert_eq!(grid_columns(7), 3);
    }

    #[test]
    fn disabled_entries_are_skipped() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = fight(1);
        map_input(InputEvent::Down, &mut state, &cat, &saves);
        assert_eq!(state.action_cursor, 2, "socialize is disabled");
        map_input(InputEvent::Up, &mut state, &cat, &saves);
        assert_eq!(state.action_cursor, 0);
        map_input(InputEvent::Right, &mut state, &cat, &saves);
        assert_eq!(state.action_cursor, 3);
    }

    #[test]
    fn single_opponent_attacks_directly() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = fight(1);
        let inv = map_input(InputEvent::Confirm, &mut state, &cat, &saves).unwrap();
        assert_eq!(inv.id, CommandId::Attack);
        assert!(state.target_select.is_none());
    }

    #[test]
    fn target_selection_commits_the_chosen_opponent() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = fight(3);
        state.encounter.opponents[1].hp.current = 0;

        assert!(map_input(InputEvent::Confirm, &mut state, &cat, &saves).is_none());
        assert_eq!(state.target_select.as_ref().unwrap().index, 0);
        map_input(InputEvent::Right, &mut state, &cat, &saves);
        assert_eq!(state.target_select.as_ref().unwrap().index, 2, "fallen opponents are skipped");

        let inv = map_input(InputEvent::Confirm, &mut state, &cat, &saves).unwrap();
        assert_eq!(inv.id, CommandId::Attack);
        assert_eq!(inv.target.as_deref(), Some("3"));
        assert_eq!(state.target_index, Some(2));
        assert!(state.target_select.is_none());
    }

    proptest! {
        #[test]
        fn aborting_target_selection_restores_the_state(moves in prop::collection::vec(any::<bool>(), 0..12)) {
            let cat = catalogs();
            let saves = SaveSlots::in_memory(3);
            let mut state = fight(3);
            let before = state.clone();
            prop_assert!(map_input(InputEvent::Confirm, &mut state, &cat, &saves).is_none());
            for right in moves {
                let event = if right { InputEvent::Right } else { InputEvent::Left };
                prop_assert!(map_input(event, &mut state, &cat, &saves).is_none());
            }
            prop_assert!(map_input(InputEvent::Back, &mut state, &cat, &saves).is_none());
            prop_assert_eq!(state, before);
        }
    }

    #[test]
    fn spellbook_sideways_keys_pick_the_cast_rank() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = fight(2);
        state.player.level = 3;
        // healing sorts before spark at level 1
        state.mode = Mode::Spellbook { cursor: 1, rank: None };
        assert_eq!(cast_rank_choice(&state, &cat, &saves), Some((2, 2)));

        map_input(InputEvent::Right, &mut state, &cat, &saves);
        assert_eq!(cast_rank_choice(&state, &cat, &saves), Some((2, 2)));
        map_input(InputEvent::Left, &mut state, &cat, &saves);
        map_input(InputEvent::Left, &mut state, &cat, &saves);
        assert_eq!(cast_rank_choice(&state, &cat, &saves), Some((1, 2)));
        assert_eq!(active_cursor(&state), 1);

        assert!(map_input(InputEvent::Confirm, &mut state, &cat, &saves).is_none());
        let select = state.target_select.take().unwrap();
        assert_eq!(select.command, CommandId::Cast("spark".into()));

        map_input(InputEvent::Up, &mut state, &cat, &saves);
        assert!(matches!(state.mode, Mode::Spellbook { rank: None, .. }));
    }

    #[test]
    fn full_rank_spark_skips_target_selection() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = fight(2);
        state.player.level = 3;
        state.mode = Mode::Spellbook { cursor: 1, rank: None };
        let inv = map_input(InputEvent::Confirm, &mut state, &cat, &saves).unwrap();
        assert_eq!(inv.id, CommandId::Cast("spark".into()));
        assert!(state.target_select.is_none());
    }

    #[test]
    fn start_toggles_options_outside_the_title() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut title = GameState::new(7);
        assert!(map_input(InputEvent::Start, &mut title, &cat, &saves).is_none());
        let mut town = GameState::new(7);
        town.move_to(Location::Town);
        let inv = map_input(InputEvent::Start, &mut town, &cat, &saves).unwrap();
        assert_eq!(inv.id, CommandId::Options);
    }

    #[test]
    fn back_leaves_venues_and_panels() {
        assert_eq!(back_command(&Mode::Town), None);
        assert_eq!(back_command(&Mode::Options { cursor: 0 }), Some(CommandId::BKey));
        assert_eq!(
            back_command(&Mode::Title(TitleStep::Fortune {
                slot: 1,
                name: "Ada".into()
            })),
            Some(CommandId::TitleFortuneBack)
        );
    }

    #[test]
    fn venue_entries_carry_their_target() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = GameState::new(7);
        state.move_to(Location::Town);
        let inv = map_input(InputEvent::Confirm, &mut state, &cat, &saves).unwrap();
        assert_eq!(inv.id, CommandId::EnterVenue);
        assert!(inv.target.is_some());
    }

    #[test]
    fn keyboard_name_entry() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = GameState::new(7);
        state.mode = Mode::Title(TitleStep::NameInput {
            slot: 1,
            name: String::new(),
            cursor: (1, 0),
            shift: true,
        });
        assert!(map_input(InputEvent::Confirm, &mut state, &cat, &saves).is_none());
        map_input(InputEvent::Right, &mut state, &cat, &saves);
        assert!(map_input(InputEvent::Confirm, &mut state, &cat, &saves).is_none());
        let Mode::Title(TitleStep::NameInput { name, .. }) = &state.mode else {
            panic!("left name entry");
        };
        assert_eq!(name, "AB");

        let inv = map_input(InputEvent::Start, &mut state, &cat, &saves).unwrap();
        assert_eq!(inv.id, CommandId::TitleName("AB".into()));
    }

    #[test]
    fn quest_browser_cycles_continents() {
        let cat = catalogs();
        let saves = SaveSlots::in_memory(3);
        let mut state = GameState::new(7);
        state.player.level = 4;
        state
            .player
            .sync_elements(cat.continents.unlocked_at(state.player.level));
        state.move_to(Location::Town);
        state.mode = Mode::QuestBrowser(Default::default());
        let count = element_list(&state.player, &cat).len();
        assert!(count > 1);
        map_input(InputEvent::Left, &mut state, &cat, &saves);
        let Mode::QuestBrowser(view) = &state.mode else {
            panic!("left quest browser");
        };
        assert_eq!(view.continent, count - 1);
    }
}

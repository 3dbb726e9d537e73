//! The command router.
//!
//! [`handle_command`] takes one [`Invocation`] and applies it to the
//! [`GameState`]. Each mode has its own handler; a command the current
//! mode does not offer (unknown, disabled or stale) returns false and
//! leaves the state untouched.

mod battle;
mod panels;
mod party;
mod quests;
mod title;
mod venue;
mod world;


use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;

use mv_core::command::AvailableCommand;
use mv_core::{Catalogs, CommandId, CoreError};
use mv_mechanics::CombatOdds;
use mv_mechanics::quest::{self, QuestEvent};

use crate::menu;
use crate::mode::{Location, Mode};
use crate::persistence::SaveSlots;
use crate::state::GameState;

/// A command with its optional target.
///
/// The target names a scene, venue or service for `ENTER_SCENE`,
/// `ENTER_VENUE` and `USE_SERVICE`, or a 1-based opponent for targeted
/// combat actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Command id.
    pub id: CommandId,
    /// Optional target.
    pub target: Option<String>,
}

impl Invocation {
    /// An invocation without a target.
    pub fn new(id: CommandId) -> Self {
        Self { id, target: None }
    }

    /// Attach a target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// 1-based opponent target as a 0-based index.
    fn opponent_index(&self) -> Option<usize> {
        self.target
            .as_deref()
            .and_then(|t| t.trim().parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
    }
}

impl From<CommandId> for Invocation {
    fn from(id: CommandId) -> Self {
        Self::new(id)
    }
}

impl FromStr for Invocation {
    type Err = CoreError;

    /// `COMMAND_ID [target]`, e.g. `ENTER_VENUE town_inn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, char::is_whitespace);
        let id: CommandId = parts.next().unwrap_or_default().parse()?;
        let target = parts.next().map(str::trim).filter(|t| !t.is_empty());
        Ok(Self {
            id,
            target: target.map(str::to_string),
        })
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(t) => write!(f, "{} {t}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// What the router needs besides the state.
pub struct RouterContext<'a> {
    /// Game data.
    pub catalogs: &'a Catalogs,
    /// Save slots.
    pub saves: &'a mut SaveSlots,
    /// The session's random source.
    pub rng: &'a mut StdRng,
    /// Miss and crit chances.
    pub odds: CombatOdds,
}

impl RouterContext<'_> {
    fn commands(&self, state: &GameState) -> Vec<AvailableCommand> {
        menu::available_commands(state, self.catalogs, self.saves.exists(None))
    }

    /// Persist the player once a game is running.
    fn save(&mut self, state: &GameState) {
        if state.location != Location::Title {
            self.saves.save_player(&state.player);
        }
    }
}

/// Apply `inv` to `state`. Returns true if the command was handled.
pub fn handle_command(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let handled = match state.mode {
        Mode::Title(_) => title::handle(inv, state, ctx),
        Mode::Leveling { .. } => panels::leveling(inv, state, ctx),
        Mode::Town | Mode::Battle => world::handle(inv, state, ctx),
        Mode::Venue(_) => venue::handle(inv, state, ctx),
        Mode::Spellbook { .. } => battle::spellbook(inv, state, ctx),
        Mode::Inventory { .. } | Mode::Stats { .. } | Mode::Elements { .. } | Mode::Options { .. } => {
            panels::handle(inv, state, ctx)
        }
        Mode::Followers(_) => party::handle(inv, state, ctx),
        Mode::QuestBrowser(_) => quests::handle(inv, state, ctx),
    };
    let handled = handled || panels::open(inv, state, ctx);
    if handled {
        tracing::debug!(command = %inv, mode = state.mode.id(), "command handled");
    } else {
        tracing::debug!(command = %inv, mode = state.mode.id(), "command not available");
    }
    handled
}

/// Feed a quest event to the ledger and return its notes.
fn quest_event(state: &mut GameState, ctx: &RouterContext<'_>, event: QuestEvent) -> Vec<String> {
    quest::handle_event(&mut state.player, ctx.catalogs, &event)
}

/// Re-check active quests after state the ledger cannot see changed.
fn settle_quests(state: &mut GameState, ctx: &RouterContext<'_>) -> Vec<String> {
    quest::evaluate(&mut state.player, ctx.catalogs)
}

/// Unlock the continents the player's level allows, keeping any already
/// open.
fn sync_elements(state: &mut GameState, catalogs: &Catalogs) {
    let mut unlocked = catalogs.continents.unlocked_at(state.player.level);
    unlocked.extend(state.player.elements().iter().copied());
    state.player.sync_elements(unlocked);
}

fn with_notes(message: impl Into<String>, notes: Vec<String>) -> String {
    let mut message = message.into();
    for note in notes {
        message.push(' ');
        message.push_str(&note);
    }
    message
}

//! The live game state the router mutates.

use mv_core::Player;
use mv_mechanics::Encounter;

use crate::battle_log::BattleLog;
use crate::mode::{Location, Mode, TargetSelect};

/// Everything that changes while playing.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// The character.
    pub player: Player,
    /// Where the player is.
    pub location: Location,
    /// What input currently drives.
    pub mode: Mode,
    /// Forest encounter, empty outside battle.
    pub encounter: Encounter,
    /// Rolling battle log, shown only in the forest.
    pub log: BattleLog,
    /// Latest message.
    pub message: String,
    /// Opponent chosen for the next targeted action.
    pub target_index: Option<usize>,
    /// Pending target selection.
    pub target_select: Option<TargetSelect>,
    /// Highlighted entry of the action grid.
    pub action_cursor: usize,
    /// Set once QUIT is accepted.
    pub quit_requested: bool,
    /// Opponents that fell during the last command.
    pub defeated: Vec<usize>,
    /// Whether the last command was an offensive combat action.
    pub offensive: bool,
}

impl GameState {
    /// A title-screen state with a placeholder player.
    pub fn new(log_lines: usize) -> Self {
        Self {
            player: Player::default(),
            location: Location::Title,
            mode: Mode::default(),
            encounter: Encounter::default(),
            log: BattleLog::new(log_lines),
            message: String::new(),
            target_index: None,
            target_select: None,
            action_cursor: 0,
            quit_requested: false,
            defeated: Vec::new(),
            offensive: false,
        }
    }

    /// Set the message and, in the forest, append it to the battle log.
    ///
    /// The arrival line of a fresh encounter is not logged; it stays the
    /// message until the first blow is struck.
    pub fn say(&mut self, message: impl Into<String>) {
        self.message = message.into();
        if self.location != Location::Forest {
            return;
        }
        if self.log.is_empty() && is_arrival(&self.message) {
            return;
        }
        self.log.push(self.message.clone());
    }

    /// Move to `location`, closing any panel and clearing the log.
    pub fn move_to(&mut self, location: Location) {
        if self.location != location {
            self.log.clear();
        }
        self.location = location;
        self.mode = Mode::base(location);
        self.target_select = None;
        self.target_index = None;
    }

    /// Return to the idle mode of the current location.
    pub fn close_panel(&mut self) {
        self.mode = Mode::base(self.location);
    }

    /// Returns true if a living opponent is present.
    pub fn in_battle(&self) -> bool {
        self.location == Location::Forest && self.encounter.any_alive()
    }

    /// Indices of living opponents.
    pub fn living_opponents(&self) -> Vec<usize> {
        self.encounter
            .opponents
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_alive())
            .map(|(i, _)| i)
            .collect()
    }
}

fn is_arrival(message: &str) -> bool {
    message == "Opponents emerge from the forest."
        || (message.starts_with("A ") && message.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_logs_in_the_forest() {
        let mut state = GameState::new(7);
        state.location = Location::Town;
        state.say("You return to town.");
        assert!(state.log.is_empty());
        assert_eq!(state.message, "You return to town.");

        state.move_to(Location::Forest);
        state.say("You hit the Slime for 2.");
        assert_eq!(state.log.len(), 1);
    }

    #[test]
    fn arrival_line_skips_empty_log() {
        let mut state = GameState::new(7);
        state.move_to(Location::Forest);
        state.say("A Slime oozes out of the brush.");
        assert!(state.log.is_empty());
        state.say("You miss the Slime.");
        state.say("Opponents emerge from the forest.");
        assert_eq!(state.log.len(), 2);
    }

    #[test]
    fn moving_clears_log_and_panels() {
        let mut state = GameState::new(7);
        state.move_to(Location::Forest);
        state.say("You miss the Slime.");
        state.mode = Mode::Options { cursor: 2 };
        state.move_to(Location::Town);
        assert!(state.log.is_empty());
        assert_eq!(state.mode, Mode::Town);
    }
}

//! A playable Mossvale session.
//!
//! `Session` owns the catalogs, save slots, game state and random source,
//! and exposes two ways in: typed lines through [`Session::process`] and
//! controller presses through [`Session::press`]. Both end up in the
//! command router.

use rand::SeedableRng;
use rand::rngs::StdRng;

use mv_core::Catalogs;
use mv_core::command::AvailableCommand;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::input::{InputEvent, active_cursor, cast_rank_choice, map_input};
use crate::menu::available_commands;
use crate::mode::{Mode, TitleStep};
use crate::persistence::SaveSlots;
use crate::router::{Invocation, RouterContext, handle_command};
use crate::state::GameState;

/// An interactive session.
pub struct Session {
    catalogs: Catalogs,
    config: SessionConfig,
    saves: SaveSlots,
    state: GameState,
    rng: StdRng,
}

impl Session {
    /// Create a session at the title screen, loading catalogs from the
    /// configured data directory or the built-in set.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        let catalogs = match &config.data_dir {
            Some(dir) => Catalogs::from_dir(dir)?,
            None => Catalogs::builtin()?,
        };
        let saves = SaveSlots::from_config(&config);
        Ok(Self::with_parts(config, catalogs, saves))
    }

    /// Create a session from already loaded parts.
    pub fn with_parts(config: SessionConfig, catalogs: Catalogs, saves: SaveSlots) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let state = GameState::new(config.battle_log_lines);
        tracing::info!(seed = config.seed, slots = saves.max_slots(), "session started");
        Self {
            catalogs,
            config,
            saves,
            state,
            rng,
        }
    }

    /// Get the game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Get the catalogs.
    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Get the save slots.
    pub fn saves(&self) -> &SaveSlots {
        &self.saves
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns true once QUIT has been accepted.
    pub fn quit_requested(&self) -> bool {
        self.state.quit_requested
    }

    /// The commands the current mode offers.
    pub fn commands(&self) -> Vec<AvailableCommand> {
        available_commands(&self.state, &self.catalogs, self.saves.exists(None))
    }

    /// Route one command. Returns true if it was handled.
    pub fn handle(&mut self, inv: &Invocation) -> bool {
        let before = self.state.mode.id();
        let mut ctx = RouterContext {
            catalogs: &self.catalogs,
            saves: &mut self.saves,
            rng: &mut self.rng,
            odds: self.config.odds(),
        };
        let handled = handle_command(inv, &mut self.state, &mut ctx);
        if self.state.mode.id() != before {
            self.state.action_cursor = 0;
        }
        handled
    }

    /// Apply a controller press. Returns true if it produced a handled
    /// command.
    pub fn press(&mut self, event: InputEvent) -> bool {
        match map_input(event, &mut self.state, &self.catalogs, &self.saves) {
            Some(inv) => self.handle(&inv),
            None => false,
        }
    }

    /// Process a line of user input and return a response.
    pub fn process(&mut self, input: &str) -> SessionResult<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }

        let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let rest = parts.get(1).map(|s| s.trim()).unwrap_or("");

        match cmd.as_str() {
            "help" => Ok(help_text()),
            "status" => Ok(self.do_status()),
            "commands" => Ok(self.do_commands()),
            "log" => Ok(self.do_log()),
            "key" => self.do_key(rest),
            _ => self.do_command(trimmed),
        }
    }

    fn do_command(&mut self, line: &str) -> SessionResult<String> {
        let inv: Invocation = line.parse()?;
        if self.handle(&inv) {
            Ok(self.state.message.clone())
        } else {
            tracing::debug!(command = %inv, mode = self.state.mode.id(), "command refused");
            Err(SessionError::Unavailable(inv.to_string()))
        }
    }

    fn do_key(&mut self, name: &str) -> SessionResult<String> {
        let event: InputEvent = name.parse()?;
        if self.press(event) {
            return Ok(self.state.message.clone());
        }
        if let Some(select) = &self.state.target_select {
            let name = self
                .state
                .encounter
                .opponents
                .get(select.index)
                .map(|o| o.name.as_str())
                .unwrap_or("?");
            return Ok(format!("Target: {} {name}", select.index + 1));
        }
        Ok(self.highlighted())
    }

    fn highlighted(&self) -> String {
        if let Mode::Title(TitleStep::NameInput { name, .. }) = &self.state.mode {
            return format!("Name: {name}");
        }
        let cursor = active_cursor(&self.state);
        let cmds = self.commands();
        let Some(c) = cmds.get(cursor) else {
            return String::new();
        };
        match cast_rank_choice(&self.state, &self.catalogs, &self.saves) {
            Some((rank, top)) => format!("> {} (Rank {rank}/{top})", label_of(c)),
            None => format!("> {}", label_of(c)),
        }
    }

    fn do_status(&self) -> String {
        let p = &self.state.player;
        format!(
            "{} Lv {} | HP {}/{} | MP {}/{} | ATK {} DEF {} | {} GP | {} ({})",
            p.name,
            p.level,
            p.hp.current,
            p.hp.max,
            p.mp.current,
            p.mp.max,
            p.atk,
            p.defense,
            p.gold,
            self.state.location,
            self.state.mode.id(),
        )
    }

    fn do_commands(&self) -> String {
        let commands = self.commands();
        if commands.is_empty() {
            return "No commands available.".to_string();
        }
        commands
            .iter()
            .map(|c| {
                let mut inv = Invocation::new(c.def.command.clone());
                inv.target = c.def.target.clone().or_else(|| c.def.service_id.clone());
                let mark = if c.enabled { "" } else { " (disabled)" };
                format!("{inv} - {}{mark}", label_of(c))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn do_log(&self) -> String {
        if self.state.log.is_empty() {
            return "The battle log is empty.".to_string();
        }
        self.state.log.lines().collect::<Vec<_>>().join("\n")
    }
}

fn label_of(c: &AvailableCommand) -> String {
    if c.def.label.is_empty() {
        c.def.command.to_string()
    } else {
        c.def.label.clone()
    }
}

fn help_text() -> String {
    [
        "Commands:",
        "  COMMAND_ID [target]  run a command, e.g. ENTER_VENUE town_inn",
        "  commands             list what the current mode offers",
        "  key <name>           press up, down, left, right, confirm, back or start",
        "  status               show the character",
        "  log                  show the battle log",
        "  help                 show this help",
    ]
    .join("\n")
}

//! Session layer for Mossvale.
//!
//! Holds the mode state machine, the command router that applies one
//! command at a time to the game state, the controller input mapper,
//! and JSON save slots. [`Session`] ties them together for a front end.

pub mod battle_log;
pub mod config;
pub mod error;
pub mod input;
pub mod menu;
pub mod mode;
pub mod names;
pub mod persistence;
pub mod router;
pub mod session;
pub mod state;

pub use battle_log::BattleLog;
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use input::{InputEvent, map_input};
pub use mode::{Location, Mode, TargetSelect, TitleStep, VenueState, VenueView};
pub use persistence::{SaveSlots, SlotSummary};
pub use router::{Invocation, RouterContext, handle_command};
pub use session::Session;
pub use state::GameState;

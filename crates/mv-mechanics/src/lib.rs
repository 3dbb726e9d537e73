//! Game mechanics for Mossvale.
//!
//! Provides the stateless combat rolls, spell availability and ranks,
//! opponent spawning, the combat turn engine and the quest ledger. All
//! randomness comes from a caller-owned [`rand::rngs::StdRng`] so a
//! session replays exactly from its seed.

pub mod engine;
pub mod error;
pub mod math;
pub mod quest;
pub mod spawn;
pub mod spells;

pub use engine::{
    Action, BattleEvent, CombatContext, DefendStance, Encounter, Loot, RoundOutcome, resolve_round,
};
pub use error::{MechError, MechResult};
pub use math::{CombatOdds, DamageRoll, roll_damage, try_stun};
pub use quest::{QuestEntry, QuestEvent};
pub use spawn::spawn_encounter;

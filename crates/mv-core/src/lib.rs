//! Core types for Mossvale: the player, followers, gear, opponents, quest
//! state and the static catalogs that describe the game's content.
//!
//! Nothing in this crate rolls combat or routes commands. It owns the data
//! model and the invariants that can be enforced locally (clamped gauges,
//! the gear owner index, canonical element order).

/// Follower abilities (end-of-round and tea-brew effects).
pub mod ability;
/// Catalog bundle: built-in JSON content and per-file overrides.
pub mod catalog;
/// Abstract command ids, scene command lists and enable predicates.
pub mod command;
/// Continents and their unlock levels.
pub mod continent;
/// Elements, the canonical element order and stat identifiers.
pub mod element;
/// Error types used throughout the crate.
pub mod error;
/// Followers, follower templates and fusion promotions.
pub mod follower;
/// Clamped current/max resources (HP, MP).
pub mod gauge;
/// Gear instances, the gear arena and its owner index.
pub mod gear;
/// Consumable and gear item definitions.
pub mod item;
/// Opponent templates, elemental variants and live opponents.
pub mod opponent;
/// The player entity.
pub mod player;
/// Quest definitions and per-quest progress state.
pub mod quest;
/// Spell definitions and rank rules.
pub mod spell;
/// Town venues, services and shop stock.
pub mod venue;

pub use catalog::Catalogs;
pub use command::{CommandDef, CommandId, Predicate, PredicateContext};
pub use element::{Element, Stat};
pub use error::{CoreError, CoreResult};
pub use follower::{Follower, FollowerId};
pub use gauge::Gauge;
pub use gear::{GearArena, GearId, GearInstance, GearOwner, GearSlot};
pub use opponent::Opponent;
pub use player::{Player, TeamMode, TeamTarget};
pub use quest::{QuestState, QuestStatus};

//! The combat turn engine.
//!
//! [`resolve_round`] runs one round of a forest encounter: the player's
//! action, opponent turns, follower turns, end-of-round abilities and,
//! when the last opponent falls, the victory payout. Everything it has
//! to say comes back as a list of [`BattleEvent`]s for the session to
//! log and react to.

mod followers;
mod opponents;
mod player;
mod rewards;

use rand::rngs::StdRng;

use mv_core::{Catalogs, Opponent, Player, TeamTarget};

use crate::error::{MechError, MechResult};
use crate::math::CombatOdds;

pub use player::cast_support;
pub use rewards::recruit_follower;

/// Read-only inputs shared by every step of a round.
#[derive(Debug, Clone, Copy)]
pub struct CombatContext<'a> {
    /// Static game content.
    pub catalogs: &'a Catalogs,
    /// Miss and crit chances.
    pub odds: CombatOdds,
}

impl<'a> CombatContext<'a> {
    /// A context with default odds.
    pub fn new(catalogs: &'a Catalogs) -> Self {
        Self {
            catalogs,
            odds: CombatOdds::default(),
        }
    }

    /// Replace the odds.
    pub fn with_odds(mut self, odds: CombatOdds) -> Self {
        self.odds = odds;
        self
    }
}

/// XP and gold banked from defeated opponents, paid out at victory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loot {
    /// Banked XP.
    pub xp: u32,
    /// Banked gold.
    pub gold: u32,
}

impl Loot {
    /// Returns true if nothing has been banked.
    pub fn is_empty(&self) -> bool {
        self.xp == 0 && self.gold == 0
    }
}

/// Bonuses from DEFEND, active until the player's next non-DEFEND action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefendStance {
    /// Extra defense against opponent attacks.
    pub defense: i32,
    /// Extra chance for opponent attacks to miss.
    pub evasion: f64,
}

/// A forest encounter in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encounter {
    /// Opponents, including the fallen until the battle ends.
    pub opponents: Vec<Opponent>,
    /// Loot banked so far.
    pub loot: Loot,
    /// Active DEFEND stance.
    pub stance: Option<DefendStance>,
    /// Opponents hit by the last spell, for effect rendering.
    pub last_spell_targets: Vec<usize>,
}

impl Encounter {
    /// Start an encounter against `opponents`.
    pub fn new(opponents: Vec<Opponent>) -> Self {
        Self {
            opponents,
            ..Self::default()
        }
    }

    /// Returns true if any opponent still stands.
    pub fn any_alive(&self) -> bool {
        self.opponents.iter().any(Opponent::is_alive)
    }

    /// Drop every opponent, the loot and the stance.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The opponent at `target` if it is alive, otherwise the first
    /// living one.
    pub fn resolve_target(&self, target: Option<usize>) -> Option<usize> {
        target
            .filter(|i| self.opponents.get(*i).is_some_and(Opponent::is_alive))
            .or_else(|| crate::math::primary_opponent_index(&self.opponents))
    }
}

/// The player's choice for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Melee attack.
    Attack {
        /// Chosen opponent; the first living one when absent.
        target: Option<usize>,
    },
    /// Brace for impact.
    Defend,
    /// Try to escape.
    Flee,
    /// Try to recruit an opponent.
    Socialize {
        /// Chosen opponent; the first living one when absent.
        target: Option<usize>,
    },
    /// Cast a spell by catalog id.
    Cast {
        /// Spell id.
        spell: String,
        /// Opponent for single-target elemental casts.
        target: Option<usize>,
        /// Team member for support casts; the neediest when absent.
        team_target: Option<TeamTarget>,
        /// Chosen rank; the highest affordable when absent.
        rank: Option<u32>,
    },
}

impl Action {
    /// Offensive actions can defeat opponents and end the battle.
    pub fn is_offensive(&self, catalogs: &Catalogs) -> bool {
        match self {
            Action::Attack { .. } | Action::Socialize { .. } => true,
            Action::Cast { spell, .. } => catalogs.spell(spell).is_some_and(|s| !s.is_support()),
            Action::Defend | Action::Flee => false,
        }
    }
}

/// Something that happened during a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleEvent {
    /// A line for the battle log.
    Message(String),
    /// Opponents at these indices just fell.
    OpponentsDefeated(Vec<usize>),
    /// The player fell and woke at the inn.
    PlayerDefeated {
        /// Gold lost.
        gold_lost: u32,
    },
    /// The last opponent fell; the encounter is over.
    BattleWon,
    /// Banked loot was paid out.
    Victory {
        /// XP gained.
        xp: u32,
        /// Gold gained.
        gold: u32,
    },
    /// The player gained levels and has stat points to spend.
    LevelUp {
        /// Levels gained.
        levels: u32,
        /// New spells, rank-ups and portals.
        notes: Vec<String>,
    },
    /// A quest completed during the payout.
    QuestCompleted(String),
    /// The forest is clear.
    AllClear,
}

impl BattleEvent {
    /// The battle-log line for this event, if it has one.
    pub fn message(&self) -> Option<String> {
        match self {
            BattleEvent::Message(text) | BattleEvent::QuestCompleted(text) => Some(text.clone()),
            BattleEvent::PlayerDefeated { gold_lost } => Some(format!(
                "You were defeated and wake up at the inn. You lost {gold_lost} GP."
            )),
            BattleEvent::Victory { xp, gold } => Some(format!("You gain {xp} XP and {gold} gold.")),
            BattleEvent::AllClear => Some("All is quiet. No enemies in sight.".to_string()),
            BattleEvent::OpponentsDefeated(_) | BattleEvent::BattleWon | BattleEvent::LevelUp { .. } => {
                None
            }
        }
    }
}

/// What a round produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Events in order.
    pub events: Vec<BattleEvent>,
    /// False when the action was refused (not enough MP, no target) and
    /// nothing else happened.
    pub performed: bool,
}

impl RoundOutcome {
    /// Every log line, in order.
    pub fn messages(&self) -> Vec<String> {
        self.events.iter().filter_map(BattleEvent::message).collect()
    }

    /// Returns true if the player was defeated this round.
    pub fn player_defeated(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, BattleEvent::PlayerDefeated { .. }))
    }

    fn refused(message: String) -> Self {
        Self {
            events: vec![BattleEvent::Message(message)],
            performed: false,
        }
    }
}

/// Resolve one combat round.
///
/// Refused actions return `performed == false` with a single message
/// and leave the player and encounter untouched. An unknown spell id is
/// an error.
pub fn resolve_round(
    hero: &mut Player,
    encounter: &mut Encounter,
    action: &Action,
    ctx: &CombatContext<'_>,
    rng: &mut StdRng,
) -> MechResult<RoundOutcome> {
    if let Action::Cast { spell, .. } = action {
        if ctx.catalogs.spell(spell).is_none() {
            return Err(MechError::UnknownSpell(spell.clone()));
        }
    }
    let mut events = match player::act(hero, encounter, action, ctx, rng) {
        Ok(events) => events,
        Err(refusal) => return Ok(RoundOutcome::refused(refusal)),
    };
    if !matches!(action, Action::Defend) {
        encounter.stance = None;
    }
    tracing::debug!(?action, "player acted");

    let offensive = action.is_offensive(ctx.catalogs);
    if offensive {
        mark_fallen(encounter, &mut events);
    }

    if !matches!(action, Action::Flee) && encounter.any_alive() {
        if let Some(defeat) = opponents::take_turns(hero, encounter, ctx, rng, &mut events) {
            events.push(defeat);
            return Ok(RoundOutcome {
                events,
                performed: true,
            });
        }
        followers::take_turns(hero, encounter, ctx, rng, &mut events);
        hero.decay_temp_bonuses();
        for f in hero.followers_mut() {
            f.decay_temp_bonuses();
        }
        followers::end_of_round(hero, ctx, rng, &mut events);
        if offensive {
            mark_fallen(encounter, &mut events);
        }
    }

    // Only an offensive action closes the battle; a follower finishing the
    // last opponent during DEFEND leaves it on the field until then.
    if offensive && !encounter.opponents.is_empty() && !encounter.any_alive() {
        rewards::finish_battle(hero, encounter, ctx, rng, &mut events);
    }
    Ok(RoundOutcome {
        events,
        performed: true,
    })
}

/// Flag newly fallen opponents as handed off.
fn mark_fallen(encounter: &mut Encounter, events: &mut Vec<BattleEvent>) {
    let fallen: Vec<usize> = encounter
        .opponents
        .iter()
        .enumerate()
        .filter(|(_, o)| o.is_newly_defeated())
        .map(|(i, _)| i)
        .collect();
    for i in &fallen {
        encounter.opponents[*i].melted = true;
    }
    if !fallen.is_empty() {
        events.push(BattleEvent::OpponentsDefeated(fallen));
    }
}

/// Bank XP and gold for a defeated opponent: each a uniform roll between
/// half and all of its max HP.
pub(crate) fn bank_loot(loot: &mut Loot, opponent: &Opponent, rng: &mut StdRng) {
    let max = opponent.hp.max.max(0) as u32;
    loot.xp += crate::math::roll_between(rng, max / 2, max);
    loot.gold += crate::math::roll_between(rng, max / 2, max);
}

#[cfg(test)]
mod tests;

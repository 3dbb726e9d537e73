//! Abstract command ids and the scene command catalog.
//!
//! A [`CommandId`] is what the input mapper produces and the router
//! consumes. Its string form (`ATTACK`, `CAST:spark`, `TITLE_SLOT_2`,
//! `PORTAL:fire`, ...) is used in data files and in the line REPL.
//! Numbered ids (`NUM1`, `SHOP_3`, `FOLLOWER_DISMISS:2`) are 1-based.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{Element, Stat};
use crate::error::CoreError;
use crate::gear::GearId;
use crate::opponent::Opponent;
use crate::player::{Fortune, Player};

/// An abstract command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CommandId {
    /// Melee attack.
    Attack,
    /// Raise defense and evasion for the round.
    Defend,
    /// Try to escape the encounter.
    Flee,
    /// Try to recruit an opponent.
    Socialize,
    /// Cast a spell by id.
    Cast(String),
    /// Travel to a scene (target: scene id).
    EnterScene,
    /// Enter a venue (target: venue id).
    EnterVenue,
    /// Leave the current venue.
    Leave,
    /// Back / close / balanced allocation.
    BKey,
    /// Random allocation.
    XKey,
    /// Bank remaining stat points.
    Bank,
    /// Quit the game.
    Quit,
    /// Numbered choice.
    Num(u8),
    /// Open the spellbook.
    Spellbook,
    /// Open the follower roster.
    Followers,
    /// Open the element picker.
    Elements,
    /// Toggle the options menu.
    Options,
    /// Open the inventory.
    Inventory,
    /// Open the stats panel.
    Stats,
    /// Open the quest browser.
    Quest,
    /// Open the portal panel.
    Portal,
    /// Travel to a continent.
    PortalTo(Element),
    /// Switch the current element.
    SetElement(Element),
    /// Spend one stat point.
    Spend(Stat),
    /// Spend all points evenly.
    StatBalanced,
    /// Spend all points randomly.
    StatRandom,
    /// Shop buy view.
    ShopBuy,
    /// Shop sell view.
    ShopSell,
    /// Pick the nth shop entry.
    ShopPick(u8),
    /// Use a venue service (service id from the command entry).
    UseService,
    /// Start gear fusion.
    AlchemyFuse,
    /// Pick the nth fusable gear.
    AlchemyPick(u8),
    /// Fuse three same-type followers.
    FollowerFuseAuto,
    /// Dismiss the nth follower (asks for confirmation first).
    FollowerDismiss(u8),
    /// Equip gear onto the nth follower.
    FollowerEquip(u8, GearId),
    /// Unequip everything from the nth follower.
    FollowerUnequip(u8),
    /// Choose the nth follower's active ability.
    FollowerAbility(u8, String),
    /// Start a quest.
    QuestStart(String),
    /// Cycle battle speed.
    ToggleSpeed,
    /// Title: new game.
    TitleNew,
    /// Title: continue.
    TitleContinue,
    /// Title: confirm overwrite.
    TitleConfirmYes,
    /// Title: cancel overwrite.
    TitleConfirmNo,
    /// Title: type a name.
    TitleNameCustom,
    /// Title: random name.
    TitleNameRandom,
    /// Title: pick this name.
    TitleName(String),
    /// Title: back from name select.
    TitleNameBack,
    /// Title: back from fortune select.
    TitleFortuneBack,
    /// Title: pick a save slot.
    TitleSlot(u8),
    /// Title: back from slot select.
    TitleSlotBack,
    /// Title: pick a fortune.
    Fortune(Fortune),
    /// Title: start the game.
    TitleStartConfirmYes,
    /// Title: back to fortune select.
    TitleStartConfirmNo,
}

fn numbered(s: &str, prefix: &str) -> Option<u8> {
    s.strip_prefix(prefix).and_then(|n| n.parse().ok())
}

impl FromStr for CommandId {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let unknown = || CoreError::UnknownCommand(raw.to_string());
        if let Some((head, rest)) = s.split_once(':') {
            let id = match head {
                "CAST" if !rest.is_empty() => CommandId::Cast(rest.to_string()),
                "PORTAL" => CommandId::PortalTo(rest.parse()?),
                "ELEMENT" => CommandId::SetElement(rest.parse()?),
                "ALCHEMY_PICK" => CommandId::AlchemyPick(rest.parse().map_err(|_| unknown())?),
                "FOLLOWER_DISMISS" => {
                    CommandId::FollowerDismiss(rest.parse().map_err(|_| unknown())?)
                }
                "FOLLOWER_UNEQUIP" => {
                    CommandId::FollowerUnequip(rest.parse().map_err(|_| unknown())?)
                }
                "FOLLOWER_EQUIP" => {
                    let (n, gear) = rest.split_once(':').ok_or_else(unknown)?;
                    CommandId::FollowerEquip(n.parse().map_err(|_| unknown())?, GearId::from(gear))
                }
                "FOLLOWER_ABILITY" => {
                    let (n, ability) = rest.split_once(':').ok_or_else(unknown)?;
                    CommandId::FollowerAbility(n.parse().map_err(|_| unknown())?, ability.to_string())
                }
                "QUEST_START" if !rest.is_empty() => CommandId::QuestStart(rest.to_string()),
                "TITLE_NAME" if !rest.trim().is_empty() => CommandId::TitleName(rest.to_string()),
                _ => return Err(unknown()),
            };
            return Ok(id);
        }
        let id = match s {
            "ATTACK" => CommandId::Attack,
            "DEFEND" => CommandId::Defend,
            "FLEE" => CommandId::Flee,
            "SOCIALIZE" => CommandId::Socialize,
            "ENTER_SCENE" => CommandId::EnterScene,
            "ENTER_VENUE" => CommandId::EnterVenue,
            "LEAVE" => CommandId::Leave,
            "B_KEY" => CommandId::BKey,
            "X_KEY" => CommandId::XKey,
            "BANK" => CommandId::Bank,
            "QUIT" => CommandId::Quit,
            "SPELLBOOK" => CommandId::Spellbook,
            "FOLLOWERS" => CommandId::Followers,
            "ELEMENTS" => CommandId::Elements,
            "OPTIONS" => CommandId::Options,
            "INVENTORY" => CommandId::Inventory,
            "STATS" => CommandId::Stats,
            "QUEST" => CommandId::Quest,
            "PORTAL" => CommandId::Portal,
            "STAT_BALANCED" => CommandId::StatBalanced,
            "STAT_RANDOM" => CommandId::StatRandom,
            "SHOP_BUY" => CommandId::ShopBuy,
            "SHOP_SELL" => CommandId::ShopSell,
            "USE_SERVICE" => CommandId::UseService,
            "ALCHEMY_FUSE" => CommandId::AlchemyFuse,
            "FOLLOWER_FUSE_AUTO" => CommandId::FollowerFuseAuto,
            "TOGGLE_SPEED" => CommandId::ToggleSpeed,
            "TITLE_NEW" => CommandId::TitleNew,
            "TITLE_CONTINUE" => CommandId::TitleContinue,
            "TITLE_CONFIRM_YES" => CommandId::TitleConfirmYes,
            "TITLE_CONFIRM_NO" => CommandId::TitleConfirmNo,
            "TITLE_NAME_CUSTOM" => CommandId::TitleNameCustom,
            "TITLE_NAME_RANDOM" => CommandId::TitleNameRandom,
            "TITLE_NAME_BACK" => CommandId::TitleNameBack,
            "TITLE_FORTUNE_BACK" => CommandId::TitleFortuneBack,
            "TITLE_SLOT_BACK" => CommandId::TitleSlotBack,
            "TITLE_START_CONFIRM_YES" => CommandId::TitleStartConfirmYes,
            "TITLE_START_CONFIRM_NO" => CommandId::TitleStartConfirmNo,
            "FORTUNE_POOR" => CommandId::Fortune(Fortune::Poor),
            "FORTUNE_WELL_OFF" => CommandId::Fortune(Fortune::WellOff),
            "FORTUNE_ROYALTY" => CommandId::Fortune(Fortune::Royalty),
            other => {
                if let Some(stat) = other.strip_prefix("STAT_") {
                    return Ok(CommandId::Spend(stat.parse().map_err(|_| unknown())?));
                }
                if let Some(n) = numbered(other, "TITLE_SLOT_") {
                    return Ok(CommandId::TitleSlot(n));
                }
                if let Some(n) = numbered(other, "SHOP_") {
                    return Ok(CommandId::ShopPick(n));
                }
                if let Some(n) = numbered(other, "NUM") {
                    return Ok(CommandId::Num(n));
                }
                return Err(unknown());
            }
        };
        Ok(id)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandId::Attack => f.write_str("ATTACK"),
            CommandId::Defend => f.write_str("DEFEND"),
            CommandId::Flee => f.write_str("FLEE"),
            CommandId::Socialize => f.write_str("SOCIALIZE"),
            CommandId::Cast(spell) => write!(f, "CAST:{spell}"),
            CommandId::EnterScene => f.write_str("ENTER_SCENE"),
            CommandId::EnterVenue => f.write_str("ENTER_VENUE"),
            CommandId::Leave => f.write_str("LEAVE"),
            CommandId::BKey => f.write_str("B_KEY"),
            CommandId::XKey => f.write_str("X_KEY"),
            CommandId::Bank => f.write_str("BANK"),
            CommandId::Quit => f.write_str("QUIT"),
            CommandId::Num(n) => write!(f, "NUM{n}"),
            CommandId::Spellbook => f.write_str("SPELLBOOK"),
            CommandId::Followers => f.write_str("FOLLOWERS"),
            CommandId::Elements => f.write_str("ELEMENTS"),
            CommandId::Options => f.write_str("OPTIONS"),
            CommandId::Inventory => f.write_str("INVENTORY"),
            CommandId::Stats => f.write_str("STATS"),
            CommandId::Quest => f.write_str("QUEST"),
            CommandId::Portal => f.write_str("PORTAL"),
            CommandId::PortalTo(el) => write!(f, "PORTAL:{el}"),
            CommandId::SetElement(el) => write!(f, "ELEMENT:{el}"),
            CommandId::Spend(stat) => write!(f, "STAT_{stat}"),
            CommandId::StatBalanced => f.write_str("STAT_BALANCED"),
            CommandId::StatRandom => f.write_str("STAT_RANDOM"),
            CommandId::ShopBuy => f.write_str("SHOP_BUY"),
            CommandId::ShopSell => f.write_str("SHOP_SELL"),
            CommandId::ShopPick(n) => write!(f, "SHOP_{n}"),
            CommandId::UseService => f.write_str("USE_SERVICE"),
            CommandId::AlchemyFuse => f.write_str("ALCHEMY_FUSE"),
            CommandId::AlchemyPick(n) => write!(f, "ALCHEMY_PICK:{n}"),
            CommandId::FollowerFuseAuto => f.write_str("FOLLOWER_FUSE_AUTO"),
            CommandId::FollowerDismiss(n) => write!(f, "FOLLOWER_DISMISS:{n}"),
            CommandId::FollowerEquip(n, gear) => write!(f, "FOLLOWER_EQUIP:{n}:{gear}"),
            CommandId::FollowerUnequip(n) => write!(f, "FOLLOWER_UNEQUIP:{n}"),
            CommandId::FollowerAbility(n, ability) => write!(f, "FOLLOWER_ABILITY:{n}:{ability}"),
            CommandId::QuestStart(id) => write!(f, "QUEST_START:{id}"),
            CommandId::ToggleSpeed => f.write_str("TOGGLE_SPEED"),
            CommandId::TitleNew => f.write_str("TITLE_NEW"),
            CommandId::TitleContinue => f.write_str("TITLE_CONTINUE"),
            CommandId::TitleConfirmYes => f.write_str("TITLE_CONFIRM_YES"),
            CommandId::TitleConfirmNo => f.write_str("TITLE_CONFIRM_NO"),
            CommandId::TitleNameCustom => f.write_str("TITLE_NAME_CUSTOM"),
            CommandId::TitleNameRandom => f.write_str("TITLE_NAME_RANDOM"),
            CommandId::TitleName(name) => write!(f, "TITLE_NAME:{name}"),
            CommandId::TitleNameBack => f.write_str("TITLE_NAME_BACK"),
            CommandId::TitleFortuneBack => f.write_str("TITLE_FORTUNE_BACK"),
            CommandId::TitleSlot(n) => write!(f, "TITLE_SLOT_{n}"),
            CommandId::TitleSlotBack => f.write_str("TITLE_SLOT_BACK"),
            CommandId::Fortune(fortune) => write!(f, "FORTUNE_{}", fortune.id()),
            CommandId::TitleStartConfirmYes => f.write_str("TITLE_START_CONFIRM_YES"),
            CommandId::TitleStartConfirmNo => f.write_str("TITLE_START_CONFIRM_NO"),
        }
    }
}

impl TryFrom<String> for CommandId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CommandId> for String {
    fn from(id: CommandId) -> Self {
        id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Live state a predicate is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct PredicateContext<'a> {
    /// The player.
    pub player: &'a Player,
    /// Current encounter.
    pub opponents: &'a [Opponent],
    /// Whether the player is in town.
    pub in_town: bool,
    /// Whether any save slot exists.
    pub has_save: bool,
}

/// A condition on live state, used by `when` and `enabled_when`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Some opponent is alive.
    HasOpponents,
    /// No opponent is alive.
    NoOpponents,
    /// The stack inventory is not empty.
    HasItems,
    /// The player has MP left.
    HasMp,
    /// More than one element is unlocked.
    HasElements,
    /// The player is in town.
    InTown,
    /// A living opponent can be recruited.
    HasRecruitable,
    /// HP or MP is below max.
    NeedsRest,
    /// A save slot exists.
    HasSave,
}

impl Predicate {
    /// Evaluate against live state.
    pub fn holds(self, ctx: &PredicateContext<'_>) -> bool {
        let living = || ctx.opponents.iter().any(Opponent::is_alive);
        match self {
            Predicate::HasOpponents => living(),
            Predicate::NoOpponents => !living(),
            Predicate::HasItems => ctx.player.has_items(),
            Predicate::HasMp => ctx.player.mp.current > 0,
            Predicate::HasElements => ctx.player.elements().len() > 1,
            Predicate::InTown => ctx.in_town,
            Predicate::HasRecruitable => ctx
                .opponents
                .iter()
                .any(|o| o.is_alive() && o.recruitable),
            Predicate::NeedsRest => {
                ctx.player.hp.current < ctx.player.hp.max || ctx.player.mp.current < ctx.player.mp.max
            }
            Predicate::HasSave => ctx.has_save,
        }
    }
}

// ---------------------------------------------------------------------------
// Command lists
// ---------------------------------------------------------------------------

/// A command entry in a scene, venue or menu list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDef {
    /// The command id.
    pub command: CommandId,
    /// Label shown in the action grid.
    #[serde(default)]
    pub label: String,
    /// Scene, venue or other target id.
    #[serde(default)]
    pub target: Option<String>,
    /// Service id for `USE_SERVICE`.
    #[serde(default)]
    pub service_id: Option<String>,
    /// Hidden unless this holds.
    #[serde(default)]
    pub when: Option<Predicate>,
    /// Shown but disabled unless all of these hold.
    #[serde(default)]
    pub enabled_when: Vec<Predicate>,
    /// Resolved by the combat turn engine.
    #[serde(default)]
    pub combat: bool,
    /// Can end a battle (animation/defeat hand-off).
    #[serde(default)]
    pub offensive: bool,
}

impl CommandDef {
    /// A bare entry with a label.
    pub fn new(command: CommandId, label: impl Into<String>) -> Self {
        Self {
            command,
            label: label.into(),
            target: None,
            service_id: None,
            when: None,
            enabled_when: Vec::new(),
            combat: false,
            offensive: false,
        }
    }

    /// Set the target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    fn dedupe_key(&self) -> (String, String, String, String) {
        (
            self.command.to_string(),
            self.target.clone().unwrap_or_default(),
            self.service_id.clone().unwrap_or_default(),
            self.label.trim().to_string(),
        )
    }
}

/// A command as currently offered: visible, possibly disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableCommand {
    /// The entry.
    pub def: CommandDef,
    /// Whether it can be used right now.
    pub enabled: bool,
}

/// Drop entries whose `when` fails, mark entries whose `enabled_when`
/// fails, and remove duplicates.
pub fn filter_commands<'a>(
    lists: impl IntoIterator<Item = &'a CommandDef>,
    ctx: &PredicateContext<'_>,
) -> Vec<AvailableCommand> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for def in lists {
        if def.when.is_some_and(|p| !p.holds(ctx)) {
            continue;
        }
        if !seen.insert(def.dedupe_key()) {
            continue;
        }
        let enabled = def.enabled_when.iter().all(|p| p.holds(ctx));
        out.push(AvailableCommand {
            def: def.clone(),
            enabled,
        });
    }
    out
}

/// Command list of one scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDef {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Commands.
    #[serde(default)]
    pub commands: Vec<CommandDef>,
}

/// A panel's command list and opening message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuDef {
    /// Message shown when the panel opens.
    #[serde(default)]
    pub open_message: Option<String>,
    /// Commands.
    #[serde(default)]
    pub commands: Vec<CommandDef>,
}

/// Scene, global and menu command lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneCatalog {
    /// Per-scene commands.
    #[serde(default)]
    pub scenes: BTreeMap<String, SceneDef>,
    /// Commands appended to every scene but the title.
    #[serde(default)]
    pub global: Vec<CommandDef>,
    /// Panel menus (options, stats, followers).
    #[serde(default)]
    pub menus: BTreeMap<String, MenuDef>,
}

impl SceneCatalog {
    /// Filtered commands for a scene plus the global list.
    pub fn scene_commands(&self, scene_id: &str, ctx: &PredicateContext<'_>) -> Vec<AvailableCommand> {
        let scene = self.scenes.get(scene_id).map(|s| s.commands.as_slice()).unwrap_or(&[]);
        let global: &[CommandDef] = if scene_id == "title" { &[] } else { &self.global };
        filter_commands(scene.iter().chain(global.iter()), ctx)
    }

    /// Every command flagged `combat`, across scenes and globals.
    pub fn combat_commands(&self) -> Vec<&CommandDef> {
        self.all_defs().filter(|d| d.combat).collect()
    }

    /// Returns true if `id` is flagged offensive anywhere.
    pub fn is_offensive(&self, id: &CommandId) -> bool {
        self.all_defs().any(|d| d.offensive && &d.command == id)
    }

    fn all_defs(&self) -> impl Iterator<Item = &CommandDef> {
        self.scenes
            .values()
            .flat_map(|s| s.commands.iter())
            .chain(self.global.iter())
    }

    /// Menu definition by id.
    pub fn menu(&self, id: &str) -> Option<&MenuDef> {
        self.menus.get(id)
    }
}

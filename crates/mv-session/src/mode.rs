//! The mode state machine.
//!
//! [`Location`] says where the player is; [`Mode`] says what the input
//! currently drives. Exactly one mode is active at a time, so opening a
//! panel or venue replaces whatever was open before.

use std::fmt;

use mv_core::player::Fortune;
use mv_core::venue::VenueKind;
use mv_core::{CommandId, GearId};

/// Where the player is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Location {
    /// The title screen; no character is loaded.
    #[default]
    Title,
    /// Town, with its venues.
    Town,
    /// The forest, where encounters happen.
    Forest,
}

impl Location {
    /// Scene id of the location's command list.
    pub fn scene_id(self) -> &'static str {
        match self {
            Location::Title => "title",
            Location::Town => "town",
            Location::Forest => "forest",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Location::Title => "Title",
            Location::Town => "Town",
            Location::Forest => "Forest",
        })
    }
}

/// Steps of the title screen and character creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TitleStep {
    /// New game, continue or quit.
    #[default]
    Menu,
    /// Choosing a slot to continue.
    SlotSelect,
    /// Asking before overwriting `slot`.
    ConfirmOverwrite {
        /// Slot that would be replaced.
        slot: u32,
    },
    /// Random or custom name.
    NameSelect {
        /// Slot the character will be saved to.
        slot: u32,
    },
    /// Typing a name on the on-screen keyboard.
    NameInput {
        /// Slot the character will be saved to.
        slot: u32,
        /// Name typed so far.
        name: String,
        /// Keyboard cursor (row, column).
        cursor: (usize, usize),
        /// Upper-case letters.
        shift: bool,
    },
    /// Choosing a starting fortune.
    Fortune {
        /// Slot the character will be saved to.
        slot: u32,
        /// Chosen name.
        name: String,
    },
    /// Last check before the game starts.
    StartConfirm {
        /// Slot the character will be saved to.
        slot: u32,
        /// Chosen name.
        name: String,
        /// Chosen fortune.
        fortune: Fortune,
    },
}

/// What a venue is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VenueView {
    /// The venue's own command list.
    #[default]
    Menu,
    /// Shop stock for the current element.
    Buy,
    /// Sellable inventory.
    Sell,
    /// Gear fusion; `first` is the item picked so far.
    Fuse {
        /// First pick.
        first: Option<GearId>,
    },
    /// Continent list.
    Portal,
    /// A hall notice.
    Info(String),
}

/// An open venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueState {
    /// Venue id in the catalog.
    pub id: String,
    /// Venue kind.
    pub kind: VenueKind,
    /// Current view.
    pub view: VenueView,
    /// List cursor.
    pub cursor: usize,
}

impl VenueState {
    /// A venue showing its menu.
    pub fn new(id: impl Into<String>, kind: VenueKind) -> Self {
        Self {
            id: id.into(),
            kind,
            view: VenueView::Menu,
            cursor: 0,
        }
    }
}

/// The follower roster panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowersView {
    /// Highlighted follower.
    pub cursor: usize,
    /// Follower awaiting a second dismiss.
    pub dismiss_pending: Option<usize>,
}

/// An open quest dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDetail {
    /// Quest id.
    pub id: String,
    /// Dialog page.
    pub page: usize,
}

/// The quest browser panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestView {
    /// Index into the unlocked continents.
    pub continent: usize,
    /// Highlighted entry.
    pub cursor: usize,
    /// Open dialog, if any.
    pub detail: Option<QuestDetail>,
}

/// What input currently drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Title screen and character creation.
    Title(TitleStep),
    /// Walking around town.
    Town,
    /// Inside a town venue.
    Venue(VenueState),
    /// In the forest, fighting or exploring.
    Battle,
    /// Spell list.
    Spellbook {
        /// Highlighted spell.
        cursor: usize,
        /// Cast rank picked for the highlighted spell; the highest
        /// affordable one when unset.
        rank: Option<u32>,
    },
    /// Items and gear.
    Inventory {
        /// Highlighted entry.
        cursor: usize,
    },
    /// Stats and stat points.
    Stats {
        /// Highlighted entry.
        cursor: usize,
    },
    /// Element picker.
    Elements {
        /// Highlighted element.
        cursor: usize,
    },
    /// Follower roster.
    Followers(FollowersView),
    /// Quest browser.
    QuestBrowser(QuestView),
    /// Options menu.
    Options {
        /// Highlighted entry.
        cursor: usize,
    },
    /// Spending stat points after a level-up. Blocks everything else.
    Leveling {
        /// Highlighted choice.
        cursor: usize,
        /// New spells and portals to announce.
        notes: Vec<String>,
    },
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Title(TitleStep::Menu)
    }
}

impl Mode {
    /// The idle mode of a location.
    pub fn base(location: Location) -> Self {
        match location {
            Location::Title => Mode::Title(TitleStep::Menu),
            Location::Town => Mode::Town,
            Location::Forest => Mode::Battle,
        }
    }

    /// Short id for renderers.
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Title(_) => "title",
            Mode::Town => "town",
            Mode::Venue(_) => "venue",
            Mode::Battle => "battle",
            Mode::Spellbook { .. } => "spellbook",
            Mode::Inventory { .. } => "inventory",
            Mode::Stats { .. } => "stats",
            Mode::Elements { .. } => "elements",
            Mode::Followers(_) => "followers",
            Mode::QuestBrowser(_) => "quests",
            Mode::Options { .. } => "options",
            Mode::Leveling { .. } => "leveling",
        }
    }

    /// The open venue's kind.
    pub fn venue_kind(&self) -> Option<VenueKind> {
        match self {
            Mode::Venue(v) => Some(v.kind),
            _ => None,
        }
    }

    /// Returns true for a base mode (no panel or venue open).
    pub fn is_base(&self) -> bool {
        matches!(self, Mode::Town | Mode::Battle)
    }
}

/// A pending targeted action: left/right cycles living opponents,
/// confirm commits, back aborts with nothing changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelect {
    /// Command that will run on confirm.
    pub command: CommandId,
    /// Highlighted opponent.
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_modes() {
        assert_eq!(Mode::base(Location::Town), Mode::Town);
        assert_eq!(Mode::base(Location::Forest), Mode::Battle);
        assert_eq!(Mode::base(Location::Title), Mode::Title(TitleStep::Menu));
        assert!(Mode::Battle.is_base());
        assert!(!Mode::Options { cursor: 0 }.is_base());
    }

    #[test]
    fn venue_kind_only_in_venues() {
        let shop = Mode::Venue(VenueState::new("town_shop", VenueKind::Shop));
        assert_eq!(shop.venue_kind(), Some(VenueKind::Shop));
        assert_eq!(shop.id(), "venue");
        assert_eq!(Mode::Town.venue_kind(), None);
    }
}

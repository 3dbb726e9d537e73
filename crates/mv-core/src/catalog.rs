//! Static content catalogs.
//!
//! The built-in content is compiled into the crate from `data/*.json`.
//! A data directory may override any of the files; files it lacks fall
//! back to the built-in copy.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::ability::AbilityDef;
use crate::command::SceneCatalog;
use crate::continent::ContinentCatalog;
use crate::error::{CoreError, CoreResult};
use crate::follower::FollowerCatalog;
use crate::item::ItemDef;
use crate::opponent::OpponentCatalog;
use crate::quest::QuestCatalog;
use crate::spell::SpellDef;
use crate::venue::VenueDef;

const ITEMS: &str = include_str!("../data/items.json");
const SPELLS: &str = include_str!("../data/spells.json");
const ABILITIES: &str = include_str!("../data/abilities.json");
const VENUES: &str = include_str!("../data/venues.json");
const OPPONENTS: &str = include_str!("../data/opponents.json");
const SCENES: &str = include_str!("../data/scenes.json");
const QUESTS: &str = include_str!("../data/quests.json");
const CONTINENTS: &str = include_str!("../data/continents.json");
const FOLLOWERS: &str = include_str!("../data/followers.json");

/// Every static catalog the game reads.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    /// Items by id.
    pub items: BTreeMap<String, ItemDef>,
    /// Spells by id.
    pub spells: BTreeMap<String, SpellDef>,
    /// Follower abilities by id.
    pub abilities: BTreeMap<String, AbilityDef>,
    /// Venues by id.
    pub venues: BTreeMap<String, VenueDef>,
    /// Opponent templates and variants.
    pub opponents: OpponentCatalog,
    /// Scene, global and menu command lists.
    pub scenes: SceneCatalog,
    /// Quests.
    pub quests: QuestCatalog,
    /// Continents.
    pub continents: ContinentCatalog,
    /// Follower templates and fusions.
    pub followers: FollowerCatalog,
}

fn parse<T: DeserializeOwned>(name: &str, text: &str) -> CoreResult<T> {
    serde_json::from_str(text).map_err(|source| CoreError::Catalog {
        name: name.to_string(),
        source,
    })
}

fn load<T: DeserializeOwned>(dir: Option<&Path>, name: &str, builtin: &str) -> CoreResult<T> {
    let Some(path) = dir.map(|d| d.join(format!("{name}.json"))) else {
        return parse(name, builtin);
    };
    if !path.is_file() {
        return parse(name, builtin);
    }
    tracing::debug!(path = %path.display(), "loading catalog override");
    let text = std::fs::read_to_string(&path).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(name, &text)
}

impl Catalogs {
    /// The content compiled into the crate.
    pub fn builtin() -> CoreResult<Self> {
        Self::load(None)
    }

    /// Built-in content with per-file overrides from `dir`.
    pub fn from_dir(dir: &Path) -> CoreResult<Self> {
        Self::load(Some(dir))
    }

    fn load(dir: Option<&Path>) -> CoreResult<Self> {
        Ok(Self {
            items: load(dir, "items", ITEMS)?,
            spells: load(dir, "spells", SPELLS)?,
            abilities: load(dir, "abilities", ABILITIES)?,
            venues: load(dir, "venues", VENUES)?,
            opponents: load(dir, "opponents", OPPONENTS)?,
            scenes: load(dir, "scenes", SCENES)?,
            quests: load(dir, "quests", QUESTS)?,
            continents: load(dir, "continents", CONTINENTS)?,
            followers: load(dir, "followers", FOLLOWERS)?,
        })
    }

    /// Look up an item.
    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    /// Look up a spell.
    pub fn spell(&self, id: &str) -> Option<&SpellDef> {
        self.spells.get(id)
    }

    /// Look up a venue.
    pub fn venue(&self, id: &str) -> Option<&VenueDef> {
        self.venues.get(id)
    }

    /// Look up an ability.
    pub fn ability(&self, id: &str) -> Option<&AbilityDef> {
        self.abilities.get(id)
    }
}

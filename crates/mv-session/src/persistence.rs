//! Save slots.
//!
//! Each slot holds one [`SaveRecord`]:
//! `{version, player, quests, flags, meta: {created_at, last_played}}`.
//! Stores are pluggable behind [`SaveStore`]; [`SaveSlots`] wraps one
//! with the game-facing API, where saving is fire-and-forget and every
//! failure is logged and swallowed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mv_core::player::PlayerFlags;
use mv_core::{Player, QuestState};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// Version written into new records.
pub const SAVE_VERSION: u32 = 1;

/// Timestamps of a save slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMeta {
    /// When the character was created.
    pub created_at: DateTime<Utc>,
    /// Last time the slot was written.
    pub last_played: DateTime<Utc>,
}

/// The persisted form of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// Format version.
    pub version: u32,
    /// The player, gear, followers and elements.
    pub player: Player,
    /// Quest progress.
    #[serde(default)]
    pub quests: BTreeMap<String, QuestState>,
    /// Quest and unlock flags.
    #[serde(default)]
    pub flags: PlayerFlags,
    /// Timestamps.
    pub meta: SaveMeta,
}

impl SaveRecord {
    /// Snapshot `player`. `created_at` is kept from an earlier save of
    /// the same slot when given.
    pub fn capture(player: &Player, created_at: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            version: SAVE_VERSION,
            player: player.clone(),
            quests: player.quests.clone(),
            flags: player.flags.clone(),
            meta: SaveMeta {
                created_at: created_at.unwrap_or(now),
                last_played: now,
            },
        }
    }

    /// Rebuild the player, restoring the invariants serialization does
    /// not carry.
    pub fn into_player(self) -> Player {
        let mut player = self.player;
        player.quests = self.quests;
        player.flags = self.flags;
        player.restore_after_load();
        player
    }
}

/// One row of the slot listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    /// Slot number.
    pub slot: u32,
    /// Character name.
    pub name: String,
    /// Character level.
    pub level: u32,
    /// Gold held.
    pub gold: u32,
    /// Last time the slot was written.
    pub last_played: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Raw slot storage.
pub trait SaveStore: fmt::Debug {
    /// Read a slot. `Ok(None)` when it is empty.
    fn read(&self, slot: u32) -> SessionResult<Option<SaveRecord>>;

    /// Write a slot, replacing what was there.
    fn write(&mut self, slot: u32, record: &SaveRecord) -> SessionResult<()>;

    /// Empty a slot. Deleting an empty slot is not an error.
    fn delete(&mut self, slot: u32) -> SessionResult<()>;

    /// Occupied slot numbers, ascending.
    fn occupied(&self) -> Vec<u32>;
}

/// Saves kept in memory as JSON text for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: BTreeMap<u32, String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, slot: u32) -> SessionResult<Option<SaveRecord>> {
        self.slots
            .get(&slot)
            .map(|text| serde_json::from_str(text).map_err(SessionError::from))
            .transpose()
    }

    fn write(&mut self, slot: u32, record: &SaveRecord) -> SessionResult<()> {
        self.slots.insert(slot, serde_json::to_string(record)?);
        Ok(())
    }

    fn delete(&mut self, slot: u32) -> SessionResult<()> {
        self.slots.remove(&slot);
        Ok(())
    }

    fn occupied(&self) -> Vec<u32> {
        self.slots.keys().copied().collect()
    }
}

/// One pretty-printed JSON file per slot: `<dir>/slot_<n>.json`.
#[derive(Debug, Clone)]
pub struct JsonSlotStore {
    dir: PathBuf,
}

impl JsonSlotStore {
    /// A store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The save directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, slot: u32) -> PathBuf {
        self.dir.join(format!("slot_{slot}.json"))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl SaveStore for JsonSlotStore {
    fn read(&self, slot: u32) -> SessionResult<Option<SaveRecord>> {
        let path = self.path(slot);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn write(&mut self, slot: u32, record: &SaveRecord) -> SessionResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path(slot);
        let text = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, text).map_err(|e| io_error(&path, e))
    }

    fn delete(&mut self, slot: u32) -> SessionResult<()> {
        let path = self.path(slot);
        if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
        }
        Ok(())
    }

    fn occupied(&self) -> Vec<u32> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut slots: Vec<u32> = entries
            .filter_map(Result::ok)
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                name.strip_prefix("slot_")?.strip_suffix(".json")?.parse().ok()
            })
            .collect();
        slots.sort_unstable();
        slots
    }
}

// ---------------------------------------------------------------------------
// Slot manager
// ---------------------------------------------------------------------------

/// The game's view of persistence: numbered slots `1..=max_slots` and
/// the slot currently being played.
#[derive(Debug)]
pub struct SaveSlots {
    store: Box<dyn SaveStore>,
    max_slots: u32,
    current: Option<u32>,
}

impl SaveSlots {
    /// Wrap a store.
    pub fn new(store: Box<dyn SaveStore>, max_slots: u32) -> Self {
        Self {
            store,
            max_slots: max_slots.max(1),
            current: None,
        }
    }

    /// Slots held in memory.
    pub fn in_memory(max_slots: u32) -> Self {
        Self::new(Box::new(MemoryStore::new()), max_slots)
    }

    /// JSON files under the configured save directory, or memory when
    /// none is set.
    pub fn from_config(config: &SessionConfig) -> Self {
        match &config.save_dir {
            Some(dir) => Self::new(Box::new(JsonSlotStore::new(dir)), config.max_slots),
            None => Self::in_memory(config.max_slots),
        }
    }

    /// Number of slots.
    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }

    /// The slot being played.
    pub fn current_slot(&self) -> Option<u32> {
        self.current
    }

    /// Make `slot` the one [`SaveSlots::save_player`] writes to.
    pub fn set_current_slot(&mut self, slot: u32) -> SessionResult<()> {
        self.check(slot)?;
        self.current = Some(slot);
        Ok(())
    }

    fn check(&self, slot: u32) -> SessionResult<()> {
        if (1..=self.max_slots).contains(&slot) {
            Ok(())
        } else {
            Err(SessionError::InvalidSlot(slot))
        }
    }

    /// Write `player` to the current slot. Failures are logged, never
    /// returned.
    pub fn save_player(&mut self, player: &Player) {
        let Some(slot) = self.current else {
            tracing::debug!("no current slot, skipping save");
            return;
        };
        if let Err(e) = self.try_save(slot, player) {
            tracing::warn!(slot, error = %e, "save failed");
        }
    }

    fn try_save(&mut self, slot: u32, player: &Player) -> SessionResult<()> {
        let created_at = self.store.read(slot).ok().flatten().map(|r| r.meta.created_at);
        self.store.write(slot, &SaveRecord::capture(player, created_at))?;
        tracing::debug!(slot, "saved");
        Ok(())
    }

    /// Read one slot.
    pub fn read(&self, slot: u32) -> SessionResult<Option<SaveRecord>> {
        self.check(slot)?;
        self.store.read(slot)
    }

    /// Load the player in `slot`. Missing or unreadable slots give `None`.
    pub fn load_player(&self, slot: u32) -> Option<Player> {
        match self.read(slot) {
            Ok(record) => record.map(SaveRecord::into_player),
            Err(e) => {
                tracing::warn!(slot, error = %e, "load failed");
                None
            }
        }
    }

    /// Whether `slot` holds a save; with `None`, whether any slot does.
    pub fn exists(&self, slot: Option<u32>) -> bool {
        let occupied = self.occupied();
        match slot {
            Some(n) => occupied.contains(&n),
            None => !occupied.is_empty(),
        }
    }

    /// Occupied slots within range, ascending.
    pub fn occupied(&self) -> Vec<u32> {
        self.store
            .occupied()
            .into_iter()
            .filter(|n| (1..=self.max_slots).contains(n))
            .collect()
    }

    /// Empty `slot`. Failures are logged.
    pub fn delete(&mut self, slot: u32) {
        if let Err(e) = self.check(slot).and_then(|()| self.store.delete(slot)) {
            tracing::warn!(slot, error = %e, "delete failed");
        }
    }

    /// The lowest empty slot.
    pub fn next_empty_slot(&self) -> Option<u32> {
        let occupied: BTreeSet<u32> = self.occupied().into_iter().collect();
        (1..=self.max_slots).find(|n| !occupied.contains(n))
    }

    /// The slot written most recently.
    pub fn last_played_slot(&self) -> Option<u32> {
        self.summaries()
            .into_iter()
            .max_by_key(|s| (s.last_played, std::cmp::Reverse(s.slot)))
            .map(|s| s.slot)
    }

    /// Names of every saved character.
    pub fn existing_player_names(&self) -> BTreeSet<String> {
        self.summaries().into_iter().map(|s| s.name).collect()
    }

    /// One row per readable occupied slot.
    pub fn summaries(&self) -> Vec<SlotSummary> {
        self.occupied()
            .into_iter()
            .filter_map(|slot| match self.store.read(slot) {
                Ok(Some(r)) => Some(SlotSummary {
                    slot,
                    name: r.player.name,
                    level: r.player.level,
                    gold: r.player.gold,
                    last_played: r.meta.last_played,
                }),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(slot, error = %e, "unreadable save");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use mv_core::{Catalogs, Follower, FollowerId, GearSlot, QuestStatus};

    use super::*;

    fn seasoned_player() -> Player {
        let cat = Catalogs::builtin().unwrap();
        let mut p = Player::new("Lyra", 250);
        p.level = 3;
        p.add_item("potion", 2);
        let sword = cat.item("iron_sword").unwrap();
        p.add_gear("iron_sword", sword).unwrap();
        let wand = cat.item("fire_wand").unwrap();
        let wand_id = p.add_gear("fire_wand", wand).unwrap();
        assert!(p.add_follower(Follower::new(FollowerId(0), "mushroom_baby", "Mushy")));
        assert!(p.assign_gear_to_follower(0, &wand_id));
        p.flags.raise("into_the_woods_done");
        p.quests.insert("first_friend".into(), QuestState::active());
        p
    }

    #[test]
    fn record_round_trips_the_whole_player() {
        let player = seasoned_player();
        let mut slots = SaveSlots::in_memory(5);
        slots.set_current_slot(2).unwrap();
        slots.save_player(&player);

        let loaded = slots.load_player(2).unwrap();
        assert_eq!(loaded, player);
        assert!(loaded.owner_index_consistent());
        assert_eq!(loaded.followers()[0].name, "Mushy");
        assert!(loaded.equipped_in(GearSlot::Sword).is_some());
        assert!(loaded.follower_gear(&loaded.followers()[0], GearSlot::Wand).is_some());
        assert_eq!(loaded.quests["first_friend"].status, QuestStatus::Active);
        assert!(loaded.flags.is_set("into_the_woods_done"));
    }

    #[test]
    fn json_shape_has_meta_and_side_tables() {
        let record = SaveRecord::capture(&seasoned_player(), None);
        let value = serde_json::to_value(&record).unwrap();
        for key in ["version", "player", "quests", "flags", "meta"] {
            assert!(value.get(key).is_some(), "{key}");
        }
        assert!(value["meta"].get("created_at").is_some());
        assert!(value["meta"].get("last_played").is_some());
        assert!(value["player"].get("quests").is_none());
    }

    #[test]
    fn files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::default().with_save_dir(dir.path()).with_max_slots(3);
        let mut slots = SaveSlots::from_config(&config);
        assert!(!slots.exists(None));
        assert_eq!(slots.next_empty_slot(), Some(1));

        slots.set_current_slot(1).unwrap();
        slots.save_player(&Player::new("Arin", 10));
        assert!(dir.path().join("slot_1.json").is_file());
        assert!(slots.exists(Some(1)));
        assert_eq!(slots.next_empty_slot(), Some(2));
        assert_eq!(slots.existing_player_names(), BTreeSet::from(["Arin".to_string()]));

        slots.delete(1);
        assert!(!slots.exists(None));
    }

    #[test]
    fn created_at_survives_resave() {
        let mut slots = SaveSlots::in_memory(2);
        slots.set_current_slot(1).unwrap();
        slots.save_player(&Player::default());
        let first = slots.read(1).unwrap().unwrap().meta;
        slots.save_player(&Player::default());
        let second = slots.read(1).unwrap().unwrap().meta;
        assert_eq!(first.created_at, second.created_at);
        assert!(second.last_played >= first.last_played);
    }

    #[test]
    fn out_of_range_slots() {
        let mut slots = SaveSlots::in_memory(2);
        assert!(matches!(slots.set_current_slot(3), Err(SessionError::InvalidSlot(3))));
        assert!(slots.load_player(0).is_none());
        slots.set_current_slot(2).unwrap();
        slots.save_player(&Player::default());
        assert_eq!(slots.next_empty_slot(), Some(1));
        slots.set_current_slot(1).unwrap();
        slots.save_player(&Player::default());
        assert_eq!(slots.next_empty_slot(), None);
    }

    #[test]
    fn corrupt_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("slot_1.json"), "{ not json").unwrap();
        let mut slots = SaveSlots::new(Box::new(JsonSlotStore::new(dir.path())), 5);
        assert!(slots.exists(Some(1)));
        assert!(slots.load_player(1).is_none());
        assert!(slots.summaries().is_empty());
        slots.set_current_slot(1).unwrap();
        slots.save_player(&Player::default());
        assert!(slots.load_player(1).is_some());
    }
}

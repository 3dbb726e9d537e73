//! Quest definitions and per-quest progress.
//!
//! Definitions are static; [`QuestState`] values live on the player and
//! are persisted with it. Status only ever moves forward
//! (locked, available, active, complete).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::gear::GearSlot;

fn one() -> u32 {
    1
}

/// A quest objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Objective {
    /// Recruit followers (optionally of one type).
    RecruitFollower {
        /// Required type; empty matches any.
        #[serde(default)]
        follower_type: String,
        /// How many.
        #[serde(default = "one")]
        count: u32,
    },
    /// Fuse followers (counted per fused follower).
    FuseFollowers {
        /// Required type; empty matches any.
        #[serde(default)]
        follower_type: String,
        /// How many.
        #[serde(default = "one")]
        count: u32,
    },
    /// Enter a scene.
    VisitScene {
        /// Scene id; empty matches any.
        #[serde(default, rename = "id")]
        scene_id: String,
        /// How many visits.
        #[serde(default = "one")]
        count: u32,
    },
    /// Fuse gear up to a rank.
    FuseGear {
        /// Item id; empty matches any.
        #[serde(default)]
        item_id: String,
        /// Fusion rank to reach.
        #[serde(default = "one")]
        count: u32,
    },
    /// Have gear equipped in the listed slots.
    EquipSlots {
        /// Slots that count.
        #[serde(default)]
        slots: Vec<GearSlot>,
        /// How many must be filled; 0 means all.
        #[serde(default)]
        count: u32,
    },
}

impl Objective {
    /// Key under which progress is stored; `None` for live-checked objectives.
    pub fn progress_key(&self) -> Option<String> {
        match self {
            Objective::RecruitFollower { follower_type, .. } => {
                Some(format!("recruit_follower:{follower_type}"))
            }
            Objective::FuseFollowers { follower_type, .. } => {
                Some(format!("fuse_followers:{follower_type}"))
            }
            Objective::VisitScene { scene_id, .. } => Some(format!("visit_scene:{scene_id}")),
            Objective::FuseGear { item_id, .. } => Some(format!("fuse_gear:{item_id}")),
            Objective::EquipSlots { .. } => None,
        }
    }

    /// Target count.
    pub fn needed(&self) -> u32 {
        match self {
            Objective::RecruitFollower { count, .. }
            | Objective::FuseFollowers { count, .. }
            | Objective::VisitScene { count, .. }
            | Objective::FuseGear { count, .. } => (*count).max(1),
            Objective::EquipSlots { slots, count } => {
                if *count == 0 {
                    slots.len() as u32
                } else {
                    *count
                }
            }
        }
    }
}

/// Conditions checked both before starting and at completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    /// Minimum player level.
    #[serde(default)]
    pub level_min: u32,
    /// Flags that must be set.
    #[serde(default)]
    pub flags_required: Vec<String>,
}

/// A follower handed out by a quest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowerGrant {
    /// Follower type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Name; defaults to the title-cased type.
    #[serde(default)]
    pub name: Option<String>,
    /// Also counts as a recruit for objectives.
    #[serde(default)]
    pub count_as_recruit: bool,
}

/// Effects applied when a quest starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnStart {
    /// Flags set.
    #[serde(default)]
    pub grant_flags: Vec<String>,
    /// Restrict recruitment to these follower types.
    #[serde(default)]
    pub recruit_only_types: Vec<String>,
    /// Fixed follower cap.
    #[serde(default)]
    pub follower_cap: Option<u32>,
    /// Cap set to current roster (plus granted follower) plus this.
    #[serde(default)]
    pub follower_cap_extra: Option<u32>,
    /// GP charged to start.
    #[serde(default)]
    pub gp_cost: u32,
    /// Follower granted on start.
    #[serde(default)]
    pub grant_follower: Option<FollowerGrant>,
    /// Message replacing `Quest started: <title>.`.
    #[serde(default)]
    pub start_message: Option<String>,
}

/// Effects applied at completion, besides rewards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnComplete {
    /// Lift the recruitment restriction.
    #[serde(default)]
    pub clear_recruit_only: bool,
    /// Lift the follower cap.
    #[serde(default)]
    pub clear_follower_cap: bool,
    /// Set a new follower cap.
    #[serde(default)]
    pub follower_cap: Option<u32>,
}

/// Completion rewards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rewards {
    /// Flags set.
    #[serde(default)]
    pub flags_set: Vec<String>,
    /// Items added (one each).
    #[serde(default)]
    pub items: Vec<String>,
    /// Followers added.
    #[serde(default)]
    pub followers_add: Vec<FollowerGrant>,
    /// XP granted.
    #[serde(default)]
    pub xp: u32,
}

/// Static quest definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestDef {
    /// Title.
    pub title: String,
    /// Continent the quest is listed under; none lists it everywhere.
    #[serde(default)]
    pub continent: Option<Element>,
    /// Dialog pages shown before starting.
    #[serde(default)]
    pub dialog: Vec<String>,
    /// Start/completion requirements.
    #[serde(default)]
    pub requirements: Requirements,
    /// Objectives.
    #[serde(default)]
    pub objectives: Vec<Objective>,
    /// Rewards.
    #[serde(default)]
    pub rewards: Rewards,
    /// Start effects.
    #[serde(default)]
    pub on_start: OnStart,
    /// Completion effects.
    #[serde(default)]
    pub on_complete: OnComplete,
}

impl QuestDef {
    /// Returns true if the quest is listed under `continent`.
    pub fn listed_under(&self, continent: Element) -> bool {
        self.continent.is_none_or(|c| c == continent)
    }
}

/// Ordered quest catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestCatalog {
    /// Quest ids in story order.
    #[serde(default)]
    pub order: Vec<String>,
    /// Definitions by id.
    #[serde(default)]
    pub quests: BTreeMap<String, QuestDef>,
}

impl QuestCatalog {
    /// Look up a quest.
    pub fn get(&self, id: &str) -> Option<&QuestDef> {
        self.quests.get(id)
    }

    /// Every quest: story order first, then any unordered ids.
    pub fn ordered(&self) -> Vec<(&str, &QuestDef)> {
        let mut out: Vec<(&str, &QuestDef)> = self
            .order
            .iter()
            .filter_map(|id| self.quests.get_key_value(id))
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        for (id, def) in &self.quests {
            if !self.order.contains(id) {
                out.push((id.as_str(), def));
            }
        }
        out
    }
}

/// Quest status, ordered by progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Requirements not met.
    Locked,
    /// Can be started.
    Available,
    /// In progress.
    Active,
    /// Done.
    Complete,
}

impl QuestStatus {
    /// Lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            QuestStatus::Locked => "locked",
            QuestStatus::Available => "available",
            QuestStatus::Active => "active",
            QuestStatus::Complete => "complete",
        }
    }
}

/// Stored state of a started quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestState {
    /// Current status.
    pub status: QuestStatus,
    /// Progress counters by objective key.
    #[serde(default)]
    pub progress: BTreeMap<String, u32>,
}

impl QuestState {
    /// A freshly started quest.
    pub fn active() -> Self {
        Self {
            status: QuestStatus::Active,
            progress: BTreeMap::new(),
        }
    }

    /// Move to `status` if it is later than the current one. Returns true on change.
    pub fn advance(&mut self, status: QuestStatus) -> bool {
        if status > self.status {
            self.status = status;
            true
        } else {
            false
        }
    }

    /// Progress stored under `key`.
    pub fn progress_of(&self, key: &str) -> u32 {
        self.progress.get(key).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objectives_parse_tagged() {
        let objs: Vec<Objective> = serde_json::from_value(serde_json::json!([
            { "type": "recruit_follower", "follower_type": "mushroom_baby" },
            { "type": "visit_scene", "id": "forest", "count": 3 },
            { "type": "equip_slots", "slots": ["sword", "shield"] }
        ]))
        .unwrap();
        assert_eq!(
            objs[0].progress_key().as_deref(),
            Some("recruit_follower:mushroom_baby")
        );
        assert_eq!(objs[0].needed(), 1);
        assert_eq!(objs[1].progress_key().as_deref(), Some("visit_scene:forest"));
        assert_eq!(objs[1].needed(), 3);
        assert_eq!(objs[2].progress_key(), None);
        assert_eq!(objs[2].needed(), 2);
    }

    #[test]
    fn status_is_monotonic() {
        let mut s = QuestState::active();
        assert!(!s.advance(QuestStatus::Available));
        assert_eq!(s.status, QuestStatus::Active);
        assert!(s.advance(QuestStatus::Complete));
        assert!(!s.advance(QuestStatus::Active));
        assert_eq!(s.status, QuestStatus::Complete);
    }

    #[test]
    fn ordered_lists_story_order_first() {
        let cat: QuestCatalog = serde_json::from_value(serde_json::json!({
            "order": ["b", "a"],
            "quests": {
                "a": { "title": "A" },
                "b": { "title": "B" },
                "c": { "title": "C" }
            }
        }))
        .unwrap();
        let ids: Vec<&str> = cat.ordered().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn listed_under_continent() {
        let q = QuestDef {
            continent: Some(Element::Fire),
            ..QuestDef::default()
        };
        assert!(q.listed_under(Element::Fire));
        assert!(!q.listed_under(Element::Base));
        assert!(QuestDef::default().listed_under(Element::Ice));
    }
}

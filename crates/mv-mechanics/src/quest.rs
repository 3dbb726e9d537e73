//! The quest ledger: objective progress, completion and rewards.
//!
//! Gameplay reports discrete [`QuestEvent`]s. [`record_event`] bumps the
//! matching counters on active quests and [`evaluate`] completes every
//! quest whose requirements and objectives hold, repeating until nothing
//! changes so one completion can unlock the next.

use mv_core::quest::{FollowerGrant, Objective, QuestDef};
use mv_core::follower::kind_title;
use mv_core::{Catalogs, Follower, FollowerId, Player, QuestState, QuestStatus};

use crate::error::{MechError, MechResult};

/// Something that happened which quests may count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestEvent {
    /// Followers joined the party.
    RecruitFollower {
        /// Type that joined.
        follower_type: String,
        /// How many.
        count: u32,
    },
    /// Followers were fused at the temple.
    FuseFollowers {
        /// Type that was consumed.
        follower_type: String,
        /// How many were consumed.
        count: u32,
    },
    /// The player entered a scene.
    VisitScene {
        /// Scene id.
        scene_id: String,
    },
    /// Gear was fused at the alchemist.
    FuseGear {
        /// Item id of the fused gear.
        item_id: String,
        /// Fusion rank reached.
        rank: u32,
    },
}

fn matches(filter: &str, value: &str) -> bool {
    filter.is_empty() || filter == value
}

/// Progress key and increment for `event` against one objective, or
/// `None` if the objective does not count it.
fn credit(objective: &Objective, event: &QuestEvent) -> Option<u32> {
    match (objective, event) {
        (
            Objective::RecruitFollower { follower_type, .. },
            QuestEvent::RecruitFollower {
                follower_type: t,
                count,
            },
        )
        | (
            Objective::FuseFollowers { follower_type, .. },
            QuestEvent::FuseFollowers {
                follower_type: t,
                count,
            },
        ) if matches(follower_type, t) => Some(*count),
        (Objective::VisitScene { scene_id, .. }, QuestEvent::VisitScene { scene_id: s })
            if matches(scene_id, s) =>
        {
            Some(1)
        }
        (Objective::FuseGear { item_id, .. }, QuestEvent::FuseGear { item_id: i, rank })
            if matches(item_id, i) =>
        {
            Some(*rank)
        }
        _ => None,
    }
}

/// Count `event` toward every active quest that tracks it. Gear fusion
/// keeps the highest rank seen; everything else accumulates.
///
/// Fusing followers of a type is also noted on quests that only ask for
/// a recruit of that type, so [`evaluate`] can credit the recruit later.
pub fn record_event(player: &mut Player, catalogs: &Catalogs, event: &QuestEvent) {
    for (id, def) in catalogs.quests.ordered() {
        let Some(state) = player.quests.get_mut(id) else {
            continue;
        };
        if state.status != QuestStatus::Active {
            continue;
        }
        let mut credited = Vec::new();
        for objective in &def.objectives {
            let (Some(key), Some(amount)) = (objective.progress_key(), credit(objective, event)) else {
                continue;
            };
            let slot = state.progress.entry(key.clone()).or_insert(0);
            *slot = match event {
                QuestEvent::FuseGear { .. } => (*slot).max(amount),
                _ => *slot + amount,
            };
            credited.push(key);
        }
        if let QuestEvent::FuseFollowers { follower_type, count } = event {
            let key = format!("fuse_followers:{follower_type}");
            let wanted = def.objectives.iter().any(|o| {
                matches!(o, Objective::RecruitFollower { follower_type: t, .. } if t == follower_type)
            });
            if wanted && !credited.contains(&key) {
                *state.progress.entry(key).or_insert(0) += count;
            }
        }
    }
}

/// Returns true if the player meets the quest's level and flag requirements.
pub fn requirements_met(player: &Player, def: &QuestDef) -> bool {
    player.level >= def.requirements.level_min
        && def
            .requirements
            .flags_required
            .iter()
            .all(|f| player.flags.is_set(f))
}

/// Explain which requirements are unmet.
pub fn requirement_summary(player: &Player, def: &QuestDef) -> String {
    let mut parts = Vec::new();
    let level_min = def.requirements.level_min;
    if level_min > 0 && player.level < level_min {
        parts.push(format!("Player level {level_min} is required."));
    }
    if def
        .requirements
        .flags_required
        .iter()
        .any(|f| !player.flags.is_set(f))
    {
        parts.push("Quest prerequisites are not met.".to_string());
    }
    if parts.is_empty() {
        "Requirement not met.".to_string()
    } else {
        format!("Requirement not met. {}", parts.join(" "))
    }
}

fn objective_met(player: &Player, state: &QuestState, objective: &Objective) -> bool {
    match objective {
        Objective::EquipSlots { slots, .. } => {
            let filled = slots
                .iter()
                .filter(|s| player.equipment().contains_key(s))
                .count() as u32;
            filled >= objective.needed()
        }
        other => other
            .progress_key()
            .is_none_or(|key| state.progress_of(&key) >= other.needed()),
    }
}

/// A recruit objective also counts as met once fusion progress for the
/// same type reaches its count.
fn credit_recruits_from_fusion(def: &QuestDef, state: &mut QuestState) {
    for objective in &def.objectives {
        let Objective::RecruitFollower { follower_type, .. } = objective else {
            continue;
        };
        if follower_type.is_empty() {
            continue;
        }
        let Some(key) = objective.progress_key() else {
            continue;
        };
        let needed = objective.needed();
        if state.progress_of(&key) >= needed {
            continue;
        }
        if state.progress_of(&format!("fuse_followers:{follower_type}")) >= needed {
            state.progress.insert(key, needed);
        }
    }
}

/// Build a follower from a quest grant using its type template.
pub fn follower_from_grant(grant: &FollowerGrant, catalogs: &Catalogs) -> Follower {
    let name = grant.name.clone().unwrap_or_else(|| kind_title(&grant.kind));
    let mut follower = Follower::new(FollowerId(0), grant.kind.clone(), name);
    if let Some(template) = catalogs.followers.template(&grant.kind) {
        follower.apply_template(template);
    }
    follower
}

fn apply_rewards(player: &mut Player, def: &QuestDef, catalogs: &Catalogs) -> u32 {
    for flag in &def.rewards.flags_set {
        player.flags.raise(flag.clone());
    }
    if def.on_complete.clear_recruit_only {
        player.flags.recruit_only_types.clear();
    }
    if def.on_complete.clear_follower_cap {
        player.flags.follower_cap = None;
    }
    if let Some(cap) = def.on_complete.follower_cap.filter(|c| *c > 0) {
        player.flags.follower_cap = Some(cap);
    }
    for item in def.rewards.items.iter().filter(|i| !i.is_empty()) {
        player.add_item(item.clone(), 1);
    }
    for grant in &def.rewards.followers_add {
        let follower = follower_from_grant(grant, catalogs);
        if !player.add_follower(follower) {
            tracing::debug!(kind = %grant.kind, "no room for quest follower");
        }
    }
    if def.rewards.xp > 0 {
        player.gain_xp(def.rewards.xp);
    }
    def.rewards.xp
}

/// Complete every active quest whose requirements and objectives hold,
/// repeating until nothing changes. Returns the announcement lines.
pub fn evaluate(player: &mut Player, catalogs: &Catalogs) -> Vec<String> {
    let mut messages = Vec::new();
    loop {
        let mut changed = false;
        for (id, def) in catalogs.quests.ordered() {
            let ready = {
                let Some(state) = player.quests.get_mut(id) else {
                    continue;
                };
                if state.status != QuestStatus::Active {
                    continue;
                }
                credit_recruits_from_fusion(def, state);
                state.clone()
            };
            if !requirements_met(player, def)
                || !def.objectives.iter().all(|o| objective_met(player, &ready, o))
            {
                continue;
            }
            if let Some(state) = player.quests.get_mut(id) {
                state.advance(QuestStatus::Complete);
            }
            let xp = apply_rewards(player, def, catalogs);
            tracing::info!(quest = id, "quest complete");
            messages.push(format!("Quest complete: {}.", def.title));
            if xp > 0 {
                messages.push(format!("You gain {xp} XP."));
            }
            changed = true;
        }
        if !changed {
            return messages;
        }
    }
}

/// Record `event` and evaluate.
pub fn handle_event(player: &mut Player, catalogs: &Catalogs, event: &QuestEvent) -> Vec<String> {
    record_event(player, catalogs, event);
    evaluate(player, catalogs)
}

// ---------------------------------------------------------------------------
// Browsing and starting
// ---------------------------------------------------------------------------

/// Status of a quest for display: stored status if started, otherwise
/// available or locked by requirements.
pub fn quest_status(player: &Player, id: &str, def: &QuestDef) -> QuestStatus {
    match player.quests.get(id) {
        Some(state) => state.status,
        None if requirements_met(player, def) => QuestStatus::Available,
        None => QuestStatus::Locked,
    }
}

/// One row of the quest browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestEntry {
    /// Quest id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Display status.
    pub status: QuestStatus,
}

/// Quest browser rows for one continent: every completed quest in story
/// order, then the single next quest (active, available or locked).
/// Run [`evaluate`] first so finished quests show as complete.
pub fn quest_entries(player: &Player, catalogs: &Catalogs, continent: mv_core::Element) -> Vec<QuestEntry> {
    let mut entries = Vec::new();
    for (id, def) in catalogs.quests.ordered() {
        if !def.listed_under(continent) {
            continue;
        }
        let status = quest_status(player, id, def);
        entries.push(QuestEntry {
            id: id.to_string(),
            title: def.title.clone(),
            status,
        });
        if status != QuestStatus::Complete {
            break;
        }
    }
    entries
}

/// Start a quest, applying its start effects all-or-nothing.
///
/// Returns the message to show. Preconditions (already started,
/// requirements, GP, roster room) fail with a message and leave the
/// player untouched.
pub fn start_quest(player: &mut Player, catalogs: &Catalogs, id: &str) -> MechResult<String> {
    let def = catalogs
        .quests
        .get(id)
        .ok_or_else(|| MechError::UnknownQuest(id.to_string()))?;
    match player.quests.get(id).map(|s| s.status) {
        Some(QuestStatus::Complete) => return Ok("That quest is already complete.".to_string()),
        Some(QuestStatus::Active) => return Ok("That quest is already underway.".to_string()),
        _ => {}
    }
    if !requirements_met(player, def) {
        return Ok(requirement_summary(player, def));
    }
    let on_start = &def.on_start;
    if player.gold < on_start.gp_cost {
        return Ok("Not enough GP.".to_string());
    }
    let granted = on_start.grant_follower.as_ref().filter(|g| !g.kind.trim().is_empty());
    let roster = player.followers().len() as u32;
    let mut cap = player.flags.follower_cap;
    if let Some(fixed) = on_start.follower_cap.filter(|c| *c > 0) {
        cap = Some(fixed);
    }
    if let Some(extra) = on_start.follower_cap_extra.filter(|e| *e > 0) {
        cap = Some(roster + u32::from(granted.is_some()) + extra);
    }
    let limit = cap.unwrap_or(mv_core::player::party::DEFAULT_FOLLOWER_LIMIT);
    if granted.is_some() && roster >= limit {
        return Ok("No room for another follower.".to_string());
    }

    for flag in &on_start.grant_flags {
        player.flags.raise(flag.clone());
    }
    if !on_start.recruit_only_types.is_empty() {
        player.flags.recruit_only_types = on_start.recruit_only_types.clone();
    }
    player.flags.follower_cap = cap;
    player.gold -= on_start.gp_cost;
    player.quests.insert(id.to_string(), QuestState::active());
    if let Some(grant) = granted {
        let follower = follower_from_grant(grant, catalogs);
        let kind = follower.kind.clone();
        player.add_follower(follower);
        if grant.count_as_recruit {
            record_event(
                player,
                catalogs,
                &QuestEvent::RecruitFollower {
                    follower_type: kind,
                    count: 1,
                },
            );
        }
    }
    tracing::info!(quest = id, "quest started");
    Ok(on_start
        .start_message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Quest started: {}.", def.title)))
}

#[cfg(test)]
mod tests {
    use mv_core::Element;

    use super::*;

    fn catalogs() -> Catalogs {
        Catalogs::builtin().unwrap()
    }

    fn visit_forest() -> QuestEvent {
        QuestEvent::VisitScene {
            scene_id: "forest".into(),
        }
    }

    #[test]
    fn inactive_quests_ignore_events() {
        let cat = catalogs();
        let mut p = Player::default();
        assert!(handle_event(&mut p, &cat, &visit_forest()).is_empty());
        assert!(p.quests.is_empty());
    }

    #[test]
    fn visit_completes_and_rewards() {
        let cat = catalogs();
        let mut p = Player::default();
        let msg = start_quest(&mut p, &cat, "into_the_woods").unwrap();
        assert_eq!(msg, "The forest path lies north of town.");
        let msgs = handle_event(&mut p, &cat, &visit_forest());
        assert_eq!(msgs, vec!["Quest complete: Into the Woods.", "You gain 10 XP."]);
        assert_eq!(p.quests["into_the_woods"].status, QuestStatus::Complete);
        assert!(p.flags.is_set("into_the_woods_done"));
        assert_eq!(p.item_count("potion"), 2);
        assert_eq!(p.xp, 10);
    }

    #[test]
    fn level_requirement_blocks_completion() {
        let cat = catalogs();
        let mut p = Player::default();
        p.quests.insert("ember_trial".into(), QuestState::active());
        for _ in 0..3 {
            record_event(&mut p, &cat, &visit_forest());
        }
        assert_eq!(p.quests["ember_trial"].progress_of("visit_scene:forest"), 3);
        assert!(evaluate(&mut p, &cat).is_empty());
        assert_eq!(p.quests["ember_trial"].status, QuestStatus::Active);
        p.level = 4;
        assert_eq!(evaluate(&mut p, &cat)[0], "Quest complete: Ember Trial.");
    }

    #[test]
    fn fuse_gear_keeps_max_rank() {
        let cat = catalogs();
        let mut p = Player::default();
        p.level = 1;
        p.quests.insert("alchemy_101".into(), QuestState::active());
        let fuse = |rank| QuestEvent::FuseGear {
            item_id: "iron_sword".into(),
            rank,
        };
        record_event(&mut p, &cat, &fuse(2));
        record_event(&mut p, &cat, &fuse(1));
        assert_eq!(p.quests["alchemy_101"].progress_of("fuse_gear:"), 2);
    }

    #[test]
    fn equip_slots_checked_live() {
        let cat = catalogs();
        let mut p = Player::default();
        p.level = 2;
        start_quest(&mut p, &cat, "well_equipped").unwrap();
        assert!(evaluate(&mut p, &cat).is_empty());
        p.add_gear("wooden_sword", cat.item("wooden_sword").unwrap());
        p.add_gear("wooden_shield", cat.item("wooden_shield").unwrap());
        let msgs = evaluate(&mut p, &cat);
        assert_eq!(msgs[0], "Quest complete: Well Equipped.");
        assert_eq!(p.item_count("copper_ring"), 1);
    }

    #[test]
    fn recruit_credited_from_fusion_progress() {
        let cat = catalogs();
        let mut p = Player::default();
        p.flags.raise("into_the_woods_done");
        p.quests.insert("first_friend".into(), QuestState::active());
        record_event(
            &mut p,
            &cat,
            &QuestEvent::FuseFollowers {
                follower_type: "mushroom_baby".into(),
                count: 3,
            },
        );
        let msgs = evaluate(&mut p, &cat);
        assert_eq!(msgs, vec!["Quest complete: A First Friend."]);
    }

    #[test]
    fn fusion_of_other_types_is_not_noted_on_recruit_quests() {
        let cat = catalogs();
        let mut p = Player::default();
        p.quests.insert("first_friend".into(), QuestState::active());
        let fuse = |kind: &str| QuestEvent::FuseFollowers {
            follower_type: kind.into(),
            count: 3,
        };
        record_event(&mut p, &cat, &fuse("fairy_baby"));
        assert_eq!(p.quests["first_friend"].progress_of("fuse_followers:fairy_baby"), 0);
        record_event(&mut p, &cat, &fuse("mushroom_baby"));
        assert_eq!(p.quests["first_friend"].progress_of("fuse_followers:mushroom_baby"), 3);
        assert_eq!(p.quests["first_friend"].progress_of("recruit_follower:mushroom_baby"), 0);
    }

    #[test]
    fn completion_chains_through_flags() {
        let cat = catalogs();
        let mut p = Player::default();
        p.quests.insert("into_the_woods".into(), QuestState::active());
        let mut state = QuestState::active();
        state.progress.insert("recruit_follower:mushroom_baby".into(), 1);
        p.quests.insert("first_friend".into(), state);
        record_event(&mut p, &cat, &visit_forest());
        let msgs = evaluate(&mut p, &cat);
        assert!(msgs.contains(&"Quest complete: Into the Woods.".to_string()));
        assert!(msgs.contains(&"Quest complete: A First Friend.".to_string()));
    }

    #[test]
    fn start_applies_cap_and_recruit_limits() {
        let cat = catalogs();
        let mut p = Player::default();
        p.flags.raise("into_the_woods_done");
        start_quest(&mut p, &cat, "first_friend").unwrap();
        assert_eq!(p.flags.recruit_only_types, vec!["mushroom_baby".to_string()]);
        assert_eq!(p.follower_limit(), 1);

        p.quests.get_mut("first_friend").unwrap().progress.insert("recruit_follower:mushroom_baby".into(), 1);
        evaluate(&mut p, &cat);
        assert!(p.flags.recruit_only_types.is_empty());
        assert_eq!(p.flags.follower_cap, None);
    }

    #[test]
    fn start_is_all_or_nothing() {
        let cat = catalogs();
        let mut p = Player::new("Ada", 5);
        p.flags.raise("first_friend_done");
        let before = p.clone();
        assert_eq!(start_quest(&mut p, &cat, "mushroom_council").unwrap(), "Not enough GP.");
        assert_eq!(p, before);
        assert_eq!(p.quests, before.quests);

        p.gold = 50;
        let msg = start_quest(&mut p, &cat, "mushroom_council").unwrap();
        assert_eq!(msg, "Quest started: The Mushroom Council.");
        assert_eq!(p.gold, 40);
        assert_eq!(p.followers()[0].name, "Mushy");
        assert_eq!(
            p.quests["mushroom_council"].progress_of("recruit_follower:mushroom_baby"),
            0
        );
    }

    #[test]
    fn start_rejects_locked_and_repeats() {
        let cat = catalogs();
        let mut p = Player::default();
        assert_eq!(
            start_quest(&mut p, &cat, "well_equipped").unwrap(),
            "Requirement not met. Player level 2 is required."
        );
        assert_eq!(
            start_quest(&mut p, &cat, "first_friend").unwrap(),
            "Requirement not met. Quest prerequisites are not met."
        );
        start_quest(&mut p, &cat, "into_the_woods").unwrap();
        assert_eq!(
            start_quest(&mut p, &cat, "into_the_woods").unwrap(),
            "That quest is already underway."
        );
        assert!(matches!(
            start_quest(&mut p, &cat, "nope"),
            Err(MechError::UnknownQuest(_))
        ));
    }

    #[test]
    fn entries_show_completed_then_next() {
        let cat = catalogs();
        let mut p = Player::default();
        let rows = quest_entries(&p, &cat, Element::Base);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "into_the_woods");
        assert_eq!(rows[0].status, QuestStatus::Available);

        start_quest(&mut p, &cat, "into_the_woods").unwrap();
        handle_event(&mut p, &cat, &visit_forest());
        let rows = quest_entries(&p, &cat, Element::Base);
        let ids: Vec<(&str, QuestStatus)> = rows.iter().map(|r| (r.id.as_str(), r.status)).collect();
        assert_eq!(
            ids,
            vec![
                ("into_the_woods", QuestStatus::Complete),
                ("first_friend", QuestStatus::Available)
            ]
        );

        let fire = quest_entries(&p, &cat, Element::Fire);
        assert_eq!(fire[0].id, "ember_trial");
        assert_eq!(fire[0].status, QuestStatus::Locked);
    }
}

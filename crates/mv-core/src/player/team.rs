//! Picking the most depleted team member and applying restores to it.

use serde::{Deserialize, Serialize};

use crate::item::ItemDef;

use super::Player;

/// Which gauges count toward "missing".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamMode {
    /// Missing HP only.
    Hp,
    /// Missing HP plus missing MP.
    #[default]
    Combined,
}

/// A member of the player's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamTarget {
    /// The player.
    Player,
    /// Follower at this roster index.
    Follower(usize),
}

impl Player {
    /// Missing points for one team member under `mode`.
    pub fn team_missing(&self, target: TeamTarget, mode: TeamMode) -> i32 {
        let (hp, mp) = match target {
            TeamTarget::Player => (
                (self.total_max_hp() - self.hp.current).max(0),
                self.mp.missing(),
            ),
            TeamTarget::Follower(idx) => match self.followers.get(idx) {
                Some(f) => (f.hp.missing(), f.mp.missing()),
                None => return 0,
            },
        };
        match mode {
            TeamMode::Hp => hp,
            TeamMode::Combined => hp + mp,
        }
    }

    /// Every team member, player first.
    pub fn team(&self) -> impl Iterator<Item = TeamTarget> {
        std::iter::once(TeamTarget::Player).chain((0..self.followers.len()).map(TeamTarget::Follower))
    }

    /// The member missing the most, or `None` when nobody is missing
    /// anything. Ties go to the earliest member.
    pub fn select_team_target(&self, mode: TeamMode) -> Option<TeamTarget> {
        let mut best: Option<(TeamTarget, i32)> = None;
        for member in self.team() {
            let missing = self.team_missing(member, mode);
            if best.is_none_or(|(_, top)| missing > top) {
                best = Some((member, missing));
            }
        }
        best.filter(|(_, missing)| *missing > 0).map(|(t, _)| t)
    }

    /// Display name of a team member.
    pub fn member_name(&self, target: TeamTarget) -> &str {
        match target {
            TeamTarget::Player => &self.name,
            TeamTarget::Follower(idx) => self
                .followers
                .get(idx)
                .map(|f| f.name.as_str())
                .unwrap_or("Follower"),
        }
    }

    /// Restore HP/MP on one member, honoring temporary max-HP bonuses for
    /// the player. Returns the amounts actually restored.
    pub fn restore_member(&mut self, target: TeamTarget, hp: i32, mp: i32) -> (i32, i32) {
        match target {
            TeamTarget::Player => {
                let ceiling = self.total_max_hp();
                (self.hp.restore_within(hp, ceiling), self.mp.restore(mp))
            }
            TeamTarget::Follower(idx) => match self.followers.get_mut(idx) {
                Some(f) => (f.hp.restore(hp), f.mp.restore(mp)),
                None => (0, 0),
            },
        }
    }

    /// Consume one `key` on `target`.
    pub fn use_item(&mut self, key: &str, item: Option<&ItemDef>, target: TeamTarget) -> String {
        let Some(item) = item else {
            return "That item is not available.".to_string();
        };
        if self.item_count(key) == 0 {
            return "You do not have that item.".to_string();
        }
        if self.team_missing(target, TeamMode::Combined) == 0 {
            return match target {
                TeamTarget::Player => "HP and MP are already full.".to_string(),
                TeamTarget::Follower(_) => {
                    format!("{} is already at full strength.", self.member_name(target))
                }
            };
        }
        self.restore_member(target, item.hp, item.mp);
        self.take_item(key);
        let name = if item.name.is_empty() { key } else { &item.name };
        match target {
            TeamTarget::Player => format!("Used {name}."),
            TeamTarget::Follower(_) => format!("Used {name} on {}.", self.member_name(target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follower::{Follower, FollowerId};

    fn potion() -> ItemDef {
        ItemDef {
            name: "Potion".into(),
            hp: 10,
            ..ItemDef::default()
        }
    }

    #[test]
    fn none_when_everyone_full() {
        let mut p = Player::default();
        p.add_follower(Follower::new(FollowerId(0), "fairy", "Pip"));
        assert_eq!(p.select_team_target(TeamMode::Hp), None);
        p.mp.current = 0;
        assert_eq!(p.select_team_target(TeamMode::Hp), None);
        assert_eq!(p.select_team_target(TeamMode::Combined), Some(TeamTarget::Player));
    }

    #[test]
    fn picks_most_missing_with_player_on_ties() {
        let mut p = Player::default();
        p.add_follower(Follower::new(FollowerId(0), "fairy", "Pip"));
        p.add_follower(Follower::new(FollowerId(0), "wolf", "Fang"));
        p.hp.current -= 3;
        p.follower_mut(0).unwrap().hp.current -= 3;
        assert_eq!(p.select_team_target(TeamMode::Hp), Some(TeamTarget::Player));
        p.follower_mut(1).unwrap().hp.current -= 4;
        assert_eq!(p.select_team_target(TeamMode::Hp), Some(TeamTarget::Follower(1)));
    }

    #[test]
    fn use_item_messages() {
        let mut p = Player::default();
        assert_eq!(
            p.use_item("potion", None, TeamTarget::Player),
            "That item is not available."
        );
        assert_eq!(
            p.use_item("potion", Some(&potion()), TeamTarget::Player),
            "You do not have that item."
        );
        p.add_item("potion", 1);
        assert_eq!(
            p.use_item("potion", Some(&potion()), TeamTarget::Player),
            "HP and MP are already full."
        );
        assert_eq!(p.item_count("potion"), 1);
        p.hp.current = 45;
        assert_eq!(p.use_item("potion", Some(&potion()), TeamTarget::Player), "Used Potion.");
        assert_eq!(p.hp.current, 50);
        assert_eq!(p.item_count("potion"), 0);
    }

    #[test]
    fn use_item_on_follower() {
        let mut p = Player::default();
        p.add_follower(Follower::new(FollowerId(0), "fairy", "Pip"));
        p.follower_mut(0).unwrap().hp.current = 2;
        p.add_item("potion", 1);
        let target = p.select_team_target(TeamMode::Combined).unwrap();
        assert_eq!(target, TeamTarget::Follower(0));
        assert_eq!(p.use_item("potion", Some(&potion()), target), "Used Potion on Pip.");
        assert_eq!(p.followers()[0].hp.current, 12);
    }
}

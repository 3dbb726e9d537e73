//! XP, levels and stat allocation for the player.

use rand::Rng;

use crate::element::Stat;

use super::Player;

/// Stat points granted per level.
pub const STAT_POINTS_PER_LEVEL: u32 = 10;

/// XP at which a player of `level` levels up: `level * 50`.
pub fn xp_threshold(level: u32) -> u32 {
    level.saturating_mul(50)
}

/// A decision taken on the level-up screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelUpChoice {
    /// Put one point into a stat.
    Spend(Stat),
    /// Split the points evenly.
    Balanced,
    /// Scatter the points at random.
    Random,
    /// Keep the points for later.
    Bank,
}

impl Player {
    /// Add XP and level up as many times as it covers. XP is cumulative.
    /// Returns the number of levels gained.
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= xp_threshold(self.level) {
            self.level += 1;
            self.stat_points += STAT_POINTS_PER_LEVEL;
            gained += 1;
        }
        gained
    }

    /// Returns true while unspent stat points remain.
    pub fn needs_level_up(&self) -> bool {
        self.stat_points > 0
    }

    /// Raise one stat by a point without touching the pool.
    pub fn apply_stat_point(&mut self, stat: Stat) {
        self.apply_stat_points(stat, 1);
    }

    fn apply_stat_points(&mut self, stat: Stat, n: i32) {
        match stat {
            Stat::Hp => self.hp.raise_max(n),
            Stat::Mp => self.mp.raise_max(n),
            Stat::Atk => self.atk += n,
            Stat::Def => self.defense += n,
        }
    }

    /// Spend one pooled point. Returns false if the pool is empty.
    pub fn spend_stat_point(&mut self, stat: Stat) -> bool {
        if self.stat_points == 0 {
            return false;
        }
        self.stat_points -= 1;
        self.apply_stat_point(stat);
        true
    }

    /// Spread the pool evenly; the remainder goes to HP, MP, ATK, DEF in
    /// that order.
    pub fn allocate_balanced(&mut self) {
        let points = self.stat_points;
        let (per_stat, remainder) = (points / 4, points % 4);
        for (i, stat) in Stat::ALL.into_iter().enumerate() {
            let extra = u32::from((i as u32) < remainder);
            self.apply_stat_points(stat, (per_stat + extra) as i32);
        }
        self.stat_points = 0;
    }

    /// Spend the pool one point at a time on uniformly random stats.
    pub fn allocate_random<R: Rng>(&mut self, rng: &mut R) {
        while self.stat_points > 0 {
            let stat = Stat::ALL[rng.random_range(0..Stat::ALL.len())];
            self.apply_stat_point(stat);
            self.stat_points -= 1;
        }
    }

    /// Close the level-up screen: refill HP and MP.
    pub fn finish_level_up(&mut self) {
        self.hp.fill();
        self.mp.fill();
    }

    /// Apply one level-up decision. `None` is any input the level-up screen
    /// does not understand. Returns the message and whether leveling is
    /// over.
    pub fn handle_level_up_input<R: Rng>(
        &mut self,
        choice: Option<LevelUpChoice>,
        rng: &mut R,
    ) -> (String, bool) {
        let message = match choice {
            Some(LevelUpChoice::Balanced) => {
                self.allocate_balanced();
                "Balanced allocation complete.".to_string()
            }
            Some(LevelUpChoice::Random) => {
                self.allocate_random(rng);
                "Random allocation complete.".to_string()
            }
            Some(LevelUpChoice::Bank) => {
                self.finish_level_up();
                return ("Stat points banked.".to_string(), true);
            }
            Some(LevelUpChoice::Spend(stat)) => {
                if self.spend_stat_point(stat) {
                    format!("{stat} increased by 1.")
                } else {
                    "No stat points to spend.".to_string()
                }
            }
            None => return ("Spend all stat points to continue.".to_string(), false),
        };
        if self.stat_points == 0 {
            self.finish_level_up();
            return ("Level up complete.".to_string(), true);
        }
        (message, false)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn multi_level_gain() {
        let mut p = Player::default();
        assert_eq!(p.gain_xp(49), 0);
        assert_eq!(p.gain_xp(1), 1);
        assert_eq!(p.level, 2);
        assert_eq!(p.gain_xp(199), 3);
        assert_eq!(p.level, 5);
        assert_eq!(p.xp, 249);
        assert_eq!(p.stat_points, 40);
    }

    #[test]
    fn spend_raises_gauge_max() {
        let mut p = Player::default();
        p.stat_points = 2;
        let mut rng = StdRng::seed_from_u64(0);
        let (msg, done) = p.handle_level_up_input(Some(LevelUpChoice::Spend(Stat::Hp)), &mut rng);
        assert_eq!((msg.as_str(), done), ("HP increased by 1.", false));
        assert_eq!(p.hp.max, 51);
        let (msg, done) = p.handle_level_up_input(Some(LevelUpChoice::Spend(Stat::Def)), &mut rng);
        assert_eq!((msg.as_str(), done), ("Level up complete.", true));
        assert_eq!(p.defense, 6);
    }

    #[test]
    fn unknown_input_keeps_screen_open() {
        let mut p = Player::default();
        p.stat_points = 3;
        let mut rng = StdRng::seed_from_u64(0);
        let (msg, done) = p.handle_level_up_input(None, &mut rng);
        assert_eq!(msg, "Spend all stat points to continue.");
        assert!(!done);
        assert_eq!(p.stat_points, 3);
    }

    #[test]
    fn bank_keeps_points_and_refills() {
        let mut p = Player::default();
        p.stat_points = 10;
        p.hp.current = 1;
        let mut rng = StdRng::seed_from_u64(0);
        let (msg, done) = p.handle_level_up_input(Some(LevelUpChoice::Bank), &mut rng);
        assert_eq!(msg, "Stat points banked.");
        assert!(done);
        assert_eq!(p.stat_points, 10);
        assert!(p.hp.is_full());
    }

    #[test]
    fn random_spends_everything() {
        let mut p = Player::default();
        p.stat_points = 10;
        let before = p.hp.max + p.mp.max + p.atk + p.defense;
        let mut rng = StdRng::seed_from_u64(9);
        let (msg, done) = p.handle_level_up_input(Some(LevelUpChoice::Random), &mut rng);
        assert_eq!(msg, "Level up complete.");
        assert!(done);
        assert_eq!(p.hp.max + p.mp.max + p.atk + p.defense - before, 10);
    }

    proptest! {
        #[test]
        fn balanced_split(n in 0u32..200) {
            let mut p = Player::default();
            p.stat_points = n;
            p.allocate_balanced();
            let q = (n / 4) as i32;
            let r = n % 4;
            prop_assert_eq!(p.hp.max, 50 + q + i32::from(r > 0));
            prop_assert_eq!(p.mp.max, 10 + q + i32::from(r > 1));
            prop_assert_eq!(p.atk, 5 + q + i32::from(r > 2));
            prop_assert_eq!(p.defense, 5 + q);
            prop_assert_eq!(p.stat_points, 0);
        }
    }
}

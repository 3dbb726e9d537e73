//! Configuration for a Mossvale session.

use std::path::PathBuf;

use mv_mechanics::CombatOdds;

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// RNG seed; a session replays exactly from its seed and inputs.
    pub seed: u64,
    /// Save directory. `None` keeps saves in memory.
    pub save_dir: Option<PathBuf>,
    /// Number of save slots.
    pub max_slots: u32,
    /// Directory with catalog overrides.
    pub data_dir: Option<PathBuf>,
    /// Lines kept in the battle log.
    pub battle_log_lines: usize,
    /// Chance that any attack misses.
    pub miss_chance: f64,
    /// Chance that a hit is critical.
    pub crit_chance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            save_dir: None,
            max_slots: 100,
            data_dir: None,
            battle_log_lines: 7,
            miss_chance: 0.10,
            crit_chance: 0.15,
        }
    }
}

impl SessionConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Store saves as JSON files in `dir`.
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    /// Set the number of save slots (at least 1).
    pub fn with_max_slots(mut self, slots: u32) -> Self {
        self.max_slots = slots.max(1);
        self
    }

    /// Override catalogs from `dir`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the battle log length (at least 1).
    pub fn with_battle_log_lines(mut self, lines: usize) -> Self {
        self.battle_log_lines = lines.max(1);
        self
    }

    /// Set miss and crit chances (each clamped to 0-1).
    pub fn with_odds(mut self, miss: f64, crit: f64) -> Self {
        self.miss_chance = miss.clamp(0.0, 1.0);
        self.crit_chance = crit.clamp(0.0, 1.0);
        self
    }

    /// The combat odds this configuration describes.
    pub fn odds(&self) -> CombatOdds {
        CombatOdds {
            miss_chance: self.miss_chance,
            crit_chance: self.crit_chance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.max_slots, 100);
        assert_eq!(cfg.battle_log_lines, 7);
        assert!(cfg.save_dir.is_none());
        assert_eq!(cfg.odds(), CombatOdds::default());
    }

    #[test]
    fn builder_methods() {
        let cfg = SessionConfig::default()
            .with_seed(7)
            .with_max_slots(3)
            .with_battle_log_lines(4)
            .with_save_dir("/tmp/mossvale");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.max_slots, 3);
        assert_eq!(cfg.battle_log_lines, 4);
        assert_eq!(cfg.save_dir.as_deref(), Some(std::path::Path::new("/tmp/mossvale")));
    }

    #[test]
    fn limits_clamped() {
        let cfg = SessionConfig::default()
            .with_max_slots(0)
            .with_battle_log_lines(0)
            .with_odds(-1.0, 2.0);
        assert_eq!(cfg.max_slots, 1);
        assert_eq!(cfg.battle_log_lines, 1);
        assert_eq!(cfg.miss_chance, 0.0);
        assert_eq!(cfg.crit_chance, 1.0);
    }
}

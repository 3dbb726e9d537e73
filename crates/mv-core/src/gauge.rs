//! Clamped resources (HP, MP).
//!
//! A gauge holds a current value between 0 and a maximum. Temporary
//! bonuses live outside the gauge, so callers that honor them pass an
//! explicit ceiling to [`Gauge::restore_within`].

use serde::{Deserialize, Serialize};

/// A current/max pair clamped to `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    /// Current value.
    pub current: i32,
    /// Maximum value.
    pub max: i32,
}

impl Gauge {
    /// Create a full gauge.
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Create a gauge with an explicit current value, clamped to `0..=max`.
    pub fn with_current(current: i32, max: i32) -> Self {
        Self {
            current: current.clamp(0, max.max(0)),
            max,
        }
    }

    /// Returns true if the gauge is at or above its maximum.
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Returns true if the gauge is at zero.
    pub fn is_empty(&self) -> bool {
        self.current <= 0
    }

    /// Points missing from the maximum.
    pub fn missing(&self) -> i32 {
        (self.max - self.current).max(0)
    }

    /// Refill to the maximum.
    pub fn fill(&mut self) {
        self.current = self.max;
    }

    /// Restore up to `amount`, capped at the maximum. Returns the amount restored.
    pub fn restore(&mut self, amount: i32) -> i32 {
        self.restore_within(amount, self.max)
    }

    /// Restore up to `amount`, capped at `ceiling`. Returns the amount restored.
    pub fn restore_within(&mut self, amount: i32, ceiling: i32) -> i32 {
        if amount <= 0 || self.current >= ceiling {
            return 0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(ceiling);
        self.current - before
    }

    /// Subtract `amount`, flooring at zero. Returns the new value.
    pub fn drain(&mut self, amount: i32) -> i32 {
        self.current = (self.current - amount).max(0);
        self.current
    }

    /// Raise the maximum and the current value together.
    pub fn raise_max(&mut self, delta: i32) {
        self.max += delta;
        self.current += delta;
    }

    /// Lower the current value to `ceiling` if it exceeds it.
    pub fn clamp_to(&mut self, ceiling: i32) {
        if self.current > ceiling {
            self.current = ceiling.max(0);
        }
    }

    /// Returns the filled fraction (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.max <= 0 {
            return 1.0;
        }
        f64::from(self.current) / f64::from(self.max)
    }
}

impl std::fmt::Display for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_full() {
        let g = Gauge::new(10);
        assert!(g.is_full());
        assert!(!g.is_empty());
        assert_eq!(g.missing(), 0);
    }

    #[test]
    fn with_current_clamps() {
        assert_eq!(Gauge::with_current(50, 10).current, 10);
        assert_eq!(Gauge::with_current(-3, 10).current, 0);
    }

    #[test]
    fn restore_caps_at_max() {
        let mut g = Gauge::with_current(4, 10);
        assert_eq!(g.restore(20), 6);
        assert!(g.is_full());
        assert_eq!(g.restore(5), 0);
    }

    #[test]
    fn restore_within_honors_ceiling() {
        let mut g = Gauge::with_current(10, 10);
        assert_eq!(g.restore_within(5, 13), 3);
        assert_eq!(g.current, 13);
    }

    #[test]
    fn drain_floors_at_zero() {
        let mut g = Gauge::new(5);
        assert_eq!(g.drain(3), 2);
        assert_eq!(g.drain(9), 0);
        assert!(g.is_empty());
    }

    #[test]
    fn raise_max_moves_both() {
        let mut g = Gauge::with_current(3, 10);
        g.raise_max(1);
        assert_eq!(g, Gauge { current: 4, max: 11 });
    }

    #[test]
    fn fraction_and_display() {
        let g = Gauge::with_current(5, 10);
        assert!((g.fraction() - 0.5).abs() < f64::EPSILON);
        assert_eq!(g.to_string(), "5/10");
    }
}

//! The rolling battle log shown in the forest.

use std::collections::VecDeque;

/// A bounded log that drops the oldest line when full and never holds
/// the same line twice in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for BattleLog {
    fn default() -> Self {
        Self::new(7)
    }
}

impl BattleLog {
    /// An empty log holding at most `capacity` lines (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line. Empty lines and repeats of the last line are
    /// dropped. Returns true if the line was added.
    pub fn push(&mut self, line: impl Into<String>) -> bool {
        let line = line.into();
        if line.is_empty() || self.lines.back() == Some(&line) {
            return false;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        true
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of lines held.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Maximum number of lines.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

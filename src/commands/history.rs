use std::collections::VecDeque;

use chrono::{DateTime, Local};

const DEFAULT_CAPACITY: usize = 64;

/// One executed command as remembered by the history: when it ran and its
/// human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub at: DateTime<Local>,
    pub summary: String,
}

/// Bounded in-memory record of executed commands, oldest evicted first.
/// Exists to give recognizers recent-command context; nothing is persisted.
#[derive(Debug)]
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CommandHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, summary: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            at: Local::now(),
            summary: summary.into(),
        });
    }

    /// The most recent `n` entries, oldest of those first.
    pub fn last_n(&self, n: usize) -> Vec<&HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

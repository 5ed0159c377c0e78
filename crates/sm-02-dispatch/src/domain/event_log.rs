//! Bounded operational history shown on the dashboard.

use std::collections::VecDeque;

use serde::Serialize;

/// Entries retained before the oldest is evicted.
pub const EVENT_LOG_CAPACITY: usize = 20;

/// FIFO ring of human-readable events, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: VecDeque<String>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, evicting the oldest once the bound is exceeded.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        while self.entries.len() > EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }
}

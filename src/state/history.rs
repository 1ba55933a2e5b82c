// Event history log
// Bounded, newest-first list of dispatched alerts, persisted as one JSON blob

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::events::types::TriggerKind;
use crate::state::storage::KeyValueStore;

/// Storage key holding the serialized log
pub const HISTORY_KEY: &str = "@event_history";

/// Maximum number of entries kept
pub const HISTORY_CAPACITY: usize = 50;

/// Largest capacity a configuration may ask for
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Title used when the event name is not a known kind
const FALLBACK_TITLE: &str = "Событие";
const FALLBACK_ICON: &str = "notifications";

/// A user-visible record of a past dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Dispatch time in epoch milliseconds
    pub id: String,
    pub title: String,
    pub icon: String,
    pub color: String,
    /// Local wall-clock time, "HH:MM"
    pub time: String,
}

impl HistoryEntry {
    /// Build the entry for an event dispatched at `at`
    /// `event` is a wire name; unknown names get a generic title and icon.
    pub fn for_event(event: &str, color: &str, at: DateTime<Utc>) -> Self {
        let (title, icon) = match TriggerKind::from_string(event) {
            Some(kind) => (kind.display_name(), kind.icon()),
            None => (FALLBACK_TITLE, FALLBACK_ICON),
        };

        HistoryEntry {
            id: at.timestamp_millis().to_string(),
            title: title.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            time: at.with_timezone(&Local).format("%H:%M").to_string(),
        }
    }
}

/// Bounded, newest-first history
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HistoryLog {
            entries: VecDeque::with_capacity(capacity.min(HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Build a log from entries ordered newest-first, truncating to capacity
    pub fn from_entries(entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        let mut entries: VecDeque<HistoryEntry> = entries.into();
        entries.truncate(capacity);
        HistoryLog { entries, capacity }
    }

    /// Prepend an entry, evicting the oldest past capacity
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries newest-first
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// The `n` newest entries
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    /// Parse a persisted log; malformed data yields an empty log
    pub fn from_json(data: &str, capacity: usize) -> Self {
        match serde_json::from_str::<Vec<HistoryEntry>>(data) {
            Ok(entries) => Self::from_entries(entries, capacity),
            Err(e) => {
                log::warn!("Discarding malformed event history: {}", e);
                Self::with_capacity(capacity)
            }
        }
    }

    /// Load the log stored under `key`; missing or unreadable data yields an empty log
    pub fn load(store: &dyn KeyValueStore, key: &str, capacity: usize) -> Self {
        match store.get_item(key) {
            Ok(Some(data)) => {
                let log = Self::from_json(&data, capacity);
                log::info!("Loaded {} history entries", log.len());
                log
            }
            Ok(None) => Self::with_capacity(capacity),
            Err(e) => {
                log::error!("Failed to read event history: {}", e);
                Self::with_capacity(capacity)
            }
        }
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

// State management module
// Trigger settings, event history, and local persistence

pub mod db;
pub mod history;
pub mod persist;
pub mod registry;
pub mod settings;
pub mod storage;

pub use db::{init_db, DbConnection};
pub use history::{HistoryEntry, HistoryLog, HISTORY_CAPACITY, HISTORY_KEY};
pub use persist::{BackgroundPersister, HistoryPersister, InlinePersister};
pub use registry::{TriggerConfig, TriggerRegistry, PALETTE};
pub use settings::{Settings, SettingsHandle};
pub use storage::{KeyValueStore, MemoryStore, StorageError};

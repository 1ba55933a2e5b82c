// History persistence workers
// Writes the serialized history log to storage without failing the caller

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::state::storage::KeyValueStore;

/// Sink for whole-log snapshots
/// Implementations log and swallow storage errors.
pub trait HistoryPersister: Send {
    /// Store `json` under the persister's key
    fn persist(&self, json: String);
}

/// Writes synchronously on the calling thread
pub struct InlinePersister {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl InlinePersister {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        InlinePersister {
            store,
            key: key.into(),
        }
    }
}

impl HistoryPersister for InlinePersister {
    fn persist(&self, json: String) {
        if let Err(e) = self.store.set_item(&self.key, &json) {
            log::error!("Failed to persist event history: {}", e);
        }
    }
}

/// Writes on a dedicated thread, in submission order
/// Dropping the persister drains pending writes before returning.
pub struct BackgroundPersister {
    sender: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundPersister {
    pub fn spawn(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (sender, receiver) = mpsc::channel::<String>();

        let worker = thread::spawn(move || {
            while let Ok(mut json) = receiver.recv() {
                // Only the newest snapshot matters; skip any that queued up behind it
                while let Ok(newer) = receiver.try_recv() {
                    json = newer;
                }
                if let Err(e) = store.set_item(&key, &json) {
                    log::error!("Failed to persist event history: {}", e);
                }
            }
            log::debug!("History writer stopped");
        });

        BackgroundPersister {
            sender: Some(sender),
            worker: Some(worker),
        }
    }
}

impl HistoryPersister for BackgroundPersister {
    fn persist(&self, json: String) {
        if let Some(sender) = &self.sender {
            if sender.send(json).is_err() {
                log::error!("History writer is gone; snapshot dropped");
            }
        }
    }
}

impl Drop for BackgroundPersister {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue is drained
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("History writer panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::storage::{MemoryStore, StorageError, StorageResult};

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::NoAppDataDir)
        }

        fn remove_item(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_inline_persister_writes() {
        let store = Arc::new(MemoryStore::new());
        let persister = InlinePersister::new(store.clone(), "history");
        persister.persist("[]".to_string());
        assert_eq!(store.get_item("history").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_inline_persister_swallows_errors() {
        let persister = InlinePersister::new(Arc::new(FailingStore), "history");
        persister.persist("[]".to_string());
    }

    #[test]
    fn test_background_persister_keeps_last_write() {
        let store = Arc::new(MemoryStore::new());
        {
            let persister = BackgroundPersister::spawn(store.clone(), "history");
            for i in 0..20 {
                persister.persist(format!("[{}]", i));
            }
        }
        assert_eq!(store.get_item("history").unwrap(), Some("[19]".to_string()));
    }

    #[test]
    fn test_background_persister_swallows_errors() {
        let persister = BackgroundPersister::spawn(Arc::new(FailingStore), "history");
        persister.persist("[]".to_string());
        drop(persister);
    }
}

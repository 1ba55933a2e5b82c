// Shared detection settings
// Threshold, trigger registry and haptic pattern shared between the UI and the monitor

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::events::calibration::Threshold;
use crate::events::types::HapticPattern;
use crate::state::registry::TriggerRegistry;

/// User-editable detection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub threshold: Threshold,
    pub triggers: TriggerRegistry,
    pub haptic_pattern: HapticPattern,
}

impl Settings {
    pub fn with_threshold(threshold: Threshold) -> Self {
        Settings {
            threshold,
            ..Settings::default()
        }
    }
}

// Thread-safe settings handle; writes are last-writer-wins
pub struct SettingsHandle {
    inner: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Settings {
        self.read().clone()
    }

    pub fn threshold(&self) -> Threshold {
        self.read().threshold
    }

    pub fn set_threshold(&self, threshold: Threshold) {
        self.write().threshold = threshold;
    }

    pub fn set_haptic_pattern(&self, pattern: HapticPattern) {
        self.write().haptic_pattern = pattern;
    }

    /// Apply a mutation to the trigger registry
    pub fn update_triggers<R>(&self, f: impl FnOnce(&mut TriggerRegistry) -> R) -> R {
        f(&mut self.write().triggers)
    }
}

impl Clone for SettingsHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

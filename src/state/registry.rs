// Trigger registry
// Per-kind enabled flag and display color, consulted on every dispatch

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::events::types::TriggerKind;

/// Fixed signal color palette: red, green, blue, pink
pub const PALETTE: [&str; 4] = ["#ff0000", "#00e676", "#2979ff", "#e040fb"];

/// Configuration of a single trigger kind
/// `hex` always equals `PALETTE[color_index]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    pub is_active: bool,
    pub color_index: usize,
    pub hex: String,
}

impl TriggerConfig {
    fn with_palette_color(is_active: bool, color_index: usize) -> Self {
        TriggerConfig {
            is_active,
            color_index,
            hex: PALETTE[color_index].to_string(),
        }
    }
}

/// Set of configured trigger kinds
/// Every kind in [`TriggerKind::ALL`] is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerRegistry {
    triggers: BTreeMap<TriggerKind, TriggerConfig>,
}

impl TriggerRegistry {
    /// Factory configuration: baby cry (pink) and doorbell (blue) on, fire alarm (red) off
    pub fn new() -> Self {
        let mut triggers = BTreeMap::new();
        triggers.insert(TriggerKind::BabyCry, TriggerConfig::with_palette_color(true, 3));
        triggers.insert(TriggerKind::Doorbell, TriggerConfig::with_palette_color(true, 2));
        triggers.insert(TriggerKind::FireAlarm, TriggerConfig::with_palette_color(false, 0));
        TriggerRegistry { triggers }
    }

    fn config(&self, kind: TriggerKind) -> Option<&TriggerConfig> {
        self.triggers.get(&kind)
    }

    fn config_mut(&mut self, kind: TriggerKind) -> &mut TriggerConfig {
        self.triggers
            .entry(kind)
            .or_insert_with(|| TriggerConfig::with_palette_color(false, 0))
    }

    pub fn is_enabled(&self, kind: TriggerKind) -> bool {
        self.config(kind).map(|c| c.is_active).unwrap_or(false)
    }

    /// Hex color of a kind
    pub fn color_of(&self, kind: TriggerKind) -> String {
        self.config(kind)
            .map(|c| c.hex.clone())
            .unwrap_or_else(|| PALETTE[0].to_string())
    }

    pub fn get(&self, kind: TriggerKind) -> TriggerConfig {
        self.config(kind)
            .cloned()
            .unwrap_or_else(|| TriggerConfig::with_palette_color(false, 0))
    }

    pub fn set_enabled(&mut self, kind: TriggerKind, enabled: bool) {
        self.config_mut(kind).is_active = enabled;
    }

    /// Pick a palette color for a kind
    /// Ignored while the kind is disabled or when `index` is outside the palette.
    /// Returns whether the color changed.
    pub fn set_color(&mut self, kind: TriggerKind, index: usize) -> bool {
        if !self.is_enabled(kind) {
            return false;
        }
        let Some(hex) = PALETTE.get(index) else {
            log::warn!("Ignoring color index {} for {}", index, kind.to_string());
            return false;
        };
        let config = self.config_mut(kind);
        config.color_index = index;
        config.hex = hex.to_string();
        true
    }

    /// Enabled kinds in enumeration order
    pub fn enabled_kinds(&self) -> Vec<TriggerKind> {
        TriggerKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    /// Kind to dispatch for a detection
    /// The detected kind if enabled, else the first enabled kind, else None.
    pub fn resolve(&self, detected: TriggerKind) -> Option<TriggerKind> {
        if self.is_enabled(detected) {
            Some(detected)
        } else {
            self.enabled_kinds().into_iter().next()
        }
    }
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_configuration() {
        let registry = TriggerRegistry::new();
        assert!(registry.is_enabled(TriggerKind::BabyCry));
        assert!(registry.is_enabled(TriggerKind::Doorbell));
        assert!(!registry.is_enabled(TriggerKind::FireAlarm));
        assert_eq!(registry.color_of(TriggerKind::BabyCry), "#e040fb");
        assert_eq!(registry.color_of(TriggerKind::Doorbell), "#2979ff");
        assert_eq!(registry.color_of(TriggerKind::FireAlarm), "#ff0000");
    }

    #[test]
    fn test_set_color_keeps_hex_consistent() {
        let mut registry = TriggerRegistry::new();
        assert!(registry.set_color(TriggerKind::Doorbell, 1));
        let config = registry.get(TriggerKind::Doorbell);
        assert_eq!(config.color_index, 1);
        assert_eq!(config.hex, PALETTE[1]);
    }

    #[test]
    fn test_set_color_ignored_when_disabled() {
        let mut registry = TriggerRegistry::new();
        assert!(!registry.set_color(TriggerKind::FireAlarm, 2));
        assert_eq!(registry.get(TriggerKind::FireAlarm).color_index, 0);
    }

    #[test]
    fn test_set_color_rejects_out_of_palette() {
        let mut registry = TriggerRegistry::new();
        assert!(!registry.set_color(TriggerKind::BabyCry, 4));
        assert_eq!(registry.get(TriggerKind::BabyCry).color_index, 3);
    }

    #[test]
    fn test_resolve_falls_back_to_first_enabled() {
        let mut registry = TriggerRegistry::new();
        assert_eq!(
            registry.resolve(TriggerKind::FireAlarm),
            Some(TriggerKind::BabyCry)
        );

        registry.set_enabled(TriggerKind::BabyCry, false);
        assert_eq!(
            registry.resolve(TriggerKind::FireAlarm),
            Some(TriggerKind::Doorbell)
        );
        assert_eq!(
            registry.resolve(TriggerKind::Doorbell),
            Some(TriggerKind::Doorbell)
        );

        registry.set_enabled(TriggerKind::Doorbell, false);
        assert_eq!(registry.resolve(TriggerKind::Doorbell), None);
    }

    #[test]
    fn test_serializes_as_kind_map() {
        let registry = TriggerRegistry::new();
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(
            json["babyCry"],
            serde_json::json!({"isActive": true, "colorIndex": 3, "hex": "#e040fb"})
        );
    }
}

// Event detection types
// Defines trigger kinds, level readings, and haptic patterns

use serde::{Deserialize, Serialize};

/// Kinds of acoustic event the detector can report
/// The set is static: kinds are configured, never created or destroyed at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    /// Sustained elevated level well above the threshold
    BabyCry,

    /// Modest one-off threshold crossing
    Doorbell,

    /// Sudden loud spike over the recent window
    FireAlarm,
}

impl TriggerKind {
    /// Fixed enumeration order, used when falling back to the first enabled kind
    pub const ALL: [TriggerKind; 3] = [
        TriggerKind::BabyCry,
        TriggerKind::Doorbell,
        TriggerKind::FireAlarm,
    ];

    /// Parse the wire name (`babyCry`, `doorbell`, `fireAlarm`)
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "babyCry" => Some(TriggerKind::BabyCry),
            "doorbell" => Some(TriggerKind::Doorbell),
            "fireAlarm" => Some(TriggerKind::FireAlarm),
            _ => None,
        }
    }

    /// Wire name used in payloads and persisted settings
    pub fn to_string(&self) -> &'static str {
        match self {
            TriggerKind::BabyCry => "babyCry",
            TriggerKind::Doorbell => "doorbell",
            TriggerKind::FireAlarm => "fireAlarm",
        }
    }

    /// Localized title shown in the event history
    pub fn display_name(&self) -> &'static str {
        match self {
            TriggerKind::BabyCry => "Плач ребенка",
            TriggerKind::Doorbell => "Дверной звонок",
            TriggerKind::FireAlarm => "Пожарная тревога",
        }
    }

    /// Material icon name shown next to history entries
    pub fn icon(&self) -> &'static str {
        match self {
            TriggerKind::BabyCry => "child-care",
            TriggerKind::Doorbell => "doorbell",
            TriggerKind::FireAlarm => "local-fire-department",
        }
    }
}

/// A normalized noise level in [25, 90]
pub type LevelReading = i32;

/// A single vibration pulse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticPulse {
    /// Pulse style as understood by the receiving device ("dot", "dash", ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Pulse length in milliseconds
    pub duration: u32,
}

impl HapticPulse {
    pub fn new(kind: impl Into<String>, duration: u32) -> Self {
        HapticPulse {
            kind: kind.into(),
            duration,
        }
    }
}

/// Ordered sequence of vibration pulses sent with every alert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HapticPattern(pub Vec<HapticPulse>);

impl HapticPattern {
    pub fn new(pulses: Vec<HapticPulse>) -> Self {
        HapticPattern(pulses)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pulses to send: the configured ones, or a single 200ms dot if none are set
    pub fn effective(&self) -> Vec<HapticPulse> {
        if self.0.is_empty() {
            vec![HapticPulse::new("dot", 200)]
        } else {
            self.0.clone()
        }
    }
}

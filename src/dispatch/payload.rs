// Alert payload
// JSON body published to the remote channel for every dispatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::types::{HapticPattern, HapticPulse};

/// Immutable record of one dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPayload {
    /// Event wire name, e.g. "doorbell"
    pub event: String,

    /// Signal color as a hex string
    pub color: String,

    /// Pulses to play on the receiving device, never empty
    pub haptic_pattern: Vec<HapticPulse>,

    /// Creation time in epoch milliseconds
    pub timestamp: i64,
}

impl DispatchPayload {
    pub fn new(event: &str, color: &str, haptics: &HapticPattern, at: DateTime<Utc>) -> Self {
        DispatchPayload {
            event: event.to_string(),
            color: color.to_string(),
            haptic_pattern: haptics.effective(),
            timestamp: at.timestamp_millis(),
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// Level normalization and the recent-level window
// Converts raw metering values into normalized readings

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::events::types::LevelReading;

/// Lowest normalized reading
pub const MIN_LEVEL: LevelReading = 25;

/// Highest normalized reading
pub const MAX_LEVEL: LevelReading = 90;

/// Metering value assumed when the sampler reports none (silence)
pub const SILENT_METERING: f64 = -160.0;

/// Number of recent readings kept for the short-term delta
pub const WINDOW_CAPACITY: usize = 5;

/// Status update delivered by the external level sampler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSample {
    /// Whether the sampler is currently recording
    pub is_active: bool,

    /// Raw decibel-like metering value (typically -160..0)
    #[serde(default, alias = "metering")]
    pub metering_raw_value: Option<f64>,
}

impl LevelSample {
    pub fn new(is_active: bool, metering_raw_value: f64) -> Self {
        LevelSample {
            is_active,
            metering_raw_value: Some(metering_raw_value),
        }
    }

    /// Normalized reading for this sample, treating missing metering as silence
    pub fn reading(&self) -> LevelReading {
        normalize_metering(self.metering_raw_value.unwrap_or(SILENT_METERING))
    }
}

/// clamp(25, 90, round(85 + raw * 0.75))
pub fn normalize_metering(raw: f64) -> LevelReading {
    let scaled = (85.0 + raw * 0.75).round();
    if scaled.is_nan() {
        return MIN_LEVEL;
    }
    (scaled.clamp(MIN_LEVEL as f64, MAX_LEVEL as f64)) as LevelReading
}

/// Fixed-capacity FIFO of the most recent readings
#[derive(Debug, Clone, Default)]
pub struct RecentLevelWindow {
    readings: VecDeque<LevelReading>,
}

impl RecentLevelWindow {
    pub fn new() -> Self {
        RecentLevelWindow {
            readings: VecDeque::with_capacity(WINDOW_CAPACITY + 1),
        }
    }

    /// Build a window from existing readings, oldest first
    pub fn from_readings(readings: &[LevelReading]) -> Self {
        let mut window = Self::new();
        for &reading in readings {
            window.push(reading);
        }
        window
    }

    /// Append a reading, evicting the oldest past capacity
    pub fn push(&mut self, reading: LevelReading) {
        self.readings.push_back(reading);
        while self.readings.len() > WINDOW_CAPACITY {
            self.readings.pop_front();
        }
    }

    /// Oldest reading once the window is full, otherwise `fallback`
    /// A window still filling up after startup has no real prior reading.
    pub fn oldest_or(&self, fallback: LevelReading) -> LevelReading {
        if self.is_full() {
            self.readings.front().copied().unwrap_or(fallback)
        } else {
            fallback
        }
    }

    pub fn is_full(&self) -> bool {
        self.readings.len() >= WINDOW_CAPACITY
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> Vec<LevelReading> {
        self.readings.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_clamps_to_range() {
        assert_eq!(normalize_metering(-160.0), MIN_LEVEL);
        assert_eq!(normalize_metering(0.0), 85);
        assert_eq!(normalize_metering(20.0), MAX_LEVEL);
        assert_eq!(normalize_metering(-40.0), 55);
    }

    #[test]
    fn test_normalize_rounds_half_up() {
        // 85 + (-39.0 * 0.75) = 55.75
        assert_eq!(normalize_metering(-39.0), 56);
        // 85 + (-38.0 * 0.75) = 56.5
        assert_eq!(normalize_metering(-38.0), 57);
    }

    #[test]
    fn test_missing_metering_is_silence() {
        let sample = LevelSample {
            is_active: true,
            metering_raw_value: None,
        };
        assert_eq!(sample.reading(), MIN_LEVEL);
    }

    #[test]
    fn test_sample_deserializes_from_sampler_status() {
        let sample: LevelSample =
            serde_json::from_str(r#"{"isActive": true, "meteringRawValue": -20.0}"#).unwrap();
        assert!(sample.is_active);
        assert_eq!(sample.reading(), 70);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let window = RecentLevelWindow::from_readings(&[30, 31, 32, 33, 34, 35, 36]);
        assert_eq!(window.len(), WINDOW_CAPACITY);
        assert_eq!(window.readings(), vec![32, 33, 34, 35, 36]);
        assert_eq!(window.oldest_or(0), 32);
    }

    #[test]
    fn test_partial_window_uses_fallback() {
        let window = RecentLevelWindow::from_readings(&[60, 61]);
        assert!(!window.is_full());
        assert_eq!(window.oldest_or(45), 45);
    }
}

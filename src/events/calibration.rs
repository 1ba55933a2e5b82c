// Detection threshold and calibration
// The threshold is set from the calibration slider and read on every sample

use serde::{Deserialize, Serialize};

/// Threshold assumed before the user calibrates
pub const DEFAULT_THRESHOLD: u8 = 45;

/// Upper bound of the threshold scale
pub const MAX_THRESHOLD: u8 = 100;

/// Noise level above which a reading may qualify as an event, in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Threshold(u8);

impl Threshold {
    /// Create a threshold, clamping to [0, 100]
    pub fn new(value: i64) -> Self {
        Threshold(value.clamp(0, MAX_THRESHOLD as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Map a vertical slider position to a threshold
    /// `offset` is measured from the top of a track `track_height` tall; the top is 100.
    pub fn from_slider(offset: f64, track_height: f64) -> Self {
        if track_height <= 0.0 || offset.is_nan() {
            return Threshold::default();
        }
        let y = offset.clamp(0.0, track_height);
        let fraction = (track_height - y) / track_height;
        Threshold::new((fraction * MAX_THRESHOLD as f64).round() as i64)
    }

    /// Inverse of [`Threshold::from_slider`], for positioning the handle
    pub fn slider_offset(&self, track_height: f64) -> f64 {
        track_height - (self.0 as f64 / MAX_THRESHOLD as f64) * track_height
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(DEFAULT_THRESHOLD)
    }
}

impl From<i64> for Threshold {
    fn from(value: i64) -> Self {
        Threshold::new(value)
    }
}

impl From<Threshold> for u8 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

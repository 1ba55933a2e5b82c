// Heuristic (rule-based) event classifier
// Classifies threshold crossings using the short-term level delta
// The numeric constants were chosen empirically and are kept as-is for parity
// with deployed devices. This is not a signal-processing algorithm.

use serde::{Deserialize, Serialize};

use crate::events::calibration::Threshold;
use crate::events::level::RecentLevelWindow;
use crate::events::types::{LevelReading, TriggerKind};

/// Which rule produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationRule {
    /// Delta over the recent window reached the spike limit
    Spike,

    /// Reading sits well above the threshold
    Sustained,

    /// Any other crossing
    Crossing,
}

impl ClassificationRule {
    /// Kind reported for this rule
    pub fn kind(&self) -> TriggerKind {
        match self {
            ClassificationRule::Spike => TriggerKind::FireAlarm,
            ClassificationRule::Sustained => TriggerKind::BabyCry,
            ClassificationRule::Crossing => TriggerKind::Doorbell,
        }
    }
}

/// A threshold crossing and its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    pub kind: TriggerKind,

    /// Reading that crossed the threshold
    pub reading: LevelReading,

    /// Threshold in effect for this reading
    pub threshold: u8,

    /// reading minus the oldest windowed reading (or the threshold during startup)
    pub delta: i32,

    pub rule: ClassificationRule,
}

/// Rule constants for the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum delta over the window that counts as a spike
    pub spike_delta: i32,

    /// Margin above the threshold that counts as sustained
    pub sustained_margin: i32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            spike_delta: 20,
            sustained_margin: 15,
        }
    }
}

/// Rule-based classifier over normalized level readings
/// Owns the recent-level window; readings must be fed serially.
#[derive(Debug, Clone, Default)]
pub struct EventClassifier {
    config: ClassifierConfig,
    window: RecentLevelWindow,
}

impl EventClassifier {
    /// Create a new classifier with default configuration
    pub fn new() -> Self {
        EventClassifier {
            config: ClassifierConfig::default(),
            window: RecentLevelWindow::new(),
        }
    }

    /// Create a classifier with custom configuration
    pub fn with_config(config: ClassifierConfig) -> Self {
        EventClassifier {
            config,
            window: RecentLevelWindow::new(),
        }
    }

    /// Create a classifier seeded with prior readings, oldest first
    pub fn with_history(readings: &[LevelReading]) -> Self {
        EventClassifier {
            config: ClassifierConfig::default(),
            window: RecentLevelWindow::from_readings(readings),
        }
    }

    /// Feed one reading and classify it against the threshold
    /// The reading is always recorded in the window, even below threshold.
    /// Readings must already be clamped to [25, 90].
    pub fn classify(
        &mut self,
        reading: LevelReading,
        threshold: Threshold,
    ) -> Option<ClassifiedEvent> {
        classify(reading, threshold, &mut self.window, &self.config)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn window(&self) -> &RecentLevelWindow {
        &self.window
    }
}

/// Push `reading` into `window` and classify it
pub fn classify(
    reading: LevelReading,
    threshold: Threshold,
    window: &mut RecentLevelWindow,
    config: &ClassifierConfig,
) -> Option<ClassifiedEvent> {
    window.push(reading);

    let limit = threshold.value() as LevelReading;
    if reading < limit {
        return None;
    }

    let delta = reading - window.oldest_or(limit);

    // First match wins
    let rule = if delta >= config.spike_delta {
        ClassificationRule::Spike
    } else if reading > limit + config.sustained_margin {
        ClassificationRule::Sustained
    } else {
        ClassificationRule::Crossing
    };

    Some(ClassifiedEvent {
        kind: rule.kind(),
        reading,
        threshold: threshold.value(),
        delta,
        rule,
    })
}

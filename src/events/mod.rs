// Event detection module
// Level normalization, classification, debouncing, and calibration

pub mod calibration;
pub mod debounce;
pub mod explainability;
pub mod heuristic;
pub mod level;
pub mod types;

pub use calibration::Threshold;
pub use debounce::DebounceGate;
pub use explainability::{DecisionOutcome, DetectionDecision};
pub use heuristic::{ClassificationRule, ClassifiedEvent, ClassifierConfig, EventClassifier};
pub use level::{normalize_metering, LevelSample, RecentLevelWindow};
pub use types::{HapticPattern, HapticPulse, LevelReading, TriggerKind};

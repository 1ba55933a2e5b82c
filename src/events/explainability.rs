// Explainability module
// Records why a sample did or did not turn into an alert

use serde::{Deserialize, Serialize};

use crate::events::heuristic::{ClassificationRule, ClassifiedEvent};
use crate::events::types::TriggerKind;

/// What happened to a classified sample after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "kind", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Dispatched as the detected kind
    Dispatched(TriggerKind),

    /// Detected kind is disabled; the first enabled kind was dispatched instead
    Redirected(TriggerKind),

    /// Inside the cooldown window
    Suppressed,

    /// No kind is enabled
    NoEnabledKind,
}

/// Complete decision information for one classified sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDecision {
    pub reading: i32,
    pub threshold: u8,
    pub delta: i32,
    pub rule: ClassificationRule,
    pub detected: TriggerKind,
    pub outcome: DecisionOutcome,
    pub reasoning: String,
}

impl DetectionDecision {
    pub fn new(event: &ClassifiedEvent, outcome: DecisionOutcome) -> Self {
        let mut reason_parts = Vec::new();

        reason_parts.push(format!(
            "Level {} crossed threshold {}.",
            event.reading, event.threshold
        ));

        reason_parts.push(match event.rule {
            ClassificationRule::Spike => format!(
                "Rose by {} over the recent window, classified as {}.",
                event.delta,
                event.kind.to_string()
            ),
            ClassificationRule::Sustained => format!(
                "Well above threshold (delta {}), classified as {}.",
                event.delta,
                event.kind.to_string()
            ),
            ClassificationRule::Crossing => format!(
                "Modest crossing (delta {}), classified as {}.",
                event.delta,
                event.kind.to_string()
            ),
        });

        reason_parts.push(match outcome {
            DecisionOutcome::Dispatched(kind) => format!("Dispatched {}.", kind.to_string()),
            DecisionOutcome::Redirected(kind) => format!(
                "{} is disabled; dispatched first enabled kind {}.",
                event.kind.to_string(),
                kind.to_string()
            ),
            DecisionOutcome::Suppressed => "Suppressed by cooldown.".to_string(),
            DecisionOutcome::NoEnabledKind => "No trigger kind is enabled.".to_string(),
        });

        DetectionDecision {
            reading: event.reading,
            threshold: event.threshold,
            delta: event.delta,
            rule: event.rule,
            detected: event.kind,
            outcome,
            reasoning: reason_parts.join(" "),
        }
    }

    /// Kind actually sent out, if any
    pub fn dispatched_kind(&self) -> Option<TriggerKind> {
        match self.outcome {
            DecisionOutcome::Dispatched(kind) | DecisionOutcome::Redirected(kind) => Some(kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doorbell_event() -> ClassifiedEvent {
        ClassifiedEvent {
            kind: TriggerKind::Doorbell,
            reading: 58,
            threshold: 45,
            delta: 13,
            rule: ClassificationRule::Crossing,
        }
    }

    #[test]
    fn test_redirect_is_explained() {
        let decision = DetectionDecision::new(
            &doorbell_event(),
            DecisionOutcome::Redirected(TriggerKind::BabyCry),
        );
        assert_eq!(decision.dispatched_kind(), Some(TriggerKind::BabyCry));
        assert!(decision.reasoning.contains("doorbell is disabled"));
        assert!(decision.reasoning.contains("babyCry"));
    }

    #[test]
    fn test_suppressed_has_no_dispatch() {
        let decision = DetectionDecision::new(&doorbell_event(), DecisionOutcome::Suppressed);
        assert_eq!(decision.dispatched_kind(), None);
        assert!(decision.reasoning.ends_with("Suppressed by cooldown."));
    }
}

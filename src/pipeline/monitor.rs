// Monitoring pipeline
// Sampler callback -> classifier -> debounce gate -> trigger lookup -> dispatcher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::dispatch::{DispatchResult, Dispatcher, Publisher};
use crate::events::calibration::Threshold;
use crate::events::debounce::DebounceGate;
use crate::events::explainability::{DecisionOutcome, DetectionDecision};
use crate::events::heuristic::{ClassifierConfig, EventClassifier};
use crate::events::level::LevelSample;
use crate::events::types::LevelReading;
use crate::state::history::HistoryLog;
use crate::state::persist::BackgroundPersister;
use crate::state::settings::SettingsHandle;
use crate::state::storage::KeyValueStore;

/// Lifecycle of the monitoring session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Not listening; samples are dropped
    Idle,

    /// Samples are classified and dispatched
    Listening,

    /// The sampler could not start (e.g. microphone permission denied)
    Unavailable { reason: String },
}

/// Snapshot of the monitor for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub session: SessionState,
    pub last_reading: Option<LevelReading>,
    pub threshold: Threshold,
    pub connected: bool,
    pub history_len: usize,
}

/// The single serially-invoked detection component
/// Window and cooldown state live here and are only touched by `on_sample`.
pub struct Monitor {
    settings: SettingsHandle,
    classifier: EventClassifier,
    gate: DebounceGate,
    dispatcher: Dispatcher,
    session: SessionState,
    last_reading: Option<LevelReading>,
}

impl Monitor {
    pub fn new(
        settings: SettingsHandle,
        dispatcher: Dispatcher,
        classifier: ClassifierConfig,
        cooldown_ms: i64,
    ) -> Self {
        Monitor {
            settings,
            classifier: EventClassifier::with_config(classifier),
            gate: DebounceGate::new(cooldown_ms),
            dispatcher,
            session: SessionState::Idle,
            last_reading: None,
        }
    }

    /// Build a monitor that loads history from `store` and persists in the background
    pub fn open(
        config: &AppConfig,
        settings: SettingsHandle,
        publisher: Box<dyn Publisher>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let history =
            HistoryLog::load(store.as_ref(), &config.history_key, config.history_capacity);
        let persister = BackgroundPersister::spawn(store, config.history_key.clone());
        let dispatcher = Dispatcher::new(
            publisher,
            Box::new(persister),
            history,
            config.topic.clone(),
        );
        Monitor::new(
            settings,
            dispatcher,
            config.classifier.clone(),
            config.cooldown_ms,
        )
    }

    /// Begin listening with a fresh level window
    /// The cooldown carries over from earlier sessions.
    pub fn start(&mut self) {
        self.classifier = EventClassifier::with_config(self.classifier.config().clone());
        self.last_reading = None;
        self.session = SessionState::Listening;
        log::info!("Monitoring started");
    }

    /// Stop listening; samples delivered after this returns are ignored
    pub fn stop(&mut self) {
        if self.session == SessionState::Listening {
            log::info!("Monitoring stopped");
        }
        self.session = SessionState::Idle;
    }

    /// Record that the sampler could not start
    pub fn report_unavailable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Level sampler unavailable: {}", reason);
        self.session = SessionState::Unavailable { reason };
    }

    /// Handle one sampler status update
    /// Returns a decision for every threshold crossing, dispatched or not.
    pub fn on_sample(
        &mut self,
        sample: &LevelSample,
        now: DateTime<Utc>,
    ) -> Option<DetectionDecision> {
        if self.session != SessionState::Listening || !sample.is_active {
            return None;
        }

        let reading = sample.reading();
        self.last_reading = Some(reading);

        let settings = self.settings.snapshot();
        let event = self.classifier.classify(reading, settings.threshold)?;

        if !self.gate.allow(now.timestamp_millis()) {
            return Some(DetectionDecision::new(&event, DecisionOutcome::Suppressed));
        }

        let outcome = match self.dispatcher.dispatch_detected(event.kind, &settings, now) {
            Some((kind, _)) if kind == event.kind => DecisionOutcome::Dispatched(kind),
            Some((kind, _)) => DecisionOutcome::Redirected(kind),
            None => DecisionOutcome::NoEnabledKind,
        };

        let decision = DetectionDecision::new(&event, outcome);
        log::debug!("{}", decision.reasoning);
        Some(decision)
    }

    /// Dispatch an alert directly, bypassing detection and cooldown
    pub fn trigger_alarm(
        &mut self,
        event: &str,
        color: &str,
        now: DateTime<Utc>,
    ) -> DispatchResult {
        let haptics = self.settings.read().haptic_pattern.clone();
        self.dispatcher.dispatch_event(event, color, &haptics, now)
    }

    pub fn history(&self) -> &HistoryLog {
        self.dispatcher.history()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.dispatcher.is_connected()
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            session: self.session.clone(),
            last_reading: self.last_reading,
            threshold: self.settings.threshold(),
            connected: self.dispatcher.is_connected(),
            history_len: self.dispatcher.history().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::PublishError;
    use crate::events::types::TriggerKind;
    use crate::state::history::{HISTORY_CAPACITY, HISTORY_KEY};
    use crate::state::persist::InlinePersister;
    use crate::state::storage::MemoryStore;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingPublisher {
        sent: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    impl Publisher for RecordingPublisher {
        fn is_connected(&self) -> bool {
            true
        }

        fn publish(&self, _topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
            let body: serde_json::Value = serde_json::from_slice(&payload)
                .map_err(|e| PublishError::Rejected(e.to_string()))?;
            self.sent.lock().unwrap().push(body);
            Ok(())
        }
    }

    struct Harness {
        monitor: Monitor,
        publisher: RecordingPublisher,
        store: Arc<MemoryStore>,
    }

    fn harness() -> Harness {
        harness_with(ClassifierConfig::default())
    }

    fn harness_with(classifier: ClassifierConfig) -> Harness {
        let publisher = RecordingPublisher::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(
            Box::new(publisher.clone()),
            Box::new(InlinePersister::new(store.clone(), HISTORY_KEY)),
            HistoryLog::new(),
            "neurosense/demo/cmd",
        );
        let mut monitor = Monitor::new(SettingsHandle::default(), dispatcher, classifier, 5000);
        monitor.start();
        Harness {
            monitor,
            publisher,
            store,
        }
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    /// Raw metering that normalizes to `level`
    fn sample_for(level: i32) -> LevelSample {
        LevelSample::new(true, (level as f64 - 85.0) / 0.75)
    }

    /// Fill the window just below the default threshold of 45
    fn settle(monitor: &mut Monitor) {
        for i in 0..5 {
            assert!(monitor.on_sample(&sample_for(44), at(i)).is_none());
        }
    }

    #[test]
    fn test_sample_for_normalizes_exactly() {
        for level in 25..=90 {
            assert_eq!(sample_for(level).reading(), level);
        }
    }

    #[test]
    fn test_quiet_room_dispatches_nothing() {
        let mut h = harness();
        for i in 0..50 {
            assert!(h.monitor.on_sample(&sample_for(30), at(i * 200)).is_none());
        }
        assert!(h.monitor.history().is_empty());
        assert_eq!(h.monitor.status().last_reading, Some(30));
    }

    #[test]
    fn test_sustained_crossing_dispatches_baby_cry() {
        let mut h = harness();
        settle(&mut h.monitor);

        let decision = h.monitor.on_sample(&sample_for(61), at(1_000)).unwrap();
        assert_eq!(decision.detected, TriggerKind::BabyCry);
        assert_eq!(
            decision.outcome,
            DecisionOutcome::Dispatched(TriggerKind::BabyCry)
        );

        let sent = h.publisher.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["event"], "babyCry");
        assert_eq!(sent[0]["color"], "#e040fb");
        assert_eq!(h.monitor.history().all()[0].title, "Плач ребенка");
    }

    #[test]
    fn test_cooldown_between_dispatches() {
        let mut h = harness();
        settle(&mut h.monitor);

        assert!(h.monitor.on_sample(&sample_for(58), at(10_000)).is_some());
        let second = h.monitor.on_sample(&sample_for(58), at(13_000)).unwrap();
        assert_eq!(second.outcome, DecisionOutcome::Suppressed);
        assert_eq!(h.monitor.history().len(), 1);

        h.monitor.on_sample(&sample_for(58), at(16_000)).unwrap();
        assert_eq!(h.monitor.history().len(), 2);
        assert_eq!(h.publisher.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_cooldown_is_shared_across_kinds() {
        let mut h = harness();
        h.monitor
            .settings()
            .update_triggers(|t| t.set_enabled(TriggerKind::FireAlarm, true));
        settle(&mut h.monitor);

        let doorbell = h.monitor.on_sample(&sample_for(58), at(10_000)).unwrap();
        assert_eq!(doorbell.detected, TriggerKind::Doorbell);

        let alarm = h.monitor.on_sample(&sample_for(90), at(11_000)).unwrap();
        assert_eq!(alarm.detected, TriggerKind::FireAlarm);
        assert_eq!(alarm.outcome, DecisionOutcome::Suppressed);
    }

    #[test]
    fn test_disabled_kind_redirects_to_first_enabled() {
        let mut h = harness();
        settle(&mut h.monitor);

        // Fire alarm is disabled by default
        let decision = h.monitor.on_sample(&sample_for(70), at(1_000)).unwrap();
        assert_eq!(decision.detected, TriggerKind::FireAlarm);
        assert_eq!(
            decision.outcome,
            DecisionOutcome::Redirected(TriggerKind::BabyCry)
        );
        assert_eq!(h.publisher.sent.lock().unwrap()[0]["event"], "babyCry");
    }

    #[test]
    fn test_all_disabled_leaves_history_unchanged() {
        let mut h = harness();
        h.monitor.settings().update_triggers(|t| {
            for kind in TriggerKind::ALL {
                t.set_enabled(kind, false);
            }
        });
        settle(&mut h.monitor);

        let decision = h.monitor.on_sample(&sample_for(61), at(1_000)).unwrap();
        assert_eq!(decision.outcome, DecisionOutcome::NoEnabledKind);
        assert!(h.monitor.history().is_empty());
        assert!(h.publisher.sent.lock().unwrap().is_empty());
        assert_eq!(h.store.get_item(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_threshold_change_applies_to_next_sample() {
        let mut h = harness();
        settle(&mut h.monitor);
        assert!(h.monitor.on_sample(&sample_for(50), at(500)).is_some());

        let mut h = harness();
        h.monitor.settings().set_threshold(Threshold::new(80));
        settle(&mut h.monitor);
        assert!(h.monitor.on_sample(&sample_for(50), at(500)).is_none());
    }

    #[test]
    fn test_stop_halts_processing() {
        let mut h = harness();
        settle(&mut h.monitor);
        h.monitor.stop();

        assert!(h.monitor.on_sample(&sample_for(90), at(1_000)).is_none());
        assert_eq!(h.monitor.session(), &SessionState::Idle);
        assert!(h.monitor.history().is_empty());
    }

    #[test]
    fn test_inactive_samples_are_ignored() {
        let mut h = harness();
        let inactive = LevelSample::new(false, 0.0);
        assert!(h.monitor.on_sample(&inactive, at(0)).is_none());
        assert_eq!(h.monitor.status().last_reading, None);
    }

    #[test]
    fn test_unavailable_sampler_blocks_classification() {
        let mut h = harness();
        h.monitor.report_unavailable("microphone permission denied");
        assert!(h.monitor.on_sample(&sample_for(90), at(0)).is_none());
        assert_eq!(
            h.monitor.status().session,
            SessionState::Unavailable {
                reason: "microphone permission denied".to_string()
            }
        );

        h.monitor.start();
        assert_eq!(h.monitor.session(), &SessionState::Listening);
    }

    #[test]
    fn test_classifier_constants_survive_restart() {
        let mut h = harness_with(ClassifierConfig {
            spike_delta: 10,
            sustained_margin: 15,
        });
        h.monitor.stop();
        h.monitor.start();
        settle(&mut h.monitor);

        // 55 - 44 = 11 is a spike with the lowered delta; fire alarm is off so it redirects
        let decision = h.monitor.on_sample(&sample_for(55), at(1_000)).unwrap();
        assert_eq!(decision.rule, crate::events::ClassificationRule::Spike);
        assert_eq!(decision.outcome, DecisionOutcome::Redirected(TriggerKind::BabyCry));
    }

    #[test]
    fn test_manual_trigger_ignores_cooldown() {
        let mut h = harness();
        h.monitor.trigger_alarm("doorbell", "#2979ff", at(0));
        h.monitor.trigger_alarm("doorbell", "#2979ff", at(10));
        assert_eq!(h.monitor.history().len(), 2);
    }

    #[test]
    fn test_open_loads_existing_history() {
        let store = Arc::new(MemoryStore::new());
        let mut seeded = HistoryLog::new();
        seeded.append(crate::state::HistoryEntry::for_event("doorbell", "#2979ff", at(0)));
        store.set_item(HISTORY_KEY, &seeded.to_json().unwrap()).unwrap();

        let config = AppConfig::default();
        let monitor = Monitor::open(
            &config,
            SettingsHandle::default(),
            Box::new(crate::dispatch::OfflinePublisher),
            store.clone(),
        );
        assert_eq!(monitor.history().all(), seeded.all());
        assert!(!monitor.is_connected());
        assert_eq!(monitor.history().capacity(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_open_persists_in_background() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut monitor = Monitor::open(
                &AppConfig::default(),
                SettingsHandle::default(),
                Box::new(crate::dispatch::OfflinePublisher),
                store.clone(),
            );
            monitor.trigger_alarm("babyCry", "#e040fb", at(0));
        }
        // Dropping the monitor drains the writer
        let persisted = store.get_item(HISTORY_KEY).unwrap().unwrap();
        assert_eq!(HistoryLog::from_json(&persisted, HISTORY_CAPACITY).len(), 1);
    }
}

// Alert dispatcher
// Publishes alerts to the remote channel and records them in the history log

use chrono::{DateTime, Utc};

use crate::dispatch::payload::DispatchPayload;
use crate::dispatch::publisher::Publisher;
use crate::events::types::{HapticPattern, TriggerKind};
use crate::state::history::{HistoryEntry, HistoryLog};
use crate::state::persist::HistoryPersister;
use crate::state::settings::Settings;

/// Outcome of a single dispatch
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub payload: DispatchPayload,

    /// Whether the payload was handed to a connected publisher
    pub published: bool,

    /// Entry prepended to the history log
    pub entry: HistoryEntry,
}

/// Sends alerts and keeps the history log
/// Remote publish and persistence are best-effort; failures are logged only.
pub struct Dispatcher {
    publisher: Box<dyn Publisher>,
    persister: Box<dyn HistoryPersister>,
    history: HistoryLog,
    topic: String,
}

impl Dispatcher {
    pub fn new(
        publisher: Box<dyn Publisher>,
        persister: Box<dyn HistoryPersister>,
        history: HistoryLog,
        topic: impl Into<String>,
    ) -> Self {
        Dispatcher {
            publisher,
            persister,
            history,
            topic: topic.into(),
        }
    }

    /// Dispatch an alert for `kind` in `color`
    pub fn dispatch(
        &mut self,
        kind: TriggerKind,
        color: &str,
        haptics: &HapticPattern,
        at: DateTime<Utc>,
    ) -> DispatchResult {
        self.dispatch_event(kind.to_string(), color, haptics, at)
    }

    /// Dispatch an alert by wire name; unknown names are sent as-is
    pub fn dispatch_event(
        &mut self,
        event: &str,
        color: &str,
        haptics: &HapticPattern,
        at: DateTime<Utc>,
    ) -> DispatchResult {
        let payload = DispatchPayload::new(event, color, haptics, at);
        let published = self.publish(&payload);

        let entry = HistoryEntry::for_event(event, color, at);
        self.history.append(entry.clone());
        self.persist_history();

        DispatchResult {
            payload,
            published,
            entry,
        }
    }

    /// Dispatch for a detected kind using the current settings
    /// A disabled detected kind is redirected to the first enabled kind in
    /// enumeration order. Returns None, touching nothing, when no kind is enabled.
    pub fn dispatch_detected(
        &mut self,
        detected: TriggerKind,
        settings: &Settings,
        at: DateTime<Utc>,
    ) -> Option<(TriggerKind, DispatchResult)> {
        let kind = settings.triggers.resolve(detected)?;
        if kind != detected {
            log::debug!(
                "{} is disabled, dispatching {} instead",
                detected.to_string(),
                kind.to_string()
            );
        }
        let color = settings.triggers.color_of(kind);
        let result = self.dispatch(kind, &color, &settings.haptic_pattern, at);
        Some((kind, result))
    }

    fn publish(&self, payload: &DispatchPayload) -> bool {
        if !self.publisher.is_connected() {
            log::warn!("Cannot send {}: broker offline", payload.event);
            return false;
        }

        let body = match payload.to_json_bytes() {
            Ok(body) => body,
            Err(e) => {
                log::error!("Failed to encode {} payload: {}", payload.event, e);
                return false;
            }
        };

        match self.publisher.publish(&self.topic, body) {
            Ok(()) => {
                log::info!("Sent {} to {}", payload.event, self.topic);
                true
            }
            Err(e) => {
                log::warn!("Publish of {} failed: {}", payload.event, e);
                false
            }
        }
    }

    fn persist_history(&self) {
        match self.history.to_json() {
            Ok(json) => self.persister.persist(json),
            Err(e) => log::error!("Failed to encode event history: {}", e),
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn is_connected(&self) -> bool {
        self.publisher.is_connected()
    }
}

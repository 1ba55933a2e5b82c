// Tauri IPC Commands
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tauri::State;

use crate::dispatch::MqttLink;
use crate::events::{DetectionDecision, HapticPattern, LevelSample, Threshold, TriggerKind};
use crate::pipeline::{Monitor, MonitorStatus};
use crate::state::{HistoryEntry, SettingsHandle, TriggerConfig, TriggerRegistry};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

type CommandResult<T> = Result<T, CommandError>;

/// State shared with the webview
pub struct AppState {
    monitor: Mutex<Monitor>,
    settings: SettingsHandle,
    mqtt: MqttLink,
}

impl AppState {
    pub fn new(monitor: Monitor, settings: SettingsHandle, mqtt: MqttLink) -> Self {
        AppState {
            monitor: Mutex::new(monitor),
            settings,
            mqtt,
        }
    }

    fn monitor(&self) -> MutexGuard<'_, Monitor> {
        self.monitor.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn mqtt(&self) -> &MqttLink {
        &self.mqtt
    }
}

fn parse_kind(kind: &str) -> CommandResult<TriggerKind> {
    TriggerKind::from_string(kind).ok_or_else(|| CommandError {
        message: format!("Unknown trigger kind: {}", kind),
    })
}

// ==================== TRIGGER COMMANDS ====================

#[tauri::command]
pub fn get_triggers(state: State<'_, AppState>) -> CommandResult<TriggerRegistry> {
    Ok(state.settings.read().triggers.clone())
}

#[tauri::command]
pub fn set_trigger_enabled(
    state: State<'_, AppState>,
    kind: String,
    enabled: bool,
) -> CommandResult<TriggerConfig> {
    let kind = parse_kind(&kind)?;
    Ok(state.settings.update_triggers(|triggers| {
        triggers.set_enabled(kind, enabled);
        triggers.get(kind)
    }))
}

/// Pick a palette color; ignored while the kind is disabled
#[tauri::command]
pub fn set_trigger_color(
    state: State<'_, AppState>,
    kind: String,
    color_index: usize,
) -> CommandResult<TriggerConfig> {
    let kind = parse_kind(&kind)?;
    Ok(state.settings.update_triggers(|triggers| {
        triggers.set_color(kind, color_index);
        triggers.get(kind)
    }))
}

// ==================== CALIBRATION COMMANDS ====================

#[tauri::command]
pub fn get_threshold(state: State<'_, AppState>) -> CommandResult<u8> {
    Ok(state.settings.threshold().value())
}

#[tauri::command]
pub fn set_threshold(state: State<'_, AppState>, value: i64) -> CommandResult<u8> {
    let threshold = Threshold::new(value);
    state.settings.set_threshold(threshold);
    Ok(threshold.value())
}

#[tauri::command]
pub fn set_threshold_from_slider(
    state: State<'_, AppState>,
    offset: f64,
    track_height: f64,
) -> CommandResult<u8> {
    let threshold = Threshold::from_slider(offset, track_height);
    state.settings.set_threshold(threshold);
    Ok(threshold.value())
}

// ==================== HAPTIC COMMANDS ====================

#[tauri::command]
pub fn get_haptic_pattern(state: State<'_, AppState>) -> CommandResult<HapticPattern> {
    Ok(state.settings.read().haptic_pattern.clone())
}

#[tauri::command]
pub fn set_haptic_pattern(state: State<'_, AppState>, pattern: HapticPattern) -> CommandResult<()> {
    log::info!("Haptic pattern set ({} pulses)", pattern.0.len());
    state.settings.set_haptic_pattern(pattern);
    Ok(())
}

// ==================== HISTORY COMMANDS ====================

#[tauri::command]
pub fn get_event_history(state: State<'_, AppState>) -> CommandResult<Vec<HistoryEntry>> {
    Ok(state.monitor().history().all())
}

#[tauri::command]
pub fn get_recent_events(
    state: State<'_, AppState>,
    limit: usize,
) -> CommandResult<Vec<HistoryEntry>> {
    Ok(state.monitor().history().recent(limit))
}

// ==================== MONITORING COMMANDS ====================

#[tauri::command]
pub fn is_mqtt_connected(state: State<'_, AppState>) -> CommandResult<bool> {
    Ok(state.monitor().is_connected())
}

#[tauri::command]
pub fn start_monitoring(state: State<'_, AppState>) -> CommandResult<MonitorStatus> {
    let mut monitor = state.monitor();
    monitor.start();
    Ok(monitor.status())
}

#[tauri::command]
pub fn stop_monitoring(state: State<'_, AppState>) -> CommandResult<MonitorStatus> {
    let mut monitor = state.monitor();
    monitor.stop();
    Ok(monitor.status())
}

/// Called when the sampler cannot start (e.g. microphone permission denied)
#[tauri::command]
pub fn report_sampler_unavailable(
    state: State<'_, AppState>,
    reason: String,
) -> CommandResult<MonitorStatus> {
    let mut monitor = state.monitor();
    monitor.report_unavailable(reason);
    Ok(monitor.status())
}

/// Periodic sampler callback
#[tauri::command]
pub fn push_level_sample(
    state: State<'_, AppState>,
    sample: LevelSample,
) -> CommandResult<Option<DetectionDecision>> {
    Ok(state.monitor().on_sample(&sample, chrono::Utc::now()))
}

#[tauri::command]
pub fn get_monitor_status(state: State<'_, AppState>) -> CommandResult<MonitorStatus> {
    Ok(state.monitor().status())
}

/// Send an alert immediately, without detection or cooldown
#[tauri::command]
pub fn trigger_alarm(
    state: State<'_, AppState>,
    event: String,
    color: String,
) -> CommandResult<HistoryEntry> {
    let result = state.monitor().trigger_alarm(&event, &color, chrono::Utc::now());
    Ok(result.entry)
}

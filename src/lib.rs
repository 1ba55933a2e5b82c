// NeuroSense - acoustic event detection and alert dispatch
// Module declarations

pub mod config;
pub mod dispatch;
pub mod events;
pub mod pipeline;
pub mod state;

#[cfg(feature = "app")]
mod commands;

#[cfg(feature = "app")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;
    use tauri::Manager;

    use crate::config::AppConfig;
    use crate::events::Threshold;
    use crate::pipeline::Monitor;
    use crate::state::{KeyValueStore, MemoryStore, Settings, SettingsHandle};

    let app = tauri::Builder::default()
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            let config = match state::storage::get_app_data_dir() {
                Ok(dir) => AppConfig::load_or_default(&AppConfig::default_path(&dir)),
                Err(e) => {
                    log::warn!("No app data directory ({}), using default config", e);
                    AppConfig::default()
                }
            };

            // History survives in memory even if the database cannot be opened
            let store: Arc<dyn KeyValueStore> = match state::init_db() {
                Ok(db) => Arc::new(db),
                Err(e) => {
                    log::error!("Failed to initialize database: {}", e);
                    Arc::new(MemoryStore::new())
                }
            };

            let settings = SettingsHandle::new(Settings::with_threshold(Threshold::new(
                config.initial_threshold as i64,
            )));

            let (link, driver) = dispatch::mqtt::connect(&config);
            tauri::async_runtime::spawn(driver.run());

            let monitor = Monitor::open(&config, settings.clone(), Box::new(link.clone()), store);
            app.manage(commands::AppState::new(monitor, settings, link));

            log::info!("NeuroSense initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_triggers,
            commands::set_trigger_enabled,
            commands::set_trigger_color,
            commands::get_threshold,
            commands::set_threshold,
            commands::set_threshold_from_slider,
            commands::get_haptic_pattern,
            commands::set_haptic_pattern,
            commands::get_event_history,
            commands::get_recent_events,
            commands::is_mqtt_connected,
            commands::start_monitoring,
            commands::stop_monitoring,
            commands::report_sampler_unavailable,
            commands::push_level_sample,
            commands::get_monitor_status,
            commands::trigger_alarm,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| {
        if let tauri::RunEvent::Exit = event {
            handle.state::<commands::AppState>().mqtt().disconnect();
        }
    });
}

//! Gemini Desktop
//!
//! Native shell around the Gemini web app. The Rust side owns the user's
//! preferences: every window reads and writes them through the commands in
//! [`commands::preferences`], and the broker pushes each change back out to
//! all windows as `theme-changed` / `hotkeys-changed` events.

mod commands;
mod constants;
mod errors;
mod platform;

use std::sync::Arc;

use gemini_prefsync::{
    default_bindings, default_preferences, HotkeyRegistrar, PreferenceStore, SharedBroker,
    SyncBroker, SyncConfig,
};
use tauri::{AppHandle, Manager, WindowEvent};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use constants::{DEFAULT_LOG_FILTER, QUICK_CHAT_WINDOW_LABEL};
use platform::{TauriShortcuts, TauriTheme, TauriWindows};

pub struct AppState {
    broker: SharedBroker,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

fn build_broker(app: &AppHandle, config: &SyncConfig) -> SharedBroker {
    let store = PreferenceStore::open(config.preferences_path(), default_preferences());
    let registrar = HotkeyRegistrar::new(
        Box::new(TauriShortcuts::new(app.clone())),
        default_bindings(),
    );
    let mut broker = SyncBroker::new(
        store,
        registrar,
        Box::new(TauriTheme::new(app.clone())),
        Arc::new(TauriWindows::new(app.clone())),
    );
    broker.apply_startup();
    SharedBroker::new(broker)
}

fn on_window_event(window: &tauri::Window, event: &WindowEvent) {
    match event {
        WindowEvent::ThemeChanged(theme) => {
            let Some(state) = window.try_state::<AppState>() else {
                return;
            };
            // a set in flight broadcasts the fresh state itself
            match state.broker.try_lock() {
                Some(mut broker) => {
                    broker.refresh_system_theme();
                }
                None => debug!(window = window.label(), ?theme, "theme event during preference update"),
            }
        }
        WindowEvent::Focused(false) if window.label() == QUICK_CHAT_WINDOW_LABEL => {
            if let Err(e) = window.hide() {
                warn!(window = window.label(), error = %e, "failed to hide quick chat on blur");
            }
        }
        _ => {}
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // load .env
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_filename("../.env");
    }

    if let Err(e) = init_tracing() {
        eprintln!("[gemini] logging init failed: {e}");
    }

    let config = SyncConfig::from_env();
    info!(path = %config.preferences_path().display(), "preference file");

    tauri::Builder::default()
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .setup(move |app| {
            let broker = build_broker(app.handle(), &config);
            app.manage(AppState { broker });
            platform::log_ready(app.handle());
            Ok(())
        })
        .on_window_event(on_window_event)
        .invoke_handler(tauri::generate_handler![
            commands::preferences::get_theme,
            commands::preferences::set_theme,
            commands::preferences::get_hotkeys_enabled,
            commands::preferences::set_hotkeys_enabled,
            commands::preferences::reset_preferences,
            commands::preferences::get_preferences,
            commands::window::hide_quick_chat,
            commands::window::frontend_log,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

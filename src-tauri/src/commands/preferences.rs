//! Preference commands - the window-facing side of the broker.
//!
//! `set_*` take raw JSON so a bad value reaches broker validation instead of
//! failing deserialization. A rejected value is a silent no-op for the
//! caller; the broker has already logged it.

use gemini_prefsync::{HotkeysState, PreferenceRecord, ThemeState};
use serde_json::Value;
use tauri::State;

use crate::AppState;

#[tauri::command]
pub fn get_theme(state: State<'_, AppState>) -> ThemeState {
    state.broker.lock().get_theme()
}

#[tauri::command]
pub fn set_theme(theme: Value, state: State<'_, AppState>) {
    let _ = state.broker.lock().set_theme(&theme);
}

#[tauri::command]
pub fn get_hotkeys_enabled(state: State<'_, AppState>) -> HotkeysState {
    state.broker.lock().get_hotkeys_enabled()
}

#[tauri::command]
pub fn set_hotkeys_enabled(enabled: Value, state: State<'_, AppState>) {
    let _ = state.broker.lock().set_hotkeys_enabled(&enabled);
}

#[tauri::command]
pub fn reset_preferences(state: State<'_, AppState>) {
    state.broker.lock().reset_preferences();
}

#[tauri::command]
pub fn get_preferences(state: State<'_, AppState>) -> PreferenceRecord {
    state.broker.lock().get_preferences()
}

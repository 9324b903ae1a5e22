use tauri::{AppHandle, Manager};
use tracing::{debug, error, info, warn};

use crate::constants::QUICK_CHAT_WINDOW_LABEL;
use crate::errors::CommandError;

/// Lets the quick-chat popup dismiss itself after submitting.
#[tauri::command]
pub fn hide_quick_chat(app: AppHandle) -> Result<(), CommandError> {
    let window = app
        .get_webview_window(QUICK_CHAT_WINDOW_LABEL)
        .ok_or_else(|| CommandError::WindowNotFound(QUICK_CHAT_WINDOW_LABEL.to_string()))?;
    window.hide()?;
    Ok(())
}

/// Front-end diagnostics, re-emitted through tracing.
#[tauri::command]
pub fn frontend_log(level: String, message: String) {
    match level.as_str() {
        "error" => error!(target: "frontend", "{message}"),
        "warn" => warn!(target: "frontend", "{message}"),
        "debug" => debug!(target: "frontend", "{message}"),
        _ => info!(target: "frontend", "{message}"),
    }
}

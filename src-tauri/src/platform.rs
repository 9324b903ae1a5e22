//! Tauri implementations of the preference-sync platform seams.

use std::sync::Arc;

use gemini_prefsync::{
    DeliveryError, HotkeyAction, NativeTheme, PlatformError, ShortcutBackend, ShortcutBinding,
    ShortcutError, SyncEvent, ThemePreference, WindowSource, WindowTarget,
};
use tauri::{AppHandle, Emitter, Manager, WebviewWindow};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};
use tracing::{debug, info, warn};

use crate::constants::{MAIN_WINDOW_LABEL, QUICK_CHAT_WINDOW_LABEL};
use crate::errors::CommandError;

// ---- global shortcuts ----

pub struct TauriShortcuts {
    app: AppHandle,
}

impl TauriShortcuts {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ShortcutBackend for TauriShortcuts {
    fn register(&mut self, binding: &ShortcutBinding) -> Result<(), ShortcutError> {
        let action = binding.action;
        self.app
            .global_shortcut()
            .on_shortcut(binding.accelerator.as_str(), move |app, _shortcut, event| {
                if event.state == ShortcutState::Pressed {
                    dispatch(app, action);
                }
            })
            .map_err(|e| ShortcutError::Register {
                accelerator: binding.accelerator.clone(),
                reason: e.to_string(),
            })
    }

    fn unregister_all(&mut self) -> Result<(), ShortcutError> {
        self.app
            .global_shortcut()
            .unregister_all()
            .map_err(|e| ShortcutError::Unregister(e.to_string()))
    }
}

/// Window a hotkey action shows or hides.
pub fn window_for(action: HotkeyAction) -> &'static str {
    match action {
        HotkeyAction::ToggleMainWindow => MAIN_WINDOW_LABEL,
        HotkeyAction::ToggleQuickChat => QUICK_CHAT_WINDOW_LABEL,
    }
}

pub fn dispatch(app: &AppHandle, action: HotkeyAction) {
    debug!(?action, "hotkey pressed");
    let centered = action == HotkeyAction::ToggleQuickChat;
    if let Err(e) = toggle_window(app, window_for(action), centered) {
        warn!(?action, error = %e, "hotkey action failed");
    }
}

fn toggle_window(app: &AppHandle, label: &str, centered: bool) -> Result<(), CommandError> {
    let window = app
        .get_webview_window(label)
        .ok_or_else(|| CommandError::WindowNotFound(label.to_string()))?;

    if window.is_visible()? {
        window.hide()?;
    } else {
        if centered {
            window.center()?;
        }
        window.show()?;
        window.set_focus()?;
    }
    Ok(())
}

// ---- native theme ----

pub struct TauriTheme {
    app: AppHandle,
}

impl TauriTheme {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

pub fn native_theme(preference: ThemePreference) -> Option<tauri::Theme> {
    match preference {
        ThemePreference::Light => Some(tauri::Theme::Light),
        ThemePreference::Dark => Some(tauri::Theme::Dark),
        ThemePreference::System => None,
    }
}

impl NativeTheme for TauriTheme {
    fn set_theme_source(&self, preference: ThemePreference) -> Result<(), PlatformError> {
        let theme = native_theme(preference);
        let mut failures = Vec::new();
        for (label, window) in self.app.webview_windows() {
            if let Err(e) = window.set_theme(theme) {
                failures.push(format!("{label}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PlatformError::ThemeSource(failures.join(", ")))
        }
    }

    fn prefers_dark(&self) -> Result<bool, PlatformError> {
        Ok(dark_light::detect() == dark_light::Mode::Dark)
    }
}

// ---- windows ----

pub struct TauriWindows {
    app: AppHandle,
}

impl TauriWindows {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl WindowSource for TauriWindows {
    fn open_windows(&self) -> Vec<Arc<dyn WindowTarget>> {
        self.app
            .webview_windows()
            .into_values()
            .map(|window| Arc::new(TauriWindow { window }) as Arc<dyn WindowTarget>)
            .collect()
    }
}

struct TauriWindow {
    window: WebviewWindow,
}

impl WindowTarget for TauriWindow {
    fn label(&self) -> &str {
        self.window.label()
    }

    // a destroyed window is dropped from the manager before its handles go away
    fn is_destroyed(&self) -> bool {
        self.window
            .app_handle()
            .get_webview_window(self.window.label())
            .is_none()
    }

    fn deliver(&self, event: &SyncEvent) -> Result<(), DeliveryError> {
        self.window
            .emit_to(self.window.label(), event.channel(), *event)
            .map_err(|e| DeliveryError::Emit {
                label: self.window.label().to_string(),
                reason: e.to_string(),
            })
    }
}

pub fn log_ready(app: &AppHandle) {
    let labels: Vec<String> = app.webview_windows().into_keys().collect();
    info!(windows = ?labels, "shell ready");
}

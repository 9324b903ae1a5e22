//! Hotkey Registrar - global shortcut enable/disable
//!
//! OS-level global shortcuts are a scarce, system-wide resource: one
//! accelerator can be claimed by one process. The registrar tracks two flags,
//! `enabled` (user intent) and `registered` (what the OS holds), and only
//! ever mutates the OS table through the transitions below, so it never
//! double-registers or leaks registrations across toggle cycles.
//!
//! The binding set is fixed at construction; toggling changes whether the
//! bindings are live, never which bindings exist.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ShortcutError, ValidationError};

/// Store key holding the hotkeys-enabled flag.
pub const HOTKEYS_ENABLED_KEY: &str = "hotkeysEnabled";

pub const BOSS_KEY_ACCELERATOR: &str = "CommandOrControl+Alt+E";
pub const QUICK_CHAT_ACCELERATOR: &str = "CommandOrControl+Shift+Space";

/// What a global shortcut does when pressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum HotkeyAction {
    /// Show or hide the main window.
    ToggleMainWindow,
    /// Show or hide the quick-chat popup.
    ToggleQuickChat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub accelerator: String,
    pub action: HotkeyAction,
}

impl ShortcutBinding {
    pub fn new(accelerator: impl Into<String>, action: HotkeyAction) -> Self {
        Self {
            accelerator: accelerator.into(),
            action,
        }
    }
}

pub fn default_bindings() -> Vec<ShortcutBinding> {
    vec![
        ShortcutBinding::new(BOSS_KEY_ACCELERATOR, HotkeyAction::ToggleMainWindow),
        ShortcutBinding::new(QUICK_CHAT_ACCELERATOR, HotkeyAction::ToggleQuickChat),
    ]
}

/// Broadcast payload for the hotkeys-enabled preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HotkeysState {
    pub enabled: bool,
}

impl HotkeysState {
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Bool(enabled) => Ok(Self { enabled: *enabled }),
            other => Err(ValidationError::HotkeysEnabled(other.clone())),
        }
    }
}

impl Default for HotkeysState {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// The OS global-shortcut table.
pub trait ShortcutBackend: Send {
    fn register(&mut self, binding: &ShortcutBinding) -> Result<(), ShortcutError>;
    fn unregister_all(&mut self) -> Result<(), ShortcutError>;
}

pub struct HotkeyRegistrar {
    backend: Box<dyn ShortcutBackend>,
    bindings: Vec<ShortcutBinding>,
    enabled: bool,
    registered: bool,
}

impl HotkeyRegistrar {
    pub fn new(backend: Box<dyn ShortcutBackend>, bindings: Vec<ShortcutBinding>) -> Self {
        Self {
            backend,
            bindings,
            enabled: true,
            registered: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Register every binding unless disabled or already registered.
    ///
    /// A binding the OS refuses is logged and skipped; the rest still get
    /// registered, and the registrar counts the pass as done either way.
    pub fn register_shortcuts(&mut self) {
        if !self.enabled {
            debug!("hotkeys disabled, skipping registration");
            return;
        }
        if self.registered {
            debug!("hotkeys already registered");
            return;
        }

        let mut failed = 0usize;
        for binding in &self.bindings {
            match self.backend.register(binding) {
                Ok(()) => debug!(accelerator = %binding.accelerator, action = ?binding.action, "registered shortcut"),
                Err(e) => {
                    failed += 1;
                    warn!(accelerator = %binding.accelerator, error = %e, "shortcut registration refused");
                }
            }
        }
        self.registered = true;
        info!(
            total = self.bindings.len(),
            failed, "global shortcuts registered"
        );
    }

    /// Drop every OS registration. Safe to call when nothing is registered.
    pub fn unregister_all(&mut self) {
        if let Err(e) = self.backend.unregister_all() {
            warn!(error = %e, "failed to unregister global shortcuts");
        }
        self.registered = false;
        debug!("global shortcuts unregistered");
    }

    /// The only way `enabled` changes. Repeating the current value is a no-op.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.register_shortcuts();
        } else {
            self.unregister_all();
        }
        info!(enabled, "hotkeys toggled");
    }
}

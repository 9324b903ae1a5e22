//! Synchronization Broker - the single authority over shared preferences
//!
//! Every change request from any window goes through here and runs to
//! completion before the next: validate, persist, apply the platform effect,
//! then broadcast the canonical state to every open window (the requester
//! included). Windows only ever hold read-through caches.
//!
//! Faults below the validation boundary never stop the pipeline. A failed
//! disk write, a refused shortcut or a theme API error is logged and the
//! user's intent is still recorded and broadcast.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{PlatformError, ValidationError};
use crate::events::SyncEvent;
use crate::hotkeys::{HotkeyRegistrar, HotkeysState, HOTKEYS_ENABLED_KEY};
use crate::store::{PreferenceRecord, PreferenceStore};
use crate::theme::{NativeTheme, ThemePreference, ThemeState, THEME_KEY};
use crate::window::WindowSource;

/// The defaults every preference file is merged over.
pub fn default_preferences() -> PreferenceRecord {
    let mut defaults = Map::new();
    defaults.insert(THEME_KEY.to_string(), ThemePreference::default().to_value());
    defaults.insert(
        HOTKEYS_ENABLED_KEY.to_string(),
        Value::Bool(HotkeysState::default().enabled),
    );
    defaults
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct SyncBroker {
    store: PreferenceStore,
    registrar: HotkeyRegistrar,
    theme: Box<dyn NativeTheme>,
    windows: Arc<dyn WindowSource>,
    last_theme: Option<ThemeState>,
}

impl SyncBroker {
    pub fn new(
        store: PreferenceStore,
        registrar: HotkeyRegistrar,
        theme: Box<dyn NativeTheme>,
        windows: Arc<dyn WindowSource>,
    ) -> Self {
        Self {
            store,
            registrar,
            theme,
            windows,
            last_theme: None,
        }
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn registrar(&self) -> &HotkeyRegistrar {
        &self.registrar
    }

    /// Bring the platform in line with what is persisted. Run once at startup.
    pub fn apply_startup(&mut self) {
        let preference = self.stored_theme().unwrap_or_default();
        self.apply_theme_source(preference);

        let hotkeys = self.get_hotkeys_enabled();
        if hotkeys.enabled {
            self.registrar.register_shortcuts();
        } else {
            self.registrar.set_enabled(false);
        }
        info!(theme = preference.as_str(), hotkeys_enabled = hotkeys.enabled, "applied stored preferences");
    }

    // ---- theme ----

    /// Current theme, resolved against the OS color scheme right now.
    pub fn get_theme(&self) -> ThemeState {
        match self.current_theme() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "theme read failed, serving fallback");
                ThemeState::FALLBACK
            }
        }
    }

    pub fn set_theme(&mut self, raw: &Value) -> Result<ThemeState, ValidationError> {
        let preference = ThemePreference::from_value(raw).inspect_err(|e| {
            warn!(error = %e, "rejected theme change");
        })?;

        self.store.set(THEME_KEY, preference.to_value());
        self.apply_theme_source(preference);

        let state = self.resolve_theme(preference);
        self.publish_theme(state);
        info!(theme = preference.as_str(), effective = ?state.effective_theme, "theme changed");
        Ok(state)
    }

    /// Re-resolve a `system` preference after the OS color scheme moved and
    /// broadcast it if windows are now out of date.
    pub fn refresh_system_theme(&mut self) -> Option<ThemeState> {
        let state = self.current_theme().ok()?;
        if state.preference != ThemePreference::System || self.last_theme == Some(state) {
            return None;
        }
        debug!(effective = ?state.effective_theme, "OS color scheme changed");
        self.publish_theme(state);
        Some(state)
    }

    // ---- hotkeys ----

    pub fn get_hotkeys_enabled(&self) -> HotkeysState {
        if let Some(enabled) = self.store.get_as::<bool>(HOTKEYS_ENABLED_KEY) {
            return HotkeysState { enabled };
        }
        if let Some(value) = self.store.get(HOTKEYS_ENABLED_KEY) {
            warn!(%value, "stored hotkeys flag unreadable, serving default");
        }
        HotkeysState::default()
    }

    pub fn set_hotkeys_enabled(&mut self, raw: &Value) -> Result<HotkeysState, ValidationError> {
        let state = HotkeysState::from_value(raw).inspect_err(|e| {
            warn!(error = %e, "rejected hotkeys change");
        })?;

        self.store.set(HOTKEYS_ENABLED_KEY, Value::Bool(state.enabled));
        self.registrar.set_enabled(state.enabled);
        self.broadcast(&SyncEvent::HotkeysChanged(state));
        Ok(state)
    }

    // ---- whole record ----

    pub fn get_preferences(&self) -> PreferenceRecord {
        self.store.get_all()
    }

    /// Restore defaults, re-apply both platform effects and broadcast both
    /// canonical states.
    pub fn reset_preferences(&mut self) -> (ThemeState, HotkeysState) {
        self.store.reset();

        let preference = self.stored_theme().unwrap_or_default();
        self.apply_theme_source(preference);
        let theme = self.resolve_theme(preference);

        let hotkeys = self.get_hotkeys_enabled();
        self.registrar.set_enabled(hotkeys.enabled);

        self.publish_theme(theme);
        self.broadcast(&SyncEvent::HotkeysChanged(hotkeys));
        info!("preferences reset to defaults");
        (theme, hotkeys)
    }

    /// Deliver `event` to every open window. Destroyed or failing windows are
    /// skipped; the rest still receive it.
    pub fn broadcast(&self, event: &SyncEvent) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for window in self.windows.open_windows() {
            if window.is_destroyed() {
                debug!(window = window.label(), channel = event.channel(), "skipping destroyed window");
                report.skipped += 1;
                continue;
            }
            match window.deliver(event) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(window = window.label(), channel = event.channel(), error = %e, "broadcast delivery failed");
                    report.failed += 1;
                }
            }
        }
        debug!(channel = event.channel(), ?report, "broadcast done");
        report
    }

    fn publish_theme(&mut self, state: ThemeState) {
        self.last_theme = Some(state);
        self.broadcast(&SyncEvent::ThemeChanged(state));
    }

    fn stored_theme(&self) -> Result<ThemePreference, ValidationError> {
        match self.store.get(THEME_KEY) {
            Some(value) => ThemePreference::from_value(&value),
            None => Ok(ThemePreference::default()),
        }
    }

    fn current_theme(&self) -> Result<ThemeState, ThemeReadError> {
        let preference = self.stored_theme()?;
        let prefers_dark = match preference {
            ThemePreference::System => self.theme.prefers_dark()?,
            _ => false,
        };
        Ok(ThemeState::resolve(preference, prefers_dark))
    }

    // on the write path an OS query fault must not block the broadcast
    fn resolve_theme(&self, preference: ThemePreference) -> ThemeState {
        if preference != ThemePreference::System {
            return ThemeState::resolve(preference, false);
        }
        match self.theme.prefers_dark() {
            Ok(dark) => ThemeState::resolve(preference, dark),
            Err(e) => {
                warn!(error = %e, "OS color scheme unavailable");
                ThemeState {
                    preference,
                    effective_theme: ThemeState::FALLBACK.effective_theme,
                }
            }
        }
    }

    fn apply_theme_source(&self, preference: ThemePreference) {
        if let Err(e) = self.theme.set_theme_source(preference) {
            warn!(theme = preference.as_str(), error = %e, "native theme not applied");
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ThemeReadError {
    #[error(transparent)]
    Stored(#[from] ValidationError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Process-wide handle to the one broker. Cloning shares it; the mutex is
/// what serializes every change.
#[derive(Clone)]
pub struct SharedBroker(Arc<Mutex<SyncBroker>>);

impl SharedBroker {
    pub fn new(broker: SyncBroker) -> Self {
        Self(Arc::new(Mutex::new(broker)))
    }

    pub fn lock(&self) -> MutexGuard<'_, SyncBroker> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `None` while another change is in flight.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, SyncBroker>> {
        match self.0.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;
    use crate::hotkeys::default_bindings;
    use crate::testing::{FakeShortcuts, FakeTheme};
    use crate::theme::EffectiveTheme;
    use crate::error::DeliveryError;
    use crate::window::{LocalWindows, WindowChannel, WindowTarget};
    use serde_json::json;
    use tempfile::TempDir;

    struct Harness {
        broker: SyncBroker,
        shortcuts: FakeShortcuts,
        theme: FakeTheme,
        windows: Arc<LocalWindows>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(dir.path().join("user-preferences.json"), default_preferences());
        let shortcuts = FakeShortcuts::default();
        let theme = FakeTheme::default();
        let windows = Arc::new(LocalWindows::new());
        let broker = SyncBroker::new(
            store,
            HotkeyRegistrar::new(Box::new(shortcuts.clone()), default_bindings()),
            Box::new(theme.clone()),
            windows.clone(),
        );
        Harness {
            broker,
            shortcuts,
            theme,
            windows,
            _dir: dir,
        }
    }

    #[test]
    fn test_fresh_install_theme_follows_os() {
        let h = harness();
        h.theme.set_os_dark(false);
        assert_eq!(
            h.broker.get_theme(),
            ThemeState {
                preference: ThemePreference::System,
                effective_theme: EffectiveTheme::Light
            }
        );
        h.theme.set_os_dark(true);
        assert_eq!(h.broker.get_theme().effective_theme, EffectiveTheme::Dark);
    }

    #[test]
    fn test_set_then_get_each_theme() {
        let mut h = harness();
        for value in ["light", "dark", "system"] {
            let state = h.broker.set_theme(&json!(value)).unwrap();
            let got = h.broker.get_theme();
            assert_eq!(got.preference.as_str(), value);
            assert_eq!(got, state);
            assert_eq!(h.theme.last_source(), Some(got.preference));
        }
    }

    #[test]
    fn test_invalid_theme_is_rejected_without_side_effects() {
        let mut h = harness();
        let main = h.windows.open("main");
        let mut sub = main.subscribe(Topic::Theme);
        h.broker.set_theme(&json!("light")).unwrap();
        sub.try_next();

        for bad in [json!("blue"), json!(42), json!(null)] {
            assert!(h.broker.set_theme(&bad).is_err());
        }
        assert_eq!(h.broker.store().get(THEME_KEY), Some(json!("light")));
        assert_eq!(sub.try_next(), None);
        assert_eq!(h.theme.source_calls(), 1);
    }

    // still reports itself open but every emit fails
    struct ClosingWindow;

    impl WindowTarget for ClosingWindow {
        fn label(&self) -> &str {
            "closing"
        }

        fn is_destroyed(&self) -> bool {
            false
        }

        fn deliver(&self, _event: &SyncEvent) -> Result<(), DeliveryError> {
            Err(DeliveryError::Destroyed("closing".into()))
        }
    }

    struct FixedWindows(Vec<Arc<dyn WindowTarget>>);

    impl WindowSource for FixedWindows {
        fn open_windows(&self) -> Vec<Arc<dyn WindowTarget>> {
            self.0.clone()
        }
    }

    #[test]
    fn test_broadcast_survives_window_closing_mid_delivery() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(dir.path().join("user-preferences.json"), default_preferences());
        let main = WindowChannel::new("main");
        let options = WindowChannel::new("options");
        let mut main_sub = main.subscribe(Topic::Theme);
        let mut options_sub = options.subscribe(Topic::Theme);
        let windows = FixedWindows(vec![
            main.clone() as Arc<dyn WindowTarget>,
            Arc::new(ClosingWindow),
            options.clone() as Arc<dyn WindowTarget>,
        ]);
        let mut broker = SyncBroker::new(
            store,
            HotkeyRegistrar::new(Box::new(FakeShortcuts::default()), default_bindings()),
            Box::new(FakeTheme::default()),
            Arc::new(windows),
        );

        let state = broker.set_theme(&json!("dark")).unwrap();
        assert_eq!(main_sub.try_next(), Some(SyncEvent::ThemeChanged(state)));
        assert_eq!(options_sub.try_next(), Some(SyncEvent::ThemeChanged(state)));

        let report = broker.broadcast(&SyncEvent::ThemeChanged(state));
        assert_eq!(report, BroadcastReport { delivered: 2, skipped: 0, failed: 1 });
    }

    #[test]
    fn test_broadcast_skips_destroyed_window() {
        let mut h = harness();
        let windows: Vec<_> = ["main", "options", "quick-chat"]
            .into_iter()
            .map(|label| h.windows.open(label))
            .collect();
        let mut subs: Vec<_> = windows.iter().map(|w| w.subscribe(Topic::Theme)).collect();
        windows[1].destroy();

        let state = h.broker.set_theme(&json!("dark")).unwrap();
        assert_eq!(subs[0].try_next(), Some(SyncEvent::ThemeChanged(state)));
        assert_eq!(subs[2].try_next(), Some(SyncEvent::ThemeChanged(state)));
        assert_eq!(subs[1].try_next(), None);

        let report = h.broker.broadcast(&SyncEvent::ThemeChanged(state));
        assert_eq!(report, BroadcastReport { delivered: 2, skipped: 1, failed: 0 });
    }

    #[test]
    fn test_theme_platform_failure_still_persists_and_broadcasts() {
        let mut h = harness();
        let main = h.windows.open("main");
        let mut sub = main.subscribe(Topic::Theme);
        h.theme.fail_source(true);

        let state = h.broker.set_theme(&json!("dark")).unwrap();
        assert_eq!(h.broker.store().get(THEME_KEY), Some(json!("dark")));
        assert_eq!(sub.try_next(), Some(SyncEvent::ThemeChanged(state)));
    }

    #[test]
    fn test_hotkeys_toggle_flows_to_registrar_and_windows() {
        let mut h = harness();
        h.broker.apply_startup();
        assert_eq!(h.shortcuts.register_calls(), 2);

        let main = h.windows.open("main");
        let mut sub = main.subscribe(Topic::Hotkeys);

        let state = h.broker.set_hotkeys_enabled(&json!(false)).unwrap();
        assert!(!state.enabled);
        assert!(!h.broker.registrar().is_enabled());
        assert!(h.shortcuts.active().is_empty());
        assert_eq!(h.broker.get_hotkeys_enabled(), state);
        assert_eq!(sub.try_next(), Some(SyncEvent::HotkeysChanged(state)));

        assert!(h.broker.set_hotkeys_enabled(&json!("yes")).is_err());
        assert_eq!(sub.try_next(), None);
        assert_eq!(h.broker.store().get(HOTKEYS_ENABLED_KEY), Some(json!(false)));
    }

    #[test]
    fn test_startup_with_hotkeys_disabled_registers_nothing() {
        let mut h = harness();
        h.broker.store.set(HOTKEYS_ENABLED_KEY, json!(false));
        h.broker.apply_startup();
        assert_eq!(h.shortcuts.register_calls(), 0);
        assert!(!h.broker.registrar().is_enabled());
    }

    #[test]
    fn test_corrupt_stored_theme_serves_fallback() {
        let mut h = harness();
        h.broker.store.set(THEME_KEY, json!("purple"));
        assert_eq!(h.broker.get_theme(), ThemeState::FALLBACK);
    }

    #[test]
    fn test_unreadable_hotkeys_flag_serves_default() {
        let mut h = harness();
        h.broker.store.set(HOTKEYS_ENABLED_KEY, json!("yes"));
        assert_eq!(h.broker.get_hotkeys_enabled(), HotkeysState { enabled: true });

        h.broker.store.set(HOTKEYS_ENABLED_KEY, json!(false));
        assert_eq!(h.broker.get_hotkeys_enabled(), HotkeysState { enabled: false });
    }

    #[test]
    fn test_os_query_failure_serves_fallback() {
        let h = harness();
        h.theme.fail_query(true);
        assert_eq!(h.broker.get_theme(), ThemeState::FALLBACK);
    }

    #[test]
    fn test_refresh_only_broadcasts_real_system_changes() {
        let mut h = harness();
        let main = h.windows.open("main");
        let mut sub = main.subscribe(Topic::Theme);

        h.theme.set_os_dark(false);
        h.broker.set_theme(&json!("system")).unwrap();
        sub.try_next();

        assert_eq!(h.broker.refresh_system_theme(), None);

        h.theme.set_os_dark(true);
        let state = h.broker.refresh_system_theme().unwrap();
        assert_eq!(state.effective_theme, EffectiveTheme::Dark);
        assert_eq!(sub.try_next(), Some(SyncEvent::ThemeChanged(state)));

        h.broker.set_theme(&json!("light")).unwrap();
        sub.try_next();
        h.theme.set_os_dark(false);
        assert_eq!(h.broker.refresh_system_theme(), None);
    }

    #[test]
    fn test_reset_restores_defaults_and_broadcasts_both() {
        let mut h = harness();
        h.broker.apply_startup();
        h.broker.set_theme(&json!("light")).unwrap();
        h.broker.set_hotkeys_enabled(&json!(false)).unwrap();

        let main = h.windows.open("main");
        let mut theme_sub = main.subscribe(Topic::Theme);
        let mut hotkey_sub = main.subscribe(Topic::Hotkeys);

        let (theme, hotkeys) = h.broker.reset_preferences();
        assert_eq!(theme.preference, ThemePreference::System);
        assert!(hotkeys.enabled);
        assert_eq!(h.broker.get_preferences(), default_preferences());
        assert!(h.broker.registrar().is_registered());
        assert_eq!(theme_sub.try_next(), Some(SyncEvent::ThemeChanged(theme)));
        assert_eq!(hotkey_sub.try_next(), Some(SyncEvent::HotkeysChanged(hotkeys)));
    }

    #[test]
    fn test_shared_broker_serializes_access() {
        let h = harness();
        let shared = SharedBroker::new(h.broker);
        let guard = shared.lock();
        assert!(shared.try_lock().is_none());
        drop(guard);
        assert!(shared.try_lock().is_some());
        assert_eq!(h.windows.open_windows().len(), 0);
    }
}

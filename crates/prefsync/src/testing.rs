//! Test doubles for the platform seams.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, ShortcutError};
use crate::hotkeys::{ShortcutBackend, ShortcutBinding};
use crate::theme::{NativeTheme, ThemePreference};

#[derive(Default)]
struct ShortcutTable {
    active: Vec<String>,
    refused: HashSet<String>,
    register_calls: usize,
    unregister_calls: usize,
}

/// Counts calls into the OS shortcut table. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct FakeShortcuts(Arc<Mutex<ShortcutTable>>);

impl FakeShortcuts {
    pub fn refuse(&self, accelerator: &str) {
        self.0.lock().unwrap().refused.insert(accelerator.to_string());
    }

    pub fn register_calls(&self) -> usize {
        self.0.lock().unwrap().register_calls
    }

    pub fn unregister_calls(&self) -> usize {
        self.0.lock().unwrap().unregister_calls
    }

    pub fn active(&self) -> Vec<String> {
        self.0.lock().unwrap().active.clone()
    }
}

impl ShortcutBackend for FakeShortcuts {
    fn register(&mut self, binding: &ShortcutBinding) -> Result<(), ShortcutError> {
        let mut table = self.0.lock().unwrap();
        table.register_calls += 1;
        if table.refused.contains(&binding.accelerator) {
            return Err(ShortcutError::Register {
                accelerator: binding.accelerator.clone(),
                reason: "claimed by another application".into(),
            });
        }
        assert!(
            !table.active.contains(&binding.accelerator),
            "{} registered twice",
            binding.accelerator
        );
        table.active.push(binding.accelerator.clone());
        Ok(())
    }

    fn unregister_all(&mut self) -> Result<(), ShortcutError> {
        let mut table = self.0.lock().unwrap();
        table.unregister_calls += 1;
        table.active.clear();
        Ok(())
    }
}

#[derive(Default)]
struct ThemeTable {
    os_dark: bool,
    fail_source: bool,
    fail_query: bool,
    last_source: Option<ThemePreference>,
    source_calls: usize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeTheme(Arc<Mutex<ThemeTable>>);

impl FakeTheme {
    pub fn set_os_dark(&self, dark: bool) {
        self.0.lock().unwrap().os_dark = dark;
    }

    pub fn fail_source(&self, fail: bool) {
        self.0.lock().unwrap().fail_source = fail;
    }

    pub fn fail_query(&self, fail: bool) {
        self.0.lock().unwrap().fail_query = fail;
    }

    pub fn last_source(&self) -> Option<ThemePreference> {
        self.0.lock().unwrap().last_source
    }

    pub fn source_calls(&self) -> usize {
        self.0.lock().unwrap().source_calls
    }
}

impl NativeTheme for FakeTheme {
    fn set_theme_source(&self, preference: ThemePreference) -> Result<(), PlatformError> {
        let mut table = self.0.lock().unwrap();
        table.source_calls += 1;
        if table.fail_source {
            return Err(PlatformError::ThemeSource("window gone".into()));
        }
        table.last_source = Some(preference);
        Ok(())
    }

    fn prefers_dark(&self) -> Result<bool, PlatformError> {
        let table = self.0.lock().unwrap();
        if table.fail_query {
            return Err(PlatformError::ColorScheme("portal unavailable".into()));
        }
        Ok(table.os_dark)
    }
}

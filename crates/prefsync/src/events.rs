use serde::Serialize;

use crate::hotkeys::HotkeysState;
use crate::theme::ThemeState;

pub const THEME_CHANGED: &str = "theme-changed";
pub const HOTKEYS_CHANGED: &str = "hotkeys-changed";

/// A synchronized preference; each has its own broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Theme,
    Hotkeys,
}

impl Topic {
    pub fn channel(self) -> &'static str {
        match self {
            Self::Theme => THEME_CHANGED,
            Self::Hotkeys => HOTKEYS_CHANGED,
        }
    }
}

/// Canonical state pushed to every window after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SyncEvent {
    ThemeChanged(ThemeState),
    HotkeysChanged(HotkeysState),
}

impl SyncEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::ThemeChanged(_) => Topic::Theme,
            Self::HotkeysChanged(_) => Topic::Hotkeys,
        }
    }

    pub fn channel(&self) -> &'static str {
        self.topic().channel()
    }
}

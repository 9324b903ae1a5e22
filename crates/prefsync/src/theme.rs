use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PlatformError, ValidationError};

/// Store key holding the theme preference.
pub const THEME_KEY: &str = "theme";

/// What the user asked for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

/// What windows actually paint. Never "system".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveTheme {
    Light,
    Dark,
}

/// The unit broadcast to windows: the preference plus its resolved value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeState {
    pub preference: ThemePreference,
    pub effective_theme: EffectiveTheme,
}

impl ThemePreference {
    /// Validate an untyped request value.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        match value.as_str() {
            Some("light") => Ok(Self::Light),
            Some("dark") => Ok(Self::Dark),
            Some("system") => Ok(Self::System),
            _ => Err(ValidationError::Theme(value.clone())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn to_value(self) -> Value {
        Value::String(self.as_str().to_string())
    }

    pub fn resolve(self, os_prefers_dark: bool) -> EffectiveTheme {
        match self {
            Self::Light => EffectiveTheme::Light,
            Self::Dark => EffectiveTheme::Dark,
            Self::System if os_prefers_dark => EffectiveTheme::Dark,
            Self::System => EffectiveTheme::Light,
        }
    }
}

impl ThemeState {
    /// Served when the read path faults, so a window's first paint is never
    /// blocked.
    pub const FALLBACK: Self = Self {
        preference: ThemePreference::System,
        effective_theme: EffectiveTheme::Dark,
    };

    pub fn resolve(preference: ThemePreference, os_prefers_dark: bool) -> Self {
        Self {
            preference,
            effective_theme: preference.resolve(os_prefers_dark),
        }
    }
}

/// Native theme integration.
pub trait NativeTheme: Send {
    /// Point the native theme at `preference`; `System` hands control back
    /// to the OS.
    fn set_theme_source(&self, preference: ThemePreference) -> Result<(), PlatformError>;

    /// Current OS color-scheme preference.
    fn prefers_dark(&self) -> Result<bool, PlatformError>;
}

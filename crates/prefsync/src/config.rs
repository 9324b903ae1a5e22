//! Where preferences live on disk.

use std::path::{Path, PathBuf};

/// Directory name under the platform's per-user data directory.
pub const APP_DIR_NAME: &str = "gemini-desktop";

/// Default preference file name.
pub const PREFERENCES_FILE: &str = "user-preferences.json";

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "GEMINI_DESKTOP_DATA_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
}

impl SyncConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_name: PREFERENCES_FILE.to_string(),
        }
    }

    /// Resolve from `GEMINI_DESKTOP_DATA_DIR`, falling back to the platform
    /// application-data directory.
    pub fn from_env() -> Self {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::new(default_data_dir()),
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(default_data_dir())
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::data_local_dir();

    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_path_joins_file_name() {
        let config = SyncConfig::new("/tmp/gd");
        assert_eq!(
            config.preferences_path(),
            PathBuf::from("/tmp/gd").join("user-preferences.json")
        );
    }

    #[test]
    fn test_default_dir_ends_with_app_name() {
        let config = SyncConfig::default();
        assert!(config.data_dir().ends_with(APP_DIR_NAME));
    }
}

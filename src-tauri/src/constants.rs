//! Shared constants for the Gemini Desktop shell.

/// Label for the main application window.
pub const MAIN_WINDOW_LABEL: &str = "main";

/// Label for the global-hotkey quick-chat popup.
pub const QUICK_CHAT_WINDOW_LABEL: &str = "quick-chat";

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,gemini_prefsync=debug,gemini_desktop_lib=debug";

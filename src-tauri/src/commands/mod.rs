//! Tauri commands exposed to the front end.

pub mod preferences;
pub mod window;

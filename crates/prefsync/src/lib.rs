//! Gemini Desktop preference synchronization
//!
//! One broker owns the user's preferences and keeps every open window in
//! step with them:
//! - Store: durable JSON record merged over defaults
//! - Hotkeys: idempotent enable/disable of the OS global shortcuts
//! - Broker: validate, persist, apply the platform effect, broadcast
//! - Client: each window's read-through cache of the broadcast state
//!
//! The OS sits behind the [`ShortcutBackend`], [`NativeTheme`] and
//! [`WindowSource`] traits, so the desktop shell plugs in real
//! implementations and tests plug in fakes.

pub mod broker;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod hotkeys;
pub mod store;
pub mod theme;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use broker::{default_preferences, BroadcastReport, SharedBroker, SyncBroker};
pub use client::{BrokerLink, Synced, SyncedHotkeys, SyncedPreference, SyncedTheme};
pub use config::SyncConfig;
pub use error::{DeliveryError, PlatformError, ShortcutError, StoreError, ValidationError};
pub use events::{SyncEvent, Topic};
pub use hotkeys::{
    default_bindings, HotkeyAction, HotkeyRegistrar, HotkeysState, ShortcutBackend,
    ShortcutBinding,
};
pub use store::{PreferenceRecord, PreferenceStore};
pub use theme::{EffectiveTheme, NativeTheme, ThemePreference, ThemeState};
pub use window::{LocalWindows, Subscription, WindowChannel, WindowSource, WindowTarget};

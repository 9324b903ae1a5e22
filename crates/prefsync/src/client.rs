//! Window-side subscription contract
//!
//! Each window keeps a local copy of every synchronized preference it shows.
//! On mount it asks the broker once, then subscribes; every broadcast
//! overwrites the copy (the broker already serializes writes, so the last
//! one wins). Local edits update the copy optimistically and forward the
//! request. A broker-side platform failure does not roll the copy back.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::broker::SharedBroker;
use crate::events::{SyncEvent, Topic};
use crate::hotkeys::HotkeysState;
use crate::theme::{ThemePreference, ThemeState};
use crate::window::{Subscription, WindowChannel};

/// What a window can ask of the broker.
pub trait BrokerLink {
    fn get_theme(&self) -> ThemeState;
    fn get_hotkeys_enabled(&self) -> HotkeysState;
    /// Fire-and-forget.
    fn set_theme(&self, value: Value);
    /// Fire-and-forget.
    fn set_hotkeys_enabled(&self, value: Value);
}

impl BrokerLink for SharedBroker {
    fn get_theme(&self) -> ThemeState {
        self.lock().get_theme()
    }

    fn get_hotkeys_enabled(&self) -> HotkeysState {
        self.lock().get_hotkeys_enabled()
    }

    fn set_theme(&self, value: Value) {
        // rejection is already logged by the broker
        let _ = self.lock().set_theme(&value);
    }

    fn set_hotkeys_enabled(&self, value: Value) {
        let _ = self.lock().set_hotkeys_enabled(&value);
    }
}

/// Per-preference glue between [`Synced`] and the broker.
pub trait SyncedPreference {
    type State: Clone + PartialEq + std::fmt::Debug;
    type Value;

    const TOPIC: Topic;

    fn query(link: &dyn BrokerLink) -> Self::State;
    fn extract(event: SyncEvent) -> Option<Self::State>;
    fn optimistic(current: &Self::State, value: &Self::Value) -> Self::State;
    fn forward(link: &dyn BrokerLink, value: Self::Value);
}

pub struct ThemeSync;

impl SyncedPreference for ThemeSync {
    type State = ThemeState;
    type Value = ThemePreference;

    const TOPIC: Topic = Topic::Theme;

    fn query(link: &dyn BrokerLink) -> ThemeState {
        link.get_theme()
    }

    fn extract(event: SyncEvent) -> Option<ThemeState> {
        match event {
            SyncEvent::ThemeChanged(state) => Some(state),
            SyncEvent::HotkeysChanged(_) => None,
        }
    }

    // "system" keeps the current paint until the broker resolves it
    fn optimistic(current: &ThemeState, value: &ThemePreference) -> ThemeState {
        ThemeState {
            preference: *value,
            effective_theme: match value {
                ThemePreference::System => current.effective_theme,
                explicit => explicit.resolve(false),
            },
        }
    }

    fn forward(link: &dyn BrokerLink, value: ThemePreference) {
        link.set_theme(value.to_value());
    }
}

pub struct HotkeysSync;

impl SyncedPreference for HotkeysSync {
    type State = HotkeysState;
    type Value = bool;

    const TOPIC: Topic = Topic::Hotkeys;

    fn query(link: &dyn BrokerLink) -> HotkeysState {
        link.get_hotkeys_enabled()
    }

    fn extract(event: SyncEvent) -> Option<HotkeysState> {
        match event {
            SyncEvent::HotkeysChanged(state) => Some(state),
            SyncEvent::ThemeChanged(_) => None,
        }
    }

    fn optimistic(_current: &HotkeysState, value: &bool) -> HotkeysState {
        HotkeysState { enabled: *value }
    }

    fn forward(link: &dyn BrokerLink, value: bool) {
        link.set_hotkeys_enabled(Value::Bool(value));
    }
}

/// A window's cached copy of one synchronized preference.
pub struct Synced<P: SyncedPreference> {
    state: P::State,
    subscription: Option<Subscription>,
}

impl<P: SyncedPreference> Synced<P> {
    /// Query once, then subscribe.
    pub fn mount(link: &dyn BrokerLink, window: &Arc<WindowChannel>) -> Self {
        let state = P::query(link);
        let subscription = window.subscribe(P::TOPIC);
        debug!(topic = ?P::TOPIC, ?state, "mounted");
        Self {
            state,
            subscription: Some(subscription),
        }
    }

    pub fn state(&self) -> &P::State {
        &self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply every pending broadcast. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let Some(subscription) = self.subscription.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        while let Some(event) = subscription.try_next() {
            if let Some(state) = P::extract(event) {
                self.state = state;
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next broadcast and apply it. `None` once unmounted or the
    /// window is gone.
    pub async fn changed(&mut self) -> Option<&P::State> {
        let subscription = self.subscription.as_mut()?;
        loop {
            let event = subscription.next().await?;
            if let Some(state) = P::extract(event) {
                self.state = state;
                return Some(&self.state);
            }
        }
    }

    /// Update locally right away and forward to the broker.
    pub fn set(&mut self, link: &dyn BrokerLink, value: P::Value) {
        self.state = P::optimistic(&self.state, &value);
        P::forward(link, value);
    }

    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            let topic = subscription.topic();
            subscription.unsubscribe();
            debug!(?topic, "unmounted");
        }
    }
}

pub type SyncedTheme = Synced<ThemeSync>;
pub type SyncedHotkeys = Synced<HotkeysSync>;

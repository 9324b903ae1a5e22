//! Window targets and the in-process broadcast transport.
//!
//! The broker only sees [`WindowTarget`]s handed out by a [`WindowSource`].
//! The desktop shell implements both over real webview windows;
//! [`WindowChannel`] and [`LocalWindows`] implement them in-process, with an
//! explicit per-topic [`Subscription`] handle on the receiving side.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::DeliveryError;
use crate::events::{SyncEvent, Topic};

/// One open window as seen by the broker.
pub trait WindowTarget: Send + Sync {
    fn label(&self) -> &str;
    fn is_destroyed(&self) -> bool;
    fn deliver(&self, event: &SyncEvent) -> Result<(), DeliveryError>;
}

/// Enumerates the windows open right now.
pub trait WindowSource: Send + Sync {
    fn open_windows(&self) -> Vec<Arc<dyn WindowTarget>>;
}

struct Listener {
    id: u64,
    topic: Topic,
    tx: UnboundedSender<SyncEvent>,
}

pub struct WindowChannel {
    label: String,
    destroyed: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

impl WindowChannel {
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            destroyed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn subscribe(self: &Arc<Self>, topic: Topic) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners().push(Listener { id, topic, tx });
        debug!(window = %self.label, ?topic, id, "subscribed");

        Subscription {
            id,
            topic,
            rx,
            window: Arc::downgrade(self),
        }
    }

    /// Mark the window gone; any handle still held by the broker will skip it.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.listeners().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners().retain(|l| l.id != id);
        debug!(window = %self.label, id, "unsubscribed");
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WindowTarget for WindowChannel {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn deliver(&self, event: &SyncEvent) -> Result<(), DeliveryError> {
        if self.is_destroyed() {
            return Err(DeliveryError::Destroyed(self.label.clone()));
        }
        let topic = event.topic();
        // a failed send means the receiving half was dropped without unsubscribing
        self.listeners()
            .retain(|l| l.topic != topic || l.tx.send(*event).is_ok());
        Ok(())
    }
}

/// Receiving half of a window's subscription to one topic.
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) removes the
/// listener from its window.
pub struct Subscription {
    id: u64,
    topic: Topic,
    rx: UnboundedReceiver<SyncEvent>,
    window: Weak<WindowChannel>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn try_next(&mut self) -> Option<SyncEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next broadcast. `None` once the window is destroyed.
    pub async fn next(&mut self) -> Option<SyncEvent> {
        self.rx.recv().await
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(window) = self.window.upgrade() {
            window.unsubscribe(self.id);
        }
    }
}

/// In-process [`WindowSource`].
#[derive(Default)]
pub struct LocalWindows {
    windows: Mutex<Vec<Arc<WindowChannel>>>,
}

impl LocalWindows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, label: impl Into<String>) -> Arc<WindowChannel> {
        let window = WindowChannel::new(label);
        self.lock().push(window.clone());
        window
    }

    /// Destroy and forget the window labelled `label`.
    pub fn close(&self, label: &str) {
        let mut windows = self.lock();
        for window in windows.iter().filter(|w| w.label() == label) {
            window.destroy();
        }
        windows.retain(|w| w.label() != label);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<WindowChannel>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WindowSource for LocalWindows {
    fn open_windows(&self) -> Vec<Arc<dyn WindowTarget>> {
        self.lock()
            .iter()
            .map(|w| w.clone() as Arc<dyn WindowTarget>)
            .collect()
    }
}

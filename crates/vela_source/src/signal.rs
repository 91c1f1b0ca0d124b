//! Request sources.
//!
//! A [`Source`] is anything that can report its latest value and hand out a
//! subscription that wakes on every change. Sources are backed by
//! [`tokio::sync::watch`], so a subscriber that falls behind always observes
//! the most recent value rather than a queue of stale ones.
//!
//! A source starts either **cold** (no value yet) or **warm**. A cold source
//! blocks every join it participates in until its first value arrives.

use std::sync::Arc;

use tokio::sync::watch;

/// A reactive value that a resource controller can depend on.
///
/// Implementations must keep their channel open for as long as they may still
/// produce values. Once every sender of a source is gone, subscribers see the
/// source as closed and keep its last value.
pub trait Source: Send + Sync + 'static {
    /// The type of value this source produces.
    type Value: Clone + Send + Sync + 'static;

    /// Returns the latest value, or `None` while the source is cold.
    fn latest(&self) -> Option<Self::Value>;

    /// Subscribes to changes.
    ///
    /// The returned receiver treats the current value as already seen;
    /// `changed()` resolves on the next write.
    fn subscribe(&self) -> watch::Receiver<Option<Self::Value>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Signal
// ─────────────────────────────────────────────────────────────────────────────

/// A writable source.
///
/// Cloning a `Signal` yields another handle to the same value, so a UI layer
/// can keep one clone for writing while the controller holds another.
///
/// # Example
///
/// ```
/// use vela_source::{Signal, Source};
///
/// let limit = Signal::with_value(5_u32);
/// limit.set(8);
/// assert_eq!(limit.latest(), Some(8));
///
/// let cold = Signal::<u32>::new();
/// assert!(!cold.is_warm());
/// ```
#[derive(Debug)]
pub struct Signal<V> {
    tx: Arc<watch::Sender<Option<V>>>,
}

impl<V> Clone for Signal<V> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<V> Default for Signal<V> {
    fn default() -> Self {
        Self::from_initial(None)
    }
}

impl<V> Signal<V> {
    /// Creates a cold signal with no value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a warm signal holding `value`.
    #[must_use]
    pub fn with_value(value: V) -> Self {
        Self::from_initial(Some(value))
    }

    fn from_initial(initial: Option<V>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the value and notifies every subscriber.
    ///
    /// Subscribers are notified even when the new value equals the old one.
    pub fn set(&self, value: V) {
        self.tx.send_replace(Some(value));
    }

    /// Modifies the value in place and notifies every subscriber.
    ///
    /// A cold signal stays cold and nobody is notified.
    pub fn update(&self, f: impl FnOnce(&mut V)) {
        self.tx.send_if_modified(|slot| match slot {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        });
    }

    /// Returns `true` once the signal holds a value.
    #[must_use]
    pub fn is_warm(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<V: Clone + Send + Sync + 'static> Source for Signal<V> {
    type Value = V;

    fn latest(&self) -> Option<V> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<V>> {
        self.tx.subscribe()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Constant
// ─────────────────────────────────────────────────────────────────────────────

/// A source that holds one value forever.
///
/// Useful for request slots that never change, such as an API base URL, when
/// the loader still wants to receive them as part of the request tuple.
#[derive(Debug, Clone)]
pub struct Constant<V> {
    inner: Signal<V>,
}

impl<V> Constant<V> {
    /// Creates a constant source.
    #[must_use]
    pub fn new(value: V) -> Self {
        Self {
            inner: Signal::with_value(value),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Source for Constant<V> {
    type Value = V;

    fn latest(&self) -> Option<V> {
        self.inner.latest()
    }

    fn subscribe(&self) -> watch::Receiver<Option<V>> {
        self.inner.subscribe()
    }
}

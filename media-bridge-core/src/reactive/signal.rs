//! Signal Implementation
//!
//! A Signal is the reactive cell the bridge writes selections into. It
//! holds a value and notifies the computations that depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a tracking context (an effect), the
//!    signal registers itself as a dependency of that context.
//!
//! 2. When a signal's value is set, every registered callback is invoked
//!    synchronously before `set` returns.
//!
//! 3. Callbacks are snapshotted before they run, so a callback may
//!    subscribe or unsubscribe without deadlocking the signal.
//!
//! `set` always notifies. Deciding whether a new value is worth writing is
//! the caller's job; the selector bridge does it with its memo.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::subscriber::{Notify, Source, SubscriberId};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct SignalInner<T> {
    id: u64,
    value: RwLock<T>,
    notifiers: RwLock<IndexMap<SubscriberId, Notify>>,
    /// Number of `set` calls so far.
    writes: AtomicUsize,
}

impl<T: Send + Sync> Source for SignalInner<T> {
    fn subscribe(&self, subscriber: SubscriberId, notify: Notify) {
        self.notifiers.write().insert(subscriber, notify);
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        self.notifiers.write().shift_remove(&subscriber);
    }
}

/// A reactive cell holding a value of type T.
///
/// Clones share the same cell.
///
/// # Example
///
/// ```rust,ignore
/// let paused = Signal::new(true);
///
/// let value = paused.get();
///
/// // Notifies subscribers
/// paused.set(false);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: next_signal_id(),
                value: RwLock::new(value),
                notifiers: RwLock::new(IndexMap::new()),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called within a tracking context, the running computation also
    /// becomes a dependent of this signal.
    pub fn get(&self) -> T {
        if ReactiveContext::is_active() {
            let source: Arc<dyn Source> = self.inner.clone();
            ReactiveContext::track_dependency(self.inner.id, source);
        }

        self.get_untracked()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value without cloning or tracking it.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Set a new value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.write() = value;
        self.inner.writes.fetch_add(1, Ordering::SeqCst);

        self.notify_subscribers();
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&self.inner.value.read());
        self.set(new_value);
    }

    /// Register a notification callback for a subscriber.
    pub fn subscribe<F>(&self, subscriber_id: SubscriberId, notify: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.subscribe(subscriber_id, Arc::new(notify));
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        self.inner.unsubscribe(subscriber_id);
    }

    fn notify_subscribers(&self) {
        let notifiers: SmallVec<[Notify; 4]> =
            self.inner.notifiers.read().values().cloned().collect();
        for notify in notifiers {
            notify();
        }
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.notifiers.read().len()
    }

    /// Number of times the value has been set since creation.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .field("writes", &self.write_count())
            .finish()
    }
}

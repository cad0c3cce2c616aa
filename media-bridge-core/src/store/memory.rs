//! In-memory Store
//!
//! [`MemoryStore`] holds a snapshot behind a lock and runs every dispatched
//! action through a reducer. When the reducer produces a new state, the
//! store publishes it as a fresh `Arc` and then notifies listeners, in
//! subscription order, before `dispatch` returns. The reducer runs under
//! the state's write lock, so dispatches from several threads apply one at
//! a time; listeners are called after the lock is released.
//!
//! # Listener Mutation
//!
//! The listener list is snapshotted before a notification pass, so
//! listeners may subscribe and unsubscribe freely while being notified.
//! Each registration also carries an `active` flag that `unsubscribe`
//! clears: a listener removed during a pass is skipped for the rest of
//! that pass.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::reducer::MediaReducer;
use super::state::MediaState;
use super::{Listener, Store, Unsubscribe};
use crate::action::MediaAction;
use crate::config::StoreConfig;
use crate::reactive::SubscriberId;

type ReduceFn<S, A> = Box<dyn Fn(&S, &A) -> Option<S> + Send + Sync>;

struct ListenerSlot {
    listener: Listener,
    active: Arc<AtomicBool>,
}

type ListenerMap = Mutex<IndexMap<SubscriberId, ListenerSlot>>;

/// A reducer-driven store keeping its state in memory.
pub struct MemoryStore<S, A> {
    state: RwLock<Arc<S>>,
    reduce: ReduceFn<S, A>,
    listeners: Arc<ListenerMap>,
    dispatches: AtomicUsize,
}

impl<S, A> MemoryStore<S, A>
where
    S: Send + Sync + 'static,
{
    /// Create a store. `reduce` returns `None` when an action changes
    /// nothing; no notification is sent in that case.
    pub fn new<F>(initial: S, reduce: F) -> Self
    where
        F: Fn(&S, &A) -> Option<S> + Send + Sync + 'static,
    {
        Self {
            state: RwLock::new(Arc::new(initial)),
            reduce: Box::new(reduce),
            listeners: Arc::new(Mutex::new(IndexMap::new())),
            dispatches: AtomicUsize::new(0),
        }
    }

    /// Replace the state wholesale and notify.
    pub fn replace_state(&self, next: S) {
        self.publish(Arc::new(next));
    }

    /// Publish `snapshot` as the current state and notify.
    ///
    /// Publishing the snapshot that is already current still notifies,
    /// which is how a store signals "something may have changed" without
    /// producing a new snapshot.
    pub fn publish(&self, snapshot: Arc<S>) {
        *self.state.write() = snapshot;
        self.notify();
    }

    fn notify(&self) {
        let slots: SmallVec<[(Listener, Arc<AtomicBool>); 8]> = self
            .listeners
            .lock()
            .values()
            .map(|slot| (slot.listener.clone(), slot.active.clone()))
            .collect();

        trace!(listeners = slots.len(), "notifying store listeners");
        for (listener, active) in slots {
            if active.load(Ordering::SeqCst) {
                listener();
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Number of actions dispatched so far, including ones that changed
    /// nothing.
    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }
}

impl MemoryStore<MediaState, MediaAction> {
    /// A media store applying requests optimistically with [`MediaReducer`].
    pub fn media(config: StoreConfig) -> Self {
        let reducer = MediaReducer::new(&config);
        Self::new(config.initial_state, move |state, action| {
            reducer.reduce(state, action)
        })
    }
}

impl<S, A> Store for MemoryStore<S, A>
where
    S: Send + Sync + 'static,
{
    type State = S;
    type Action = A;

    fn get_state(&self) -> Arc<S> {
        self.state.read().clone()
    }

    fn dispatch(&self, action: A) {
        self.dispatches.fetch_add(1, Ordering::SeqCst);

        // Reduce under the write lock so concurrent dispatches serialize.
        let changed = {
            let mut state = self.state.write();
            match (self.reduce)(&**state, &action) {
                Some(next) => {
                    *state = Arc::new(next);
                    true
                }
                None => false,
            }
        };

        if changed {
            self.notify();
        } else {
            trace!("dispatch left the state unchanged");
        }
    }

    fn subscribe(&self, listener: Listener) -> Unsubscribe {
        let id = SubscriberId::new();
        let active = Arc::new(AtomicBool::new(true));
        self.listeners.lock().insert(
            id,
            ListenerSlot {
                listener,
                active: active.clone(),
            },
        );
        debug!(%id, "store listener added");

        let listeners = Arc::downgrade(&self.listeners);
        Unsubscribe::new(move || {
            active.store(false, Ordering::SeqCst);
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().shift_remove(&id);
            }
            debug!(%id, "store listener removed");
        })
    }
}

impl<S, A> fmt::Debug for MemoryStore<S, A>
where
    S: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("listeners", &self.listener_count())
            .field("dispatches", &self.dispatch_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_store() -> MemoryStore<i64, i64> {
        MemoryStore::new(0, |state: &i64, delta: &i64| {
            (*delta != 0).then(|| state + delta)
        })
    }

    fn counting_listener() -> (Arc<AtomicUsize>, Listener) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let listener: Listener = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (calls, listener)
    }

    #[test]
    fn dispatch_notifies_before_returning() {
        let store = counter_store();
        let (calls, listener) = counting_listener();
        let _sub = store.subscribe(listener);

        store.dispatch(5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*store.get_state(), 5);
    }

    #[test]
    fn unchanged_state_is_not_published() {
        let store = counter_store();
        let (calls, listener) = counting_listener();
        let _sub = store.subscribe(listener);
        let before = store.get_state();

        store.dispatch(0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(Arc::ptr_eq(&before, &store.get_state()));
        assert_eq!(store.dispatch_count(), 1);
    }

    #[test]
    fn each_change_publishes_a_new_snapshot() {
        let store = counter_store();
        let first = store.get_state();
        store.dispatch(1);
        assert!(!Arc::ptr_eq(&first, &store.get_state()));
    }

    #[test]
    fn listener_reads_the_new_state() {
        let store = Arc::new(counter_store());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = store.clone();
        let log = seen.clone();
        let _sub = store.subscribe(Arc::new(move || log.lock().push(*s.get_state())));

        store.dispatch(2);
        store.dispatch(3);
        assert_eq!(*seen.lock(), vec![2, 5]);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_removes_listener() {
        let store = counter_store();
        let (calls, listener) = counting_listener();
        let sub = store.subscribe(listener);
        assert_eq!(store.listener_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(store.listener_count(), 0);

        store.dispatch(1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_removed_mid_pass_is_skipped() {
        let store = counter_store();
        let (second_calls, second) = counting_listener();

        let victim: Arc<Mutex<Option<Unsubscribe>>> = Arc::new(Mutex::new(None));
        let v = victim.clone();
        let _first = store.subscribe(Arc::new(move || {
            if let Some(sub) = v.lock().take() {
                sub.unsubscribe();
            }
        }));
        *victim.lock() = Some(store.subscribe(second));

        store.dispatch(1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn unsubscribe_after_store_dropped_is_harmless() {
        let store = counter_store();
        let (_calls, listener) = counting_listener();
        let sub = store.subscribe(listener);

        drop(store);
        sub.unsubscribe();
    }

    #[test]
    fn concurrent_dispatches_are_not_lost() {
        let store = counter_store();
        let (calls, listener) = counting_listener();
        let _sub = store.subscribe(listener);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..2_000 {
                        store.dispatch(1);
                    }
                });
            }
        });

        assert_eq!(*store.get_state(), 16_000);
        assert_eq!(store.dispatch_count(), 16_000);
        assert_eq!(calls.load(Ordering::SeqCst), 16_000);
    }

    #[test]
    fn media_store_uses_configured_initial_state() {
        let config = StoreConfig::default()
            .with_initial_state(MediaState::new().with("mediaPaused", true));
        let store = MemoryStore::media(config);

        assert_eq!(store.get_state().paused(), Some(true));
        store.dispatch(MediaAction::PlayRequest);
        assert_eq!(store.get_state().paused(), Some(false));
    }
}

//! Store Subscription Bridge
//!
//! Connects an external store to a reactive cell. A bridge computes its
//! selection eagerly, seeds a [`Signal`] with it, subscribes to the store,
//! and from then on rewrites the cell only when the memoized selection
//! actually changes.
//!
//! # Lifetime
//!
//! A bridge belongs to the scope that was current when it was created. The
//! store subscription is torn down, exactly once, when that scope is
//! disposed; a listener invocation that races the teardown is ignored via
//! the binding's `active` flag. A bridge created outside any scope has
//! nothing to bind to and behaves as a constant.
//!
//! # Store Swaps
//!
//! [`use_store_selector`] reads its store from a signal inside an
//! [`Effect`]. Swapping the store reruns the effect: the previous run's
//! subscription is released with the run's scope, a new one is taken out
//! against the new store, and the selection is recomputed against its
//! snapshot. The memo survives the swap, so an equal selection is not
//! written again.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::memo::SelectorMemo;
use crate::reactive::{on_cleanup, untrack, Effect, Scope, Signal, SubscriberId};
use crate::store::{Listener, Store, Unsubscribe};

type SnapshotFn<S> = Arc<dyn Fn() -> Arc<S> + Send + Sync>;

/// Read side of a bridge: a reactive cell holding the current selection.
pub struct Selection<T>
where
    T: Clone + Send + Sync + 'static,
{
    cell: Signal<T>,
}

impl<T> Selection<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Current selection. Tracked when read inside an effect.
    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn get_untracked(&self) -> T {
        self.cell.get_untracked()
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with_untracked(f)
    }

    /// Number of selections published to the cell, the eager initial one
    /// included.
    pub fn write_count(&self) -> usize {
        self.cell.write_count() + 1
    }

    /// The underlying cell.
    pub fn signal(&self) -> &Signal<T> {
        &self.cell
    }
}

impl<T> Clone for Selection<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Selection<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cell
            .with_untracked(|value| f.debug_struct("Selection").field("value", value).finish())
    }
}

struct Binding<S, T>
where
    T: Clone + Send + Sync + 'static,
{
    id: SubscriberId,
    memo: Mutex<SelectorMemo<S, T>>,
    cell: Signal<T>,
}

impl<S, T> Binding<S, T>
where
    S: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn new(memo: SelectorMemo<S, T>, cell: Signal<T>) -> Arc<Self> {
        Arc::new(Self {
            id: SubscriberId::new(),
            memo: Mutex::new(memo),
            cell,
        })
    }

    /// Run the memo against `snapshot` and publish a changed selection.
    fn refresh(&self, snapshot: &Arc<S>) {
        untrack(|| {
            let (value, outcome) = self.memo.lock().select(snapshot);
            if outcome.is_changed() {
                trace!(subscriber = %self.id, ?outcome, "selection changed");
                self.cell.set(value);
            }
        });
    }

    /// Subscribe through `subscribe` for the lifetime of the current scope.
    fn attach<F>(self: &Arc<Self>, subscribe: F, get_snapshot: SnapshotFn<S>)
    where
        F: FnOnce(Listener) -> Unsubscribe,
    {
        let active = Arc::new(AtomicBool::new(true));
        let listener: Listener = {
            let active = active.clone();
            let binding = self.clone();
            let get_snapshot = get_snapshot.clone();
            Arc::new(move || {
                if active.load(Ordering::SeqCst) {
                    binding.refresh(&get_snapshot());
                }
            })
        };

        let unsubscribe = untrack(|| subscribe(listener));
        debug!(subscriber = %self.id, "selector subscribed");

        let id = self.id;
        on_cleanup(move || {
            active.store(false, Ordering::SeqCst);
            unsubscribe.unsubscribe();
            debug!(subscriber = %id, "selector unsubscribed");
        });

        // Catch a change that landed between the eager read and subscribing.
        self.refresh(&get_snapshot());
    }
}

/// Bridge any subscribe/snapshot pair to a reactive cell.
///
/// `subscribe` is called once, with the bridge's listener, and must return
/// the handle that removes it. `get_snapshot` must return the same `Arc`
/// for as long as nothing changed.
pub fn use_sync_external_store_with_selector<S, T, Sub, Snap>(
    subscribe: Sub,
    get_snapshot: Snap,
    memo: SelectorMemo<S, T>,
) -> Selection<T>
where
    S: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    Sub: FnOnce(Listener) -> Unsubscribe,
    Snap: Fn() -> Arc<S> + Send + Sync + 'static,
{
    let mut memo = memo;
    let (initial, _) = untrack(|| memo.select(&get_snapshot()));
    let cell = Signal::new(initial);
    let selection = Selection { cell: cell.clone() };

    if Scope::current().is_none() {
        warn!("selector created outside of a scope will not follow the store");
        return selection;
    }

    Binding::new(memo, cell).attach(subscribe, Arc::new(get_snapshot));
    selection
}

/// Bridge the store held in `store` to a reactive cell.
///
/// While `store` holds `None`, the selector sees `fallback`. Replacing the
/// store moves the subscription to the new one.
pub fn use_store_selector<St, T>(
    store: &Signal<Option<Arc<St>>>,
    fallback: Arc<St::State>,
    memo: SelectorMemo<St::State, T>,
) -> Selection<T>
where
    St: Store + ?Sized + 'static,
    T: Clone + Send + Sync + 'static,
{
    let mut memo = memo;
    let snapshot = match store.get_untracked() {
        Some(current) => current.get_state(),
        None => fallback.clone(),
    };
    let (initial, _) = untrack(|| memo.select(&snapshot));
    let cell = Signal::new(initial);
    let selection = Selection { cell: cell.clone() };

    if Scope::current().is_none() {
        warn!("selector created outside of a scope will not follow the store");
        return selection;
    }

    let binding = Binding::new(memo, cell);
    let store = store.clone();
    Effect::new(move || match store.get() {
        Some(current) => {
            let get_snapshot: SnapshotFn<St::State> = {
                let current = current.clone();
                Arc::new(move || current.get_state())
            };
            binding.attach(|listener| current.subscribe(listener), get_snapshot);
        }
        None => {
            trace!(subscriber = %binding.id, "no store, selecting from fallback");
            binding.refresh(&fallback);
        }
    });

    selection
}

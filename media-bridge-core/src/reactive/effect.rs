//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever one of the
//! signals it read changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs immediately to establish its initial
//!    dependencies.
//!
//! 2. Each run happens inside a fresh child scope, so `on_cleanup` calls
//!    made by the effect body belong to that run.
//!
//! 3. When a dependency changes, the previous run's scope is disposed (its
//!    cleanups run), old dependencies are dropped, and the body runs again,
//!    tracking a new set of dependencies.
//!
//! 4. An effect created inside a scope is disposed with that scope.
//!
//! Runs are synchronous. A change notified while the effect is already
//! running is not lost: the effect runs once more after the current run.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::scope::{Scope, WeakScope};
use super::subscriber::{Notify, Source, SubscriberId};

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct EffectInner {
    id: u64,
    subscriber_id: SubscriberId,
    run: Box<dyn Fn() + Send + Sync>,
    owner: Option<WeakScope>,
    /// Sources read during the last run.
    sources: Mutex<Vec<Arc<dyn Source>>>,
    /// Scope owning the last run's cleanups.
    run_scope: Mutex<Option<Scope>>,
    disposed: AtomicBool,
    running: AtomicBool,
    pending: AtomicBool,
    run_count: AtomicUsize,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl EffectInner {
    fn execute(self: &Arc<Self>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            self.pending.store(true, Ordering::SeqCst);
            return;
        }
        let _running = RunningGuard(&self.running);

        loop {
            let previous = self.run_scope.lock().take();
            if let Some(scope) = previous {
                scope.dispose();
            }

            let scope = match self.owner.as_ref().and_then(WeakScope::upgrade) {
                Some(owner) => owner.child(),
                None => Scope::root(),
            };

            // Old subscriptions stay in place during the run so a write made
            // by the body itself still marks the effect pending.
            let sources = {
                let _ctx = ReactiveContext::enter(self.subscriber_id);
                scope.run(|| (self.run)());
                ReactiveContext::take_dependencies()
            };
            self.run_count.fetch_add(1, Ordering::SeqCst);

            if self.disposed.load(Ordering::SeqCst) {
                scope.dispose();
                return;
            }

            let stale = std::mem::take(&mut *self.sources.lock());
            for source in stale {
                source.unsubscribe(self.subscriber_id);
            }

            let weak: Weak<EffectInner> = Arc::downgrade(self);
            let notify: Notify = Arc::new(move || {
                if let Some(effect) = weak.upgrade() {
                    effect.execute();
                }
            });
            for source in &sources {
                source.subscribe(self.subscriber_id, notify.clone());
            }
            *self.sources.lock() = sources;
            *self.run_scope.lock() = Some(scope);

            if !self.pending.swap(false, Ordering::SeqCst) {
                break;
            }
        }
    }

    /// Drop all dependencies and dispose the last run's scope.
    fn release(&self) {
        let sources = std::mem::take(&mut *self.sources.lock());
        for source in sources {
            source.unsubscribe(self.subscriber_id);
        }
        let scope = self.run_scope.lock().take();
        if let Some(scope) = scope {
            scope.dispose();
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.release();
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A side-effecting computation that re-runs when its dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let muted = Signal::new(false);
///
/// let m = muted.clone();
/// let effect = Effect::new(move || {
///     println!("muted: {}", m.get());
/// });
///
/// muted.set(true);  // Prints: "muted: true"
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create a new effect and run it once.
    ///
    /// If a scope is current, the effect is owned by it: it stays alive
    /// while the scope does and is disposed with it, whether or not the
    /// returned handle is kept.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let owner = Scope::current();
        let inner = Arc::new(EffectInner {
            id: next_effect_id(),
            subscriber_id: SubscriberId::new(),
            run: Box::new(run),
            owner: owner.as_ref().map(Scope::downgrade),
            sources: Mutex::new(Vec::new()),
            run_scope: Mutex::new(None),
            disposed: AtomicBool::new(false),
            running: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
        });

        if let Some(owner) = owner {
            let owned = inner.clone();
            owner.on_cleanup(move || owned.dispose());
        }

        inner.execute();

        Self { inner }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Re-run the effect now.
    pub fn schedule(&self) {
        self.inner.execute();
    }

    /// Dispose of the effect.
    ///
    /// Runs the last run's cleanups and drops all dependencies. After
    /// disposal the effect never runs again.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of sources the last run depended on.
    pub fn dependency_count(&self) -> usize {
        self.inner.sources.lock().len()
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{on_cleanup, untrack, Signal};
    use std::sync::atomic::AtomicI32;

    #[test]
    fn effect_runs_on_creation() {
        let run_count = Arc::new(AtomicI32::new(0));
        let run_count_clone = run_count.clone();

        let effect = Effect::new(move || {
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_reruns_when_dependency_changes() {
        let signal = Signal::new(0);
        let observed = Arc::new(AtomicI32::new(-1));

        let s = signal.clone();
        let o = observed.clone();
        let effect = Effect::new(move || {
            o.store(s.get(), Ordering::SeqCst);
        });

        assert_eq!(observed.load(Ordering::SeqCst), 0);
        assert_eq!(effect.dependency_count(), 1);

        signal.set(42);
        assert_eq!(observed.load(Ordering::SeqCst), 42);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn untracked_reads_do_not_rerun() {
        let signal = Signal::new(0);

        let s = signal.clone();
        let effect = Effect::new(move || {
            untrack(|| s.get());
        });

        signal.set(1);
        assert_eq!(effect.run_count(), 1);
        assert_eq!(effect.dependency_count(), 0);
    }

    #[test]
    fn cleanup_runs_before_each_rerun_and_on_dispose() {
        let signal = Signal::new(0);
        let cleanups = Arc::new(AtomicI32::new(0));

        let s = signal.clone();
        let c = cleanups.clone();
        let effect = Effect::new(move || {
            s.get();
            let c = c.clone();
            on_cleanup(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(cleanups.load(Ordering::SeqCst), 0);

        signal.set(1);
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);

        effect.dispose();
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);

        // Disposal is final
        effect.dispose();
        signal.set(2);
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn effect_does_not_run_after_disposal() {
        let run_count = Arc::new(AtomicI32::new(0));
        let run_count_clone = run_count.clone();

        let effect = Effect::new(move || {
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        effect.dispose();
        assert!(effect.is_disposed());

        effect.schedule();
        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn owning_scope_keeps_effect_alive_and_disposes_it() {
        let signal = Signal::new(0);
        let run_count = Arc::new(AtomicI32::new(0));
        let scope = Scope::root();

        let s = signal.clone();
        let r = run_count.clone();
        scope.run(|| {
            // Handle dropped right away; the scope owns the effect.
            Effect::new(move || {
                s.get();
                r.fetch_add(1, Ordering::SeqCst);
            });
        });

        signal.set(1);
        assert_eq!(run_count.load(Ordering::SeqCst), 2);

        scope.dispose();
        signal.set(2);
        assert_eq!(run_count.load(Ordering::SeqCst), 2);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn write_during_run_schedules_one_more_run() {
        let signal = Signal::new(0);

        let s = signal.clone();
        let effect = Effect::new(move || {
            let value = s.get();
            if value == 1 {
                s.set(2);
            }
        });

        signal.set(1);
        assert_eq!(signal.get_untracked(), 2);
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn effect_clone_shares_state() {
        let effect1 = Effect::new(|| {});
        let effect2 = effect1.clone();

        assert_eq!(effect1.id(), effect2.id());

        effect1.schedule();
        assert_eq!(effect2.run_count(), 2);

        effect1.dispose();
        assert!(effect2.is_disposed());
    }
}

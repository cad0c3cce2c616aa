//! Ownership Scopes
//!
//! A [`Scope`] owns everything created while it is current: effects,
//! store subscriptions, child scopes. Disposing the scope releases them.
//!
//! # Guarantees
//!
//! - Every cleanup registered with a scope runs exactly once: on
//!   [`Scope::dispose`], or when the last handle to the scope is dropped.
//! - Children are disposed before their parent's own cleanups run.
//! - Cleanups run in reverse registration order.
//! - Registering a cleanup on an already disposed scope runs it at once.
//!
//! # Context
//!
//! Scopes also carry a typed context map. [`use_context`] looks a value up
//! in the current scope and then in each ancestor, which is how hooks find
//! the provider's store without it being passed down by hand.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{trace, warn};

thread_local! {
    static SCOPE_STACK: RefCell<Vec<Scope>> = RefCell::new(Vec::new());
}

static SCOPE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

type Cleanup = Box<dyn FnOnce() + Send>;

struct ScopeInner {
    id: u64,
    parent: Option<Weak<ScopeInner>>,
    cleanups: Mutex<Vec<Cleanup>>,
    children: Mutex<Vec<Scope>>,
    contexts: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    disposed: AtomicBool,
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let children = std::mem::take(self.children.get_mut());
        for child in children.iter().rev() {
            child.dispose();
        }
        let cleanups = std::mem::take(self.cleanups.get_mut());
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
    }
}

/// An ownership region for reactive resources.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

/// Non-owning handle to a [`Scope`].
#[derive(Clone)]
pub struct WeakScope {
    inner: Weak<ScopeInner>,
}

impl WeakScope {
    pub fn upgrade(&self) -> Option<Scope> {
        self.inner.upgrade().map(|inner| Scope { inner })
    }
}

impl Scope {
    fn with_parent(parent: Option<Weak<ScopeInner>>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: SCOPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
                parent,
                cleanups: Mutex::new(Vec::new()),
                children: Mutex::new(Vec::new()),
                contexts: Mutex::new(HashMap::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Create a scope with no parent.
    pub fn root() -> Self {
        Self::with_parent(None)
    }

    /// Create a child scope. The child is disposed with this scope.
    ///
    /// A child of a disposed scope starts out disposed.
    pub fn child(&self) -> Scope {
        let child = Self::with_parent(Some(Arc::downgrade(&self.inner)));
        if self.is_disposed() {
            child.dispose();
        } else {
            self.inner.children.lock().push(child.clone());
        }
        child
    }

    /// The innermost scope entered on this thread, if any.
    pub fn current() -> Option<Scope> {
        SCOPE_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Run `f` with this scope as the current scope.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        SCOPE_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
        let _guard = PopGuard;
        f()
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakScope {
        WeakScope {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Register `f` to run when this scope is disposed.
    pub fn on_cleanup<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_disposed() {
            f();
            return;
        }
        self.inner.cleanups.lock().push(Box::new(f));
    }

    /// Dispose this scope: children first, then this scope's cleanups in
    /// reverse order. Calling it again does nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let children = std::mem::take(&mut *self.inner.children.lock());
        for child in children.iter().rev() {
            child.dispose();
        }

        let cleanups = std::mem::take(&mut *self.inner.cleanups.lock());
        trace!(scope = self.inner.id, cleanups = cleanups.len(), "disposing scope");
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }

        self.inner.contexts.lock().clear();

        if let Some(parent) = self.inner.parent.as_ref().and_then(Weak::upgrade) {
            parent
                .children
                .lock()
                .retain(|child| !Arc::ptr_eq(&child.inner, &self.inner));
        }
    }

    /// Make `value` available to this scope and its descendants.
    pub fn provide_context<T>(&self, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.inner
            .contexts
            .lock()
            .insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Look up a context value here or in the nearest ancestor providing one.
    pub fn use_context<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut current = Some(self.inner.clone());
        while let Some(scope) = current {
            let found = scope
                .contexts
                .lock()
                .get(&TypeId::of::<T>())
                .and_then(|value| value.downcast_ref::<T>().cloned());
            if found.is_some() {
                return found;
            }
            current = scope.parent.as_ref().and_then(Weak::upgrade);
        }
        None
    }

    /// Number of live child scopes.
    pub fn child_count(&self) -> usize {
        self.inner.children.lock().len()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .field("children", &self.child_count())
            .finish()
    }
}

struct PopGuard;

impl Drop for PopGuard {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Register a cleanup with the current scope.
///
/// Outside of any scope there is nothing to tie the cleanup to; it is
/// dropped without running and a warning is logged.
pub fn on_cleanup<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    match Scope::current() {
        Some(scope) => scope.on_cleanup(f),
        None => warn!("cleanup registered outside of a scope will never run"),
    }
}

/// Provide a context value on the current scope. Returns `false` when no
/// scope is current.
pub fn provide_context<T>(value: T) -> bool
where
    T: Send + Sync + 'static,
{
    match Scope::current() {
        Some(scope) => {
            scope.provide_context(value);
            true
        }
        None => false,
    }
}

/// Look up a context value from the current scope outward.
pub fn use_context<T>() -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    Scope::current().and_then(|scope| scope.use_context::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (count.clone(), count)
    }

    #[test]
    fn cleanup_runs_once_on_dispose() {
        let scope = Scope::root();
        let (count, count_clone) = counter();

        scope.on_cleanup(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        scope.dispose();
        scope.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(scope.is_disposed());
    }

    #[test]
    fn cleanups_run_in_reverse_order() {
        let scope = Scope::root();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            scope.on_cleanup(move || order.lock().push(n));
        }
        scope.dispose();

        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[test]
    fn children_dispose_before_parent_cleanups() {
        let parent = Scope::root();
        let child = parent.child();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = order.clone();
        parent.on_cleanup(move || o.lock().push("parent"));
        let o = order.clone();
        child.on_cleanup(move || o.lock().push("child"));

        parent.dispose();
        assert!(child.is_disposed());
        assert_eq!(*order.lock(), vec!["child", "parent"]);
    }

    #[test]
    fn disposed_child_leaves_parent() {
        let parent = Scope::root();
        let child = parent.child();
        assert_eq!(parent.child_count(), 1);

        child.dispose();
        assert_eq!(parent.child_count(), 0);
    }

    #[test]
    fn cleanup_on_disposed_scope_runs_immediately() {
        let scope = Scope::root();
        scope.dispose();

        let (count, count_clone) = counter();
        scope.on_cleanup(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let child = scope.child();
        assert!(child.is_disposed());
    }

    #[test]
    fn dropping_last_handle_runs_cleanups() {
        let (count, count_clone) = counter();
        {
            let scope = Scope::root();
            scope.on_cleanup(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_sets_current_scope() {
        assert!(Scope::current().is_none());

        let scope = Scope::root();
        scope.run(|| {
            assert_eq!(Scope::current().map(|s| s.id()), Some(scope.id()));
            let (count, count_clone) = counter();
            on_cleanup(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(count.load(Ordering::SeqCst), 0);
        });

        assert!(Scope::current().is_none());
    }

    #[test]
    fn context_is_found_through_ancestors() {
        let root = Scope::root();
        root.provide_context(String::from("outer"));
        let child = root.child();
        let grandchild = child.child();

        assert_eq!(grandchild.use_context::<String>().as_deref(), Some("outer"));

        child.provide_context(String::from("inner"));
        assert_eq!(grandchild.use_context::<String>().as_deref(), Some("inner"));
        assert_eq!(root.use_context::<u32>(), None);

        grandchild.run(|| {
            assert_eq!(use_context::<String>().as_deref(), Some("inner"));
        });
        assert_eq!(use_context::<String>(), None);
    }
}

//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! the current computation records it as a dependency.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing computation.
//! When an effect runs, it pushes its subscriber onto the stack and pops it
//! when the run completes.
//!
//! [`untrack`] pushes an entry with no subscriber. Reads made under it are
//! not recorded anywhere, which is how store listeners and dispatches avoid
//! leaking dependencies into whatever effect happens to be running.

use std::cell::RefCell;
use std::sync::Arc;

use super::subscriber::{Source, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = RefCell::new(Vec::new());
}

/// An entry in the reactive context stack.
struct ContextEntry {
    /// `None` for untracked regions.
    subscriber_id: Option<SubscriberId>,
    /// Sources read during this computation, keyed by source id.
    dependencies: Vec<(u64, Arc<dyn Source>)>,
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if the computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a tracking context for the given subscriber.
    ///
    /// While this context is on top of the stack, any signal that is read
    /// is recorded as a dependency of `subscriber_id`.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        Self::push(Some(subscriber_id))
    }

    /// Enter a region in which reads are not tracked.
    pub fn untracked() -> Self {
        Self::push(None)
    }

    fn push(subscriber_id: Option<SubscriberId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                dependencies: Vec::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the subscriber reads are attributed to, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.subscriber_id))
    }

    /// Record a dependency on `source`.
    ///
    /// Called by signals when they are read. Repeated reads of the same
    /// source within one computation are recorded once.
    pub fn track_dependency(source_id: u64, source: Arc<dyn Source>) {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let Some(entry) = stack.last_mut() else {
                return;
            };
            if entry.subscriber_id.is_none() {
                return;
            }
            if entry.dependencies.iter().all(|(id, _)| *id != source_id) {
                entry.dependencies.push((source_id, source));
            }
        });
    }

    /// Ids of the sources collected in the current context, in read order.
    pub fn dependency_ids() -> Vec<u64> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.iter().map(|(id, _)| *id).collect())
                .unwrap_or_default()
        })
    }

    /// Drain the sources collected in the current context.
    pub fn take_dependencies() -> Vec<Arc<dyn Source>> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow_mut()
                .last_mut()
                .map(|entry| {
                    std::mem::take(&mut entry.dependencies)
                        .into_iter()
                        .map(|(_, source)| source)
                        .collect()
                })
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}

/// Run `f` without tracking any signal reads it makes.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSource;

    impl Source for NullSource {
        fn subscribe(&self, _subscriber: SubscriberId, _notify: crate::reactive::Notify) {}
        fn unsubscribe(&self, _subscriber: SubscriberId) {}
    }

    fn source() -> Arc<dyn Source> {
        Arc::new(NullSource)
    }

    #[test]
    fn context_tracks_subscriber() {
        let id = SubscriberId::new();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(id);

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn context_tracks_dependencies_once() {
        let id = SubscriberId::new();
        let _ctx = ReactiveContext::enter(id);

        ReactiveContext::track_dependency(1, source());
        ReactiveContext::track_dependency(2, source());
        ReactiveContext::track_dependency(1, source());
        ReactiveContext::track_dependency(3, source());

        assert_eq!(ReactiveContext::dependency_ids(), vec![1, 2, 3]);
        assert_eq!(ReactiveContext::take_dependencies().len(), 3);
        assert!(ReactiveContext::dependency_ids().is_empty());
    }

    #[test]
    fn untracked_region_records_nothing() {
        let id = SubscriberId::new();
        let _ctx = ReactiveContext::enter(id);

        untrack(|| {
            assert!(!ReactiveContext::is_active());
            ReactiveContext::track_dependency(7, source());
        });

        // The outer computation is tracking again and saw no reads
        assert!(ReactiveContext::is_active());
        assert!(ReactiveContext::dependency_ids().is_empty());
    }

    #[test]
    fn nested_contexts() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();

        {
            let _ctx1 = ReactiveContext::enter(id1);
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(id2);
                assert_eq!(ReactiveContext::current_subscriber(), Some(id2));
            }

            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }
}

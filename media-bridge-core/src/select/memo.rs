//! Selector memoization.
//!
//! [`SelectorMemo`] caches the last snapshot a selector ran against and the
//! selection it produced. Snapshots are compared by identity: handing it
//! the same `Arc` again returns the cached selection without calling the
//! selector. A new snapshot reruns the selector, and a result equal to the
//! previous one (under the memo's equality) keeps the previous value so
//! downstream consumers see nothing change.

use std::fmt;
use std::sync::Arc;

use super::equality::{same_value_fn, EqualityFn, SameValue};

/// Projection of a snapshot.
pub type Selector<S, T> = Arc<dyn Fn(&S) -> T + Send + Sync>;

/// What a call to [`SelectorMemo::select`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoOutcome {
    /// First selection.
    Initial,
    /// Same snapshot as last time; the selector did not run.
    Cached,
    /// New snapshot, but the selection equals the previous one.
    Retained,
    /// New snapshot and a different selection.
    Changed,
}

impl MemoOutcome {
    /// Whether the selection should be published.
    pub fn is_changed(self) -> bool {
        matches!(self, MemoOutcome::Initial | MemoOutcome::Changed)
    }
}

pub struct SelectorMemo<S, T> {
    selector: Selector<S, T>,
    is_equal: EqualityFn<T>,
    cache: Option<(Arc<S>, T)>,
    computations: usize,
}

impl<S, T> SelectorMemo<S, T>
where
    T: Clone,
{
    /// Memoize `selector`, comparing selections with [`SameValue`].
    pub fn new<F>(selector: F) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
        T: SameValue + 'static,
    {
        Self::with_equality(selector, same_value_fn())
    }

    pub fn with_equality<F>(selector: F, is_equal: EqualityFn<T>) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        Self {
            selector: Arc::new(selector),
            is_equal,
            cache: None,
            computations: 0,
        }
    }

    /// Select from `snapshot`, reusing the cached result where possible.
    pub fn select(&mut self, snapshot: &Arc<S>) -> (T, MemoOutcome) {
        if let Some((cached, selection)) = &self.cache {
            if Arc::ptr_eq(cached, snapshot) {
                return (selection.clone(), MemoOutcome::Cached);
            }
        }

        self.computations += 1;
        let next = (self.selector)(snapshot.as_ref());

        match self.cache.take() {
            None => {
                self.cache = Some((snapshot.clone(), next.clone()));
                (next, MemoOutcome::Initial)
            }
            Some((_, previous)) if (self.is_equal)(&previous, &next) => {
                self.cache = Some((snapshot.clone(), previous.clone()));
                (previous, MemoOutcome::Retained)
            }
            Some(_) => {
                self.cache = Some((snapshot.clone(), next.clone()));
                (next, MemoOutcome::Changed)
            }
        }
    }

    /// The last selection, if any.
    pub fn last(&self) -> Option<&T> {
        self.cache.as_ref().map(|(_, selection)| selection)
    }

    /// How many times the selector has run.
    pub fn computations(&self) -> usize {
        self.computations
    }
}

impl<S, T> fmt::Debug for SelectorMemo<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorMemo")
            .field("cached", &self.cache.is_some())
            .field("computations", &self.computations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn same_snapshot_skips_the_selector() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut memo = SelectorMemo::new(move |s: &i32| {
            c.fetch_add(1, Ordering::SeqCst);
            *s * 2
        });

        let snapshot = Arc::new(21);
        assert_eq!(memo.select(&snapshot), (42, MemoOutcome::Initial));
        assert_eq!(memo.select(&snapshot), (42, MemoOutcome::Cached));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn equal_value_in_new_snapshot_is_retained() {
        let mut memo = SelectorMemo::new(|s: &(i32, i32)| s.0);

        memo.select(&Arc::new((1, 1)));
        let (value, outcome) = memo.select(&Arc::new((1, 2)));
        assert_eq!(value, 1);
        assert_eq!(outcome, MemoOutcome::Retained);
        assert!(!outcome.is_changed());

        let (value, outcome) = memo.select(&Arc::new((3, 2)));
        assert_eq!(value, 3);
        assert_eq!(outcome, MemoOutcome::Changed);
    }

    #[test]
    fn retained_selection_updates_cached_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut memo = SelectorMemo::new(move |s: &i32| {
            c.fetch_add(1, Ordering::SeqCst);
            *s > 0
        });

        memo.select(&Arc::new(1));
        let second = Arc::new(2);
        memo.select(&second);
        assert_eq!(memo.select(&second).1, MemoOutcome::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retained_keeps_previous_instance() {
        let mut memo = SelectorMemo::with_equality(
            |s: &Vec<i32>| Arc::new(s.clone()),
            Arc::new(|a: &Arc<Vec<i32>>, b: &Arc<Vec<i32>>| a == b),
        );

        let (first, _) = memo.select(&Arc::new(vec![1, 2]));
        let (second, outcome) = memo.select(&Arc::new(vec![1, 2]));
        assert_eq!(outcome, MemoOutcome::Retained);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn nan_selection_is_stable() {
        let mut memo = SelectorMemo::new(|s: &f64| Some(*s));

        memo.select(&Arc::new(f64::NAN));
        let (_, outcome) = memo.select(&Arc::new(f64::NAN));
        assert_eq!(outcome, MemoOutcome::Retained);
        assert_eq!(memo.computations(), 2);
    }
}

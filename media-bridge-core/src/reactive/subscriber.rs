//! Subscriber types for the reactive system.
//!
//! A subscriber is anything that wants to hear about changes to a reactive
//! source: an effect re-running, a store listener, a test probe.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. Sources key their
/// notification callbacks by this ID, so subscribing twice with the same ID
/// replaces the earlier callback instead of duplicating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Callback invoked when a source changes. Carries no payload; the
/// subscriber reads whatever it needs itself.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// A reactive value that computations can depend on.
///
/// Implemented by [`Signal`](super::Signal). The tracking context stores
/// sources as trait objects so an effect can subscribe to signals of
/// different value types.
pub trait Source: Send + Sync {
    /// Register `notify` to run whenever this source changes.
    fn subscribe(&self, subscriber: SubscriberId, notify: Notify);

    /// Remove the callback registered for `subscriber`, if any.
    fn unsubscribe(&self, subscriber: SubscriberId);
}

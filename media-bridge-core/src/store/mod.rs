//! Store Contract
//!
//! The bridge never owns state. It talks to a [`Store`] through three
//! operations:
//!
//! - `get_state()` returns the current snapshot, synchronously.
//! - `dispatch(action)` applies an action and notifies every current
//!   listener before returning.
//! - `subscribe(listener)` registers a zero-argument listener and returns
//!   an [`Unsubscribe`] handle.
//!
//! Listeners carry no payload; they read `get_state()` themselves.
//!
//! This module also ships [`MemoryStore`], a reducer-driven store used as
//! the provider's default and as a test double.

mod handle;
mod memory;
mod reducer;
mod state;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

pub use handle::HostHandle;
pub use memory::MemoryStore;
pub use reducer::MediaReducer;
pub use state::{
    empty_state, names, Attachments, Availability, MediaState, MediaValue, StreamType, TextTrack,
    VolumeLevel,
};

use crate::action::MediaAction;

/// Zero-argument change listener.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// An external state container the UI observes and commands.
pub trait Store: Send + Sync {
    type State: Send + Sync + 'static;
    type Action;

    /// Current snapshot. A new `Arc` is published whenever anything changes.
    fn get_state(&self) -> Arc<Self::State>;

    /// Apply `action`, then notify listeners before returning.
    fn dispatch(&self, action: Self::Action);

    /// Register `listener`. The returned handle removes it.
    fn subscribe(&self, listener: Listener) -> Unsubscribe;
}

/// A media store shared between the provider and every hook.
pub type SharedMediaStore = Arc<dyn Store<State = MediaState, Action = MediaAction>>;

type UnsubscribeFn = Box<dyn FnOnce() + Send>;

/// Handle returned by [`Store::subscribe`].
///
/// Clones share the same registration. Only the first call to
/// [`unsubscribe`](Unsubscribe::unsubscribe) does anything.
#[derive(Clone)]
pub struct Unsubscribe {
    hook: Arc<Mutex<Option<UnsubscribeFn>>>,
}

impl Unsubscribe {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            hook: Arc::new(Mutex::new(Some(Box::new(f)))),
        }
    }

    /// A handle with nothing to remove.
    pub fn noop() -> Self {
        Self {
            hook: Arc::new(Mutex::new(None)),
        }
    }

    pub fn unsubscribe(&self) {
        let hook = self.hook.lock().take();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Whether `unsubscribe` still has something to do.
    pub fn is_active(&self) -> bool {
        self.hook.lock().is_some()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}

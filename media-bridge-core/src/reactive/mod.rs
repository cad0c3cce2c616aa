//! Reactive Primitives
//!
//! This module implements the small reactive runtime the store bridge is
//! built on: signals, effects and ownership scopes.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (an effect), the signal registers that context
//! as a dependent. When the signal's value is set, all dependents are
//! notified synchronously.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that re-runs whenever one of
//! the signals it read changes. Effects are how the bridge reacts to a
//! provider swapping its store.
//!
//! ## Scopes
//!
//! A Scope owns cleanups. Whatever registers a cleanup while a scope is
//! current (a store subscription, an effect) is torn down exactly once when
//! the scope is disposed. Scopes also carry typed context values.
//!
//! # Implementation Notes
//!
//! Dependency tracking and the current scope both live in thread-local
//! stacks. All notification is synchronous; there is no scheduler queue.

mod context;
mod effect;
mod scope;
mod signal;
mod subscriber;

pub use context::{untrack, ReactiveContext};
pub use effect::Effect;
pub use scope::{on_cleanup, provide_context, use_context, Scope, WeakScope};
pub use signal::Signal;
pub use subscriber::{Notify, Source, SubscriberId};

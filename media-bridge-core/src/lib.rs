//! Media Bridge Core
//!
//! This crate connects fine-grained reactive UI code to an external media
//! state store. It implements:
//!
//! - A small reactive runtime (signals, effects, ownership scopes)
//! - The store contract and an in-memory, reducer-driven store
//! - Memoized selectors bridged into reactive cells
//! - The media request vocabulary and a dispatch facade
//! - A provider that scopes a store to a subtree, plus hooks to reach it
//!
//! # Architecture
//!
//! - `reactive`: signals, effects, scopes and dependency tracking
//! - `store`: the `Store` trait, media state, `MemoryStore` and its reducer
//! - `select`: selector memoization and the store-to-signal bridge
//! - `action`: typed media requests and their wire names
//! - `media`: provider, context and hooks
//!
//! # Example
//!
//! ```rust,ignore
//! use media_bridge_core::prelude::*;
//!
//! let provider = MediaProvider::mount(ProviderOptions::new());
//!
//! provider.run(|| {
//!     let paused = use_media_selector(|state| state.paused());
//!     let dispatch = use_media_dispatch();
//!
//!     Effect::new(move || println!("paused: {:?}", paused.get()));
//!
//!     dispatch.dispatch(MediaAction::PauseRequest);
//!     // Effect runs again, prints: "paused: Some(true)"
//! });
//!
//! provider.unmount();
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod media;
pub mod reactive;
pub mod select;
pub mod store;

pub use error::{Error, Result};

/// The types most UI code needs.
pub mod prelude {
    pub use crate::action::{MediaAction, MediaActionType};
    pub use crate::config::StoreConfig;
    pub use crate::media::{
        use_media_dispatch, use_media_fullscreen_ref, use_media_ref, use_media_selector,
        use_media_selector_with, use_media_store, MediaContext, MediaDispatch, MediaProvider,
        ProviderOptions,
    };
    pub use crate::reactive::{on_cleanup, Effect, Scope, Signal};
    pub use crate::select::{SameValue, Selection};
    pub use crate::store::{HostHandle, MediaState, MemoryStore, SharedMediaStore, Store};
}

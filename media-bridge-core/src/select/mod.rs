//! Selection
//!
//! Selectors project a store snapshot down to the slice a UI element
//! renders. This module memoizes those projections and bridges them into
//! reactive cells that only change when the selected slice does.

mod bridge;
mod equality;
mod memo;

pub use bridge::{use_store_selector, use_sync_external_store_with_selector, Selection};
pub use equality::{same_value, same_value_fn, EqualityFn, SameValue};
pub use memo::{MemoOutcome, Selector, SelectorMemo};

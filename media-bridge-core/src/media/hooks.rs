//! Hooks
//!
//! Entry points for code running inside a [`MediaProvider`]. Each hook
//! looks up the nearest provider's [`MediaContext`] through the current
//! scope. Outside any provider they still work: dispatches are dropped and
//! selectors see an empty state.
//!
//! [`MediaProvider`]: super::MediaProvider

use super::context::{MediaContext, MediaDispatch};
use crate::reactive::use_context;
use crate::select::{EqualityFn, SameValue, Selection};
use crate::store::{HostHandle, MediaState, SharedMediaStore};

/// The nearest provider's context, or a detached one.
pub fn use_media_context() -> MediaContext {
    use_context::<MediaContext>().unwrap_or_else(MediaContext::detached)
}

pub fn use_media_store() -> Option<SharedMediaStore> {
    use_context::<MediaContext>().and_then(|context| context.store())
}

pub fn use_media_dispatch() -> MediaDispatch {
    use_media_context().dispatcher()
}

pub fn use_media_selector<T, F>(selector: F) -> Selection<T>
where
    T: SameValue + Clone + Send + Sync + 'static,
    F: Fn(&MediaState) -> T + Send + Sync + 'static,
{
    use_media_context().selector(selector)
}

pub fn use_media_selector_with<T, F>(selector: F, is_equal: EqualityFn<T>) -> Selection<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&MediaState) -> T + Send + Sync + 'static,
{
    use_media_context().selector_with(selector, is_equal)
}

pub fn use_media_ref() -> impl Fn(Option<HostHandle>) + Clone + Send + Sync + 'static {
    use_media_context().media_ref()
}

pub fn use_media_fullscreen_ref() -> impl Fn(Option<HostHandle>) + Clone + Send + Sync + 'static
{
    use_media_context().fullscreen_ref()
}

//! Media bindings: the provider, its context, and the hooks UI code calls.

mod context;
mod hooks;
mod provider;

pub use context::{MediaContext, MediaDispatch};
pub use hooks::{
    use_media_context, use_media_dispatch, use_media_fullscreen_ref, use_media_ref,
    use_media_selector, use_media_selector_with, use_media_store,
};
pub use provider::{MediaProvider, ProviderOptions};

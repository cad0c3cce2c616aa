//! Media Provider
//!
//! A [`MediaProvider`] owns a scope and makes a [`MediaContext`] available
//! to everything that runs inside it. Hooks called under
//! [`MediaProvider::run`] find the provider's store; selectors created
//! there are released when the provider unmounts.
//!
//! # Document Binding
//!
//! When given a document handle, the provider tells its store about it on
//! mount and withdraws it on unmount. Swapping the store moves the binding:
//! the old store is told the document is gone before the new one is told
//! it arrived.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::context::MediaContext;
use crate::action::MediaAction;
use crate::config::StoreConfig;
use crate::reactive::{on_cleanup, untrack, Effect, Scope};
use crate::store::{HostHandle, MemoryStore, SharedMediaStore};

/// How to mount a [`MediaProvider`].
#[derive(Clone, Default)]
pub struct ProviderOptions {
    store: Option<SharedMediaStore>,
    document: Option<HostHandle>,
    store_config: StoreConfig,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `store` instead of building one.
    pub fn store(mut self, store: SharedMediaStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Document handle announced to the store while mounted.
    ///
    /// Without one the provider never dispatches a document change request,
    /// so nothing but explicit dispatches sets the store's `document`.
    pub fn document(mut self, document: HostHandle) -> Self {
        self.document = Some(document);
        self
    }

    /// Configuration for the store built when none is given.
    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = config;
        self
    }
}

impl fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("store", &self.store.is_some())
            .field("document", &self.document)
            .field("store_config", &self.store_config)
            .finish()
    }
}

pub struct MediaProvider {
    scope: Scope,
    context: MediaContext,
}

impl MediaProvider {
    /// Mount a provider below the current scope, or as a root.
    pub fn mount(options: ProviderOptions) -> Self {
        let ProviderOptions {
            store,
            document,
            store_config,
        } = options;

        let scope = match Scope::current() {
            Some(parent) => parent.child(),
            None => Scope::root(),
        };
        let store: SharedMediaStore = match store {
            Some(store) => store,
            None => {
                debug!("no media store given, using an in-memory store");
                Arc::new(MemoryStore::media(store_config))
            }
        };

        let context = MediaContext::new(store);
        scope.provide_context(context.clone());

        if let Some(document) = document {
            let slot = context.store_signal().clone();
            scope.run(|| {
                Effect::new(move || {
                    let Some(store) = slot.get() else {
                        return;
                    };
                    let attach = Some(document.clone());
                    untrack(|| store.dispatch(MediaAction::DocumentElementChangeRequest(attach)));
                    on_cleanup(move || {
                        let detach = MediaAction::DocumentElementChangeRequest(None);
                        untrack(|| store.dispatch(detach));
                    });
                })
            });
        }

        debug!(scope = scope.id(), "media provider mounted");
        Self { scope, context }
    }

    /// Run `f` inside the provider.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        self.scope.run(f)
    }

    pub fn context(&self) -> &MediaContext {
        &self.context
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Replace the store. Every selector and the document binding move to
    /// the new one; `None` detaches the provider from any store.
    pub fn set_store(&self, store: Option<SharedMediaStore>) {
        self.context.replace_store(store);
    }

    pub fn is_mounted(&self) -> bool {
        !self.scope.is_disposed()
    }

    /// Release every subscription made inside the provider. Idempotent.
    pub fn unmount(&self) {
        if self.is_mounted() {
            debug!(scope = self.scope.id(), "media provider unmounting");
        }
        self.scope.dispose();
    }
}

impl fmt::Debug for MediaProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaProvider")
            .field("scope", &self.scope.id())
            .field("mounted", &self.is_mounted())
            .field("context", &self.context)
            .finish()
    }
}

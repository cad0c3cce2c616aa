//! Media context and dispatch facade.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::action::{MediaAction, RawAction};
use crate::error::Result;
use crate::reactive::{untrack, Signal};
use crate::select::{use_store_selector, EqualityFn, SameValue, Selection, SelectorMemo};
use crate::store::{empty_state, HostHandle, MediaState, SharedMediaStore};

/// What a provider makes available to everything below it: the store, in a
/// signal so it can be swapped.
///
/// Clones share the same store slot.
#[derive(Clone)]
pub struct MediaContext {
    store: Signal<Option<SharedMediaStore>>,
}

impl MediaContext {
    pub fn new(store: SharedMediaStore) -> Self {
        Self {
            store: Signal::new(Some(store)),
        }
    }

    /// A context with no store. Dispatches are dropped and selectors see an
    /// empty state.
    pub fn detached() -> Self {
        Self {
            store: Signal::new(None),
        }
    }

    /// Current store. Tracked when read inside an effect.
    pub fn store(&self) -> Option<SharedMediaStore> {
        self.store.get()
    }

    pub fn has_store(&self) -> bool {
        self.store.with_untracked(Option::is_some)
    }

    pub(crate) fn store_signal(&self) -> &Signal<Option<SharedMediaStore>> {
        &self.store
    }

    pub(crate) fn replace_store(&self, store: Option<SharedMediaStore>) {
        let unchanged = self.store.with_untracked(|current| match (current, &store) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        });
        if unchanged {
            return;
        }
        debug!(attached = store.is_some(), "swapping media store");
        self.store.set(store);
    }

    pub fn dispatcher(&self) -> MediaDispatch {
        MediaDispatch {
            store: self.store.clone(),
        }
    }

    /// Select a slice of the media state, compared with
    /// [`SameValue`](crate::select::SameValue).
    pub fn selector<T, F>(&self, selector: F) -> Selection<T>
    where
        T: SameValue + Clone + Send + Sync + 'static,
        F: Fn(&MediaState) -> T + Send + Sync + 'static,
    {
        use_store_selector(&self.store, empty_state(), SelectorMemo::new(selector))
    }

    /// Select a slice of the media state with a custom equality.
    pub fn selector_with<T, F>(&self, selector: F, is_equal: EqualityFn<T>) -> Selection<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&MediaState) -> T + Send + Sync + 'static,
    {
        use_store_selector(
            &self.store,
            empty_state(),
            SelectorMemo::with_equality(selector, is_equal),
        )
    }

    /// Callback binding the media element. Pass `None` when it goes away.
    pub fn media_ref(&self) -> impl Fn(Option<HostHandle>) + Clone + Send + Sync + 'static {
        let dispatch = self.dispatcher();
        move |element: Option<HostHandle>| {
            dispatch.dispatch(MediaAction::MediaElementChangeRequest(element))
        }
    }

    /// Callback binding the element that goes fullscreen.
    pub fn fullscreen_ref(&self) -> impl Fn(Option<HostHandle>) + Clone + Send + Sync + 'static {
        let dispatch = self.dispatcher();
        move |element: Option<HostHandle>| {
            dispatch.dispatch(MediaAction::FullscreenElementChangeRequest(element))
        }
    }
}

impl fmt::Debug for MediaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaContext")
            .field("has_store", &self.has_store())
            .finish()
    }
}

/// Sends requests to whatever store the context holds at call time.
#[derive(Clone)]
pub struct MediaDispatch {
    store: Signal<Option<SharedMediaStore>>,
}

impl MediaDispatch {
    /// Forward `action` to the store. Without a store this does nothing.
    pub fn dispatch(&self, action: MediaAction) {
        let kind = action.kind();
        match self.store.get_untracked() {
            Some(store) => {
                debug!(action = %kind, "dispatching media request");
                untrack(|| store.dispatch(action));
            }
            None => trace!(action = %kind, "no media store, request dropped"),
        }
    }

    /// Convert a loosely typed record and dispatch it.
    pub fn dispatch_raw(&self, raw: RawAction) -> Result<()> {
        self.dispatch(MediaAction::try_from(raw)?);
        Ok(())
    }
}

impl fmt::Debug for MediaDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDispatch")
            .field("has_store", &self.store.with_untracked(Option::is_some))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionDetail, MediaActionType};
    use crate::store::{Listener, MediaValue, Store, Unsubscribe};
    use parking_lot::Mutex;

    /// Records every action it receives and never changes state.
    #[derive(Default)]
    struct RecordingStore {
        actions: Mutex<Vec<MediaAction>>,
    }

    impl Store for RecordingStore {
        type State = MediaState;
        type Action = MediaAction;

        fn get_state(&self) -> Arc<MediaState> {
            empty_state()
        }

        fn dispatch(&self, action: MediaAction) {
            self.actions.lock().push(action);
        }

        fn subscribe(&self, _listener: Listener) -> Unsubscribe {
            Unsubscribe::noop()
        }
    }

    #[test]
    fn detached_dispatch_is_a_no_op() {
        let context = MediaContext::detached();
        context.dispatcher().dispatch(MediaAction::PlayRequest);
        assert!(!context.has_store());
    }

    #[test]
    fn refs_dispatch_element_changes() {
        let store = Arc::new(RecordingStore::default());
        let context = MediaContext::new(store.clone());
        let media_ref = context.media_ref();
        let fullscreen_ref = context.fullscreen_ref();

        let video = HostHandle::new("video");
        media_ref(Some(video.clone()));
        media_ref(None);
        fullscreen_ref(None);

        assert_eq!(
            *store.actions.lock(),
            vec![
                MediaAction::MediaElementChangeRequest(Some(video)),
                MediaAction::MediaElementChangeRequest(None),
                MediaAction::FullscreenElementChangeRequest(None),
            ]
        );
    }

    #[test]
    fn dispatcher_follows_store_swaps() {
        let first = Arc::new(RecordingStore::default());
        let second = Arc::new(RecordingStore::default());
        let context = MediaContext::new(first.clone());
        let dispatch = context.dispatcher();

        dispatch.dispatch(MediaAction::PlayRequest);
        context.replace_store(Some(second.clone()));
        dispatch.dispatch(MediaAction::PauseRequest);

        assert_eq!(*first.actions.lock(), vec![MediaAction::PlayRequest]);
        assert_eq!(*second.actions.lock(), vec![MediaAction::PauseRequest]);
    }

    #[test]
    fn raw_dispatch_validates_detail() {
        let store = Arc::new(RecordingStore::default());
        let dispatch = MediaContext::new(store.clone()).dispatcher();

        dispatch
            .dispatch_raw(RawAction::new(
                MediaActionType::VolumeRequest,
                ActionDetail::Number(0.5),
            ))
            .unwrap();
        assert!(dispatch
            .dispatch_raw(RawAction::new(MediaActionType::SeekRequest, ActionDetail::None))
            .is_err());
        assert_eq!(*store.actions.lock(), vec![MediaAction::VolumeRequest(0.5)]);
    }

    #[test]
    fn detached_selector_sees_empty_state() {
        let context = MediaContext::detached();
        let paused = context.selector(|state| state.get("mediaPaused").cloned());
        assert_eq!(paused.get_untracked(), None::<MediaValue>);
    }
}

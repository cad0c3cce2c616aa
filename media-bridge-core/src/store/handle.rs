//! Opaque references to host objects.
//!
//! The bridge passes media elements, fullscreen containers and documents
//! through actions without ever looking inside them. A [`HostHandle`] wraps
//! whatever the host uses for such an object and compares by identity.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static HANDLE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identity-compared reference to a host object.
///
/// Clones refer to the same object and compare equal. Two handles created
/// separately never compare equal, even around equal values.
#[derive(Clone)]
pub struct HostHandle {
    id: u64,
    object: Arc<dyn Any + Send + Sync>,
}

impl HostHandle {
    pub fn new<T>(object: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            id: HANDLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            object: Arc::new(object),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Borrow the wrapped object if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl PartialEq for HostHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for HostHandle {}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostHandle(#{})", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Video {
        src: &'static str,
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = HostHandle::new(Video { src: "a.mp4" });
        let b = HostHandle::new(Video { src: "a.mp4" });

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn downcast_recovers_the_object() {
        let handle = HostHandle::new(Video { src: "clip.mp4" });

        assert_eq!(handle.downcast_ref::<Video>(), Some(&Video { src: "clip.mp4" }));
        assert!(handle.downcast_ref::<String>().is_none());
    }
}

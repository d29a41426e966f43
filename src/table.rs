//! The authoritative store for one resource kind.
//!
//! A `HandleTable` owns the backend objects of a single resource kind and
//! names them with versioned, typed handles. Lookups are total: the nil
//! handle, a stale handle, or a handle from a failed factory all resolve to
//! the table's installed fallback resource, so consumers never null-check a
//! handle before dereferencing it. "Did my texture actually load" is a
//! question for the asset lifecycle layer, not for the table.

use std::sync::{Arc, RwLock};

use crate::utils::handle::HandleLike;
use crate::utils::object_pool::ObjectPool;

/// A shared, clonable table mapping typed handles to heap-owned resources.
///
/// Clones are cheap and refer to the same underlying storage; this is what
/// lets a [`SharedHandle`](../shared/struct.SharedHandle.html) capture the
/// table it must erase its entry from, without borrowing from the engine
/// context.
///
/// Entries are expected to be created and erased from the thread that owns
/// the engine context; the interior lock exists so the last clone of a
/// shared handle can run its release path wherever it happens to be dropped.
pub struct HandleTable<H: HandleLike, T> {
    inner: Arc<RwLock<Inner<H, T>>>,
}

struct Inner<H: HandleLike, T> {
    entries: ObjectPool<H, T>,
    fallback: Option<T>,
}

impl<H: HandleLike, T> Clone for HandleTable<H, T> {
    fn clone(&self) -> Self {
        HandleTable {
            inner: self.inner.clone(),
        }
    }
}

impl<H: HandleLike, T> Default for HandleTable<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HandleLike, T> HandleTable<H, T> {
    /// Constructs a new, empty `HandleTable`. No lookups may be issued
    /// before [`set_fallback`](#method.set_fallback) has installed the null
    /// resource.
    pub fn new() -> Self {
        HandleTable {
            inner: Arc::new(RwLock::new(Inner {
                entries: ObjectPool::new(),
                fallback: None,
            })),
        }
    }

    /// Installs the fallback resource returned for nil or unknown handles.
    /// Must be called exactly once, during table initialization.
    pub fn set_fallback(&self, value: T) {
        let mut inner = self.inner.write().unwrap();
        debug_assert!(
            inner.fallback.is_none(),
            "the fallback resource has already been installed"
        );
        inner.fallback = Some(value);
    }

    /// Takes ownership of a newly constructed backend resource and returns
    /// a fresh, live handle for it. The handle never compares equal to any
    /// previously issued handle, even when a slot is recycled.
    pub fn create(&self, value: T) -> H {
        self.inner.write().unwrap().entries.create(value)
    }

    /// Looks up `handle` and passes the resource to `func`. Nil, stale and
    /// foreign handles observe the installed fallback; the lookup itself
    /// never fails.
    pub fn with<F, U>(&self, handle: H, func: F) -> U
    where
        F: FnOnce(&T) -> U,
    {
        let inner = self.inner.read().unwrap();
        match inner.entries.get(handle) {
            Some(v) => func(v),
            None => func(inner
                .fallback
                .as_ref()
                .expect("the fallback resource has not been installed")),
        }
    }

    /// Mutates the resource named by `handle` in place. Unknown handles are
    /// ignored and reported with `false`; the fallback is never mutated
    /// through a handle.
    pub fn with_mut<F>(&self, handle: H, func: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut inner = self.inner.write().unwrap();
        match inner.entries.get_mut(handle) {
            Some(v) => {
                func(v);
                true
            }
            None => false,
        }
    }

    /// Destroys the resource named by `handle` and removes the mapping.
    /// Erasing the nil handle, or a handle that was already erased, is a
    /// no-op. The fallback resource is untouched.
    pub fn erase(&self, handle: H) -> Option<T> {
        self.inner.write().unwrap().entries.free(handle)
    }

    /// Returns true if `handle` currently names a live entry.
    pub fn contains(&self, handle: H) -> bool {
        self.inner.read().unwrap().entries.contains(handle)
    }

    /// Returns the number of live entries, excluding the fallback.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    /// Checks if the table has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and the fallback resource. This is the wholesale
    /// destruction path taken during engine teardown; the table must not be
    /// used afterwards.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.entries.clear();
        inner.fallback = None;
    }
}

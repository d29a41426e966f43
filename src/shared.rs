//! Shared ownership of a table entry, with a teardown-safe release path.

use std::sync::Arc;

use crate::context::Liveness;
use crate::table::HandleTable;
use crate::utils::handle::HandleLike;

/// A shared, reference-counted wrapper around one handle.
///
/// All clones refer to the same id; when the last clone is dropped, the
/// entry is erased from the captured table, but only if the engine context
/// is still alive. Once teardown has begun, the table is being destroyed
/// wholesale and the release is silently skipped. That guard is the single
/// most important correctness property of this crate: without it, the last
/// handle going out of scope during shutdown would reach into a table that
/// no longer exists.
///
/// A `SharedHandle` over the nil handle is perfectly valid; it is how
/// factories report resource-construction failure. Looking it up observes
/// the table's fallback resource, and its release path is a no-op.
pub struct SharedHandle<H: HandleLike + 'static, T: 'static> {
    inner: Arc<Guard<H, T>>,
}

struct Guard<H: HandleLike, T> {
    id: H,
    table: HandleTable<H, T>,
    alive: Liveness,
}

impl<H: HandleLike, T> Drop for Guard<H, T> {
    fn drop(&mut self) {
        if self.alive.is_active() {
            self.table.erase(self.id);
        }
    }
}

impl<H: HandleLike + 'static, T: 'static> Clone for SharedHandle<H, T> {
    fn clone(&self) -> Self {
        SharedHandle {
            inner: self.inner.clone(),
        }
    }
}

impl<H: HandleLike + 'static, T: 'static> SharedHandle<H, T> {
    /// Wraps `id`, tying its erasure to the lifetime of the last clone.
    /// The table is captured by (cheap) clone so the release path does not
    /// need to reach back into the engine context.
    pub fn new(id: H, table: &HandleTable<H, T>, alive: Liveness) -> Self {
        SharedHandle {
            inner: Arc::new(Guard {
                id,
                table: table.clone(),
                alive,
            }),
        }
    }

    /// Returns the wrapped id. Plain value; copying it confers no
    /// ownership.
    #[inline]
    pub fn id(&self) -> H {
        self.inner.id
    }

    /// Returns true unless this wraps the nil handle.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.id.is_valid()
    }

    /// Looks the entry up in the captured table; nil or stale ids observe
    /// the fallback resource.
    #[inline]
    pub fn with<F, U>(&self, func: F) -> U
    where
        F: FnOnce(&T) -> U,
    {
        self.inner.table.with(self.inner.id, func)
    }
}

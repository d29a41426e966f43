use std::cmp::Ordering;
use std::collections::binary_heap::BinaryHeap;
use std::marker::PhantomData;

use super::handle::{HandleIndex, HandleLike};

#[derive(PartialEq, Eq)]
struct InverseHandleIndex(HandleIndex);

impl PartialOrd for InverseHandleIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        other.0.partial_cmp(&self.0)
    }
}

impl Ord for InverseHandleIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

/// `HandlePool` manages the allocation of a `Handle` collection with
/// continuous `index` fields, and can report whether a given `Handle` is
/// still alive.
///
/// An index is recycled only together with a version bump, so a freed
/// `Handle` is dead forever; whoever still holds a copy of it will observe
/// `contains() == false` even after the index has been handed out again.
/// Versions of alive handles are always odd, which also keeps every live
/// handle distinct from the reserved nil handle (index 0, version 0).
pub struct HandlePool<H: HandleLike> {
    versions: Vec<HandleIndex>,
    frees: BinaryHeap<InverseHandleIndex>,
    _marker: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool {
            versions: Vec::new(),
            frees: BinaryHeap::new(),
            _marker: PhantomData,
        }
    }
}

impl<H: HandleLike> HandlePool<H> {
    /// Constructs a new, empty `HandlePool`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Constructs a new `HandlePool` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        HandlePool {
            versions: Vec::with_capacity(capacity),
            frees: BinaryHeap::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Creates a fresh, alive `Handle`.
    pub fn create(&mut self) -> H {
        if let Some(InverseHandleIndex(index)) = self.frees.pop() {
            // Reuse the lowest free slot, under the next generation.
            self.versions[index as usize] += 1;
            H::new(index, self.versions[index as usize])
        } else {
            self.versions.push(1);
            H::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if this `Handle` was created by this pool and has not
    /// been freed yet.
    pub fn contains(&self, handle: H) -> bool {
        let index = handle.index() as usize;
        self.is_alive_at(index) && (self.versions[index] == handle.version())
    }

    #[inline]
    fn is_alive_at(&self, index: usize) -> bool {
        (index < self.versions.len()) && ((self.versions[index] & 0x1) == 1)
    }

    /// Recycles the `Handle` index and marks its version as dead. Returns
    /// false for stale or foreign handles.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.contains(handle) {
            false
        } else {
            self.versions[handle.index() as usize] += 1;
            self.frees.push(InverseHandleIndex(handle.index()));
            true
        }
    }

    /// Frees every alive `Handle` in this pool.
    pub fn clear(&mut self) {
        for index in 0..self.versions.len() {
            if (self.versions[index] & 0x1) == 1 {
                self.versions[index] += 1;
                self.frees.push(InverseHandleIndex(index as HandleIndex));
            }
        }
    }

    /// Returns the total number of alive handles in this `HandlePool`.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    /// Checks if the pool is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::super::handle::Handle;
    use super::*;

    #[test]
    fn basic() {
        let mut pool = HandlePool::<Handle>::new();
        assert_eq!(pool.len(), 0);

        let h1 = pool.create();
        assert!(h1.is_valid());
        assert!(pool.contains(h1));
        assert_eq!(pool.len(), 1);

        assert!(pool.free(h1));
        assert!(!pool.contains(h1));
        assert!(!pool.free(h1));
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn index_reuse() {
        let mut pool = HandlePool::<Handle>::new();

        let mut v = vec![];
        for _ in 0..10 {
            v.push(pool.create());
        }

        assert_eq!(pool.len(), 10);
        for &h in &v {
            pool.free(h);
        }

        for _ in 0..10 {
            let h = pool.create();
            assert!((h.index() as usize) < v.len());
            assert_ne!(v[h.index() as usize].version(), h.version());
            assert!(!pool.contains(v[h.index() as usize]));
        }
    }

    #[test]
    fn clear() {
        let mut pool = HandlePool::<Handle>::new();
        let handles: Vec<_> = (0..4).map(|_| pool.create()).collect();

        pool.clear();
        assert_eq!(pool.len(), 0);
        for h in handles {
            assert!(!pool.contains(h));
        }
    }
}

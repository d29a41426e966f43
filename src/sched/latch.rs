use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// A latch is a primitive signaling mechanism. It starts as false, and
/// eventually someone calls `set()` and it becomes true. You can test if it
/// has been set by calling `is_set()`.
pub trait Latch {
    /// Set the latch, signalling others.
    fn set(&self);
    /// Test if the latch is set.
    fn is_set(&self) -> bool;
}

/// A latch you can block on until it becomes true.
pub struct LockLatch {
    m: Mutex<bool>,
    v: Condvar,
}

impl LockLatch {
    #[inline]
    pub fn new() -> LockLatch {
        LockLatch {
            m: Mutex::new(false),
            v: Condvar::new(),
        }
    }

    /// Block until the latch is set.
    pub fn wait(&self) {
        let mut guard = self.m.lock().unwrap();
        while !*guard {
            guard = self.v.wait(guard).unwrap();
        }
    }
}

impl Latch for LockLatch {
    #[inline]
    fn set(&self) {
        let mut guard = self.m.lock().unwrap();
        *guard = true;
        self.v.notify_all();
    }

    #[inline]
    fn is_set(&self) -> bool {
        *self.m.lock().unwrap()
    }
}

/// Counting latches track a counter starting at one. Unlike other latches,
/// calling `set()` does not necessarily make the latch observable as set;
/// it just decrements the counter, and the latch only reads as set once the
/// counter reaches zero. The scheduler uses one as its terminator: each
/// in-flight task holds an increment, and `terminate` releases the initial
/// count, so workers keep running until the last outstanding task is done.
pub struct CountLatch {
    counter: AtomicUsize,
}

impl CountLatch {
    #[inline]
    pub fn new() -> CountLatch {
        CountLatch {
            counter: AtomicUsize::new(1),
        }
    }

    #[inline]
    pub fn increment(&self) {
        debug_assert!(!self.is_set());
        self.counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Latch for CountLatch {
    #[inline]
    fn set(&self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }

    #[inline]
    fn is_set(&self) -> bool {
        // Need to acquire any memory writes that happened before the latch
        // was set.
        self.counter.load(Ordering::SeqCst) == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn count_latch() {
        let latch = CountLatch::new();
        assert!(!latch.is_set());

        latch.increment();
        latch.set();
        assert!(!latch.is_set());

        latch.set();
        assert!(latch.is_set());
    }
}

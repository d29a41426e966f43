//! The explicit engine bracket that owns every resource table.
//!
//! The original design this crate grew out of kept a process-wide singleton
//! and asked "is the engine still alive" through it, because C++ statics are
//! destroyed in an order the program does not fully control. Here the
//! context is an ordinary value with an owner-controlled lifetime, but the
//! liveness flag survives as the one piece of shared state: release paths
//! that may run while (or after) the context is being torn down consult it
//! first, and silently do nothing once teardown has begun. At that point the
//! tables are being destroyed wholesale and there is nothing useful left for
//! a straggling destructor to do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::sched::Scheduler;

/// A clonable view of the engine's liveness flag.
///
/// The flag flips to inactive exactly once, at the start of teardown,
/// strictly before any table is destroyed. Destructors of handle-owning
/// objects check it before touching anything engine-owned; the flag is
/// atomic so those destructors may run from worker threads during shutdown.
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Liveness(Arc::new(AtomicBool::new(true)))
    }

    /// Returns true from successful init until teardown begins.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    #[inline]
    fn deactivate(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Clone for Liveness {
    fn clone(&self) -> Self {
        Liveness(self.0.clone())
    }
}

/// The user-defined struct-of-tables the context owns, one
/// [`HandleTable`](../table/struct.HandleTable.html) field per resource
/// kind. Field access gives each kind's table in O(1) without any runtime
/// type lookup.
pub trait ResourceTables: 'static {
    /// Drops every table's entries and fallback. Implementors clear tables
    /// in dependency order: a table whose resources are referenced by
    /// another table's resources is cleared last.
    fn clear(&mut self);
}

/// Configuration for the engine context.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// The number of background worker threads servicing asynchronous
    /// loads. Zero is promoted to one.
    pub num_workers: u32,
    /// Sets the stack size of the worker threads.
    pub worker_stack_size: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            num_workers: 2,
            worker_stack_size: None,
        }
    }
}

/// The owner of all per-kind resource tables, the background loading
/// workers, and the liveness flag.
///
/// Construction brackets the engine's lifetime on one side; dropping the
/// context (or calling [`teardown`](#method.teardown), which reads better
/// at call sites) brackets it on the other: the liveness flag flips first,
/// then the workers drain every in-flight load, then the tables are
/// cleared. The state machine is `Active` → `Destroyed`, terminal; there is
/// no way back.
pub struct EngineContext<T: ResourceTables> {
    tables: T,
    sched: Arc<Scheduler>,
    alive: Liveness,
}

impl<T: ResourceTables> EngineContext<T> {
    /// Constructs a context around the given tables with default settings.
    pub fn new(tables: T) -> Self {
        Self::with_settings(tables, Settings::default())
    }

    /// Constructs a context around the given tables.
    pub fn with_settings(tables: T, settings: Settings) -> Self {
        let num = settings.num_workers.max(1);
        let sched = Scheduler::new(num, settings.worker_stack_size);

        info!("engine context initialized ({} loading workers).", num);

        EngineContext {
            tables,
            sched,
            alive: Liveness::new(),
        }
    }

    /// Returns the per-kind resource tables.
    #[inline]
    pub fn tables(&self) -> &T {
        &self.tables
    }

    /// Returns the per-kind resource tables, mutably.
    #[inline]
    pub fn tables_mut(&mut self) -> &mut T {
        &mut self.tables
    }

    /// Returns true until teardown begins.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.alive.is_active()
    }

    /// Returns a clonable view of the liveness flag, for objects whose
    /// destructors may outlive this context.
    #[inline]
    pub fn liveness(&self) -> Liveness {
        self.alive.clone()
    }

    #[inline]
    pub(crate) fn scheduler(&self) -> &Arc<Scheduler> {
        &self.sched
    }

    /// Tears the engine down: deactivates the liveness flag, waits for
    /// in-flight loads, destroys every table. Equivalent to dropping the
    /// context, but explicit at the call site.
    pub fn teardown(self) {
        drop(self);
    }
}

impl<T: ResourceTables> Drop for EngineContext<T> {
    fn drop(&mut self) {
        // Order matters: the flag must read inactive before any table is
        // destroyed, and no load task may still be writing into a payload
        // while tables go away.
        self.alive.deactivate();
        self.sched.terminate();
        self.tables.clear();

        info!("engine context destroyed.");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct NoTables;

    impl ResourceTables for NoTables {
        fn clear(&mut self) {}
    }

    #[test]
    fn liveness_outlives_context() {
        let ctx = EngineContext::new(NoTables);
        let alive = ctx.liveness();

        assert!(ctx.is_active());
        assert!(alive.is_active());

        ctx.teardown();
        assert!(!alive.is_active());
    }
}

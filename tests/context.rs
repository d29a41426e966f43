use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use keel::impl_handle;
use keel::prelude::*;

impl_handle!(BufferHandle);

/// A spy resource that counts its own destruction, so tests can tell
/// whether (and how many times) a table operation actually touched it.
struct SpyBuffer {
    drops: Arc<AtomicUsize>,
}

impl Drop for SpyBuffer {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

struct Tables {
    buffers: HandleTable<BufferHandle, SpyBuffer>,
}

impl ResourceTables for Tables {
    fn clear(&mut self) {
        self.buffers.clear();
    }
}

fn testbed(drops: &Arc<AtomicUsize>) -> EngineContext<Tables> {
    let tables = Tables {
        buffers: HandleTable::new(),
    };
    tables.buffers.set_fallback(SpyBuffer {
        drops: drops.clone(),
    });
    EngineContext::new(tables)
}

#[test]
fn last_handle_erases_while_active() {
    let drops = Arc::new(AtomicUsize::new(0));
    let ctx = testbed(&drops);

    let id = ctx.tables().buffers.create(SpyBuffer {
        drops: drops.clone(),
    });
    let h1 = SharedHandle::new(id, &ctx.tables().buffers, ctx.liveness());
    let h2 = h1.clone();

    drop(h1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert!(ctx.tables().buffers.contains(id));

    drop(h2);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(!ctx.tables().buffers.contains(id));
}

#[test]
fn teardown_destroys_tables_wholesale() {
    let drops = Arc::new(AtomicUsize::new(0));
    let ctx = testbed(&drops);

    for _ in 0..4 {
        ctx.tables().buffers.create(SpyBuffer {
            drops: drops.clone(),
        });
    }

    ctx.teardown();

    // Four entries plus the fallback.
    assert_eq!(drops.load(Ordering::SeqCst), 5);
}

#[test]
fn handle_dropped_after_teardown_touches_nothing() {
    let drops = Arc::new(AtomicUsize::new(0));
    let ctx = testbed(&drops);
    let alive = ctx.liveness();

    let id = ctx.tables().buffers.create(SpyBuffer {
        drops: drops.clone(),
    });
    let handle = SharedHandle::new(id, &ctx.tables().buffers, ctx.liveness());

    ctx.teardown();
    assert!(!alive.is_active());

    // The entry and the fallback were dropped exactly once, by the
    // teardown itself.
    assert_eq!(drops.load(Ordering::SeqCst), 2);

    // The surviving handle's release path must not touch the table: no
    // double drop, no panic.
    drop(handle);
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}

#[test]
fn asset_dropped_after_teardown_skips_release() {
    use failure::err_msg;

    struct Sentinel {
        released: Arc<AtomicUsize>,
    }

    impl Loadable for Sentinel {
        type Hint = bool;

        fn load(&mut self, hint: &bool) -> Result<()> {
            if *hint {
                Ok(())
            } else {
                Err(err_msg("refused"))
            }
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct NoTables;

    impl ResourceTables for NoTables {
        fn clear(&mut self) {}
    }

    let released = Arc::new(AtomicUsize::new(0));
    let ctx = EngineContext::new(NoTables);

    let asset = Asset::new(
        &ctx,
        Sentinel {
            released: released.clone(),
        },
    );
    assert!(asset.load(&true));

    ctx.teardown();
    drop(asset);

    // Misuse during teardown is absorbed, not reported.
    assert_eq!(released.load(Ordering::SeqCst), 0);
}

//! A tiny background worker pool for asset loading tasks.
//!
//! The pool has the narrowest possible contract: `spawn` enqueues one task,
//! tasks are picked up by whatever worker is idle, and `terminate` blocks
//! until every task that was ever spawned has run to completion. There is no
//! cancellation and no ordering guarantee between tasks; anything that needs
//! to observe a task's completion does so through its own synchronization
//! (the asset lifecycle uses a condition variable keyed on its state).

pub mod latch;
pub mod scheduler;

pub(crate) use self::scheduler::halt_unwinding;
pub use self::scheduler::Scheduler;

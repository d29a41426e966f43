use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crossbeam_deque as deque;

use super::latch::{CountLatch, Latch, LockLatch};

type Task = Box<dyn FnOnce() + Send>;

/// Executes `func` and captures any panic, translating it into an `Err`
/// result, so a panicking load callback never unwinds into the worker loop.
pub(crate) fn halt_unwinding<F, R>(func: F) -> thread::Result<R>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(func))
}

/// A fixed pool of worker threads consuming tasks from a shared queue.
///
/// Spawned tasks are fire-and-forget from the scheduler's point of view;
/// the only global guarantee is that `terminate` does not return until
/// every task spawned before it has finished.
pub struct Scheduler {
    terminator: CountLatch,
    watcher: Watcher,
    threads: Vec<ThreadInfo>,

    inject_stealer: deque::Stealer<Task>,
    injector: Mutex<deque::Worker<Task>>,
}

struct ThreadInfo {
    primed: LockLatch,
    terminated: LockLatch,
}

impl Scheduler {
    pub fn new(num: u32, stack_size: Option<usize>) -> Arc<Self> {
        let (w, s) = deque::fifo();

        let threads = (0..num)
            .map(|_| ThreadInfo {
                primed: LockLatch::new(),
                terminated: LockLatch::new(),
            })
            .collect();

        let scheduler = Arc::new(Scheduler {
            threads,
            injector: Mutex::new(w),
            inject_stealer: s,
            terminator: CountLatch::new(),
            watcher: Watcher(Mutex::new(()), Condvar::new()),
        });

        for i in 0..num as usize {
            let sc = scheduler.clone();
            let mut b = thread::Builder::new().name(format!("asset-worker ({})", i));

            if let Some(stack_size) = stack_size {
                b = b.stack_size(stack_size);
            }

            b.spawn(move || Scheduler::main_loop(sc, i)).unwrap();
        }

        for v in &scheduler.threads {
            v.primed.wait();
        }

        scheduler
    }

    /// Spawns an asynchronous task; it will be taken by whatever worker has
    /// nothing to do. The scheduler cannot terminate until the task has
    /// executed, even if `terminate` is called while it is still queued.
    pub fn spawn<F>(self: &Arc<Self>, func: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // This ref is released by the task itself at the (*) below.
        self.terminator.increment();

        let sched = self.clone();
        let task: Task = Box::new(move || {
            if halt_unwinding(func).is_err() {
                warn!("a background loading task panicked.");
            }

            sched.terminator.set(); // (*) permit the scheduler to terminate now
            sched.watcher.notify_all();
        });

        self.injector.lock().unwrap().push(task);
        self.watcher.notify_one();
    }

    /// Releases the initial terminator count and blocks until every worker
    /// has drained the queue and exited its loop gracefully.
    pub fn terminate(&self) {
        self.terminator.set();
        self.wait_until_terminated();
    }

    fn wait_until_terminated(&self) {
        let pending = || self.threads.iter().any(|v| !v.terminated.is_set());

        while pending() {
            self.watcher.notify_all();
            thread::yield_now();
        }
    }

    fn main_loop(scheduler: Arc<Scheduler>, index: usize) {
        scheduler.threads[index].primed.set();

        let mut ms = 1;
        while !scheduler.terminator.is_set() {
            if let Some(task) = scheduler.inject_stealer.steal() {
                task();
                ms = 1;
            } else {
                scheduler.watcher.wait_timeout(ms);
                ms = (ms * 2).min(48);
            }
        }

        scheduler.threads[index].terminated.set();
    }
}

struct Watcher(Mutex<()>, Condvar);

impl Watcher {
    #[inline]
    fn wait_timeout(&self, ms: u64) {
        let duration = ::std::time::Duration::from_millis(ms);
        let v = self.0.lock().unwrap();
        let _ = self.1.wait_timeout(v, duration);
    }

    #[inline]
    fn notify_one(&self) {
        self.1.notify_one()
    }

    #[inline]
    fn notify_all(&self) {
        self.1.notify_all()
    }
}

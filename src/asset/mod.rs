//! The lifecycle state machine layered on every loadable payload.
//!
//! Textures, shaders, models, scripts and audio clips all share the same
//! shape: an in-memory payload that is expensive to populate, may be
//! populated on a background worker, and must be released exactly once:
//! never while a background load is still writing into it, and never after
//! the engine has begun teardown. [`Asset`] captures that shape once so the
//! concrete asset types only supply the load and release callbacks.
//!
//! Per generation (construction or `release` → next `release`) the states
//! move monotonically:
//!
//! ```text
//! Uninitialized ──load──────────────▶ Loaded | Failed
//!       │                                ▲
//!       └─load_async──▶ AsyncLoading ────┘
//! ```
//!
//! `release` resets a terminal state back to `Uninitialized`, after which
//! the asset may be loaded again.
//!
//! A failed load is a state, not an error value: callers observe it through
//! [`Asset::state`] or the boolean returned by [`Asset::load`]. The payload
//! of a `Failed` asset is whatever the failed callback left behind; it is
//! only guaranteed safe to release.
//!
//! [`Asset`]: struct.Asset.html
//! [`Asset::state`]: struct.Asset.html#method.state
//! [`Asset::load`]: struct.Asset.html#method.load

use std::sync::{Arc, Condvar, Mutex};

use crate::context::{EngineContext, Liveness, ResourceTables};
use crate::errors::Result;
use crate::sched::{halt_unwinding, Scheduler};

/// The lifecycle state of an [`Asset`](struct.Asset.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetState {
    /// Nothing loaded yet, or released since. The only state `load` and
    /// `load_async` act from.
    Uninitialized,
    /// A background task is populating the payload.
    AsyncLoading,
    /// The load callback succeeded. Terminal for this generation.
    Loaded,
    /// The load callback failed (or panicked). Terminal for this
    /// generation; the payload is only guaranteed safe to release.
    Failed,
}

/// The contract between an asset payload and its lifecycle.
///
/// `load` populates the payload from the hint (a path, a source string,
/// decode parameters, whatever the concrete asset needs) and reports
/// failure as an ordinary `Err`, which the lifecycle maps to
/// [`AssetState::Failed`](enum.AssetState.html) and logs. `release` tears
/// the payload back down; it must tolerate a payload a failed load left
/// half-populated.
pub trait Loadable: Send + 'static {
    type Hint: Clone + Send + Sync + 'static;

    fn load(&mut self, hint: &Self::Hint) -> Result<()>;
    fn release(&mut self);
}

/// A loadable payload plus its lifecycle state.
///
/// The asset is designed for a single owning thread; the synchronization
/// inside exists for the one sanctioned cross-thread interaction, the
/// background load task spawned by [`load_async`](#method.load_async).
/// `wait` is a reentrant-safe blocking join on that task: calling it twice,
/// or racing it against `load` or `release`, never deadlocks and never runs
/// the load twice. Cancellation is deliberately unsupported; `release`
/// waits for an in-flight load rather than abandoning it.
///
/// Dropping an asset behaves like [`release`](#method.release) while the
/// engine context is alive, and does nothing once teardown has begun.
pub struct Asset<L: Loadable> {
    inner: Arc<Inner<L>>,
    sched: Arc<Scheduler>,
    alive: Liveness,
}

struct Inner<L: Loadable> {
    payload: Mutex<L>,
    state: Mutex<AssetState>,
    cv: Condvar,
}

impl<L: Loadable> Asset<L> {
    /// Wraps `payload` in an `Uninitialized` lifecycle tied to `ctx`'s
    /// worker pool and liveness flag.
    pub fn new<T: ResourceTables>(ctx: &EngineContext<T>, payload: L) -> Self {
        Asset {
            inner: Arc::new(Inner {
                payload: Mutex::new(payload),
                state: Mutex::new(AssetState::Uninitialized),
                cv: Condvar::new(),
            }),
            sched: ctx.scheduler().clone(),
            alive: ctx.liveness(),
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> AssetState {
        *self.inner.state.lock().unwrap()
    }

    /// Returns true if the current generation loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.state() == AssetState::Loaded
    }

    /// Loads the payload synchronously and returns whether this generation
    /// is loaded.
    ///
    /// Idempotent: a terminal state answers from cache, an in-flight
    /// asynchronous load is joined (blocking) and its result returned, and
    /// only an `Uninitialized` asset actually runs the load callback.
    pub fn load(&self, hint: &L::Hint) -> bool {
        if !self.alive.is_active() {
            return false;
        }

        {
            let mut state = self.inner.state.lock().unwrap();
            loop {
                match *state {
                    AssetState::Loaded => return true,
                    AssetState::Failed => return false,
                    AssetState::AsyncLoading => {
                        state = self.inner.cv.wait(state).unwrap();
                    }
                    AssetState::Uninitialized => {
                        *state = AssetState::AsyncLoading;
                        break;
                    }
                }
            }
        }

        Inner::run_load(&self.inner, hint)
    }

    /// Spawns a background task that runs the load callback and settles the
    /// state to `Loaded` or `Failed`. No-op unless `Uninitialized`; once
    /// spawned, the task cannot be cancelled, only waited for.
    pub fn load_async(&self, hint: L::Hint) {
        if !self.alive.is_active() {
            return;
        }

        {
            let mut state = self.inner.state.lock().unwrap();
            if *state != AssetState::Uninitialized {
                return;
            }
            *state = AssetState::AsyncLoading;
        }

        let inner = self.inner.clone();
        self.sched.spawn(move || {
            Inner::run_load(&inner, &hint);
        });
    }

    /// Blocks until any in-flight background load completes; no-op if none
    /// is in flight. Safe to call any number of times, from any state.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock().unwrap();
        while *state == AssetState::AsyncLoading {
            state = self.inner.cv.wait(state).unwrap();
        }
    }

    /// Releases the payload and resets the lifecycle to `Uninitialized`.
    ///
    /// Waits for any in-flight load first, so the release callback never
    /// observes a payload a background task is still writing into. No-op
    /// when already `Uninitialized`; per generation the release callback
    /// runs exactly once.
    pub fn release(&self) {
        let mut state = self.inner.state.lock().unwrap();
        while *state == AssetState::AsyncLoading {
            state = self.inner.cv.wait(state).unwrap();
        }

        if *state == AssetState::Uninitialized {
            return;
        }

        self.inner.payload.lock().unwrap().release();
        *state = AssetState::Uninitialized;
    }

    /// Passes the payload to `func`. Note that the payload of a `Failed`
    /// generation is in whatever state the failed load left it.
    pub fn with<F, U>(&self, func: F) -> U
    where
        F: FnOnce(&L) -> U,
    {
        func(&*self.inner.payload.lock().unwrap())
    }

    /// Passes the payload to `func`, mutably.
    pub fn with_mut<F, U>(&self, func: F) -> U
    where
        F: FnOnce(&mut L) -> U,
    {
        func(&mut *self.inner.payload.lock().unwrap())
    }
}

impl<L: Loadable> Inner<L> {
    /// Runs the load callback and settles the state. Entered with the state
    /// already at `AsyncLoading`, from the owning thread (sync path) or
    /// from a worker (async path).
    fn run_load(inner: &Arc<Inner<L>>, hint: &L::Hint) -> bool {
        let ok = {
            let mut payload = inner.payload.lock().unwrap();
            match halt_unwinding(|| payload.load(hint)) {
                Ok(Ok(())) => true,
                Ok(Err(err)) => {
                    warn!("asset load failed: {}", err);
                    false
                }
                Err(_) => {
                    warn!("asset load callback panicked; treating as failed.");
                    false
                }
            }
        };

        let mut state = inner.state.lock().unwrap();
        *state = if ok {
            AssetState::Loaded
        } else {
            AssetState::Failed
        };
        inner.cv.notify_all();

        ok
    }
}

impl<L: Loadable> Drop for Asset<L> {
    fn drop(&mut self) {
        if self.alive.is_active() {
            self.release();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::ResourceTables;
    use failure::err_msg;

    struct NoTables;

    impl ResourceTables for NoTables {
        fn clear(&mut self) {}
    }

    #[derive(Default)]
    struct Text {
        contents: String,
        releases: usize,
    }

    impl Loadable for Text {
        type Hint = String;

        fn load(&mut self, hint: &String) -> Result<()> {
            if hint.is_empty() {
                return Err(err_msg("empty source"));
            }

            self.contents = hint.clone();
            Ok(())
        }

        fn release(&mut self) {
            self.contents.clear();
            self.releases += 1;
        }
    }

    #[test]
    fn sync_load() {
        let ctx = EngineContext::new(NoTables);
        let asset = Asset::new(&ctx, Text::default());

        assert_eq!(asset.state(), AssetState::Uninitialized);
        assert!(asset.load(&"hello".to_owned()));
        assert_eq!(asset.state(), AssetState::Loaded);
        assert_eq!(asset.with(|v| v.contents.clone()), "hello");

        // Terminal states answer from cache; the callback does not run
        // again with a different hint.
        assert!(asset.load(&"other".to_owned()));
        assert_eq!(asset.with(|v| v.contents.clone()), "hello");
    }

    #[test]
    fn failed_load() {
        let ctx = EngineContext::new(NoTables);
        let asset = Asset::new(&ctx, Text::default());

        assert!(!asset.load(&String::new()));
        assert_eq!(asset.state(), AssetState::Failed);
        assert!(!asset.load(&"hello".to_owned()));
    }

    #[test]
    fn release_resets_generation() {
        let ctx = EngineContext::new(NoTables);
        let asset = Asset::new(&ctx, Text::default());

        // Releasing an uninitialized asset is a no-op.
        asset.release();
        assert_eq!(asset.with(|v| v.releases), 0);

        assert!(asset.load(&"hello".to_owned()));
        asset.release();
        asset.release();
        assert_eq!(asset.with(|v| v.releases), 1);
        assert_eq!(asset.state(), AssetState::Uninitialized);

        // A new generation can be loaded afterwards.
        assert!(asset.load(&"again".to_owned()));
        assert_eq!(asset.with(|v| v.contents.clone()), "again");
    }
}

//! # What is This?
//!
//! Keel is the load-bearing piece of infrastructure every other engine
//! subsystem leans on: a resource handle and asset lifecycle framework. It
//! answers two questions that every rendering, audio or scripting module
//! keeps asking:
//!
//! 1. *How do I name an expensive backend object (texture, shader, model,
//! script) without owning it?* With a versioned, typed [`Handle`] resolved
//! through a [`HandleTable`] that always answers, falling back to a
//! designated null resource for nil or stale handles.
//!
//! 2. *How do I load something in the background and tear it down without
//! racing the engine's shutdown?* With [`Asset`], a small state machine
//! (`Uninitialized` / `AsyncLoading` / `Loaded` / `Failed`) driven by user
//! supplied load and release callbacks, and with every release path guarded
//! by the [`EngineContext`] liveness flag.
//!
//! The context is an explicit value with an owner-controlled lifetime rather
//! than a hidden process-wide singleton, so the classic destruction-order
//! hazard (a handle dropped during shutdown dereferencing an already dead
//! table) is reduced to a single, testable rule: release paths check
//! `is_active()` first, and do nothing once teardown has begun.
//!
//! [`Handle`]: utils/handle/struct.Handle.html
//! [`HandleTable`]: table/struct.HandleTable.html
//! [`Asset`]: asset/struct.Asset.html
//! [`EngineContext`]: context/struct.EngineContext.html

#[macro_use]
extern crate log;

pub mod errors;
#[macro_use]
pub mod utils;
pub mod sched;

pub mod asset;
pub mod context;
pub mod shared;
pub mod table;

pub mod prelude;

//! Commonly used utilities, mostly the versioned handle machinery.

#[macro_use]
pub mod handle;
pub mod handle_pool;
pub mod object_pool;

pub use self::handle::{Handle, HandleIndex, HandleLike};
pub use self::handle_pool::HandlePool;
pub use self::object_pool::ObjectPool;

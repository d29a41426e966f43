pub type Result<T> = ::std::result::Result<T, ::failure::Error>;

pub use failure::Error;

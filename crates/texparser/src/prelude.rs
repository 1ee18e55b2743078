//! Types that almost every module and command implementation needs.

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Box<crate::error::Error>>;

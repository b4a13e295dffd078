//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// There is no "not found" variant: absence is always reported as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Invalid capacity, TTL or other configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A removal listener panicked while handling a notification
    #[error("Removal listener failed: {0}")]
    Listener(String),
}

impl CacheError {
    /// Shorthand for building a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        CacheError::Config(msg.into())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

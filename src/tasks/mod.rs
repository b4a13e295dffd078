//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - Pruner: Removes expired cache entries at a configured interval

mod pruner;

pub use pruner::BackgroundPruner;

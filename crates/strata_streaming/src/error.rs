//! # Cache Error Types
//!
//! Lookup misses are `None`, not errors. Per-chunk generation failures never
//! reach callers; the worker logs them and the chunk becomes requestable again.

use strata_procedural::ConfigError;
use thiserror::Error;

/// Errors surfaced by the streaming cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The cache was shut down; it accepts no more work.
    #[error("chunk cache is closed")]
    Closed,

    /// The worker thread could not be started.
    #[error("failed to spawn chunk loader thread: {0}")]
    WorkerSpawn(String),

    /// Invalid world or streaming configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

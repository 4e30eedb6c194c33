//! # Generation Error Types
//!
//! Configuration errors are fatal to the source being built.
//! Generation errors are scoped to a single chunk.

use thiserror::Error;

/// Errors raised while building a tile source, overlay or sprite source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Chunk grids need at least two samples per side.
    #[error("invalid chunk size {0}: must be at least 2")]
    InvalidChunkSize(usize),

    /// Noise scale must be finite and strictly positive.
    #[error("invalid noise scale {0}: must be finite and > 0")]
    InvalidScale(f64),

    /// Height multiplier must be finite and strictly positive.
    #[error("invalid height multiplier {0}: must be finite and > 0")]
    InvalidHeightMultiplier(f32),

    /// Material band thresholds must be strictly ascending.
    #[error("band `{material}` at {threshold} is not above the previous band at {previous}")]
    UnorderedBands {
        /// Material of the offending band.
        material: String,
        /// Its threshold.
        threshold: f32,
        /// Threshold of the band before it.
        previous: f32,
    },

    /// A band names a material that is not in the catalog.
    #[error("material `{0}` is not in the material catalog")]
    UnknownMaterial(String),

    /// A periodic grid has a zero spacing or a width that covers the whole period.
    #[error("invalid {grid} grid: width {width} must be in 1..{spacing}")]
    InvalidGrid {
        /// Which grid (e.g. "main road", "river").
        grid: &'static str,
        /// Grid spacing.
        spacing: u32,
        /// Grid width.
        width: u32,
    },

    /// A numeric parameter is outside its allowed range.
    #[error("invalid {name}: {value} is outside {range}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
        /// Human-readable allowed range.
        range: &'static str,
    },

    /// Streaming radii are inconsistent.
    #[error("unload radius {unload} must be >= view radius {view}")]
    InvalidRadii {
        /// View radius in chunks.
        view: u32,
        /// Unload radius in chunks.
        unload: u32,
    },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// Configuration file could not be read.
    #[error("cannot read configuration {path}: {reason}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },
}

/// Errors raised while generating one chunk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Requested grid size is unusable.
    #[error("invalid grid size {0}: must be at least 2")]
    InvalidSize(usize),

    /// A source returned a grid that does not match the requested size.
    #[error("source `{source_name}` returned {actual} tiles, expected {expected}")]
    GridMismatch {
        /// Name of the misbehaving source.
        source_name: String,
        /// Expected tile count.
        expected: usize,
        /// Actual tile count.
        actual: usize,
    },

    /// A source failed for its own reasons.
    #[error("source `{source_name}` failed: {reason}")]
    Source {
        /// Name of the failing source.
        source_name: String,
        /// Failure description.
        reason: String,
    },

    /// Generation panicked and was contained at the worker boundary.
    #[error("generation panicked: {0}")]
    Panicked(String),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for chunk generation.
pub type GenerationResult<T> = Result<T, GenerationError>;

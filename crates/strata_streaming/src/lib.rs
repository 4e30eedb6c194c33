//! # STRATA Chunk Streaming
//!
//! Keeps generated chunks around a moving observer without ever blocking
//! the caller on generation.
//!
//! ## Design Principles
//!
//! 1. **Non-blocking**: Requests return immediately; one worker generates
//! 2. **Deduplicated**: At most one job per coordinate is queued or running
//! 3. **Unload wins**: A chunk unloaded while generating is never published
//! 4. **Contained failures**: A failing or panicking chunk is logged and skipped
//!
//! ## Core Components
//!
//! - `ChunkCache`: Slot map + background worker
//! - `ChunkGenerator`: Tile stack and sprite source at a fixed chunk size
//! - `ChunkStreamer`: View/unload radius policy driven by observer positions
//! - `WorldConfig`: TOML world description that builds all of the above
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata_streaming::{ChunkStreamer, WorldConfig};
//!
//! let mut streamer = ChunkStreamer::from_config(&WorldConfig::default())?;
//! streamer.update(0.0, 0.0);
//! if let Some(height) = streamer.ground_height(10.0, 10.0) {
//!     println!("ground at {height}");
//! }
//! streamer.cache().shutdown();
//! # Ok::<(), strata_streaming::CacheError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod chunk;
pub mod config;
pub mod error;
pub mod generator;
pub mod streamer;

pub use cache::{
    CacheConfig, CacheStats, ChunkCache, ChunkState, RequestOutcome, WORKER_THREAD_NAME,
};
pub use chunk::LoadedChunk;
pub use config::{ChunkBounds, RoadSection, StreamingConfig, WaterSection, WorldConfig};
pub use error::{CacheError, CacheResult};
pub use generator::ChunkGenerator;
pub use streamer::{ChunkStreamer, ViewUpdate};

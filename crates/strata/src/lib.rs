//! # STRATA
//!
//! Procedural tile worlds streamed around a moving observer.
//!
//! ## Crates
//!
//! - [`procedural`]: Noise, terrain, road and water overlays, sprite scatter
//! - [`streaming`]: Background chunk cache and view/unload policy
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata::prelude::*;
//!
//! let config = WorldConfig::from_toml_str("seed = 7")?;
//! let mut streamer = ChunkStreamer::from_config(&config)?;
//!
//! // Once per frame:
//! streamer.update(12.0, -3.5);
//! if let Some(chunk) = streamer.cache().get_loaded(ChunkCoord::new(0, 0)) {
//!     for sprite in chunk.big_sprites() {
//!         println!("{:?} at {:?}", sprite.kind, sprite.position);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub use strata_procedural as procedural;
pub use strata_streaming as streaming;

/// Common imports for embedding a streamed world.
pub mod prelude {
    pub use strata_procedural::prelude::*;
    pub use strata_streaming::{
        CacheError, ChunkCache, ChunkState, ChunkStreamer, LoadedChunk, RequestOutcome, ViewUpdate,
        WorldConfig,
    };
}

/// Returns crate version information.
#[must_use]
pub fn crate_info() -> &'static str {
    concat!("strata v", env!("CARGO_PKG_VERSION"))
}

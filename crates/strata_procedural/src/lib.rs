//! # STRATA Procedural Generation
//!
//! Deterministic tile worlds: terrain, overlays and decoration.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Chunked**: World is generated in square patches with shared borders
//! 3. **Composable**: Roads and water are overlays stacked on any tile source
//! 4. **Stateless**: Sources keep no per-chunk state and need no locking
//!
//! ## Core Components
//!
//! - `ValueNoise`: Lattice value noise with fractal octaves
//! - `ProceduralTileSource`: Height, material and climate per tile
//! - `RoadOverlay` / `WaterOverlay`: Decorators over any `TileSource`
//! - `ProceduralSpriteSource`: Chunk-seeded decoration scatter
//! - `MaterialCatalog`: Material key → texture and traversal data
//!
//! ## Example
//!
//! ```rust
//! use strata_procedural::prelude::*;
//!
//! let seed = WorldSeed::new(12345);
//! let terrain = ProceduralTileSource::new(seed, &TerrainConfig::default())?
//!     .decorate(RoadOverlay::new(seed, RoadConfig::default())?)
//!     .decorate(WaterOverlay::new(WaterConfig::default())?);
//! let sprites = ProceduralSpriteSource::new(seed, SpriteConfig::default())?;
//!
//! let coord = ChunkCoord::new(0, 0);
//! let tiles = terrain.tile_data(coord, DEFAULT_CHUNK_SIZE)?;
//! for sprite in sprites.sprites(coord, &tiles) {
//!     assert!(sprite.position[1].is_finite());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod climate;
pub mod config;
pub mod error;
pub mod material;
pub mod noise;
pub mod overlay;
pub mod source;
pub mod sprite;
pub mod tile;

pub use chunk::{ChunkCoord, TileGrid, DEFAULT_CHUNK_SIZE};
pub use climate::ClimateSampler;
pub use config::{parse_toml, PeriodicGrid, RoadConfig, SpriteConfig, TerrainConfig, WaterConfig};
pub use error::{ConfigError, ConfigResult, GenerationError, GenerationResult};
pub use material::{BandConfig, MaterialBands, MaterialCatalog, MaterialDescriptor, MaterialKey};
pub use noise::{ValueNoise, WorldSeed};
pub use overlay::{Decorated, RoadClass, RoadOverlay, TileOverlay, WaterOverlay};
pub use source::{ProceduralTileSource, TileSource, TileSourceExt};
pub use sprite::{ProceduralSpriteSource, Sprite, SpriteKind, SpriteSource};
pub use tile::{TerrainTile, WaterInfo, WaterKind};

/// Everything needed to build and query a generation stack.
pub mod prelude {
    pub use crate::chunk::{ChunkCoord, TileGrid, DEFAULT_CHUNK_SIZE};
    pub use crate::config::{RoadConfig, SpriteConfig, TerrainConfig, WaterConfig};
    pub use crate::noise::WorldSeed;
    pub use crate::overlay::{RoadOverlay, TileOverlay, WaterOverlay};
    pub use crate::source::{ProceduralTileSource, TileSource, TileSourceExt};
    pub use crate::sprite::{ProceduralSpriteSource, Sprite, SpriteKind, SpriteSource};
    pub use crate::tile::{TerrainTile, WaterKind};
}

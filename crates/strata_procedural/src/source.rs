//! # Tile Sources
//!
//! A [`TileSource`] turns a chunk coordinate into a [`TileGrid`]. The base
//! implementation, [`ProceduralTileSource`], samples fractal noise for height,
//! bands height into a material, and fills the climate channels.
//!
//! Sources hold only their seed and parameters. Nothing is memoized, so
//! asking twice for the same chunk yields bit-identical grids, and a source
//! can be shared across threads without locking.
//!
//! ## Stacking
//!
//! ```rust
//! use strata_procedural::prelude::*;
//!
//! let seed = WorldSeed::new(12345);
//! let stack = ProceduralTileSource::new(seed, &TerrainConfig::default())?
//!     .decorate(RoadOverlay::new(seed, RoadConfig::default())?)
//!     .decorate(WaterOverlay::new(WaterConfig::default())?);
//!
//! let grid = stack.tile_data(ChunkCoord::new(0, 0), 65)?;
//! assert_eq!(grid.len(), 65 * 65);
//! assert!(stack.materials().contains("road"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::chunk::{check_size, ChunkCoord, TileGrid};
use crate::climate::ClimateSampler;
use crate::config::TerrainConfig;
use crate::error::{ConfigResult, GenerationResult};
use crate::material::{MaterialBands, MaterialCatalog};
use crate::noise::{ValueNoise, WorldSeed};
use crate::overlay::{Decorated, TileOverlay};
use crate::tile::TerrainTile;

/// Anything that can produce terrain tiles for a chunk.
pub trait TileSource: Send + Sync {
    /// Generates the `size × size` grid for `coord`.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`](crate::error::GenerationError) scoped
    /// to this chunk.
    fn tile_data(&self, coord: ChunkCoord, size: usize) -> GenerationResult<TileGrid>;

    /// Every material key this source can emit.
    fn materials(&self) -> &MaterialCatalog;

    /// Human-readable description of the source (and what it wraps).
    fn name(&self) -> String;
}

impl<T: TileSource + ?Sized> TileSource for Box<T> {
    fn tile_data(&self, coord: ChunkCoord, size: usize) -> GenerationResult<TileGrid> {
        (**self).tile_data(coord, size)
    }

    fn materials(&self) -> &MaterialCatalog {
        (**self).materials()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Builder methods for any tile source.
pub trait TileSourceExt: TileSource + Sized {
    /// Wraps this source in `overlay`.
    fn decorate<O: TileOverlay>(self, overlay: O) -> Decorated<O, Self> {
        Decorated::new(self, overlay)
    }

    /// Erases the concrete stack type.
    fn boxed(self) -> Box<dyn TileSource>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: TileSource> TileSourceExt for T {}

/// Noise-driven base terrain.
#[derive(Clone, Debug)]
pub struct ProceduralTileSource {
    seed: WorldSeed,
    noise: ValueNoise,
    climate: ClimateSampler,
    scale: f64,
    height_multiplier: f32,
    bands: MaterialBands,
    catalog: MaterialCatalog,
}

impl ProceduralTileSource {
    /// Creates a base source.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if `config` is
    /// invalid or its bands name unknown materials.
    pub fn new(seed: WorldSeed, config: &TerrainConfig) -> ConfigResult<Self> {
        config.validate()?;

        let mut catalog = MaterialCatalog::terrain();
        for (key, descriptor) in &config.materials {
            catalog.insert(key, descriptor.clone());
        }
        let bands = MaterialBands::new(&config.bands, &config.top_material, &catalog)?;

        tracing::debug!(
            seed = seed.value(),
            scale = config.scale,
            height_multiplier = config.height_multiplier,
            "base tile source ready"
        );

        Ok(Self {
            seed,
            noise: ValueNoise::new(seed),
            climate: ClimateSampler::new(
                seed,
                config.climate_scale,
                config.height_dryness,
                config.elevation_cooling,
            ),
            scale: config.scale,
            height_multiplier: config.height_multiplier,
            bands,
            catalog,
        })
    }

    /// World seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Normalized terrain value in [-1, 1] at a world position.
    #[inline]
    fn elevation(&self, world_x: f64, world_z: f64) -> f64 {
        self.noise.fbm(world_x * self.scale, world_z * self.scale)
    }

    /// Signed terrain height at any world position.
    ///
    /// Matches the `height` of the tile generated at that position.
    #[must_use]
    pub fn height_at(&self, world_x: f64, world_z: f64) -> f32 {
        self.elevation(world_x, world_z) as f32 * self.height_multiplier
    }

    /// Full base tile at a world position.
    #[must_use]
    pub fn tile_at(&self, world_x: f64, world_z: f64) -> TerrainTile {
        let elevation = self.elevation(world_x, world_z);
        let height = elevation as f32 * self.height_multiplier;
        let material = self.bands.classify(height).clone();
        let speed = self.catalog.speed_of(material.as_str());

        TerrainTile::new(
            height,
            material,
            self.climate.wetness(world_x, world_z, elevation),
            self.climate.temperature(world_x, world_z, elevation),
            speed,
        )
    }
}

impl TileSource for ProceduralTileSource {
    fn tile_data(&self, coord: ChunkCoord, size: usize) -> GenerationResult<TileGrid> {
        check_size(size)?;
        let (origin_x, origin_z) = coord.world_origin(size);

        let mut tiles = Vec::with_capacity(size * size);
        for z in 0..size {
            let world_z = (origin_z + z as i64) as f64;
            for x in 0..size {
                let world_x = (origin_x + x as i64) as f64;
                tiles.push(self.tile_at(world_x, world_z));
            }
        }

        TileGrid::from_tiles(size, tiles)
    }

    fn materials(&self) -> &MaterialCatalog {
        &self.catalog
    }

    fn name(&self) -> String {
        format!(
            "ProceduralTileSource(seed={}, scale={})",
            self.seed.value(),
            self.scale
        )
    }
}

//! # World Configuration
//!
//! One TOML file describes a whole world: seed, terrain, overlays, sprites
//! and the streaming policy. Every section and field is optional.
//!
//! ```toml
//! seed = 12345
//!
//! [terrain]
//! scale = 0.02
//! height_multiplier = 40.0
//!
//! [water]
//! enabled = false
//!
//! [streaming]
//! view_radius = 4
//! unload_radius = 6
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_procedural::chunk::DEFAULT_CHUNK_SIZE;
use strata_procedural::{
    ChunkCoord, ConfigError, ConfigResult, ProceduralSpriteSource, ProceduralTileSource,
    RoadConfig, RoadOverlay, SpriteConfig, TerrainConfig, TileSource, TileSourceExt, WaterConfig,
    WaterOverlay, WorldSeed,
};

use crate::cache::CacheConfig;
use crate::generator::ChunkGenerator;

/// Inclusive chunk-coordinate limits of a finite world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBounds {
    /// Smallest chunk X.
    pub min_x: i32,
    /// Smallest chunk Z.
    pub min_z: i32,
    /// Largest chunk X.
    pub max_x: i32,
    /// Largest chunk Z.
    pub max_z: i32,
}

impl ChunkBounds {
    /// Creates bounds from two corners.
    #[must_use]
    pub fn new(min: ChunkCoord, max: ChunkCoord) -> Self {
        Self {
            min_x: min.x,
            min_z: min.z,
            max_x: max.x,
            max_z: max.z,
        }
    }

    /// Returns true if `coord` lies inside.
    #[inline]
    #[must_use]
    pub const fn contains(&self, coord: ChunkCoord) -> bool {
        coord.x >= self.min_x
            && coord.x <= self.max_x
            && coord.z >= self.min_z
            && coord.z <= self.max_z
    }
}

/// Streaming policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Samples per chunk side.
    pub chunk_size: usize,
    /// Chunks within this Chebyshev distance are requested.
    pub view_radius: u32,
    /// Chunks beyond this Chebyshev distance are unloaded.
    pub unload_radius: u32,
    /// Worker shutdown wait in milliseconds.
    pub shutdown_timeout_ms: u64,
    /// Optional world limits.
    pub bounds: Option<ChunkBounds>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            view_radius: 12,
            unload_radius: 14,
            shutdown_timeout_ms: 2000,
            bounds: None,
        }
    }
}

impl StreamingConfig {
    /// Checks chunk size and radii.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChunkSize`] or [`ConfigError::InvalidRadii`].
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size < 2 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }
        if self.unload_radius < self.view_radius {
            return Err(ConfigError::InvalidRadii {
                view: self.view_radius,
                unload: self.unload_radius,
            });
        }
        Ok(())
    }

    /// Cache settings derived from this policy.
    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
        }
    }
}

/// Road overlay section: parameters plus an on/off switch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadSection {
    /// Whether roads are laid at all.
    pub enabled: bool,
    /// Road parameters.
    #[serde(flatten)]
    pub config: RoadConfig,
}

impl Default for RoadSection {
    fn default() -> Self {
        Self {
            enabled: true,
            config: RoadConfig::default(),
        }
    }
}

/// Water overlay section: parameters plus an on/off switch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSection {
    /// Whether water is added at all.
    pub enabled: bool,
    /// Water parameters.
    #[serde(flatten)]
    pub config: WaterConfig,
}

impl Default for WaterSection {
    fn default() -> Self {
        Self {
            enabled: true,
            config: WaterConfig::default(),
        }
    }
}

/// Everything needed to build and stream one world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Base terrain.
    pub terrain: TerrainConfig,
    /// Road overlay.
    pub roads: RoadSection,
    /// Water overlay.
    pub water: WaterSection,
    /// Sprite scatter.
    pub sprites: SpriteConfig,
    /// Streaming policy.
    pub streaming: StreamingConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            terrain: TerrainConfig::default(),
            roads: RoadSection::default(),
            water: WaterSection::default(),
            sprites: SpriteConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, or the first
    /// validation error.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`WorldConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), seed = config.seed, "world config loaded");
        Ok(config)
    }

    /// Serializes the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter.
    pub fn validate(&self) -> ConfigResult<()> {
        self.terrain.validate()?;
        self.roads.config.validate()?;
        self.water.config.validate()?;
        self.sprites.validate()?;
        self.streaming.validate()
    }

    /// World seed.
    #[must_use]
    pub const fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(self.seed)
    }

    /// Builds the canonical tile stack: `Water(Road(Base))`, skipping
    /// disabled overlays.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn build_tile_source(&self) -> ConfigResult<Box<dyn TileSource>> {
        let seed = self.world_seed();
        let mut source = ProceduralTileSource::new(seed, &self.terrain)?.boxed();
        if self.roads.enabled {
            source = source.decorate(RoadOverlay::new(seed, self.roads.config.clone())?).boxed();
        }
        if self.water.enabled {
            source = source.decorate(WaterOverlay::new(self.water.config.clone())?).boxed();
        }
        Ok(source)
    }

    /// Builds the chunk generator for this world.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn build_generator(&self) -> ConfigResult<ChunkGenerator> {
        self.validate()?;
        let tiles = self.build_tile_source()?;
        let sprites = ProceduralSpriteSource::new(self.world_seed(), self.sprites.clone())?;
        ChunkGenerator::new(tiles, sprites, self.streaming.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_world() {
        let config = WorldConfig::default();
        assert_eq!(config.seed, 12345);
        assert_eq!(config.terrain.scale, 0.02);
        assert_eq!(config.terrain.height_multiplier, 40.0);
        assert_eq!(config.streaming.chunk_size, 65);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = WorldConfig::from_toml_str(
            r"
            seed = 7

            [water]
            enabled = false
            drag = 0.5

            [roads.main]
            spacing = 128
            width = 5

            [streaming]
            view_radius = 2
            unload_radius = 5
            bounds = { min_x = -4, min_z = -4, max_x = 4, max_z = 4 }
            ",
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert!(!config.water.enabled);
        assert_eq!(config.water.config.drag, 0.5);
        assert_eq!(config.roads.config.main.spacing, 128);
        assert!(config.roads.enabled);
        assert_eq!(config.streaming.view_radius, 2);
        assert!(config.streaming.bounds.unwrap().contains(ChunkCoord::new(4, -4)));
        assert_eq!(config.terrain, TerrainConfig::default());
    }

    #[test]
    fn test_radii_validation() {
        let err = WorldConfig::from_toml_str("[streaming]\nview_radius = 6\nunload_radius = 3\n")
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidRadii { view: 6, unload: 3 });
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(WorldConfig::from_toml_str("seed = ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = WorldConfig::from_file("/definitely/not/here/world.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = WorldConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(WorldConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_stack_respects_switches() {
        let mut config = WorldConfig::default();
        config.water.enabled = false;
        let source = config.build_tile_source().unwrap();
        assert!(source.materials().contains("road"));
        assert!(!source.materials().contains("water"));
        assert!(source.name().starts_with("RoadOverlay"));

        let generator = config.build_generator().unwrap();
        assert_eq!(generator.chunk_size(), 65);
    }
}

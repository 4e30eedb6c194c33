//! # Generation Configuration
//!
//! Parameter structs for the base tile source, the overlays and the sprite
//! scatter. Every struct deserializes from TOML with per-field defaults, so
//! a config file only lists what it changes:
//!
//! ```toml
//! [terrain]
//! scale = 0.02
//! height_multiplier = 40.0
//!
//! [roads.main]
//! spacing = 256
//! width = 7
//! ```
//!
//! Call `validate()` (or build the source, which validates) before use.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::material::{BandConfig, MaterialBands, MaterialDescriptor, ROCK};

/// Parses a TOML document into any config struct.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] with the TOML error message.
pub fn parse_toml<T: DeserializeOwned>(text: &str) -> ConfigResult<T> {
    toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn check_range(
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
    range: &'static str,
) -> ConfigResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value, range })
    }
}

// ============================================================================
// TERRAIN
// ============================================================================

/// Base tile source parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World units → noise units.
    pub scale: f64,
    /// Peak absolute terrain height.
    pub height_multiplier: f32,
    /// Height bands in ascending order.
    pub bands: Vec<BandConfig>,
    /// Material above the last band.
    pub top_material: String,
    /// Frequency of the wetness and temperature channels.
    pub climate_scale: f64,
    /// How strongly height dries a tile, in [0, 1].
    pub height_dryness: f32,
    /// Temperature drop at peak height, in [0, 2].
    pub elevation_cooling: f32,
    /// Extra or replacement catalog entries.
    pub materials: BTreeMap<String, MaterialDescriptor>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            scale: 0.02,
            height_multiplier: 40.0,
            bands: MaterialBands::default_config(),
            top_material: ROCK.to_owned(),
            climate_scale: 0.004,
            height_dryness: 0.4,
            elevation_cooling: 0.5,
            materials: BTreeMap::new(),
        }
    }
}

impl TerrainConfig {
    /// Checks scalar parameters. Bands are checked against the catalog when
    /// the source is built.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        if !(self.climate_scale.is_finite() && self.climate_scale > 0.0) {
            return Err(ConfigError::InvalidScale(self.climate_scale));
        }
        if !(self.height_multiplier.is_finite() && self.height_multiplier > 0.0) {
            return Err(ConfigError::InvalidHeightMultiplier(self.height_multiplier));
        }
        check_range("height_dryness", self.height_dryness, 0.0, 1.0, "[0, 1]")?;
        check_range("elevation_cooling", self.elevation_cooling, 0.0, 2.0, "[0, 2]")?;
        for descriptor in self.materials.values() {
            descriptor.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// PERIODIC GRIDS
// ============================================================================

/// Lines of `width` units repeating every `spacing` units on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicGrid {
    /// Period in world units.
    pub spacing: u32,
    /// Line width in world units.
    pub width: u32,
}

impl PeriodicGrid {
    /// Creates a grid.
    #[must_use]
    pub const fn new(spacing: u32, width: u32) -> Self {
        Self { spacing, width }
    }

    /// Returns true if `(world_x, world_z)` lies on a line of either axis.
    #[inline]
    #[must_use]
    pub fn contains(&self, world_x: i64, world_z: i64) -> bool {
        let spacing = i64::from(self.spacing);
        let width = i64::from(self.width);
        world_x.rem_euclid(spacing) < width || world_z.rem_euclid(spacing) < width
    }

    fn validate(&self, grid: &'static str) -> ConfigResult<()> {
        if self.width == 0 || self.width >= self.spacing {
            return Err(ConfigError::InvalidGrid {
                grid,
                spacing: self.spacing,
                width: self.width,
            });
        }
        Ok(())
    }
}

// ============================================================================
// ROADS
// ============================================================================

/// Road overlay parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// How far road tiles sink below the terrain.
    pub road_depth: f32,
    /// Unconditional arterial grid.
    pub main: PeriodicGrid,
    /// Unconditional secondary grid.
    pub secondary: PeriodicGrid,
    /// Local grid, present only in dense regions.
    pub local: PeriodicGrid,
    /// Frequency of the regional density noise.
    pub density_scale: f64,
    /// Normalized density above which local roads appear.
    pub density_threshold: f32,
    /// Road catalog entry.
    pub material: MaterialDescriptor,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            road_depth: 0.5,
            main: PeriodicGrid::new(256, 7),
            secondary: PeriodicGrid::new(64, 4),
            local: PeriodicGrid::new(32, 3),
            density_scale: 0.005,
            density_threshold: 0.5,
            material: MaterialDescriptor::new("Road", "textures/terrain/dirt.jpg", 1.0, 1.3),
        }
    }
}

impl RoadConfig {
    /// Checks grids, depth, density and the road material.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter.
    pub fn validate(&self) -> ConfigResult<()> {
        self.main.validate("main road")?;
        self.secondary.validate("secondary road")?;
        self.local.validate("local road")?;
        check_range("road_depth", self.road_depth, 0.0, f32::MAX, "[0, inf)")?;
        check_range("density_threshold", self.density_threshold, 0.0, 1.0, "[0, 1]")?;
        if !(self.density_scale.is_finite() && self.density_scale > 0.0) {
            return Err(ConfigError::InvalidScale(self.density_scale));
        }
        self.material.validate()
    }
}

// ============================================================================
// WATER
// ============================================================================

/// Water overlay parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    /// Global still-water surface height.
    pub water_level: f32,
    /// River channel grid.
    pub rivers: PeriodicGrid,
    /// River surface height above the riverbed.
    pub river_depth: f32,
    /// Standing water deeper than this is ocean.
    pub ocean_depth: f32,
    /// Speed factor applied on water tiles, in (0, 1].
    pub drag: f32,
    /// Water catalog entry. Its speed multiplier is replaced by `drag`.
    pub material: MaterialDescriptor,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            water_level: -10.0,
            rivers: PeriodicGrid::new(224, 6),
            river_depth: 1.5,
            ocean_depth: 12.0,
            drag: 0.3,
            material: MaterialDescriptor::new("Water", "textures/water/water.png", 4.0, 0.3),
        }
    }
}

impl WaterConfig {
    /// Checks grid, depths, drag and the water material.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter.
    pub fn validate(&self) -> ConfigResult<()> {
        self.rivers.validate("river")?;
        check_range("water_level", self.water_level, f32::MIN, f32::MAX, "finite")?;
        check_range("river_depth", self.river_depth, 0.0, f32::MAX, "[0, inf)")?;
        check_range("ocean_depth", self.ocean_depth, 0.0, f32::MAX, "[0, inf)")?;
        if !(self.drag.is_finite() && self.drag > 0.0 && self.drag <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "drag",
                value: self.drag,
                range: "(0, 1]",
            });
        }
        self.material.validate()
    }
}

// ============================================================================
// SPRITES
// ============================================================================

/// Sprite scatter parameters.
///
/// Attempt counts cap the number of candidates per chunk; rejected
/// candidates are not retried.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Tree candidates per chunk.
    pub tree_attempts: u32,
    /// Bush candidates per chunk.
    pub bush_attempts: u32,
    /// Rock candidates per chunk.
    pub rock_attempts: u32,
    /// Grass tuft candidates per chunk.
    pub grass_attempts: u32,
    /// Model prop candidates per chunk.
    pub model_attempts: u32,
    /// Chance a rock lands on a non-rock material.
    pub rock_off_material_chance: f32,
    /// Chance an eligible model candidate is placed.
    pub model_chance: f32,
    /// Number of distinct model props.
    pub model_variants: u8,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            tree_attempts: 5,
            bush_attempts: 10,
            rock_attempts: 3,
            grass_attempts: 20,
            model_attempts: 1,
            rock_off_material_chance: 0.3,
            model_chance: 0.25,
            model_variants: 4,
        }
    }
}

impl SpriteConfig {
    /// Checks probabilities and variant count.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter.
    pub fn validate(&self) -> ConfigResult<()> {
        check_range("rock_off_material_chance", self.rock_off_material_chance, 0.0, 1.0, "[0, 1]")?;
        check_range("model_chance", self.model_chance, 0.0, 1.0, "[0, 1]")?;
        if self.model_attempts > 0 && self.model_variants == 0 {
            return Err(ConfigError::OutOfRange {
                name: "model_variants",
                value: 0.0,
                range: "[1, 255] when model_attempts > 0",
            });
        }
        Ok(())
    }

    /// Total candidate draws per chunk.
    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        self.tree_attempts
            .saturating_add(self.bush_attempts)
            .saturating_add(self.rock_attempts)
            .saturating_add(self.grass_attempts)
            .saturating_add(self.model_attempts)
    }
}

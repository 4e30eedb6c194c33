//! # Tile Model
//!
//! Value types for one terrain sample and its optional water cover.

use crate::material::MaterialKey;

/// Kind of water body covering a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaterKind {
    /// Flowing water on the river grid.
    River,
    /// Standing water in a basin below the water level.
    Lake,
    /// Standing water deeper than the ocean threshold.
    Ocean,
}

/// Water surface over a tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterInfo {
    /// World height of the water surface.
    pub water_height: f32,
    /// `water_height - terrain_height`.
    pub depth: f32,
    /// Water body kind.
    pub kind: WaterKind,
    /// Speed factor the water applies on top of the surface material.
    pub drag: f32,
}

impl WaterInfo {
    /// Creates water info for a tile at `terrain_height`, without drag.
    #[inline]
    #[must_use]
    pub fn new(water_height: f32, terrain_height: f32, kind: WaterKind) -> Self {
        Self {
            water_height,
            depth: water_height - terrain_height,
            kind,
            drag: 1.0,
        }
    }

    /// Sets the speed factor.
    #[inline]
    #[must_use]
    pub const fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag;
        self
    }
}

/// One terrain sample.
///
/// `speed_multiplier` always matches the tile's final material: an overlay
/// that swaps the material swaps the multiplier too.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainTile {
    /// Signed world height.
    pub height: f32,
    /// Surface material key.
    pub material: MaterialKey,
    /// Moisture in [0, 1].
    pub wetness: f32,
    /// Temperature in [-1, 1].
    pub temperature: f32,
    /// Movement speed factor (> 0).
    pub speed_multiplier: f32,
    /// Water cover, if any.
    pub water: Option<WaterInfo>,
}

impl TerrainTile {
    /// Creates a dry tile.
    #[must_use]
    pub fn new(
        height: f32,
        material: MaterialKey,
        wetness: f32,
        temperature: f32,
        speed_multiplier: f32,
    ) -> Self {
        Self {
            height,
            material,
            wetness,
            temperature,
            speed_multiplier,
            water: None,
        }
    }

    /// Returns true if water covers this tile.
    #[inline]
    #[must_use]
    pub const fn has_water(&self) -> bool {
        self.water.is_some()
    }
}

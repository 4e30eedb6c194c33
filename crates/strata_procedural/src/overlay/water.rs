//! Water overlay: rivers on a periodic channel grid, standing water below
//! the global water level.
//!
//! | Condition                       | Kind    | Surface                               |
//! |---------------------------------|---------|---------------------------------------|
//! | on river grid                   | River   | `max(water_level, height + river_depth)` |
//! | below level, depth <= ocean     | Lake    | `water_level`                         |
//! | below level, depth > ocean      | Ocean   | `water_level`                         |
//!
//! Terrain height and material are kept; water is extra data on the tile.
//! The drag is recorded on the water so overlays stacked above can reapply
//! it when they replace the surface speed.

use crate::chunk::{ChunkCoord, TileGrid};
use crate::config::WaterConfig;
use crate::error::ConfigResult;
use crate::material::{MaterialCatalog, WATER};
use crate::overlay::TileOverlay;
use crate::tile::{WaterInfo, WaterKind};

/// Floods rivers and basins.
#[derive(Clone, Debug)]
pub struct WaterOverlay {
    config: WaterConfig,
}

impl WaterOverlay {
    /// Creates a water overlay.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if `config` is invalid.
    pub fn new(config: WaterConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Water that would cover terrain of `height` at a world position.
    #[must_use]
    pub fn water_at(&self, world_x: i64, world_z: i64, height: f32) -> Option<WaterInfo> {
        let level = self.config.water_level;
        let drag = self.config.drag;

        if self.config.rivers.contains(world_x, world_z) {
            let surface = level.max(height + self.config.river_depth);
            return Some(WaterInfo::new(surface, height, WaterKind::River).with_drag(drag));
        }

        if height < level {
            let kind = if level - height > self.config.ocean_depth {
                WaterKind::Ocean
            } else {
                WaterKind::Lake
            };
            return Some(WaterInfo::new(level, height, kind).with_drag(drag));
        }

        None
    }
}

impl TileOverlay for WaterOverlay {
    fn name(&self) -> String {
        format!(
            "WaterOverlay(level={}, rivers={})",
            self.config.water_level, self.config.rivers.spacing
        )
    }

    fn extend_materials(&self, catalog: &mut MaterialCatalog) {
        let mut descriptor = self.config.material.clone();
        descriptor.speed_multiplier = self.config.drag;
        catalog.insert(WATER, descriptor);
    }

    fn apply(&self, grid: &mut TileGrid, coord: ChunkCoord, _catalog: &MaterialCatalog) {
        let size = grid.size();
        let (origin_x, origin_z) = coord.world_origin(size);

        for (i, tile) in grid.tiles_mut().iter_mut().enumerate() {
            if tile.has_water() {
                continue;
            }
            let world_x = origin_x + (i % size) as i64;
            let world_z = origin_z + (i / size) as i64;

            if let Some(water) = self.water_at(world_x, world_z, tile.height) {
                tile.water = Some(water);
                tile.speed_multiplier *= water.drag;
                tile.wetness = 1.0;
            }
        }
    }
}

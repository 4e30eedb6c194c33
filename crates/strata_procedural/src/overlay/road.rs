//! Road network overlay.
//!
//! Three periodic grids lay out the network. Main and secondary roads are
//! everywhere; local roads appear only where a low-frequency density field
//! is above a threshold, so some regions are busy and others are open.
//!
//! The road predicate depends on world position only, never on height, and
//! tiles already paved are skipped. Applying the overlay twice is therefore
//! the same as applying it once.

use crate::chunk::{ChunkCoord, TileGrid};
use crate::config::RoadConfig;
use crate::error::ConfigResult;
use crate::material::{MaterialCatalog, MaterialKey, ROAD};
use crate::noise::{ValueNoise, WorldSeed};
use crate::overlay::TileOverlay;

/// Sub-seed purpose for the density field.
const DENSITY_CHANNEL: u64 = 0x524f_4144;

/// Road class at a world position, ordered by priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoadClass {
    /// No road.
    None,
    /// Local street (density gated).
    Local,
    /// Secondary road.
    Secondary,
    /// Main road.
    Main,
}

impl RoadClass {
    /// Returns true for any actual road.
    #[inline]
    #[must_use]
    pub const fn is_road(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Paves tiles on the road network.
#[derive(Clone, Debug)]
pub struct RoadOverlay {
    config: RoadConfig,
    density_noise: ValueNoise,
    road_key: MaterialKey,
}

impl RoadOverlay {
    /// Creates a road overlay.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if `config` is invalid.
    pub fn new(seed: WorldSeed, config: RoadConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            density_noise: ValueNoise::new(seed.derive(DENSITY_CHANNEL)),
            road_key: MaterialKey::new(ROAD),
        })
    }

    /// Regional road density in [0, 1].
    #[must_use]
    pub fn density(&self, world_x: i64, world_z: i64) -> f32 {
        let scale = self.config.density_scale;
        let n = self
            .density_noise
            .sample(world_x as f64 * scale, world_z as f64 * scale);
        ((n + 1.0) * 0.5) as f32
    }

    /// Classifies a world position. Main beats secondary beats local.
    #[must_use]
    pub fn classify(&self, world_x: i64, world_z: i64) -> RoadClass {
        if self.config.main.contains(world_x, world_z) {
            RoadClass::Main
        } else if self.config.secondary.contains(world_x, world_z) {
            RoadClass::Secondary
        } else if self.config.local.contains(world_x, world_z)
            && self.density(world_x, world_z) > self.config.density_threshold
        {
            RoadClass::Local
        } else {
            RoadClass::None
        }
    }
}

impl TileOverlay for RoadOverlay {
    fn name(&self) -> String {
        format!(
            "RoadOverlay(main={}, secondary={}, local={})",
            self.config.main.spacing, self.config.secondary.spacing, self.config.local.spacing
        )
    }

    fn extend_materials(&self, catalog: &mut MaterialCatalog) {
        catalog.insert(ROAD, self.config.material.clone());
    }

    fn apply(&self, grid: &mut TileGrid, coord: ChunkCoord, catalog: &MaterialCatalog) {
        let size = grid.size();
        let (origin_x, origin_z) = coord.world_origin(size);
        let speed = catalog.speed_of(ROAD);

        for (i, tile) in grid.tiles_mut().iter_mut().enumerate() {
            if tile.material == self.road_key {
                continue;
            }
            let world_x = origin_x + (i % size) as i64;
            let world_z = origin_z + (i / size) as i64;
            if !self.classify(world_x, world_z).is_road() {
                continue;
            }

            tile.height -= self.config.road_depth;
            tile.material = self.road_key.clone();
            tile.speed_multiplier = speed;
            // Water laid before the road keeps its surface and drag; the bed moved.
            if let Some(water) = tile.water.as_mut() {
                water.depth = water.water_height - tile.height;
                tile.speed_multiplier *= water.drag;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PeriodicGrid, TerrainConfig};
    use crate::source::{ProceduralTileSource, TileSource};
    use crate::tile::{WaterInfo, WaterKind};

    fn overlay() -> RoadOverlay {
        RoadOverlay::new(WorldSeed::new(12345), RoadConfig::default()).unwrap()
    }

    #[test]
    fn test_priority() {
        let roads = overlay();
        assert_eq!(roads.classify(0, 100), RoadClass::Main);
        assert_eq!(roads.classify(256 + 6, 100), RoadClass::Main);
        assert_eq!(roads.classify(64, 100), RoadClass::Secondary);
        assert_eq!(roads.classify(-64, 30), RoadClass::Secondary);
        assert_eq!(roads.classify(20, 20), RoadClass::None);
    }

    #[test]
    fn test_local_roads_follow_density() {
        let roads = overlay();
        let mut dense = 0;
        let mut sparse = 0;

        // Local lines every 32 units, skipping the ones secondary roads cover.
        for block in -40..40i64 {
            let x = block * 64 + 32;
            let z = block * 37 + 10;
            if roads.config.secondary.contains(x, z) || roads.config.main.contains(x, z) {
                continue;
            }
            let class = roads.classify(x, z);
            if roads.density(x, z) > 0.5 {
                assert_eq!(class, RoadClass::Local);
                dense += 1;
            } else {
                assert_eq!(class, RoadClass::None);
                sparse += 1;
            }
        }
        assert!(dense + sparse > 0);
    }

    #[test]
    fn test_density_range() {
        let roads = overlay();
        for i in -300..300i64 {
            let d = roads.density(i * 97, i * -53);
            assert!((0.0..=1.0).contains(&d));
        }
    }

    #[test]
    fn test_paving_lowers_and_sets_speed() {
        let seed = WorldSeed::new(12345);
        let base = ProceduralTileSource::new(seed, &TerrainConfig::default()).unwrap();
        let roads = overlay();
        let mut catalog = base.materials().clone();
        roads.extend_materials(&mut catalog);

        let coord = ChunkCoord::new(0, 0);
        let original = base.tile_data(coord, 65).unwrap();
        let mut paved = original.clone();
        roads.apply(&mut paved, coord, &catalog);

        // Column x = 0 is on a main road.
        let before = original.get(0, 10).unwrap();
        let after = paved.get(0, 10).unwrap();
        assert!(after.material.is(ROAD));
        assert_eq!(after.height, before.height - 0.5);
        assert_eq!(after.speed_multiplier, catalog.speed_of(ROAD));
        assert_eq!(after.wetness, before.wetness);

        // (20, 20) is off every grid.
        assert_eq!(paved.get(20, 20), original.get(20, 20));
    }

    #[test]
    fn test_paving_under_water_keeps_drag() {
        let seed = WorldSeed::new(12345);
        let base = ProceduralTileSource::new(seed, &TerrainConfig::default()).unwrap();
        let roads = overlay();
        let mut catalog = base.materials().clone();
        roads.extend_materials(&mut catalog);

        let coord = ChunkCoord::new(0, 0);
        let mut grid = base.tile_data(coord, 65).unwrap();
        for tile in grid.tiles_mut() {
            tile.water = Some(WaterInfo::new(60.0, tile.height, WaterKind::Lake).with_drag(0.5));
            tile.speed_multiplier *= 0.5;
        }
        roads.apply(&mut grid, coord, &catalog);

        let paved = grid.get(0, 10).unwrap();
        assert!(paved.material.is(ROAD));
        assert_eq!(paved.speed_multiplier, catalog.speed_of(ROAD) * 0.5);
        let water = paved.water.unwrap();
        assert_eq!(water.depth, 60.0 - paved.height);
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let seed = WorldSeed::new(99);
        let base = ProceduralTileSource::new(seed, &TerrainConfig::default()).unwrap();
        let config = RoadConfig {
            local: PeriodicGrid::new(8, 2),
            density_threshold: 0.0,
            ..RoadConfig::default()
        };
        let roads = RoadOverlay::new(seed, config).unwrap();
        let mut catalog = base.materials().clone();
        roads.extend_materials(&mut catalog);

        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 5)] {
            let mut once = base.tile_data(coord, 33).unwrap();
            roads.apply(&mut once, coord, &catalog);
            let mut twice = once.clone();
            roads.apply(&mut twice, coord, &catalog);
            assert_eq!(once, twice);
        }
    }
}

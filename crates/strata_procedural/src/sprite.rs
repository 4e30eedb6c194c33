//! # Sprite Scatter
//!
//! Places decoration on a generated grid. Each chunk gets its own RNG seeded
//! from the world seed and the chunk coordinate, so the same chunk always
//! gets the same decoration, whatever order chunks are generated in.
//!
//! ## Categories
//!
//! Categories run in a fixed order. Each draws a capped number of random
//! local positions and keeps those whose tile qualifies:
//!
//! | Category | Attempts | Tile rule                               | Scale     |
//! |----------|----------|-----------------------------------------|-----------|
//! | Trees    | 5        | dry, grass                              | 0.8 - 1.2 |
//! | Bushes   | 10       | dry, not road                           | 0.7 - 1.3 |
//! | Rocks    | 3        | dry, rock (or 30% chance elsewhere)     | 0.5 - 1.5 |
//! | Grass    | 20       | dry, not road                           | 0.5 - 1.0 |
//! | Models   | 1        | dry, not road, 25% chance               | 0.9 - 1.1 |
//!
//! Rejected candidates are skipped, never retried.

use std::f32::consts::TAU;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chunk::{ChunkCoord, TileGrid};
use crate::config::SpriteConfig;
use crate::error::ConfigResult;
use crate::material::{GRASS, ROAD, ROCK};
use crate::noise::WorldSeed;
use crate::tile::TerrainTile;

/// Hash multiplier for the chunk X coordinate.
const CHUNK_SEED_X: i64 = 73_856_093;
/// Hash multiplier for the chunk Z coordinate.
const CHUNK_SEED_Z: i64 = 19_349_663;

/// Kind of decoration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    /// Small tree.
    TreeSmall,
    /// Large tree.
    TreeLarge,
    /// Bush.
    Bush,
    /// Grass tuft.
    Grass,
    /// Rock.
    Rock,
    /// One-off model prop, by variant index.
    Model(u8),
}

impl SpriteKind {
    /// Kinds large enough to show on distant chunks.
    #[inline]
    #[must_use]
    pub const fn is_big(self) -> bool {
        matches!(self, Self::TreeSmall | Self::TreeLarge | Self::Rock | Self::Model(_))
    }
}

/// One placed decoration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// World position; `y` is the ground height of the tile it stands on.
    pub position: [f32; 3],
    /// Decoration kind.
    pub kind: SpriteKind,
    /// Uniform scale.
    pub scale: f32,
    /// Rotation about the vertical axis, radians in [0, 2π).
    pub rotation: f32,
}

impl Sprite {
    /// Shortcut for `kind.is_big()`.
    #[inline]
    #[must_use]
    pub const fn is_big(&self) -> bool {
        self.kind.is_big()
    }
}

/// Anything that can decorate a generated grid.
pub trait SpriteSource: Send + Sync {
    /// Decoration for `coord`; grid size is taken from `tiles`.
    fn sprites(&self, coord: ChunkCoord, tiles: &TileGrid) -> Vec<Sprite>;

    /// Human-readable description.
    fn name(&self) -> String;
}

impl<T: SpriteSource + ?Sized> SpriteSource for Box<T> {
    fn sprites(&self, coord: ChunkCoord, tiles: &TileGrid) -> Vec<Sprite> {
        (**self).sprites(coord, tiles)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Category rule: tile predicate plus scale range.
#[derive(Clone, Copy)]
enum Category {
    Trees,
    Bushes,
    Rocks,
    Grass,
    Models,
}

/// Chunk-seeded decoration scatter.
#[derive(Clone, Debug)]
pub struct ProceduralSpriteSource {
    seed: WorldSeed,
    config: SpriteConfig,
}

impl ProceduralSpriteSource {
    /// Creates a scatter.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if `config` is invalid.
    pub fn new(seed: WorldSeed, config: SpriteConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { seed, config })
    }

    /// RNG seed for one chunk: `seed + x * 73856093 + z * 19349663`, wrapping.
    #[must_use]
    pub fn chunk_seed(&self, coord: ChunkCoord) -> u64 {
        self.seed
            .value()
            .wrapping_add(i64::from(coord.x).wrapping_mul(CHUNK_SEED_X) as u64)
            .wrapping_add(i64::from(coord.z).wrapping_mul(CHUNK_SEED_Z) as u64)
    }

    fn attempts(&self, category: Category) -> u32 {
        match category {
            Category::Trees => self.config.tree_attempts,
            Category::Bushes => self.config.bush_attempts,
            Category::Rocks => self.config.rock_attempts,
            Category::Grass => self.config.grass_attempts,
            Category::Models => self.config.model_attempts,
        }
    }

    /// Decides the kind for a candidate, or rejects it.
    fn accept(
        &self,
        category: Category,
        tile: &TerrainTile,
        rng: &mut ChaCha8Rng,
    ) -> Option<SpriteKind> {
        if tile.has_water() {
            return None;
        }
        let on_road = tile.material.is(ROAD);

        match category {
            Category::Trees => tile.material.is(GRASS).then(|| {
                if rng.gen_bool(0.5) {
                    SpriteKind::TreeSmall
                } else {
                    SpriteKind::TreeLarge
                }
            }),
            Category::Bushes => (!on_road).then_some(SpriteKind::Bush),
            Category::Grass => (!on_road).then_some(SpriteKind::Grass),
            Category::Rocks => {
                let placed = tile.material.is(ROCK)
                    || rng.gen::<f32>() < self.config.rock_off_material_chance;
                placed.then_some(SpriteKind::Rock)
            }
            Category::Models => {
                if on_road || rng.gen::<f32>() >= self.config.model_chance {
                    return None;
                }
                Some(SpriteKind::Model(rng.gen_range(0..self.config.model_variants)))
            }
        }
    }

    fn scale_range(category: Category) -> (f32, f32) {
        match category {
            Category::Trees => (0.8, 0.4),
            Category::Bushes => (0.7, 0.6),
            Category::Rocks => (0.5, 1.0),
            Category::Grass => (0.5, 0.5),
            Category::Models => (0.9, 0.2),
        }
    }
}

impl SpriteSource for ProceduralSpriteSource {
    fn sprites(&self, coord: ChunkCoord, tiles: &TileGrid) -> Vec<Sprite> {
        let size = tiles.size();
        let (origin_x, origin_z) = coord.world_origin(size);
        let mut rng = ChaCha8Rng::seed_from_u64(self.chunk_seed(coord));
        let mut sprites = Vec::new();

        for category in [
            Category::Trees,
            Category::Bushes,
            Category::Rocks,
            Category::Grass,
            Category::Models,
        ] {
            for _ in 0..self.attempts(category) {
                let local_x = rng.gen_range(0..size);
                let local_z = rng.gen_range(0..size);
                let Some(tile) = tiles.get(local_x, local_z) else {
                    continue;
                };
                let Some(kind) = self.accept(category, tile, &mut rng) else {
                    continue;
                };

                let (base, spread) = Self::scale_range(category);
                let scale = base + rng.gen::<f32>() * spread;
                let rotation = rng.gen::<f32>() * TAU;

                sprites.push(Sprite {
                    position: [
                        (origin_x + local_x as i64) as f32,
                        tile.height,
                        (origin_z + local_z as i64) as f32,
                    ],
                    kind,
                    scale,
                    rotation,
                });
            }
        }

        sprites
    }

    fn name(&self) -> String {
        format!(
            "ProceduralSpriteSource(seed={}, attempts={})",
            self.seed.value(),
            self.config.total_attempts()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::material::MaterialKey;
    use crate::source::{ProceduralTileSource, TileSource};
    use crate::tile::{WaterInfo, WaterKind};

    fn scatter(config: SpriteConfig) -> ProceduralSpriteSource {
        ProceduralSpriteSource::new(WorldSeed::new(12345), config).unwrap()
    }

    fn uniform_grid(size: usize, material: &str, water: bool) -> TileGrid {
        let tiles = (0..size * size)
            .map(|i| {
                let height = i as f32 * 0.01;
                let mut tile = TerrainTile::new(height, MaterialKey::new(material), 0.5, 0.0, 1.0);
                if water {
                    tile.water = Some(WaterInfo::new(20.0, tile.height, WaterKind::Lake));
                }
                tile
            })
            .collect();
        TileGrid::from_tiles(size, tiles).unwrap()
    }

    #[test]
    fn test_chunk_seed_formula() {
        let source = scatter(SpriteConfig::default());
        assert_eq!(source.chunk_seed(ChunkCoord::new(0, 0)), 12345);
        assert_eq!(
            source.chunk_seed(ChunkCoord::new(1, 2)),
            12345 + 73_856_093 + 2 * 19_349_663
        );
        assert_eq!(
            source.chunk_seed(ChunkCoord::new(-1, 0)),
            12345u64.wrapping_sub(73_856_093)
        );
    }

    #[test]
    fn test_deterministic_per_chunk() {
        let source = scatter(SpriteConfig::default());
        let base =
            ProceduralTileSource::new(WorldSeed::new(12345), &TerrainConfig::default()).unwrap();
        let coord = ChunkCoord::new(4, -2);
        let tiles = base.tile_data(coord, 65).unwrap();

        assert_eq!(source.sprites(coord, &tiles), source.sprites(coord, &tiles));
    }

    #[test]
    fn test_ground_alignment_and_ranges() {
        let source = scatter(SpriteConfig::default());
        let base =
            ProceduralTileSource::new(WorldSeed::new(12345), &TerrainConfig::default()).unwrap();

        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(7, -3), ChunkCoord::new(-10, -10)] {
            let tiles = base.tile_data(coord, 65).unwrap();
            let (ox, oz) = coord.world_origin(65);

            for sprite in source.sprites(coord, &tiles) {
                let lx = (sprite.position[0] as i64 - ox) as usize;
                let lz = (sprite.position[2] as i64 - oz) as usize;
                let tile = tiles.get(lx, lz).unwrap();
                assert_eq!(sprite.position[1], tile.height);
                assert!((0.0..TAU).contains(&sprite.rotation));
                assert!(sprite.scale >= 0.5 && sprite.scale <= 1.5);
            }
        }
    }

    #[test]
    fn test_no_sprites_on_water() {
        let source = scatter(SpriteConfig {
            rock_off_material_chance: 1.0,
            model_chance: 1.0,
            ..SpriteConfig::default()
        });
        let tiles = uniform_grid(33, GRASS, true);
        assert!(source.sprites(ChunkCoord::new(0, 0), &tiles).is_empty());
    }

    #[test]
    fn test_roads_only_get_rocks() {
        let source = scatter(SpriteConfig {
            rock_off_material_chance: 1.0,
            model_chance: 1.0,
            ..SpriteConfig::default()
        });
        let tiles = uniform_grid(33, ROAD, false);
        let sprites = source.sprites(ChunkCoord::new(2, 2), &tiles);

        assert_eq!(sprites.len(), 3);
        assert!(sprites.iter().all(|s| s.kind == SpriteKind::Rock));
    }

    #[test]
    fn test_attempts_cap_count() {
        let source = scatter(SpriteConfig {
            rock_off_material_chance: 1.0,
            model_chance: 1.0,
            ..SpriteConfig::default()
        });
        let tiles = uniform_grid(33, GRASS, false);
        let sprites = source.sprites(ChunkCoord::new(0, 0), &tiles);

        // Every candidate qualifies on dry grass with both chances at 1.
        assert_eq!(sprites.len(), 5 + 10 + 3 + 20 + 1);
        assert!(sprites[..5]
            .iter()
            .all(|s| matches!(s.kind, SpriteKind::TreeSmall | SpriteKind::TreeLarge)));
        assert!(matches!(sprites[38].kind, SpriteKind::Model(v) if v < 4));
    }

    #[test]
    fn test_big_kinds() {
        assert!(SpriteKind::TreeLarge.is_big());
        assert!(SpriteKind::Rock.is_big());
        assert!(SpriteKind::Model(2).is_big());
        assert!(!SpriteKind::Bush.is_big());
        assert!(!SpriteKind::Grass.is_big());
    }
}

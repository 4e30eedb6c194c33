//! # Loaded Chunks
//!
//! The immutable result of generating one chunk. The cache shares it as
//! `Arc<LoadedChunk>`; readers never observe a half-built chunk.

use std::time::{Duration, Instant};

use strata_procedural::{ChunkCoord, Sprite, TerrainTile, TileGrid};

/// A generated chunk: tiles plus decoration.
#[derive(Clone, Debug)]
pub struct LoadedChunk {
    coord: ChunkCoord,
    tiles: TileGrid,
    sprites: Vec<Sprite>,
    loaded_at: Instant,
    generation_time: Duration,
}

impl LoadedChunk {
    /// Wraps generated data, stamping the load time.
    #[must_use]
    pub fn new(
        coord: ChunkCoord,
        tiles: TileGrid,
        sprites: Vec<Sprite>,
        generation_time: Duration,
    ) -> Self {
        Self {
            coord,
            tiles,
            sprites,
            loaded_at: Instant::now(),
            generation_time,
        }
    }

    /// Chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Tile grid.
    #[inline]
    #[must_use]
    pub const fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    /// Placed decoration, in placement order.
    #[inline]
    #[must_use]
    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    /// Decoration worth drawing on distant chunks.
    pub fn big_sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter().filter(|s| s.is_big())
    }

    /// When the chunk was built.
    #[inline]
    #[must_use]
    pub const fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    /// How long generation took.
    #[inline]
    #[must_use]
    pub const fn generation_time(&self) -> Duration {
        self.generation_time
    }

    /// Tile at local `(x, z)`.
    #[must_use]
    pub fn tile_local(&self, x: usize, z: usize) -> Option<&TerrainTile> {
        self.tiles.get(x, z)
    }

    /// Tile at an integer world position, if this chunk covers it.
    #[must_use]
    pub fn tile_world(&self, world_x: i64, world_z: i64) -> Option<&TerrainTile> {
        let (origin_x, origin_z) = self.coord.world_origin(self.tiles.size());
        let x = usize::try_from(world_x - origin_x).ok()?;
        let z = usize::try_from(world_z - origin_z).ok()?;
        self.tiles.get(x, z)
    }

    /// Bilinearly interpolated ground height at a world position.
    ///
    /// Returns `None` outside the chunk.
    #[must_use]
    pub fn ground_height(&self, world_x: f32, world_z: f32) -> Option<f32> {
        let size = self.tiles.size();
        let (origin_x, origin_z) = self.coord.world_origin(size);
        let local_x = f64::from(world_x) - origin_x as f64;
        let local_z = f64::from(world_z) - origin_z as f64;
        let last = (size - 1) as f64;

        if !(0.0..=last).contains(&local_x) || !(0.0..=last).contains(&local_z) {
            return None;
        }

        // Clamp the cell so the far border samples its own row.
        let ix = (local_x.floor() as usize).min(size - 2);
        let iz = (local_z.floor() as usize).min(size - 2);
        let fx = (local_x - ix as f64) as f32;
        let fz = (local_z - iz as f64) as f32;

        let h00 = self.tiles.get(ix, iz)?.height;
        let h10 = self.tiles.get(ix + 1, iz)?.height;
        let h01 = self.tiles.get(ix, iz + 1)?.height;
        let h11 = self.tiles.get(ix + 1, iz + 1)?.height;

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;
        Some(h0 * (1.0 - fz) + h1 * fz)
    }
}

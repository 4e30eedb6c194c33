//! # Chunk Addressing and Tile Grids
//!
//! The world is split into square patches of `size × size` samples.
//!
//! ## Shared Borders
//!
//! Neighbouring chunks share their border row and column: the origin of
//! chunk `(cx, cz)` is `(cx * (size - 1), cz * (size - 1))`. The last column
//! of chunk `(0, 0)` and the first column of chunk `(1, 0)` sample the same
//! world positions, so meshes built from them stitch without seams.
//!
//! ## Grid Layout
//!
//! Tiles are stored row-major: `index = z * size + x`.

use crate::error::{GenerationError, GenerationResult};
use crate::tile::TerrainTile;

/// Default samples per chunk side (2^6 + 1).
pub const DEFAULT_CHUNK_SIZE: usize = 65;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not world units).
    pub x: i32,
    /// Z coordinate (in chunks, not world units).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts a world position to the chunk containing it.
    ///
    /// Uses `floor(pos / (size - 1))` to match the shared-border layout.
    /// A position exactly on a shared border belongs to the chunk on its
    /// positive side.
    #[inline]
    #[must_use]
    pub fn from_world_pos(world_x: f32, world_z: f32, size: usize) -> Self {
        let stride = stride(size) as f32;
        Self {
            x: (world_x / stride).floor() as i32,
            z: (world_z / stride).floor() as i32,
        }
    }

    /// Returns the world position of the chunk's origin (local tile `(0, 0)`).
    #[inline]
    #[must_use]
    pub fn world_origin(self, size: usize) -> (i64, i64) {
        let stride = stride(size) as i64;
        (i64::from(self.x) * stride, i64::from(self.z) * stride)
    }

    /// Chebyshev (chessboard) distance in chunks.
    #[inline]
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).unsigned_abs();
        dx.max(dz).min(u64::from(u32::MAX)) as u32
    }

    /// Returns the coordinate offset by `(dx, dz)` chunks.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            z: self.z.wrapping_add(dz),
        }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// World units between two adjacent chunk origins.
#[inline]
fn stride(size: usize) -> usize {
    size.saturating_sub(1).max(1)
}

/// Returns true if `size` has the form 2^n + 1.
#[inline]
#[must_use]
pub fn is_power_of_two_plus_one(size: usize) -> bool {
    size >= 2 && (size - 1).is_power_of_two()
}

/// Validates a requested grid size.
///
/// Sizes below 2 are rejected; sizes that are not 2^n + 1 are accepted
/// with a warning.
pub fn check_size(size: usize) -> GenerationResult<()> {
    if size < 2 {
        return Err(GenerationError::InvalidSize(size));
    }
    if !is_power_of_two_plus_one(size) {
        tracing::warn!(size, "chunk size is not 2^n+1; neighbouring meshes may not tile cleanly");
    }
    Ok(())
}

/// A `size × size` row-major grid of terrain tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    size: usize,
    tiles: Vec<TerrainTile>,
}

impl TileGrid {
    /// Builds a grid from a row-major tile vector.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidSize`] if `size < 2` and
    /// [`GenerationError::GridMismatch`] if `tiles.len() != size * size`.
    pub fn from_tiles(size: usize, tiles: Vec<TerrainTile>) -> GenerationResult<Self> {
        if size < 2 {
            return Err(GenerationError::InvalidSize(size));
        }
        let expected = size * size;
        if tiles.len() != expected {
            return Err(GenerationError::GridMismatch {
                source_name: "TileGrid".to_owned(),
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self { size, tiles })
    }

    /// Samples per side.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Total number of tiles (`size * size`).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false for a constructed grid.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Row-major index of local `(x, z)`.
    #[inline]
    #[must_use]
    pub const fn index(&self, x: usize, z: usize) -> usize {
        z * self.size + x
    }

    /// Tile at local `(x, z)`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> Option<&TerrainTile> {
        if x < self.size && z < self.size {
            self.tiles.get(self.index(x, z))
        } else {
            None
        }
    }

    /// Tile at a flat row-major index.
    #[inline]
    #[must_use]
    pub fn tile(&self, index: usize) -> Option<&TerrainTile> {
        self.tiles.get(index)
    }

    /// All tiles in row-major order.
    #[inline]
    #[must_use]
    pub fn tiles(&self) -> &[TerrainTile] {
        &self.tiles
    }

    /// Mutable tiles in row-major order. Overlays rewrite tiles in place.
    #[inline]
    pub fn tiles_mut(&mut self) -> &mut [TerrainTile] {
        &mut self.tiles
    }

    /// Iterates `(x, z, tile)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &TerrainTile)> + '_ {
        let size = self.size;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (i % size, i / size, tile))
    }
}

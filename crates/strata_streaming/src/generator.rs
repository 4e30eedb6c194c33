//! # Chunk Generator
//!
//! Runs a tile stack and a sprite source for one coordinate and packs the
//! result into a [`LoadedChunk`]. This is the only thing the cache worker
//! calls.

use std::time::Instant;

use strata_procedural::chunk::is_power_of_two_plus_one;
use strata_procedural::{
    ChunkCoord, ConfigError, ConfigResult, GenerationResult, MaterialCatalog, SpriteSource,
    TileSource,
};

use crate::chunk::LoadedChunk;

/// Tile stack + sprite source at a fixed chunk size.
pub struct ChunkGenerator {
    tiles: Box<dyn TileSource>,
    sprites: Box<dyn SpriteSource>,
    chunk_size: usize,
}

impl std::fmt::Debug for ChunkGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkGenerator")
            .field("tiles", &self.tiles.name())
            .field("sprites", &self.sprites.name())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl ChunkGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChunkSize`] if `chunk_size < 2`.
    pub fn new<T, S>(tiles: T, sprites: S, chunk_size: usize) -> ConfigResult<Self>
    where
        T: TileSource + 'static,
        S: SpriteSource + 'static,
    {
        if chunk_size < 2 {
            return Err(ConfigError::InvalidChunkSize(chunk_size));
        }
        if !is_power_of_two_plus_one(chunk_size) {
            tracing::warn!(chunk_size, "chunk size is not 2^n+1");
        }

        Ok(Self {
            tiles: Box::new(tiles),
            sprites: Box::new(sprites),
            chunk_size,
        })
    }

    /// Samples per chunk side.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Material catalog of the tile stack.
    #[must_use]
    pub fn materials(&self) -> &MaterialCatalog {
        self.tiles.materials()
    }

    /// Description of the tile stack.
    #[must_use]
    pub fn tile_source_name(&self) -> String {
        self.tiles.name()
    }

    /// Generates one chunk.
    ///
    /// # Errors
    ///
    /// Propagates the tile stack's error for this chunk.
    pub fn generate(&self, coord: ChunkCoord) -> GenerationResult<LoadedChunk> {
        let start = Instant::now();
        let tiles = self.tiles.tile_data(coord, self.chunk_size)?;
        let sprites = self.sprites.sprites(coord, &tiles);
        let elapsed = start.elapsed();

        tracing::debug!(
            %coord,
            tiles = tiles.len(),
            sprites = sprites.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "chunk generated"
        );

        Ok(LoadedChunk::new(coord, tiles, sprites, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_procedural::prelude::*;

    fn generator(size: usize) -> ConfigResult<ChunkGenerator> {
        let seed = WorldSeed::new(12345);
        ChunkGenerator::new(
            ProceduralTileSource::new(seed, &TerrainConfig::default())?,
            ProceduralSpriteSource::new(seed, SpriteConfig::default())?,
            size,
        )
    }

    #[test]
    fn test_generate_packs_tiles_and_sprites() {
        let gen = generator(33).unwrap();
        let chunk = gen.generate(ChunkCoord::new(2, -1)).unwrap();

        assert_eq!(chunk.coord(), ChunkCoord::new(2, -1));
        assert_eq!(chunk.tiles().size(), 33);
        assert_eq!(gen.materials().len(), 3);
    }

    #[test]
    fn test_rejects_tiny_chunks() {
        assert_eq!(generator(1).unwrap_err(), ConfigError::InvalidChunkSize(1));
        assert!(generator(40).is_ok());
    }
}

//! # Tile Overlays
//!
//! An overlay rewrites tiles produced by the source beneath it. Stacks are
//! built bottom-up and each layer owns the one below:
//!
//! ```text
//! Decorated<WaterOverlay, Decorated<RoadOverlay, ProceduralTileSource>>
//! ```
//!
//! ## Canonical Order
//!
//! `Water(Road(Base))`. Water runs last, so roads dip under lakes and
//! rivers cross roads. Overlays only rely on the [`TileSource`] contract,
//! so other orders build too; they just look different.

mod road;
mod water;

pub use road::{RoadClass, RoadOverlay};
pub use water::WaterOverlay;

use crate::chunk::{ChunkCoord, TileGrid};
use crate::error::{GenerationError, GenerationResult};
use crate::material::MaterialCatalog;
use crate::source::TileSource;

/// A deterministic transform over a generated grid.
pub trait TileOverlay: Send + Sync {
    /// Short name used in stack descriptions.
    fn name(&self) -> String;

    /// Adds this overlay's materials to the catalog of the source below.
    fn extend_materials(&self, catalog: &mut MaterialCatalog);

    /// Rewrites `grid` (generated for `coord`) in place.
    ///
    /// `catalog` is the merged catalog of the whole stack up to this layer.
    fn apply(&self, grid: &mut TileGrid, coord: ChunkCoord, catalog: &MaterialCatalog);
}

/// A tile source wrapped by one overlay.
#[derive(Debug)]
pub struct Decorated<O, S> {
    inner: S,
    overlay: O,
    catalog: MaterialCatalog,
}

impl<O: TileOverlay, S: TileSource> Decorated<O, S> {
    /// Wraps `inner`. The merged catalog is computed once here.
    pub fn new(inner: S, overlay: O) -> Self {
        let mut catalog = inner.materials().clone();
        overlay.extend_materials(&mut catalog);
        Self {
            inner,
            overlay,
            catalog,
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The overlay at this layer.
    pub fn overlay(&self) -> &O {
        &self.overlay
    }
}

impl<O: TileOverlay, S: TileSource> TileSource for Decorated<O, S> {
    fn tile_data(&self, coord: ChunkCoord, size: usize) -> GenerationResult<TileGrid> {
        let mut grid = self.inner.tile_data(coord, size)?;
        if grid.size() != size {
            return Err(GenerationError::GridMismatch {
                source_name: self.inner.name(),
                expected: size * size,
                actual: grid.len(),
            });
        }
        self.overlay.apply(&mut grid, coord, &self.catalog);
        Ok(grid)
    }

    fn materials(&self) -> &MaterialCatalog {
        &self.catalog
    }

    fn name(&self) -> String {
        format!("{} -> {}", self.overlay.name(), self.inner.name())
    }
}

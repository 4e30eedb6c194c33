//! # View/Unload Driver
//!
//! Keeps the cache populated around a moving observer.
//!
//! - The observer's chunk is recomputed every update; nothing else happens
//!   until it changes.
//! - On a change, every in-bounds chunk within `view_radius` (Chebyshev) is
//!   requested, nearest first, so the ground under the observer is queued
//!   before the horizon.
//! - Every tracked chunk farther than `unload_radius` is unloaded. The gap
//!   between the two radii keeps chunks near the edge from flickering in
//!   and out as the observer moves back and forth.

use std::sync::Arc;

use strata_procedural::ChunkCoord;

use crate::cache::{ChunkCache, RequestOutcome};
use crate::config::{StreamingConfig, WorldConfig};
use crate::error::CacheResult;

/// What one rescan did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewUpdate {
    /// Observer chunk the rescan was centered on.
    pub center: ChunkCoord,
    /// Newly queued chunks, nearest first.
    pub requested: Vec<ChunkCoord>,
    /// Chunks dropped for being too far away.
    pub unloaded: Vec<ChunkCoord>,
}

/// Drives a [`ChunkCache`] from observer positions.
#[derive(Debug)]
pub struct ChunkStreamer {
    cache: Arc<ChunkCache>,
    config: StreamingConfig,
    center: Option<ChunkCoord>,
}

impl ChunkStreamer {
    /// Creates a streamer over an existing cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`](crate::CacheError::Config) if the radii
    /// are inconsistent.
    pub fn new(cache: Arc<ChunkCache>, config: StreamingConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self {
            cache,
            config,
            center: None,
        })
    }

    /// Builds generator, cache and streamer from a world config.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error, or
    /// [`CacheError::WorkerSpawn`](crate::CacheError::WorkerSpawn).
    pub fn from_config(config: &WorldConfig) -> CacheResult<Self> {
        let generator = config.build_generator()?;
        let cache = ChunkCache::new(generator, config.streaming.cache_config())?;
        Self::new(Arc::new(cache), config.streaming.clone())
    }

    /// The cache being driven.
    #[must_use]
    pub fn cache(&self) -> &Arc<ChunkCache> {
        &self.cache
    }

    /// Streaming policy.
    #[must_use]
    pub const fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Chunk of the last observed position.
    #[must_use]
    pub const fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    /// Feeds an observer position. Rescans only when the observer's chunk
    /// changed; returns what the rescan did.
    pub fn update(&mut self, observer_x: f32, observer_z: f32) -> Option<ViewUpdate> {
        let center = ChunkCoord::from_world_pos(observer_x, observer_z, self.cache.chunk_size());
        if self.center == Some(center) {
            return None;
        }

        tracing::debug!(from = ?self.center, to = %center, "observer entered new chunk");
        self.center = Some(center);
        Some(self.update_visible_chunks(center))
    }

    /// Requests everything in view of `center` and unloads what is too far.
    pub fn update_visible_chunks(&mut self, center: ChunkCoord) -> ViewUpdate {
        let mut update = ViewUpdate {
            center,
            ..ViewUpdate::default()
        };

        for coord in self.visible_chunks(center) {
            match self.cache.request_load(coord) {
                Ok(RequestOutcome::Queued) => update.requested.push(coord),
                Ok(_) => {}
                Err(error) => {
                    tracing::debug!(%error, "streaming stopped");
                    break;
                }
            }
        }

        for coord in self.cache.tracked_coords() {
            let too_far = center.chebyshev_distance(coord) > self.config.unload_radius;
            if too_far && self.cache.unload(coord) {
                update.unloaded.push(coord);
            }
        }
        update.unloaded.sort_unstable();

        tracing::debug!(
            %center,
            requested = update.requested.len(),
            unloaded = update.unloaded.len(),
            loaded = self.cache.loaded_count(),
            pending = self.cache.pending_count(),
            "view updated"
        );
        update
    }

    /// In-bounds chunks within `view_radius` of `center`, nearest first.
    #[must_use]
    pub fn visible_chunks(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let radius = i32::try_from(self.config.view_radius).unwrap_or(i32::MAX);
        let mut chunks = Vec::new();

        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let coord = center.offset(dx, dz);
                if self.in_bounds(coord) {
                    chunks.push(coord);
                }
            }
        }

        chunks.sort_by_key(|coord| {
            let dx = i64::from(coord.x) - i64::from(center.x);
            let dz = i64::from(coord.z) - i64::from(center.z);
            (center.chebyshev_distance(*coord), dx * dx + dz * dz, *coord)
        });
        chunks
    }

    fn in_bounds(&self, coord: ChunkCoord) -> bool {
        match self.config.bounds {
            Some(bounds) => bounds.contains(coord),
            None => true,
        }
    }

    /// Interpolated ground height under a world position, if its chunk is loaded.
    #[must_use]
    pub fn ground_height(&self, world_x: f32, world_z: f32) -> Option<f32> {
        let coord = ChunkCoord::from_world_pos(world_x, world_z, self.cache.chunk_size());
        self.cache.get_loaded(coord)?.ground_height(world_x, world_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkBounds;

    fn streamer(view: u32, unload: u32, bounds: Option<ChunkBounds>) -> ChunkStreamer {
        let mut world = WorldConfig::default();
        world.streaming.chunk_size = 9;
        world.streaming.view_radius = view;
        world.streaming.unload_radius = unload;
        world.streaming.bounds = bounds;
        ChunkStreamer::from_config(&world).unwrap()
    }

    #[test]
    fn test_nearest_first() {
        let streamer = streamer(2, 3, None);
        let chunks = streamer.visible_chunks(ChunkCoord::new(10, -4));

        assert_eq!(chunks.len(), 25);
        assert_eq!(chunks[0], ChunkCoord::new(10, -4));
        assert!(chunks[1..9].iter().all(|c| c.chebyshev_distance(ChunkCoord::new(10, -4)) == 1));
    }

    #[test]
    fn test_bounds_clip_view() {
        let bounds = ChunkBounds::new(ChunkCoord::new(0, 0), ChunkCoord::new(3, 3));
        let streamer = streamer(2, 3, Some(bounds));
        let chunks = streamer.visible_chunks(ChunkCoord::new(0, 0));

        assert_eq!(chunks.len(), 9);
        assert!(chunks.iter().all(|c| bounds.contains(*c)));
    }

    #[test]
    fn test_update_only_on_chunk_change() {
        let mut streamer = streamer(1, 2, None);

        let first = streamer.update(1.0, 1.0).unwrap();
        assert_eq!(first.center, ChunkCoord::new(0, 0));
        assert_eq!(first.requested.len(), 9);

        // Same chunk: no rescan.
        assert!(streamer.update(7.5, 0.5).is_none());

        // Stride is 8 for 9-sample chunks.
        let second = streamer.update(8.0, 0.5).unwrap();
        assert_eq!(second.center, ChunkCoord::new(1, 0));
        assert_eq!(second.requested.len(), 3);
        assert!(second.unloaded.is_empty());
    }

    #[test]
    fn test_inverted_radii_rejected() {
        let mut world = WorldConfig::default();
        world.streaming.view_radius = 4;
        world.streaming.unload_radius = 2;
        assert!(ChunkStreamer::from_config(&world).is_err());
    }
}

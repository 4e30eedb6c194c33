//! # Chunk Streaming Cache
//!
//! Owns the lifecycle of every chunk coordinate:
//!
//! ```text
//!            request_load              worker publishes
//!  Absent ───────────────▶ Loading ───────────────────▶ Loaded
//!    ▲                        │                            │
//!    └────── unload / failure ┴────────── unload ──────────┘
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ (coord, epoch) ┌──────────────┐  Arc<LoadedChunk>  ┌──────────────┐
//! │   Callers    │ ─────────────▶ │   Worker     │ ─────────────────▶ │  Slot Map    │
//! │ request_load │   unbounded    │ (1 thread)   │    write lock      │  (RwLock)    │
//! └──────────────┘    FIFO        └──────────────┘                    └──────────────┘
//!        ▲                                                                   │
//!        └──────────────────── get_loaded / state (read lock) ◀──────────────┘
//! ```
//!
//! Every queued job carries the epoch stamped on its `Loading` slot. The
//! worker skips jobs whose slot no longer carries that epoch and drops
//! results for coordinates that were unloaded while generating, so an
//! unload is never undone by a late result.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use strata_procedural::{ChunkCoord, GenerationError, GenerationResult, MaterialCatalog};

use crate::chunk::LoadedChunk;
use crate::error::{CacheError, CacheResult};
use crate::generator::ChunkGenerator;

/// Name of the background generation thread.
pub const WORKER_THREAD_NAME: &str = "strata-chunk-loader";

/// Lifecycle state of one coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Nothing queued or stored.
    Absent,
    /// Queued or generating.
    Loading,
    /// Generated and stored.
    Loaded,
}

/// What `request_load` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    /// A new job was queued.
    Queued,
    /// A job for this coordinate is already queued or running.
    AlreadyLoading,
    /// The chunk is already stored.
    AlreadyLoaded,
}

/// Cache configuration.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// How long `shutdown` waits for the worker before abandoning it.
    pub shutdown_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

/// Snapshot of worker statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Chunks generated and published.
    pub generated: u64,
    /// Chunks whose generation failed or panicked.
    pub failed: u64,
    /// Results dropped because the chunk was unloaded meanwhile.
    pub discarded: u64,
    /// Total time spent generating.
    pub generation_time: Duration,
}

#[derive(Debug, Default)]
struct WorkerCounters {
    generated: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
    generation_ns: AtomicU64,
}

#[derive(Debug)]
enum Slot {
    Loading { epoch: u64 },
    Loaded(Arc<LoadedChunk>),
}

/// Slot map plus per-state counts, kept consistent under one lock.
#[derive(Debug, Default)]
struct SlotMap {
    slots: HashMap<ChunkCoord, Slot>,
    loading: usize,
    loaded: usize,
}

impl SlotMap {
    fn insert_loading(&mut self, coord: ChunkCoord, epoch: u64) {
        if let Some(old) = self.slots.insert(coord, Slot::Loading { epoch }) {
            self.forget(&old);
        }
        self.loading += 1;
    }

    fn publish(&mut self, coord: ChunkCoord, chunk: Arc<LoadedChunk>) {
        if let Some(old) = self.slots.insert(coord, Slot::Loaded(chunk)) {
            self.forget(&old);
        }
        self.loaded += 1;
    }

    fn remove(&mut self, coord: ChunkCoord) -> bool {
        match self.slots.remove(&coord) {
            Some(old) => {
                self.forget(&old);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.loading = 0;
        self.loaded = 0;
    }

    fn forget(&mut self, slot: &Slot) {
        match slot {
            Slot::Loading { .. } => self.loading -= 1,
            Slot::Loaded(_) => self.loaded -= 1,
        }
    }

    fn is_current(&self, coord: ChunkCoord, epoch: u64) -> bool {
        matches!(self.slots.get(&coord), Some(Slot::Loading { epoch: e }) if *e == epoch)
    }
}

/// State shared between callers and the worker.
#[derive(Debug, Default)]
struct Shared {
    map: RwLock<SlotMap>,
    closed: AtomicBool,
    counters: WorkerCounters,
}

/// One queued generation job.
#[derive(Clone, Copy, Debug)]
struct Job {
    coord: ChunkCoord,
    epoch: u64,
}

/// Thread-safe chunk store with one background generation worker.
///
/// All methods take `&self` and never wait on generation.
///
/// # Example
///
/// ```rust,no_run
/// use strata_procedural::prelude::*;
/// use strata_streaming::{CacheConfig, ChunkCache, ChunkGenerator, RequestOutcome};
///
/// let seed = WorldSeed::new(12345);
/// let generator = ChunkGenerator::new(
///     ProceduralTileSource::new(seed, &TerrainConfig::default())?,
///     ProceduralSpriteSource::new(seed, SpriteConfig::default())?,
///     65,
/// )?;
/// let cache = ChunkCache::new(generator, CacheConfig::default())?;
///
/// let coord = ChunkCoord::new(0, 0);
/// assert_eq!(cache.request_load(coord)?, RequestOutcome::Queued);
/// // ... later, once per frame:
/// if let Some(chunk) = cache.get_loaded(coord) {
///     println!("{} sprites", chunk.sprites().len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ChunkCache {
    shared: Arc<Shared>,
    generator: Arc<ChunkGenerator>,
    jobs: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_done: Receiver<()>,
    next_epoch: AtomicU64,
    config: CacheConfig,
}

impl std::fmt::Debug for ChunkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkCache")
            .field("generator", &self.generator)
            .field("pending", &self.pending_count())
            .field("loaded", &self.loaded_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl ChunkCache {
    /// Creates the cache and starts its worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::WorkerSpawn`] if the thread cannot be started.
    pub fn new(generator: ChunkGenerator, config: CacheConfig) -> CacheResult<Self> {
        let shared = Arc::new(Shared::default());
        let generator = Arc::new(generator);
        let (job_tx, job_rx) = unbounded();
        let (done_tx, done_rx) = bounded(1);

        let worker_shared = Arc::clone(&shared);
        let worker_generator = Arc::clone(&generator);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || {
                Self::worker_loop(&worker_shared, &worker_generator, &job_rx);
                // Receiver sees either this or the disconnect if the loop unwound.
                let _ = done_tx.send(());
            })
            .map_err(|e| CacheError::WorkerSpawn(e.to_string()))?;

        tracing::info!(
            chunk_size = generator.chunk_size(),
            source = %generator.tile_source_name(),
            "chunk cache started"
        );

        Ok(Self {
            shared,
            generator,
            jobs: Mutex::new(Some(job_tx)),
            worker: Mutex::new(Some(worker)),
            worker_done: done_rx,
            next_epoch: AtomicU64::new(1),
            config,
        })
    }

    fn worker_loop(shared: &Shared, generator: &ChunkGenerator, jobs: &Receiver<Job>) {
        tracing::debug!("chunk loader running");

        for job in jobs {
            if shared.closed.load(Ordering::Acquire) {
                break;
            }
            if !shared.map.read().is_current(job.coord, job.epoch) {
                tracing::debug!(coord = %job.coord, "skipping job for unloaded chunk");
                continue;
            }

            let start = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(|| generator.generate(job.coord)))
                .unwrap_or_else(|payload| {
                    Err(GenerationError::Panicked(panic_message(payload.as_ref())))
                });
            let elapsed = start.elapsed();

            Self::publish(shared, job, result, elapsed);
        }

        tracing::debug!("chunk loader stopped");
    }

    fn publish(
        shared: &Shared,
        job: Job,
        result: GenerationResult<LoadedChunk>,
        elapsed: Duration,
    ) {
        let counters = &shared.counters;
        counters
            .generation_ns
            .fetch_add(elapsed.as_nanos().min(u128::from(u64::MAX)) as u64, Ordering::Relaxed);

        let mut map = shared.map.write();
        let current = map.is_current(job.coord, job.epoch);

        match result {
            Ok(chunk) if current => {
                map.publish(job.coord, Arc::new(chunk));
                counters.generated.fetch_add(1, Ordering::Relaxed);
            }
            Ok(_) => {
                counters.discarded.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    coord = %job.coord,
                    "dropping result for chunk unloaded while loading"
                );
            }
            Err(error) => {
                if current {
                    map.remove(job.coord);
                }
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(coord = %job.coord, %error, "chunk generation failed");
            }
        }
    }

    /// Requests a chunk. Never blocks on generation.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Closed`] after [`ChunkCache::shutdown`].
    pub fn request_load(&self, coord: ChunkCoord) -> CacheResult<RequestOutcome> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }

        let mut map = self.shared.map.write();
        // Shutdown may have cleared the map between the check above and the lock.
        if self.is_closed() {
            return Err(CacheError::Closed);
        }
        match map.slots.get(&coord) {
            Some(Slot::Loading { .. }) => return Ok(RequestOutcome::AlreadyLoading),
            Some(Slot::Loaded(_)) => return Ok(RequestOutcome::AlreadyLoaded),
            None => {}
        }

        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let jobs = self.jobs.lock();
        let sent = jobs
            .as_ref()
            .is_some_and(|sender| sender.send(Job { coord, epoch }).is_ok());
        if !sent {
            return Err(CacheError::Closed);
        }
        // The worker needs the read lock to check the epoch, so it cannot
        // see this job before the slot exists.
        map.insert_loading(coord, epoch);

        Ok(RequestOutcome::Queued)
    }

    /// The stored chunk, if generation has finished.
    #[must_use]
    pub fn get_loaded(&self, coord: ChunkCoord) -> Option<Arc<LoadedChunk>> {
        match self.shared.map.read().slots.get(&coord) {
            Some(Slot::Loaded(chunk)) => Some(Arc::clone(chunk)),
            _ => None,
        }
    }

    /// Lifecycle state of a coordinate.
    #[must_use]
    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        match self.shared.map.read().slots.get(&coord) {
            None => ChunkState::Absent,
            Some(Slot::Loading { .. }) => ChunkState::Loading,
            Some(Slot::Loaded(_)) => ChunkState::Loaded,
        }
    }

    /// Forgets a chunk, loaded or loading. A loading chunk's result will be
    /// dropped when it arrives.
    ///
    /// Returns true if the coordinate was tracked.
    pub fn unload(&self, coord: ChunkCoord) -> bool {
        if self.is_closed() {
            return false;
        }
        self.shared.map.write().remove(coord)
    }

    /// Coordinates queued or generating.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.map.read().loading
    }

    /// Coordinates with a stored chunk.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.shared.map.read().loaded
    }

    /// Every coordinate that is loading or loaded.
    #[must_use]
    pub fn tracked_coords(&self) -> Vec<ChunkCoord> {
        self.shared.map.read().slots.keys().copied().collect()
    }

    /// Worker statistics so far.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let counters = &self.shared.counters;
        CacheStats {
            generated: counters.generated.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
            generation_time: Duration::from_nanos(counters.generation_ns.load(Ordering::Relaxed)),
        }
    }

    /// Samples per chunk side.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.generator.chunk_size()
    }

    /// Material catalog of the generation stack.
    #[must_use]
    pub fn materials(&self) -> &MaterialCatalog {
        self.generator.materials()
    }

    /// Returns true once [`ChunkCache::shutdown`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Stops the cache: no new jobs, queued jobs are cancelled, stored chunks
    /// are released. Waits at most `shutdown_timeout` for the worker to
    /// finish its current chunk, then abandons it.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shared.map.write().clear();
        // Dropping the sender ends the worker's job loop.
        drop(self.jobs.lock().take());

        let Some(handle) = self.worker.lock().take() else {
            return;
        };

        match self.worker_done.recv_timeout(self.config.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    tracing::warn!("chunk loader exited abnormally");
                }
                tracing::info!("chunk cache shut down");
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                    "chunk loader did not stop in time; abandoning it"
                );
            }
        }
    }
}

impl Drop for ChunkCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use strata_procedural::prelude::*;
    use strata_procedural::{MaterialCatalog, TileGrid};

    /// Tile source that can be made to fail or stall.
    struct ScriptedSource {
        inner: ProceduralTileSource,
        fail_x: Option<i32>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                inner: ProceduralTileSource::new(WorldSeed::new(1), &TerrainConfig::default())
                    .unwrap(),
                fail_x: None,
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl TileSource for ScriptedSource {
        fn tile_data(&self, coord: ChunkCoord, size: usize) -> GenerationResult<TileGrid> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if self.fail_x == Some(coord.x) {
                panic!("scripted failure at {coord}");
            }
            self.inner.tile_data(coord, size)
        }

        fn materials(&self) -> &MaterialCatalog {
            self.inner.materials()
        }

        fn name(&self) -> String {
            "ScriptedSource".to_owned()
        }
    }

    fn cache_with(source: ScriptedSource, timeout: Duration) -> ChunkCache {
        let sprites =
            ProceduralSpriteSource::new(WorldSeed::new(1), SpriteConfig::default()).unwrap();
        let generator = ChunkGenerator::new(source, sprites, 9).unwrap();
        let config = CacheConfig {
            shutdown_timeout: timeout,
        };
        ChunkCache::new(generator, config).unwrap()
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn test_request_is_deduplicated() {
        let mut source = ScriptedSource::new();
        source.delay = Duration::from_millis(50);
        let cache = cache_with(source, Duration::from_secs(2));
        let coord = ChunkCoord::new(0, 0);

        assert_eq!(cache.request_load(coord), Ok(RequestOutcome::Queued));
        assert_eq!(cache.state(coord), ChunkState::Loading);
        assert_eq!(cache.request_load(coord), Ok(RequestOutcome::AlreadyLoading));
        assert_eq!(cache.pending_count(), 1);

        assert!(wait_until(Duration::from_secs(5), || cache.get_loaded(coord).is_some()));
        assert_eq!(cache.request_load(coord), Ok(RequestOutcome::AlreadyLoaded));
        assert_eq!(cache.pending_count(), 0);
        assert_eq!(cache.loaded_count(), 1);
    }

    #[test]
    fn test_panic_is_contained() {
        let mut source = ScriptedSource::new();
        source.fail_x = Some(7);
        let cache = cache_with(source, Duration::from_secs(2));

        cache.request_load(ChunkCoord::new(7, 0)).unwrap();
        cache.request_load(ChunkCoord::new(1, 0)).unwrap();

        assert!(wait_until(Duration::from_secs(5), || {
            cache.get_loaded(ChunkCoord::new(1, 0)).is_some()
        }));
        assert_eq!(cache.state(ChunkCoord::new(7, 0)), ChunkState::Absent);
        assert_eq!(cache.stats().failed, 1);
        assert_eq!(cache.stats().generated, 1);

        // A failed coordinate can be requested again.
        assert_eq!(cache.request_load(ChunkCoord::new(7, 0)), Ok(RequestOutcome::Queued));
    }

    #[test]
    fn test_unload_while_loading_drops_result() {
        let mut source = ScriptedSource::new();
        source.delay = Duration::from_millis(100);
        let calls = Arc::clone(&source.calls);
        let cache = cache_with(source, Duration::from_secs(2));
        let coord = ChunkCoord::new(3, 3);

        cache.request_load(coord).unwrap();
        assert!(wait_until(Duration::from_secs(5), || calls.load(Ordering::SeqCst) == 1));
        assert!(cache.unload(coord));
        assert_eq!(cache.state(coord), ChunkState::Absent);

        assert!(wait_until(Duration::from_secs(5), || cache.stats().discarded == 1));
        assert_eq!(cache.state(coord), ChunkState::Absent);
        assert_eq!(cache.loaded_count(), 0);
    }

    #[test]
    fn test_queued_job_for_unloaded_chunk_is_skipped() {
        let mut source = ScriptedSource::new();
        source.delay = Duration::from_millis(80);
        let calls = Arc::clone(&source.calls);
        let cache = cache_with(source, Duration::from_secs(2));

        cache.request_load(ChunkCoord::new(0, 0)).unwrap();
        cache.request_load(ChunkCoord::new(1, 0)).unwrap();
        // (1, 0) is still queued behind (0, 0).
        assert!(cache.unload(ChunkCoord::new(1, 0)));

        assert!(wait_until(Duration::from_secs(5), || cache.loaded_count() == 1));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state(ChunkCoord::new(1, 0)), ChunkState::Absent);
    }

    #[test]
    fn test_shutdown_is_idempotent_and_closes() {
        let cache = cache_with(ScriptedSource::new(), Duration::from_secs(2));
        cache.request_load(ChunkCoord::new(0, 0)).unwrap();

        cache.shutdown();
        cache.shutdown();

        assert!(cache.is_closed());
        assert_eq!(cache.request_load(ChunkCoord::new(1, 1)), Err(CacheError::Closed));
        assert!(!cache.unload(ChunkCoord::new(0, 0)));
        assert_eq!(cache.pending_count(), 0);
        assert_eq!(cache.loaded_count(), 0);
        assert!(cache.get_loaded(ChunkCoord::new(0, 0)).is_none());
    }

    #[test]
    fn test_requests_racing_shutdown_leave_nothing_tracked() {
        for round in 0..50u32 {
            let cache = Arc::new(cache_with(ScriptedSource::new(), Duration::from_secs(2)));

            let requesters: Vec<_> = (0..4)
                .map(|t| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        for i in 0..200 {
                            if cache.request_load(ChunkCoord::new(t, i)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            thread::sleep(Duration::from_micros(50 * u64::from(round % 5)));
            cache.shutdown();
            for requester in requesters {
                requester.join().unwrap();
            }

            assert_eq!(cache.pending_count(), 0, "round {round}");
            assert_eq!(cache.loaded_count(), 0, "round {round}");
            assert!(cache.tracked_coords().is_empty(), "round {round}");
        }
    }

    #[test]
    fn test_shutdown_abandons_slow_worker() {
        let mut source = ScriptedSource::new();
        source.delay = Duration::from_millis(500);
        let calls = Arc::clone(&source.calls);
        let cache = cache_with(source, Duration::from_millis(50));

        cache.request_load(ChunkCoord::new(0, 0)).unwrap();
        assert!(wait_until(Duration::from_secs(5), || calls.load(Ordering::SeqCst) == 1));

        let start = Instant::now();
        cache.shutdown();
        let waited = start.elapsed();
        println!("shutdown returned after {waited:?}");
        assert!(waited < Duration::from_millis(400));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload = panic::catch_unwind(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 1");
        let payload = panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
    }
}

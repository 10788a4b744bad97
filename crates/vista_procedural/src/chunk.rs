//! # Chunk Cache
//!
//! The world is split into square chunks of `S x S` tiles. A chunk is
//! generated the first time any of its tiles is read and is kept for the
//! rest of the session.
//!
//! ## Concurrency
//!
//! Generation follows claim / generate / publish:
//!
//! 1. The per-chunk slot is claimed under a short map write lock.
//! 2. The chunk is generated outside the map lock, inside the slot's
//!    once-cell. Callers racing on the same chunk block on the cell.
//! 3. The finished chunk is published by the cell. Readers never see a
//!    partially filled chunk.
//!
//! A chunk is generated at most once no matter how many threads ask.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::classifier::TerrainClassifier;
use crate::config::{TerrainConfig, MAX_CHUNK_SIZE};
use crate::tile::Tile;

/// Produces the tile at a world position.
///
/// Chunk generation calls this once per tile.
pub trait TileSource: Send + Sync {
    /// Returns the fully lit tile at `(x, y)`.
    fn tile(&self, x: f64, y: f64) -> Tile;
}

impl TileSource for TerrainClassifier {
    #[inline]
    fn tile(&self, x: f64, y: f64) -> Tile {
        self.classify(x, y, true)
    }
}

/// Read access to the tile map, as the renderer sees it.
pub trait TileSampler: Send + Sync {
    /// Returns the tile covering `(x, y)`.
    fn sample(&self, x: f64, y: f64) -> Tile;
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: i32,
    /// Y coordinate (in chunks, not tiles).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the chunk containing world position `(x, y)`.
    ///
    /// Positions are floored first, so `-0.5` lands in chunk `-1`.
    #[inline]
    #[must_use]
    pub fn from_world(x: f64, y: f64, chunk_size: u32) -> Self {
        let size = chunk_size as i32;
        Self {
            x: (x.floor() as i32).div_euclid(size),
            y: (y.floor() as i32).div_euclid(size),
        }
    }

    /// World X of the chunk's origin corner.
    #[inline]
    #[must_use]
    pub const fn world_x(self, chunk_size: u32) -> i32 {
        self.x * chunk_size as i32
    }

    /// World Y of the chunk's origin corner.
    #[inline]
    #[must_use]
    pub const fn world_y(self, chunk_size: u32) -> i32 {
        self.y * chunk_size as i32
    }
}

/// Local offset of a world position inside its chunk.
#[inline]
#[must_use]
pub fn tile_offset(x: f64, y: f64, chunk_size: u32) -> (usize, usize) {
    let size = chunk_size as i32;
    (
        (x.floor() as i32).rem_euclid(size) as usize,
        (y.floor() as i32).rem_euclid(size) as usize,
    )
}

/// A fully generated chunk.
pub struct Chunk {
    /// Chunk position in the world.
    pub coord: ChunkCoord,
    size: usize,
    /// Indexed as `offset_x * size + offset_y`.
    tiles: Box<[Tile]>,
    /// Set once every tile has been written.
    initialized: bool,
}

impl Chunk {
    /// Generates every tile of a chunk from a source.
    ///
    /// `chunk_size` is clamped to `1..=MAX_CHUNK_SIZE`.
    #[must_use]
    pub fn generate<S: TileSource + ?Sized>(coord: ChunkCoord, chunk_size: u32, source: &S) -> Self {
        let chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        let size = chunk_size as usize;
        let origin_x = f64::from(coord.world_x(chunk_size));
        let origin_y = f64::from(coord.world_y(chunk_size));

        let mut tiles = vec![Tile::EMPTY; size * size].into_boxed_slice();
        for dx in 0..size {
            for dy in 0..size {
                tiles[dx * size + dy] = source.tile(origin_x + dx as f64, origin_y + dy as f64);
            }
        }

        Self {
            coord,
            size,
            tiles,
            initialized: true,
        }
    }

    /// True once generation has written every tile.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Edge length in tiles.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the tile at a local offset.
    ///
    /// # Panics
    ///
    /// Panics if either offset is outside `0..size`.
    #[inline]
    #[must_use]
    pub fn tile(&self, offset_x: usize, offset_y: usize) -> &Tile {
        assert!(offset_x < self.size && offset_y < self.size);
        &self.tiles[offset_x * self.size + offset_y]
    }

    /// All tiles in storage order.
    #[inline]
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}

/// Cache counters since creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Chunks generated.
    pub generated: u64,
    /// Lookups served by an already published chunk.
    pub hits: u64,
    /// Lookups that had to generate or wait for generation.
    pub misses: u64,
}

type Slot = Arc<OnceLock<Arc<Chunk>>>;

/// Lazy, memoizing, thread-safe chunk store.
pub struct ChunkCache<S: TileSource = TerrainClassifier> {
    source: S,
    chunk_size: u32,
    slots: RwLock<HashMap<ChunkCoord, Slot>>,
    generated: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ChunkCache<TerrainClassifier> {
    /// Creates a cache backed by the terrain classifier.
    #[must_use]
    pub fn new(config: &TerrainConfig) -> Self {
        Self::with_source(TerrainClassifier::new(config), config.chunk_size)
    }
}

impl<S: TileSource> ChunkCache<S> {
    /// Creates a cache over any tile source.
    ///
    /// `chunk_size` is clamped to `1..=MAX_CHUNK_SIZE`.
    #[must_use]
    pub fn with_source(source: S, chunk_size: u32) -> Self {
        Self {
            source,
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
            slots: RwLock::new(HashMap::new()),
            generated: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Edge length of every chunk, in tiles.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// The underlying tile source.
    #[inline]
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the tile covering `(x, y)`, generating its chunk if needed.
    #[must_use]
    pub fn get(&self, x: f64, y: f64) -> Tile {
        let chunk = self.chunk(ChunkCoord::from_world(x, y, self.chunk_size));
        let (offset_x, offset_y) = tile_offset(x, y, self.chunk_size);
        *chunk.tile(offset_x, offset_y)
    }

    /// Returns a chunk, generating it on first access.
    pub fn chunk(&self, coord: ChunkCoord) -> Arc<Chunk> {
        let slot = self.claim(coord);

        if let Some(chunk) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(chunk);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let chunk = slot.get_or_init(|| {
            let chunk = Chunk::generate(coord, self.chunk_size, &self.source);
            self.generated.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Generated chunk ({}, {})", coord.x, coord.y);
            Arc::new(chunk)
        });
        Arc::clone(chunk)
    }

    /// Returns true if the chunk has been generated and published.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.slots
            .read()
            .get(&coord)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of published chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    /// Returns true if no chunk has been published yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            generated: self.generated.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn claim(&self, coord: ChunkCoord) -> Slot {
        if let Some(slot) = self.slots.read().get(&coord) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().entry(coord).or_default())
    }
}

impl<S: TileSource> TileSampler for ChunkCache<S> {
    #[inline]
    fn sample(&self, x: f64, y: f64) -> Tile {
        self.get(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Behavior, Biome, TileType};

    struct Checker;

    impl TileSource for Checker {
        fn tile(&self, x: f64, y: f64) -> Tile {
            Tile {
                biome: Biome::Normal,
                behavior: Behavior::Solid,
                tile_type: TileType::Grass,
                color: TileType::Grass.color(),
                height: x as i32 * 1000 + y as i32,
                light: 100.0,
            }
        }
    }

    #[test]
    fn test_coord_floors_negative_positions() {
        assert_eq!(ChunkCoord::from_world(0.0, 0.0, 64), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(63.9, 0.0, 64), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(64.0, 0.0, 64), ChunkCoord::new(1, 0));
        assert_eq!(ChunkCoord::from_world(-0.5, -1.0, 64), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_world(-64.0, -64.5, 64), ChunkCoord::new(-1, -2));
    }

    #[test]
    fn test_offset_is_never_negative() {
        assert_eq!(tile_offset(-1.0, -0.25, 64), (63, 63));
        assert_eq!(tile_offset(-64.0, 65.0, 64), (0, 1));
    }

    #[test]
    fn test_get_returns_source_tile() {
        let cache = ChunkCache::with_source(Checker, 8);
        for (x, y) in [(0.0, 0.0), (7.5, 3.2), (-1.0, -9.0), (100.0, -3.5)] {
            let expected = Checker.tile(f64::floor(x), f64::floor(y));
            assert_eq!(cache.get(x, y).height, expected.height, "at ({x}, {y})");
        }
    }

    #[test]
    fn test_chunk_generated_once() {
        let cache = ChunkCache::with_source(Checker, 4);
        let a = cache.chunk(ChunkCoord::new(2, -3));
        let b = cache.chunk(ChunkCoord::new(2, -3));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            cache.stats(),
            CacheStats {
                generated: 1,
                hits: 1,
                misses: 1,
            }
        );
    }

    #[test]
    fn test_contains_and_len() {
        let cache = ChunkCache::with_source(Checker, 4);
        assert!(cache.is_empty());
        assert!(!cache.contains(ChunkCoord::new(0, 0)));

        let _ = cache.get(1.0, 1.0);
        let _ = cache.get(-1.0, 1.0);

        assert!(cache.contains(ChunkCoord::new(0, 0)));
        assert!(cache.contains(ChunkCoord::new(-1, 0)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let cache = ChunkCache::with_source(Checker, 0);
        assert_eq!(cache.chunk_size(), 1);
        let _ = cache.get(3.0, 4.0);
        assert!(cache.contains(ChunkCoord::new(3, 4)));
    }

    #[test]
    fn test_shift_by_whole_chunks_keeps_offset() {
        for size in [4_u32, 64] {
            let s = f64::from(size);
            for (x, y) in [(-1.0, -1.0), (-0.5, -63.2), (-65.0, -130.5), (-3.0, 7.0)] {
                for k in [1_i32, 2, 3] {
                    let (sx, sy) = (x - f64::from(k) * s, y - f64::from(k) * s);
                    assert_eq!(tile_offset(x, y, size), tile_offset(sx, sy, size));

                    let base = ChunkCoord::from_world(x, y, size);
                    let shifted = ChunkCoord::from_world(sx, sy, size);
                    assert_eq!(shifted, ChunkCoord::new(base.x - k, base.y - k));
                }
            }
        }
    }

    #[test]
    fn test_generated_chunk_is_initialized() {
        let chunk = Chunk::generate(ChunkCoord::new(-1, 2), 4, &Checker);
        assert!(chunk.is_initialized());
        assert_eq!(chunk.tiles().len(), 16);
        assert_eq!(chunk.tile(3, 0).height, -1000 + 8);
    }

    #[test]
    fn test_oversized_chunk_size_is_clamped() {
        let cache = ChunkCache::with_source(Checker, u32::MAX);
        assert_eq!(cache.chunk_size(), MAX_CHUNK_SIZE);
    }
}

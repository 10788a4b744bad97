//! # VISTA Procedural Terrain
//!
//! Deterministic, infinite terrain for the voxel-space renderer.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Chunked**: Tiles are generated in square chunks on first access
//! 3. **Memoized**: A chunk is generated at most once and never evicted
//! 4. **Shareable**: The cache is read concurrently by every render worker
//!
//! ## Core Components
//!
//! - `NoiseField`: Seeded 2D simplex noise with octaves
//! - `TerrainClassifier`: Climate to tile decision tree with sun shadows
//! - `ChunkCache`: Lazy, thread-safe tile storage
//! - `ChunkPrefetcher`: Background generation around the camera
//!
//! ## Example
//!
//! ```rust
//! use vista_procedural::{ChunkCache, TerrainConfig};
//!
//! let cache = ChunkCache::new(&TerrainConfig::with_seed(1000));
//! let tile = cache.get(12.5, -40.0);
//! assert!(tile.light <= 100.0);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod classifier;
pub mod config;
pub mod error;
pub mod noise;
pub mod prefetch;
pub mod tile;

pub use chunk::{Chunk, ChunkCache, ChunkCoord, CacheStats, TileSampler, TileSource};
pub use classifier::{Classification, ClimateSample, TerrainClassifier};
pub use config::{TerrainConfig, MAX_CHUNK_SIZE};
pub use error::ConfigInvalid;
pub use noise::{NoiseField, NoiseSet, WorldSeed};
pub use prefetch::{ChunkPrefetcher, MAX_PREFETCH_RADIUS};
pub use tile::{color_of, rgba, unpack, Behavior, Biome, Tile, TileType};

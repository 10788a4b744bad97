//! Background chunk generation around the camera.
//!
//! The render loop posts the camera position every frame. A single worker
//! thread fills the ring of chunks around the newest position, nearest
//! first, so render workers mostly hit published chunks.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::chunk::{ChunkCache, ChunkCoord, TileSource};

/// Largest accepted prefetch radius in chunks.
pub const MAX_PREFETCH_RADIUS: u32 = 64;

/// Chunks within `radius` of `center` (Chebyshev), nearest first.
///
/// `radius` is clamped to [`MAX_PREFETCH_RADIUS`].
#[must_use]
pub fn ring_around(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let radius = radius.min(MAX_PREFETCH_RADIUS);
    let side = 2 * radius as usize + 1;
    let r = radius as i32;

    let mut coords = Vec::with_capacity(side * side);
    for dx in -r..=r {
        for dy in -r..=r {
            coords.push(ChunkCoord::new(
                center.x.saturating_add(dx),
                center.y.saturating_add(dy),
            ));
        }
    }
    coords.sort_by_key(|c| {
        let dx = i64::from(c.x) - i64::from(center.x);
        let dy = i64::from(c.y) - i64::from(center.y);
        dx * dx + dy * dy
    });
    coords
}

/// Handle to the prefetch thread.
///
/// Dropping the handle stops and joins the thread.
pub struct ChunkPrefetcher {
    hints: Option<Sender<(f64, f64)>>,
    stale: Receiver<(f64, f64)>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ChunkPrefetcher {
    /// Starts the prefetch thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn<S>(cache: Arc<ChunkCache<S>>, radius: u32) -> io::Result<Self>
    where
        S: TileSource + 'static,
    {
        let (tx, rx) = bounded(1);
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let rx = rx.clone();
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("vista-prefetch".into())
                .spawn(move || prefetch_loop(&cache, radius, &rx, &stop))?
        };

        tracing::debug!("Chunk prefetcher started (radius {})", radius);

        Ok(Self {
            hints: Some(tx),
            stale: rx,
            stop,
            handle: Some(handle),
        })
    }

    /// Posts the newest camera position, replacing any unread one.
    pub fn update(&self, x: f64, y: f64) {
        let Some(tx) = &self.hints else {
            return;
        };
        if let Err(TrySendError::Full(position)) = tx.try_send((x, y)) {
            let _ = self.stale.try_recv();
            let _ = tx.try_send(position);
        }
    }

    /// Stops the thread and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.hints = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Chunk prefetcher panicked");
            }
        }
    }
}

impl Drop for ChunkPrefetcher {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn prefetch_loop<S: TileSource>(
    cache: &ChunkCache<S>,
    radius: u32,
    hints: &Receiver<(f64, f64)>,
    stop: &AtomicBool,
) {
    while let Ok(mut position) = hints.recv() {
        while let Ok(newer) = hints.try_recv() {
            position = newer;
        }

        let center = ChunkCoord::from_world(position.0, position.1, cache.chunk_size());
        let mut generated = 0usize;
        for coord in ring_around(center, radius) {
            if stop.load(Ordering::Acquire) {
                return;
            }
            if !hints.is_empty() {
                break;
            }
            if !cache.contains(coord) {
                let _ = cache.chunk(coord);
                generated += 1;
            }
        }

        if generated > 0 {
            tracing::trace!(
                "Prefetched {} chunks around ({}, {})",
                generated,
                center.x,
                center.y
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Behavior, Biome, Tile, TileType};
    use std::time::{Duration, Instant};

    struct Flat;

    impl TileSource for Flat {
        fn tile(&self, _x: f64, _y: f64) -> Tile {
            Tile {
                biome: Biome::Normal,
                behavior: Behavior::Solid,
                tile_type: TileType::Dirt,
                color: TileType::Dirt.color(),
                height: 10,
                light: 100.0,
            }
        }
    }

    #[test]
    fn test_ring_is_nearest_first() {
        let center = ChunkCoord::new(3, -2);
        let ring = ring_around(center, 2);
        assert_eq!(ring.len(), 25);
        assert_eq!(ring[0], center);
        for pair in ring.windows(2) {
            let d = |c: &ChunkCoord| (c.x - center.x).pow(2) + (c.y - center.y).pow(2);
            assert!(d(&pair[0]) <= d(&pair[1]));
        }
    }

    #[test]
    fn test_zero_radius_is_single_chunk() {
        assert_eq!(ring_around(ChunkCoord::new(0, 0), 0), vec![ChunkCoord::new(0, 0)]);
    }

    #[test]
    fn test_huge_radius_is_clamped() {
        let ring = ring_around(ChunkCoord::new(0, 0), 40_000);
        let side = 2 * MAX_PREFETCH_RADIUS as usize + 1;
        assert_eq!(ring.len(), side * side);

        let edge = ring_around(ChunkCoord::new(i32::MAX, i32::MIN), 1);
        assert_eq!(edge[0], ChunkCoord::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_prefetch_fills_ring() {
        let cache = Arc::new(ChunkCache::with_source(Flat, 4));
        let prefetcher = ChunkPrefetcher::spawn(Arc::clone(&cache), 1).unwrap();
        prefetcher.update(10.0, -3.0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while cache.len() < 9 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        prefetcher.shutdown();

        for coord in ring_around(ChunkCoord::new(2, -1), 1) {
            assert!(cache.contains(coord), "{coord:?} not prefetched");
        }
        assert_eq!(cache.stats().generated, 9);
    }

    #[test]
    fn test_drop_joins_idle_thread() {
        let cache = Arc::new(ChunkCache::with_source(Flat, 4));
        let prefetcher = ChunkPrefetcher::spawn(cache, 1).unwrap();
        drop(prefetcher);
    }
}

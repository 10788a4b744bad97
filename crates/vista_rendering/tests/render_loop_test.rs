//! # Render Loop Integration Test
//!
//! Drives the whole renderer over real terrain: worker splits, buffer
//! hand-off, camera motion, prefetching and telemetry.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use vista_core::TripleBuffer;
use vista_procedural::{ChunkCache, ChunkCoord, ChunkPrefetcher, TerrainConfig};
use vista_rendering::{
    Camera, CameraConfig, FramePipeline, Intent, MetricsSink, RenderConfig, RenderLoop,
    SampleLog, SharedIntent, SKY_COLOR,
};

const WIDTH: usize = 96;
const HEIGHT: usize = 64;

fn render_config(workers: usize) -> RenderConfig {
    RenderConfig {
        workers,
        width: WIDTH,
        height: HEIGHT,
        ..RenderConfig::default()
    }
}

fn camera_config() -> CameraConfig {
    // Low eye and high horizon so terrain lands inside a small surface
    CameraConfig {
        height: 60.0,
        horizon: 10.0,
        view_distance: 160.0,
        ..CameraConfig::default()
    }
}

fn render_once(cache: &Arc<ChunkCache>, workers: usize, camera: &Camera) -> Vec<u32> {
    let frames = TripleBuffer::new(WIDTH, HEIGHT).unwrap();
    let mut consumer = frames.consumer().unwrap();
    let mut pipeline =
        FramePipeline::new(Arc::clone(cache), &frames, &render_config(workers)).unwrap();
    pipeline.begin_frame(camera).unwrap();
    let pixels = consumer.take_frame().to_vec();
    pixels
}

#[test]
fn test_worker_count_does_not_change_image() {
    let cache = Arc::new(ChunkCache::new(&TerrainConfig::with_seed(1000)));
    let camera = Camera::from_config(&camera_config());

    let single = render_once(&cache, 1, &camera);
    assert_eq!(single.len(), WIDTH * HEIGHT);
    for workers in [2, 3, 7] {
        assert_eq!(single, render_once(&cache, workers, &camera), "{workers} workers");
    }
}

#[test]
fn test_frame_shows_terrain_and_sky() {
    let cache = Arc::new(ChunkCache::new(&TerrainConfig::with_seed(1000)));
    let camera = Camera::from_config(&camera_config());
    let pixels = render_once(&cache, 2, &camera);

    assert!(pixels.iter().all(|p| p >> 24 == 0xff), "every pixel is opaque");
    assert!(pixels.iter().any(|&p| p != SKY_COLOR), "some terrain is visible");
}

#[test]
fn test_step_advances_camera_and_telemetry() {
    let cache = Arc::new(ChunkCache::new(&TerrainConfig::with_seed(3)));
    let frames = TripleBuffer::new(WIDTH, HEIGHT).unwrap();
    let pipeline = FramePipeline::new(Arc::clone(&cache), &frames, &render_config(2)).unwrap();

    let intent = Arc::new(SharedIntent::new());
    let log = Arc::new(SampleLog::new());
    let mut render_loop = RenderLoop::new(
        pipeline,
        &camera_config(),
        &render_config(2),
        Arc::clone(&intent),
        Arc::clone(&log) as Arc<dyn MetricsSink>,
    );

    let start = *render_loop.camera();
    intent.set(Intent {
        forward: true,
        ..Intent::default()
    });
    for n in 1..=4 {
        let report = render_loop.step(100.0).unwrap();
        assert_eq!(report.frame_number, n);
    }

    // Heading pi/2, 4 frames of dt 3.6 at speed 3
    let moved = *render_loop.camera();
    assert!((moved.x - (start.x - 4.0 * 10.8)).abs() < 1e-6);
    assert!((moved.y - start.y).abs() < 1e-6);

    assert_eq!(log.summary().count, 4);
    assert_eq!(frames.frame_count(), 4);
    render_loop.shutdown();
}

#[test]
fn test_prefetcher_follows_camera() {
    let cache = Arc::new(ChunkCache::new(&TerrainConfig::with_seed(11)));
    let frames = TripleBuffer::new(16, 16).unwrap();
    let pipeline = FramePipeline::new(Arc::clone(&cache), &frames, &render_config(1)).unwrap();
    let prefetcher = ChunkPrefetcher::spawn(Arc::clone(&cache), 1).unwrap();

    let camera = CameraConfig {
        x: 1000.0,
        y: -1000.0,
        view_distance: 2.0,
        ..CameraConfig::default()
    };
    let mut render_loop = RenderLoop::new(
        pipeline,
        &camera,
        &render_config(1),
        Arc::new(SharedIntent::new()),
        Arc::new(SampleLog::new()),
    )
    .with_prefetcher(prefetcher);

    render_loop.step(16.0).unwrap();

    let center = ChunkCoord::from_world(1000.0, -1000.0, cache.chunk_size());
    let corner = ChunkCoord::new(center.x + 1, center.y + 1);
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cache.contains(corner) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(cache.contains(corner), "ring around the camera was not prefetched");
    render_loop.shutdown();
}

#[test]
fn test_threaded_loop_hands_off_finished_frames() {
    let cache = Arc::new(ChunkCache::new(&TerrainConfig::with_seed(1000)));
    let frames = TripleBuffer::new(WIDTH, HEIGHT).unwrap();
    let mut consumer = frames.consumer().unwrap();
    let pipeline = FramePipeline::new(Arc::clone(&cache), &frames, &render_config(3)).unwrap();

    let log = Arc::new(SampleLog::new());
    let intent = Arc::new(SharedIntent::new());
    intent.set(Intent {
        left: true,
        forward: true,
        ..Intent::default()
    });
    let render_thread = RenderLoop::new(
        pipeline,
        &camera_config(),
        &render_config(3),
        intent,
        Arc::clone(&log) as Arc<dyn MetricsSink>,
    )
    .spawn()
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(20);
    let mut last_seen = 0;
    let mut distinct = 0;
    while distinct < 3 && Instant::now() < deadline {
        let view = consumer.take_frame();
        assert_ne!(view.buffer_index(), frames.roles().active);
        if view.frame_count() > last_seen {
            last_seen = view.frame_count();
            distinct += 1;
            assert_eq!(view.len(), WIDTH * HEIGHT);
        }
        drop(view);
        thread::sleep(Duration::from_millis(5));
    }

    let rendered = render_thread.stop().unwrap();
    assert!(distinct >= 3, "consumer saw only {distinct} new frames");
    assert!(rendered >= last_seen);
    assert_eq!(log.summary().count as u64, rendered);
}

#[test]
fn test_take_frame_twice_without_new_frame() {
    let cache = Arc::new(ChunkCache::new(&TerrainConfig::default()));
    let frames = TripleBuffer::new(WIDTH, HEIGHT).unwrap();
    let mut consumer = frames.consumer().unwrap();
    let mut pipeline = FramePipeline::new(cache, &frames, &render_config(2)).unwrap();
    pipeline
        .begin_frame(&Camera::from_config(&camera_config()))
        .unwrap();

    let (index, first) = {
        let view = consumer.take_frame();
        (view.buffer_index(), view.to_vec())
    };
    let view = consumer.take_frame();
    assert_eq!(view.buffer_index(), index);
    assert_eq!(view.to_vec(), first);
}

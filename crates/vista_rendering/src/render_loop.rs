//! # Render Loop
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ while !stop                                          │
//! │   1. snapshot intent, advance camera by elapsed time │
//! │   2. post camera position to the chunk prefetcher    │
//! │   3. begin_frame: sky, workers, barrier, publish     │
//! │   4. record render time, log the frame               │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! [`RenderLoop::step`] runs one iteration with an explicit elapsed time so
//! tests can drive it frame by frame. [`RenderLoop::spawn`] runs it on its own
//! thread until [`RenderThread::stop`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use vista_procedural::ChunkPrefetcher;

use crate::camera::{Camera, CameraConfig, SharedIntent};
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::pipeline::{FramePipeline, FrameReport};
use crate::telemetry::MetricsSink;

/// Drives the camera and the frame pipeline.
pub struct RenderLoop {
    pipeline: FramePipeline,
    camera: Camera,
    camera_config: CameraConfig,
    intent: Arc<SharedIntent>,
    prefetcher: Option<ChunkPrefetcher>,
    sink: Arc<dyn MetricsSink>,
    frame_budget_ms: f64,
    stop: Arc<AtomicBool>,
    frames_over_budget: u64,
}

impl RenderLoop {
    /// Creates a loop starting at the configured camera pose.
    #[must_use]
    pub fn new(
        pipeline: FramePipeline,
        camera_config: &CameraConfig,
        render_config: &RenderConfig,
        intent: Arc<SharedIntent>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            pipeline,
            camera: Camera::from_config(camera_config),
            camera_config: camera_config.clone(),
            intent,
            prefetcher: None,
            sink,
            frame_budget_ms: render_config.frame_budget_ms,
            stop: Arc::new(AtomicBool::new(false)),
            frames_over_budget: 0,
        }
    }

    /// Posts the camera position to a prefetcher every frame.
    #[must_use]
    pub fn with_prefetcher(mut self, prefetcher: ChunkPrefetcher) -> Self {
        self.prefetcher = Some(prefetcher);
        self
    }

    /// Current camera pose.
    #[inline]
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The frame pipeline.
    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &FramePipeline {
        &self.pipeline
    }

    /// Frames that missed the budget so far.
    #[inline]
    #[must_use]
    pub const fn frames_over_budget(&self) -> u64 {
        self.frames_over_budget
    }

    /// Flag observed at the top of every [`run`](Self::run) iteration.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Runs one iteration as if `elapsed_ms` passed since the last one.
    ///
    /// # Errors
    ///
    /// Propagates fatal pipeline errors.
    pub fn step(&mut self, elapsed_ms: f64) -> RenderResult<FrameReport> {
        let intent = self.intent.snapshot();
        self.camera.advance(&intent, elapsed_ms, &self.camera_config);

        if let Some(prefetcher) = &self.prefetcher {
            prefetcher.update(self.camera.x, self.camera.y);
        }

        let report = self.pipeline.begin_frame(&self.camera)?;
        self.sink.record_render_time(report.render_ms);

        if report.within_budget(self.frame_budget_ms) {
            tracing::debug!(
                "Frame {} rendered in {:.2}ms at ({:.1}, {:.1})",
                report.frame_number,
                report.render_ms,
                self.camera.x,
                self.camera.y
            );
        } else {
            self.frames_over_budget += 1;
            tracing::warn!(
                "Frame {} over budget: {:.2}ms > {:.2}ms",
                report.frame_number,
                report.render_ms,
                self.frame_budget_ms
            );
        }

        Ok(report)
    }

    /// Renders until the stop flag is set.
    ///
    /// Returns the number of frames rendered.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal pipeline error.
    pub fn run(&mut self) -> RenderResult<u64> {
        let mut frames = 0;
        let mut last_frame = Instant::now();

        while !self.stop.load(Ordering::Acquire) {
            let now = Instant::now();
            let elapsed_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
            last_frame = now;

            self.step(elapsed_ms)?;
            frames += 1;
        }

        Ok(frames)
    }

    /// Moves the loop onto its own thread.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::LoopSpawn`] if the thread cannot start.
    pub fn spawn(self) -> RenderResult<RenderThread> {
        let stop = self.stop_flag();
        let handle = thread::Builder::new()
            .name("vista-render".into())
            .spawn(move || {
                let mut render_loop = self;
                let result = render_loop.run();
                render_loop.shutdown();
                if let Ok(frames) = &result {
                    tracing::info!(
                        "Render loop rendered {} frames, {} over budget",
                        frames,
                        render_loop.frames_over_budget()
                    );
                }
                result
            })
            .map_err(RenderError::LoopSpawn)?;

        tracing::info!("Render loop started");
        Ok(RenderThread {
            stop,
            handle: Some(handle),
        })
    }

    /// Stops the workers and the prefetcher.
    pub fn shutdown(&mut self) {
        self.pipeline.shutdown();
        if let Some(prefetcher) = self.prefetcher.take() {
            prefetcher.shutdown();
        }
    }
}

/// Handle to a render loop running on its own thread.
///
/// Dropping the handle stops and joins the loop.
pub struct RenderThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<RenderResult<u64>>>,
}

impl RenderThread {
    /// Returns true once the loop has exited, for example after an error.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signals the loop and joins it.
    ///
    /// Returns the number of frames rendered.
    ///
    /// # Errors
    ///
    /// Returns the loop's fatal error, or [`RenderError::LoopPanicked`].
    pub fn stop(mut self) -> RenderResult<u64> {
        self.join()
    }

    fn join(&mut self) -> RenderResult<u64> {
        self.stop.store(true, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        let result = handle.join().map_err(|_| RenderError::LoopPanicked)?;
        tracing::info!("Render loop stopped");
        result
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        if let Err(err) = self.join() {
            tracing::warn!("Render loop ended with error: {}", err);
        }
    }
}

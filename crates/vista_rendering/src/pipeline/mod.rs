//! # Frame Pipeline
//!
//! Paints one frame with a fixed pool of persistent workers.
//!
//! ```text
//! begin_frame(camera)
//!   ├── begin WriteFrame (active buffer)
//!   ├── fill sky
//!   ├── dispatch Render{camera, writer} to every worker
//!   ├── barrier: wait for every ack
//!   └── publish (active <-> complete)
//! ```
//!
//! Each worker owns a disjoint column range. The frame is published only
//! after every dispatched worker has answered, so no column writer outlives
//! its frame.

#![allow(unsafe_code)]

mod stats;
mod worker;

pub use stats::{FrameReport, WorkerReport};

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use vista_core::{FrameProducer, SyncError, TripleBuffer};
use vista_procedural::TileSampler;

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::raymarch::ColumnRayMarcher;
use worker::{Ack, WorkerHandle};

/// Splits `width` columns into `parts` contiguous ranges.
///
/// Ranges cover every column exactly once; some are empty when there are
/// more parts than columns.
#[must_use]
pub fn column_ranges(width: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    (0..parts)
        .map(|i| (i * width / parts)..((i + 1) * width / parts))
        .collect()
}

/// Persistent worker pool bound to one triple buffer.
pub struct FramePipeline {
    frames: Arc<TripleBuffer>,
    producer: FrameProducer,
    workers: Vec<WorkerHandle>,
    sky_color: u32,
}

impl FramePipeline {
    /// Starts the worker pool.
    ///
    /// # Errors
    ///
    /// - [`RenderError::InvalidConfig`] for zero workers.
    /// - [`RenderError::Surface`] if the buffer is zero-sized or its
    ///   producer is already taken.
    /// - [`RenderError::WorkerSpawn`] if a thread cannot start; workers
    ///   already started are stopped.
    pub fn new<M>(map: Arc<M>, frames: &Arc<TripleBuffer>, config: &RenderConfig) -> RenderResult<Self>
    where
        M: TileSampler + ?Sized + 'static,
    {
        if config.workers == 0 {
            return Err(RenderError::InvalidConfig(
                "at least one render worker is required".into(),
            ));
        }

        let (width, height) = frames.dimensions();
        if width == 0 || height == 0 {
            return Err(SyncError::Unallocated { width, height }.into());
        }

        let producer = frames.producer()?;
        let marcher = ColumnRayMarcher::new(config.sky_rgba());

        let workers = (0..config.workers)
            .map(|index| WorkerHandle::spawn(index, Arc::clone(&map), marcher))
            .collect::<RenderResult<Vec<_>>>()?;

        tracing::info!(
            "Render pipeline started: {} workers, {}x{} surface",
            workers.len(),
            width,
            height
        );

        Ok(Self {
            frames: Arc::clone(frames),
            producer,
            workers,
            sky_color: config.sky_rgba(),
        })
    }

    /// Number of live workers.
    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// The triple buffer this pipeline paints into.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> &Arc<TripleBuffer> {
        &self.frames
    }

    /// Renders and publishes one frame.
    ///
    /// Rejected worker commands are logged and leave their columns showing
    /// sky for this frame.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Surface`] on a zero-sized surface.
    /// - [`RenderError::WorkerDisconnected`] if a worker is gone; the frame
    ///   is discarded once every other worker has answered.
    /// - [`RenderError::Busy`] if a worker still has a command in flight.
    pub fn begin_frame(&mut self, camera: &Camera) -> RenderResult<FrameReport> {
        if self.workers.is_empty() {
            return Err(RenderError::InvalidConfig("render pipeline is shut down".into()));
        }

        let start = Instant::now();
        let mut frame = self.producer.begin()?;
        frame.fill(self.sky_color);

        let ranges = column_ranges(frame.width(), self.workers.len());
        let mut failure = None;

        for (worker, range) in self.workers.iter_mut().zip(ranges) {
            if range.is_empty() {
                continue;
            }
            // SAFETY: ranges are disjoint, and every dispatched writer is
            // dropped by its worker before the ack collected below
            let writer = unsafe { frame.column_writer(range) };
            if let Err(err) = worker.dispatch(*camera, writer) {
                failure.get_or_insert(err);
            }
        }

        let mut report = FrameReport::default();
        for worker in self.workers.iter_mut().filter(|w| w.is_pending()) {
            match worker.wait() {
                Ok(Ack::Done(done)) => report.workers.push(done),
                Ok(Ack::Rejected { reason }) => {
                    tracing::warn!("Render worker {} rejected frame: {}", worker.index(), reason);
                    report.rejected += 1;
                }
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        report.frame_number = frame.publish();
        report.render_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(report)
    }

    /// Reallocates the frame buffers.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the size is too large.
    pub fn resize(&self, width: usize, height: usize) -> RenderResult<()> {
        self.frames.resize(width, height)?;
        Ok(())
    }

    /// Stops and joins every worker. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        for worker in &mut self.workers {
            worker.stop();
        }
        tracing::info!("Render pipeline stopped ({} workers joined)", self.workers.len());
        self.workers.clear();
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

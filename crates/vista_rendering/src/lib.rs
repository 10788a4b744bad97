//! # VISTA Rendering Engine
//!
//! CPU voxel-space terrain renderer:
//! - Front-to-back column marching over an infinite height map
//! - Persistent worker pool with one disjoint column range per worker
//! - Triple-buffered output, so display never waits on rendering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        RENDER LOOP                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  SharedIntent → Camera::advance → ChunkPrefetcher::update     │
//! │                        ↓                                     │
//! │  FramePipeline: sky → workers (ColumnRayMarcher) → publish   │
//! │                        ↓                                     │
//! │  TripleBuffer → FrameConsumer::take_frame (host)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod camera;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod raymarch;
pub mod render_loop;
pub mod telemetry;

pub use camera::{Camera, CameraConfig, Intent, SharedIntent};
pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use pipeline::{column_ranges, FramePipeline, FrameReport, WorkerReport};
pub use raymarch::{apply_effects, fog_ratio, ColumnRayMarcher, MarchStats, SKY_COLOR};
pub use render_loop::{RenderLoop, RenderThread};
pub use telemetry::{MetricsSink, SampleLog, TelemetrySummary};

//! # Column Ray Marcher
//!
//! Voxel-space rendering: for each screen column, march depth slices front
//! to back, project the sampled terrain height to a screen row and paint
//! only the part of the column not already covered by nearer terrain.
//!
//! ```text
//!  depth z ──▶
//!     ┌───────────────────────────────┐
//!  pl ●───────── one slice ──────────● pr     (spans the full width)
//!     │ col 0   col 1   ...   col W-1 │
//!     └───────────────────────────────┘
//!  step grows with z / view_distance, so far slices are sparser
//! ```
//!
//! Every column position is derived from the slice endpoints and its own
//! index, so splitting the width between workers never changes a pixel.

use vista_core::ColumnWriter;
use vista_procedural::{rgba, unpack, TileSampler};

use crate::camera::Camera;

/// Default sky color.
pub const SKY_COLOR: u32 = rgba(135, 206, 235, 255);

/// Projection scale applied to `1 / z`.
const PROJECTION_SCALE: f64 = 240.0;

/// Fog blend factor for a depth ratio `z / view_distance`.
///
/// Zero for the near half of the view, then linear up to 1.
#[inline]
#[must_use]
pub fn fog_ratio(depth_ratio: f64) -> f64 {
    if depth_ratio < 0.5 {
        0.0
    } else {
        (depth_ratio - 0.5) / 0.5
    }
}

/// Applies light and fog to a tile color.
///
/// Each channel becomes `c * light / 100`; past a fog ratio of 0.05 it is
/// blended towards the sky. Alpha is always opaque.
#[inline]
#[must_use]
pub fn apply_effects(color: u32, light: f64, fog: f64, sky: u32) -> u32 {
    let [r, g, b, _] = unpack(color);
    let [sky_r, sky_g, sky_b, _] = unpack(sky);

    let lit = |c: u8| f64::from(c) * light / 100.0;
    let (r, g, b) = (lit(r).trunc(), lit(g).trunc(), lit(b).trunc());

    if fog < 0.05 {
        return rgba(r as u8, g as u8, b as u8, 255);
    }

    let blend = |c: f64, s: u8| c * (1.0 - fog) + f64::from(s) * fog;
    rgba(
        blend(r, sky_r) as u8,
        blend(g, sky_g) as u8,
        blend(b, sky_b) as u8,
        255,
    )
}

/// Counters from one marched column range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarchStats {
    /// Depth slices marched.
    pub slices: u32,
    /// Tiles sampled.
    pub samples: u64,
    /// Column spans painted.
    pub spans: u64,
}

impl MarchStats {
    /// Adds another range's counters.
    pub fn merge(&mut self, other: &Self) {
        self.slices = self.slices.max(other.slices);
        self.samples += other.samples;
        self.spans += other.spans;
    }
}

/// Paints terrain into one writer's columns.
#[derive(Clone, Copy, Debug)]
pub struct ColumnRayMarcher {
    sky_color: u32,
}

impl Default for ColumnRayMarcher {
    fn default() -> Self {
        Self::new(SKY_COLOR)
    }
}

impl ColumnRayMarcher {
    /// Creates a marcher that fogs towards `sky_color`.
    #[must_use]
    pub const fn new(sky_color: u32) -> Self {
        Self { sky_color }
    }

    /// Color the far terrain fades into.
    #[inline]
    #[must_use]
    pub const fn sky_color(&self) -> u32 {
        self.sky_color
    }

    /// Marches `writer`'s columns for one frame.
    ///
    /// `hidden` is scratch space for the per-column occlusion cursor; it is
    /// resized as needed and may be reused across frames.
    pub fn march<M>(
        &self,
        map: &M,
        camera: &Camera,
        writer: &mut ColumnWriter,
        hidden: &mut Vec<usize>,
    ) -> MarchStats
    where
        M: TileSampler + ?Sized,
    {
        let columns = writer.columns();
        let height = writer.height();
        let width = writer.width() as f64;

        hidden.clear();
        hidden.resize(columns.len(), height);

        let mut stats = MarchStats::default();
        if columns.is_empty() || height == 0 {
            return stats;
        }

        let (sin, cos) = camera.heading.sin_cos();

        let mut z = 1.0;
        while z < camera.view_distance {
            let left_x = -cos * z - sin * z + camera.x;
            let left_y = sin * z - cos * z + camera.y;
            let right_x = cos * z - sin * z + camera.x;
            let right_y = -sin * z - cos * z + camera.y;
            let step_x = (right_x - left_x) / width;
            let step_y = (right_y - left_y) / width;

            let invz = (1.0 / z) * PROJECTION_SCALE;
            let depth_ratio = z / camera.view_distance;
            let fog = fog_ratio(depth_ratio);

            for (cursor, x) in hidden.iter_mut().zip(columns.clone()) {
                let column = x as f64;
                let tile = map.sample(left_x + step_x * column, left_y + step_y * column);
                stats.samples += 1;

                let screen_y = (camera.height - f64::from(tile.height)) * invz + camera.horizon;
                let top = screen_row(screen_y, height);
                if top < *cursor {
                    let color = apply_effects(tile.color, tile.light, fog, self.sky_color);
                    writer.draw_vline(x, top, *cursor, color);
                    *cursor = top;
                    stats.spans += 1;
                }
            }

            stats.slices += 1;
            z += 2.0 * depth_ratio * depth_ratio + 0.5 * depth_ratio + 0.25;
        }

        stats
    }
}

/// Screen row of a projected height, clamped to `[0, height]`.
#[inline]
fn screen_row(screen_y: f64, height: usize) -> usize {
    (screen_y.max(0.0) as usize).min(height)
}

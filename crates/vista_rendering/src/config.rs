//! Renderer settings, usually the `[render]` table of the host's TOML file.

use serde::{Deserialize, Serialize};
use vista_procedural::{rgba, ConfigInvalid, MAX_PREFETCH_RADIUS};

/// Surface, worker pool and frame budget settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render worker threads.
    pub workers: usize,
    /// Surface width in pixels.
    pub width: usize,
    /// Surface height in pixels.
    pub height: usize,
    /// Sky and fog color as `[r, g, b]`.
    pub sky_color: [u8; 3],
    /// Frames slower than this are logged as warnings.
    pub frame_budget_ms: f64,
    /// Chunks prefetched around the camera, in each direction.
    pub prefetch_radius: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            width: 800,
            height: 600,
            sky_color: [135, 206, 235],
            frame_budget_ms: 16.6,
            prefetch_radius: 2,
        }
    }
}

impl RenderConfig {
    /// Packed RGBA sky color.
    #[must_use]
    pub const fn sky_rgba(&self) -> u32 {
        rgba(self.sky_color[0], self.sky_color[1], self.sky_color[2], 255)
    }

    /// Checks the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`] for the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigInvalid> {
        if self.workers == 0 {
            return Err(ConfigInvalid::out_of_range("render.workers", "at least 1", 0));
        }
        if self.width == 0 {
            return Err(ConfigInvalid::out_of_range("render.width", "at least 1", 0));
        }
        if self.height == 0 {
            return Err(ConfigInvalid::out_of_range("render.height", "at least 1", 0));
        }
        if !(self.frame_budget_ms.is_finite() && self.frame_budget_ms > 0.0) {
            return Err(ConfigInvalid::out_of_range(
                "render.frame_budget_ms",
                "a positive number",
                self.frame_budget_ms,
            ));
        }
        if self.prefetch_radius > MAX_PREFETCH_RADIUS {
            return Err(ConfigInvalid::out_of_range(
                "render.prefetch_radius",
                "at most 64",
                self.prefetch_radius,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raymarch::SKY_COLOR;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(RenderConfig::default().validate(), Ok(()));
        assert_eq!(RenderConfig::default().sky_rgba(), SKY_COLOR);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = RenderConfig {
            workers: 0,
            ..RenderConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), "render.workers");
    }

    #[test]
    fn test_rejects_empty_surface() {
        let config = RenderConfig {
            height: 0,
            ..RenderConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), "render.height");
    }

    #[test]
    fn test_prefetch_radius_is_bounded() {
        let config = RenderConfig {
            prefetch_radius: 40_000,
            ..RenderConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), "render.prefetch_radius");

        let config = RenderConfig {
            prefetch_radius: MAX_PREFETCH_RADIUS,
            ..RenderConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }
}

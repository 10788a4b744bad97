//! Terrain generation parameters.
//!
//! Loaded once at startup (usually the `[terrain]` table of the host's
//! TOML file). Every field has a default, so a partial table is valid.

use serde::{Deserialize, Serialize};

use crate::error::ConfigInvalid;
use crate::noise::WorldSeed;

/// Largest accepted chunk edge length.
pub const MAX_CHUNK_SIZE: u32 = 1024;

/// Parameters for noise sampling, classification and chunking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Base seed for all four noise fields.
    pub seed: WorldSeed,
    /// Chunk edge length in tiles.
    pub chunk_size: u32,
    /// Coordinate divisor for the height field.
    pub height_ratio: f64,
    /// Coordinate divisor for the humidity field.
    pub humidity_ratio: f64,
    /// Coordinate divisor for the temperature field.
    pub temperature_ratio: f64,
    /// Octaves combined per field sample.
    pub octaves: u32,
    /// Darkest light level a shadowed tile may reach.
    pub baseline_brightness: f64,
    /// Light level of an unshadowed tile.
    pub sunlight_brightness: f64,
    /// Sun elevation in degrees.
    pub sun_angle_degrees: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default(),
            chunk_size: 64,
            height_ratio: 128.0,
            humidity_ratio: 512.0,
            temperature_ratio: 1024.0,
            octaves: 4,
            baseline_brightness: 20.0,
            sunlight_brightness: 100.0,
            sun_angle_degrees: 60.0,
        }
    }
}

impl TerrainConfig {
    /// Returns a default config with another seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: WorldSeed::new(seed),
            ..Self::default()
        }
    }

    /// Checks the invariants the generator relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`] for the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigInvalid> {
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ConfigInvalid::out_of_range(
                "terrain.chunk_size",
                "in 1..=1024",
                self.chunk_size,
            ));
        }
        for (field, ratio) in [
            ("terrain.height_ratio", self.height_ratio),
            ("terrain.humidity_ratio", self.humidity_ratio),
            ("terrain.temperature_ratio", self.temperature_ratio),
        ] {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(ConfigInvalid::out_of_range(field, "a positive number", ratio));
            }
        }
        if self.octaves == 0 {
            return Err(ConfigInvalid::out_of_range("terrain.octaves", "at least 1", 0));
        }
        if !(self.baseline_brightness >= 0.0
            && self.baseline_brightness <= self.sunlight_brightness)
        {
            return Err(ConfigInvalid::out_of_range(
                "terrain.baseline_brightness",
                "in [0, sunlight_brightness]",
                self.baseline_brightness,
            ));
        }
        if !(self.sun_angle_degrees > 0.0 && self.sun_angle_degrees < 180.0) {
            return Err(ConfigInvalid::out_of_range(
                "terrain.sun_angle_degrees",
                "in (0, 180)",
                self.sun_angle_degrees,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(TerrainConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_chunk() {
        let config = TerrainConfig {
            chunk_size: 0,
            ..TerrainConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), "terrain.chunk_size");
    }

    #[test]
    fn test_rejects_huge_chunk() {
        let config = TerrainConfig {
            chunk_size: MAX_CHUNK_SIZE + 1,
            ..TerrainConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), "terrain.chunk_size");

        let config = TerrainConfig {
            chunk_size: MAX_CHUNK_SIZE,
            ..TerrainConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_inverted_brightness() {
        let config = TerrainConfig {
            baseline_brightness: 120.0,
            ..TerrainConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), "terrain.baseline_brightness");
    }

    #[test]
    fn test_with_seed() {
        assert_eq!(TerrainConfig::with_seed(7).seed.value(), 7);
    }
}

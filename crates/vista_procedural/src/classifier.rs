//! # Terrain Classification
//!
//! Maps world coordinates to tiles.
//!
//! Three noise channels are scaled into a climate sample:
//!
//! | Channel       | Range        |
//! |---------------|--------------|
//! | height noise  | `[-1, 33]`   |
//! | humidity      | `[0, 100]`   |
//! | temperature   | `[-15, 50]`  |
//!
//! The sample runs through a fixed decision tree that picks biome, behavior,
//! and surface type. Liquids pin the height noise to the water level (5).
//! Every branch ends in a concrete tile, so classification is total.
//!
//! ## Sun Shadows
//!
//! With lighting enabled, a probe walks `+y` one tile at a time and
//! classifies each step without lighting. The first step that is taller than
//! the tile puts it in shadow. The walk is an explicit bounded loop, never
//! recursion.

use crate::config::TerrainConfig;
use crate::noise::NoiseSet;
use crate::tile::{color_of, Behavior, Biome, Tile, TileType};

/// Scaled noise values at one position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateSample {
    /// Elevation noise in `[-1, 33]`.
    pub height_noise: f64,
    /// Humidity in `[0, 100]`.
    pub humidity: f64,
    /// Temperature in `[-15, 50]`.
    pub temperature: f64,
}

/// Outcome of the decision tree, before lighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    /// Climate region.
    pub biome: Biome,
    /// Surface behavior.
    pub behavior: Behavior,
    /// Surface material.
    pub tile_type: TileType,
    /// Height noise after humidity adjustment and liquid pinning.
    pub height_noise: f64,
    /// `round(height_noise * 6)`.
    pub height: i32,
}

/// Deterministic tile classifier.
///
/// Cheap to share: all state is read-only after construction.
pub struct TerrainClassifier {
    noise: NoiseSet,
    height_ratio: f64,
    humidity_ratio: f64,
    temperature_ratio: f64,
    octaves: u32,
    baseline_brightness: f64,
    sunlight_brightness: f64,
    max_shadow_distance: f64,
}

impl TerrainClassifier {
    /// Height noise assigned to every liquid tile.
    pub const WATER_LEVEL: f64 = 5.0;
    /// Upper bound on the shadow probe length, in tiles.
    pub const MAX_SHADOW_DISTANCE: f64 = 20.0;
    /// Occluder height used to size the probe for a given sun angle.
    const SHADOW_CASTER_HEIGHT: f64 = 42.0;
    /// Added to the probe length to form the light falloff window.
    const FALLOFF_PADDING: f64 = 20.0;
    /// World units per unit of height noise.
    const HEIGHT_SCALE: f64 = 6.0;

    /// Creates a classifier from terrain parameters.
    #[must_use]
    pub fn new(config: &TerrainConfig) -> Self {
        let sun = (config.sun_angle_degrees * std::f64::consts::PI / 180.0).sin();
        let max_shadow_distance = if sun > 0.0 {
            (Self::SHADOW_CASTER_HEIGHT / sun).min(Self::MAX_SHADOW_DISTANCE)
        } else {
            Self::MAX_SHADOW_DISTANCE
        };

        Self {
            noise: NoiseSet::new(config.seed),
            height_ratio: config.height_ratio,
            humidity_ratio: config.humidity_ratio,
            temperature_ratio: config.temperature_ratio,
            octaves: config.octaves,
            baseline_brightness: config.baseline_brightness,
            sunlight_brightness: config.sunlight_brightness,
            max_shadow_distance,
        }
    }

    /// Darkest light a tile can receive.
    #[inline]
    #[must_use]
    pub const fn baseline_brightness(&self) -> f64 {
        self.baseline_brightness
    }

    /// Light of an unshadowed tile.
    #[inline]
    #[must_use]
    pub const fn sunlight_brightness(&self) -> f64 {
        self.sunlight_brightness
    }

    /// Length of the shadow probe, in tiles.
    #[inline]
    #[must_use]
    pub const fn max_shadow_distance(&self) -> f64 {
        self.max_shadow_distance
    }

    /// Samples the three climate channels at a world position.
    #[must_use]
    pub fn climate(&self, x: f64, y: f64) -> ClimateSample {
        let height = self.noise.height.octave_noise(
            x / self.height_ratio,
            y / self.height_ratio,
            self.octaves,
        );
        let humidity = self.noise.humidity.octave_noise(
            x / self.humidity_ratio,
            y / self.humidity_ratio,
            self.octaves,
        );
        let temperature = self.noise.temperature.octave_noise(
            x / self.temperature_ratio,
            y / self.temperature_ratio,
            self.octaves,
        );

        ClimateSample {
            height_noise: 16.0 * (height + 1.0) - 1.0,
            humidity: 50.0 * (humidity + 1.0),
            temperature: 32.5 * (temperature + 1.0) - 15.0,
        }
    }

    /// Runs the biome/type decision tree on a climate sample.
    #[must_use]
    pub fn classify_climate(sample: ClimateSample) -> Classification {
        let ClimateSample {
            mut height_noise,
            humidity,
            temperature,
        } = sample;

        let mut behavior = Behavior::Solid;
        let biome;
        let tile_type;

        if temperature <= 0.0 {
            biome = Biome::Ice;
            if height_noise <= 6.0 {
                tile_type = TileType::Ice;
                height_noise = Self::WATER_LEVEL;
            } else {
                tile_type = TileType::Snow;
            }
        } else if temperature <= 40.0 {
            // Low humidity dries up shallow water
            if humidity <= 25.0 && height_noise <= 7.0 {
                height_noise += 5.0 * (25.0 - humidity) / 25.0;
            }

            if height_noise <= 6.0 {
                height_noise = Self::WATER_LEVEL;
                if temperature <= 2.5 {
                    biome = Biome::Ice;
                    tile_type = TileType::Ice;
                } else if temperature <= 38.0 {
                    biome = Biome::Normal;
                    tile_type = TileType::Water;
                    behavior = Behavior::ReflectiveLiquid;
                } else {
                    biome = Biome::Hell;
                    tile_type = TileType::Lava;
                    behavior = Behavior::Liquid;
                }
            } else if humidity <= 25.0 {
                biome = Biome::Desert;
                tile_type = TileType::DesertSand;
            } else if height_noise <= 15.0 {
                biome = Biome::Desert;
                tile_type = TileType::Sand;
            } else if height_noise <= 25.0 {
                biome = Biome::Normal;
                tile_type = TileType::Grass;
            } else {
                biome = Biome::Normal;
                tile_type = TileType::Stone;
            }
        } else {
            biome = Biome::Hell;
            if height_noise <= 6.0 {
                tile_type = TileType::Lava;
                behavior = Behavior::Liquid;
                height_noise = Self::WATER_LEVEL;
            } else {
                tile_type = TileType::VolcanicRock;
            }
        }

        Classification {
            biome,
            behavior,
            tile_type,
            height_noise,
            height: (height_noise * Self::HEIGHT_SCALE).round() as i32,
        }
    }

    /// Classifies the tile at a world position.
    ///
    /// Without lighting the tile is fully sunlit; that mode exists for the
    /// shadow probe and is not meant for rendering.
    #[must_use]
    pub fn classify(&self, x: f64, y: f64, compute_lighting: bool) -> Tile {
        let class = Self::classify_climate(self.climate(x, y));

        let light = if compute_lighting {
            self.shade(x, y, class.height)
        } else {
            self.sunlight_brightness
        };

        Tile {
            biome: class.biome,
            behavior: class.behavior,
            tile_type: class.tile_type,
            color: color_of(class.tile_type),
            height: class.height,
            light,
        }
    }

    /// Light at `(x, y)` for a tile of the given height.
    fn shade(&self, x: f64, y: f64, height: i32) -> f64 {
        let window = self.max_shadow_distance + Self::FALLOFF_PADDING;

        let mut dy = 0.0;
        while dy < self.max_shadow_distance {
            let probe = Self::classify_climate(self.climate(x, y + dy));
            if probe.height > height {
                let light = (self.sunlight_brightness - self.baseline_brightness) * (window - dy)
                    / window;
                return light.max(self.baseline_brightness).min(self.sunlight_brightness);
            }
            dy += 1.0;
        }

        self.sunlight_brightness
    }
}

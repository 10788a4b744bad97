//! # Camera
//!
//! The viewer's pose over the height map and how intent moves it.
//!
//! Motion is a pure function of the previous pose, one intent snapshot and
//! the elapsed time, so it can be replayed in tests without a clock.

use std::f64::consts::FRAC_PI_2;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vista_procedural::ConfigInvalid;

/// Initial pose and motion rates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial world X.
    pub x: f64,
    /// Initial world Y.
    pub y: f64,
    /// Initial eye height.
    pub height: f64,
    /// Initial heading in radians.
    pub heading: f64,
    /// Screen row of the horizon.
    pub horizon: f64,
    /// Farthest marched depth.
    pub view_distance: f64,
    /// Milliseconds to motion units.
    pub time_scale: f64,
    /// Heading change per unit of scaled time.
    pub turn_rate: f64,
    /// Ground speed per unit of scaled time.
    pub move_rate: f64,
    /// Vertical speed per unit of scaled time.
    pub rise_rate: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            x: 206.88,
            y: 192.58,
            height: 180.96,
            heading: FRAC_PI_2,
            horizon: 160.58,
            view_distance: 350.0,
            time_scale: 0.036,
            turn_rate: 0.1,
            move_rate: 3.0,
            rise_rate: 2.0,
        }
    }
}

impl CameraConfig {
    /// Checks the invariants the renderer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`] for the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigInvalid> {
        if !(self.view_distance.is_finite() && self.view_distance > 1.0) {
            return Err(ConfigInvalid::out_of_range(
                "camera.view_distance",
                "greater than 1",
                self.view_distance,
            ));
        }
        for (field, value) in [
            ("camera.x", self.x),
            ("camera.y", self.y),
            ("camera.height", self.height),
            ("camera.heading", self.heading),
            ("camera.horizon", self.horizon),
            ("camera.time_scale", self.time_scale),
            ("camera.turn_rate", self.turn_rate),
            ("camera.move_rate", self.move_rate),
            ("camera.rise_rate", self.rise_rate),
        ] {
            if !value.is_finite() {
                return Err(ConfigInvalid::out_of_range(field, "finite", value));
            }
        }
        Ok(())
    }
}

/// Movement requested by the user for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intent {
    /// Turn left.
    pub left: bool,
    /// Turn right.
    pub right: bool,
    /// Move along the heading.
    pub forward: bool,
    /// Move against the heading.
    pub back: bool,
    /// Raise the eye.
    pub look_up: bool,
    /// Lower the eye.
    pub look_down: bool,
    /// Last pointer position in surface pixels, if known.
    ///
    /// Carried for hosts; it does not move the camera.
    pub pointer: Option<(i32, i32)>,
}

impl Intent {
    #[inline]
    fn axis(positive: bool, negative: bool) -> f64 {
        f64::from(i8::from(positive) - i8::from(negative))
    }
}

/// Latest intent, shared between the input source and the render loop.
///
/// Writers overwrite, the render loop snapshots once per frame.
#[derive(Debug, Default)]
pub struct SharedIntent {
    current: Mutex<Intent>,
}

impl SharedIntent {
    /// Creates a cell holding the idle intent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored intent.
    pub fn set(&self, intent: Intent) {
        *self.current.lock() = intent;
    }

    /// Edits the stored intent in place.
    pub fn update(&self, edit: impl FnOnce(&mut Intent)) {
        edit(&mut *self.current.lock());
    }

    /// Copy of the stored intent.
    #[must_use]
    pub fn snapshot(&self) -> Intent {
        *self.current.lock()
    }
}

/// Viewer pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// World X.
    pub x: f64,
    /// World Y.
    pub y: f64,
    /// Eye height.
    pub height: f64,
    /// Heading in radians.
    pub heading: f64,
    /// Screen row of the horizon.
    pub horizon: f64,
    /// Farthest marched depth.
    pub view_distance: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl Camera {
    /// Initial pose from a config.
    #[must_use]
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            x: config.x,
            y: config.y,
            height: config.height,
            heading: config.heading,
            horizon: config.horizon,
            view_distance: config.view_distance,
        }
    }

    /// Moves the camera by one intent over `elapsed_ms`.
    pub fn advance(&mut self, intent: &Intent, elapsed_ms: f64, rates: &CameraConfig) {
        let dt = rates.time_scale * elapsed_ms;

        let turn = Intent::axis(intent.left, intent.right);
        let forward = rates.move_rate * Intent::axis(intent.forward, intent.back);
        let rise = rates.rise_rate * Intent::axis(intent.look_up, intent.look_down);

        if turn != 0.0 {
            self.heading += turn * rates.turn_rate * dt;
        }
        if forward != 0.0 {
            self.x -= forward * self.heading.sin() * dt;
            self.y -= forward * self.heading.cos() * dt;
        }
        if rise != 0.0 {
            self.height += rise * dt;
        }
    }
}

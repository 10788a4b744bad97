//! # Host Configuration
//!
//! One TOML file with three optional tables:
//!
//! ```toml
//! [terrain]
//! seed = 1000
//!
//! [camera]
//! view_distance = 350.0
//!
//! [render]
//! workers = 4
//! ```
//!
//! Missing tables and fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vista_procedural::{ConfigInvalid, TerrainConfig};
use vista_rendering::{CameraConfig, RenderConfig};

/// Errors loading the host configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigInvalid),
}

/// Every setting the host passes to the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VistaConfig {
    /// Terrain generation.
    pub terrain: TerrainConfig,
    /// Initial pose and motion rates.
    pub camera: CameraConfig,
    /// Surface and worker pool.
    pub render: RenderConfig,
}

impl VistaConfig {
    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable, malformed or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate()?;
        self.camera.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

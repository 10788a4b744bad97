//! # Rendering Error Types
//!
//! Failures of the frame pipeline and render loop.

use thiserror::Error;
use vista_core::SyncError;

/// Errors that can occur while rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The frame surface refused the operation.
    #[error("frame surface: {0}")]
    Surface(#[from] SyncError),

    /// A render worker thread could not be started.
    #[error("failed to spawn render worker {index}: {source}")]
    WorkerSpawn {
        /// Worker index.
        index: usize,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// A render worker hung up before acknowledging.
    #[error("render worker {0} disconnected")]
    WorkerDisconnected(usize),

    /// A command was dispatched before the previous one was acknowledged.
    #[error("render worker {0} is still busy with the previous frame")]
    Busy(usize),

    /// The render loop thread could not be started.
    #[error("failed to spawn render loop: {0}")]
    LoopSpawn(#[source] std::io::Error),

    /// The render loop thread panicked.
    #[error("render loop panicked")]
    LoopPanicked,

    /// Render settings are unusable.
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

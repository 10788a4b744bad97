//! # Core Error Types
//!
//! Errors raised by the frame synchronization layer.

use thiserror::Error;

/// Errors from the triple buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The surface has zero width or height.
    #[error("frame surface is unallocated (size is {width}x{height})")]
    Unallocated {
        /// Current width.
        width: usize,
        /// Current height.
        height: usize,
    },

    /// The requested surface does not fit the pixel limit.
    #[error("frame surface {width}x{height} exceeds {limit} pixels")]
    Oversized {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Maximum pixel count.
        limit: usize,
    },

    /// A producer handle is already alive.
    #[error("frame producer already taken")]
    ProducerTaken,

    /// A consumer handle is already alive.
    #[error("frame consumer already taken")]
    ConsumerTaken,
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

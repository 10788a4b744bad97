//! # VISTA Core
//!
//! Frame synchronization shared by the renderer and its host.
//!
//! ## Architecture Rules
//!
//! 1. **Three owned buffers** - Storage is allocated on resize, never copied
//! 2. **Roles, not pixels, rotate** - A frame is published by swapping indices
//! 3. **One producer, one consumer** - Enforced at handle creation
//!
//! ## Example
//!
//! ```rust
//! use vista_core::TripleBuffer;
//!
//! let frames = TripleBuffer::new(4, 2).unwrap();
//! let mut producer = frames.producer().unwrap();
//! let mut consumer = frames.consumer().unwrap();
//!
//! let mut frame = producer.begin().unwrap();
//! frame.fill(0xff00_00ff);
//! frame.publish();
//!
//! let view = consumer.take_frame();
//! assert_eq!(view.len(), 8);
//! assert!(view.iter().all(|&p| p == 0xff00_00ff));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod sync;

pub use error::{SyncError, SyncResult};
pub use sync::{
    ColumnWriter, FrameConsumer, FrameProducer, FrameView, RoleSnapshot, TripleBuffer, WriteFrame,
};

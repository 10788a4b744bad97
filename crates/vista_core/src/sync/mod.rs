//! # Frame Synchronization
//!
//! ## The Problem
//!
//! ```text
//! Render loop + workers:  WRITE frame N+1
//! Display (consumer):     READ frame N
//!
//! One buffer:   TEARING
//! Two buffers:  producer waits for the consumer
//! ```
//!
//! ## The Solution: Triple Buffering
//!
//! ```text
//! active     being painted by the workers
//! complete   newest finished frame, not yet taken
//! published  handed to the consumer
//!
//! publish():     active <-> complete
//! take_frame():  complete <-> published (only if a new frame exists)
//! ```
//!
//! Producer and consumer never touch the same buffer, so neither blocks the
//! other beyond an O(1) role swap.

mod triple_buffer;

pub use triple_buffer::{
    ColumnWriter, FrameConsumer, FrameProducer, FrameView, RoleSnapshot, TripleBuffer, WriteFrame,
    MAX_PIXELS,
};

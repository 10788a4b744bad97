//! # Triple-Buffered Frames
//!
//! Three equally sized pixel buffers with rotating roles.
//!
//! ## Architecture
//!
//! ```text
//!              ┌──────────────────────────────────────┐
//!              │             TripleBuffer             │
//!              │                                      │
//!              │  storage: RwLock<[Pixels; 3]>        │
//!              │  roles:   RwLock<active, complete,   │
//!              │                  published, frames>  │
//!              └──────────────────────────────────────┘
//!                    │                       │
//!           ┌────────┴───────┐       ┌───────┴────────┐
//!           ▼                ▼       ▼                ▼
//!    ┌─────────────┐  ┌──────────────┐        ┌────────────┐
//!    │ WriteFrame  │─▶│ ColumnWriter │ x N    │ FrameView  │
//!    │ (producer)  │  │  (workers)   │        │ (consumer) │
//!    └─────────────┘  └──────────────┘        └────────────┘
//! ```
//!
//! ## Safety Note
//!
//! Pixel stores are `UnsafeCell` slices. The role permutation guarantees the
//! producer only ever writes `active` and the consumer only ever reads
//! `published`, and both hold a storage read guard so `resize` cannot free a
//! buffer underneath them. Column writers are handed to other threads as raw
//! pointers; their constructor is `unsafe` and its contract is upheld by the
//! frame pipeline's barrier.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::ops::{Deref, Range};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{SyncError, SyncResult};

/// Largest surface the buffer will allocate (three of these are kept).
pub const MAX_PIXELS: usize = 1 << 26;

struct PixelStore {
    cells: Box<[UnsafeCell<u32>]>,
}

impl PixelStore {
    fn new(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| UnsafeCell::new(0)).collect(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn as_mut_ptr(&self) -> *mut u32 {
        UnsafeCell::raw_get(self.cells.as_ptr())
    }

    /// # Safety
    ///
    /// No writer may be active on this store for the returned lifetime.
    #[inline]
    unsafe fn as_slice(&self) -> &[u32] {
        std::slice::from_raw_parts(self.as_mut_ptr(), self.len())
    }

    /// # Safety
    ///
    /// The caller must be the only accessor of this store for the returned
    /// lifetime.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn as_mut_slice(&self) -> &mut [u32] {
        std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.len())
    }
}

struct Storage {
    width: usize,
    height: usize,
    stores: [PixelStore; 3],
}

impl Storage {
    fn allocate(width: usize, height: usize) -> SyncResult<Self> {
        let len = width
            .checked_mul(height)
            .filter(|&len| len <= MAX_PIXELS)
            .ok_or(SyncError::Oversized {
                width,
                height,
                limit: MAX_PIXELS,
            })?;
        Ok(Self {
            width,
            height,
            stores: [PixelStore::new(len), PixelStore::new(len), PixelStore::new(len)],
        })
    }

    #[inline]
    const fn is_allocated(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

struct Roles {
    active: usize,
    complete: usize,
    published: usize,
    frame_count: u64,
    /// Counter value at the last `take_frame` rotation.
    last_taken: Option<u64>,
}

/// Point-in-time copy of the role assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleSnapshot {
    /// Buffer being written.
    pub active: usize,
    /// Newest finished buffer.
    pub complete: usize,
    /// Buffer last handed to the consumer.
    pub published: usize,
    /// Frames published so far.
    pub frame_count: u64,
}

/// Three frame buffers with rotating roles.
///
/// ## Usage
///
/// ```rust
/// use vista_core::TripleBuffer;
///
/// let frames = TripleBuffer::new(2, 2).unwrap();
/// let mut producer = frames.producer().unwrap();
///
/// let frame = producer.begin().unwrap();
/// frame.publish();
/// assert_eq!(frames.frame_count(), 1);
/// ```
pub struct TripleBuffer {
    storage: RwLock<Storage>,
    roles: RwLock<Roles>,
    producer_taken: AtomicBool,
    consumer_taken: AtomicBool,
}

// SAFETY: access to the UnsafeCell stores is partitioned by role (see module docs)
unsafe impl Send for TripleBuffer {}
// SAFETY: access to the UnsafeCell stores is partitioned by role (see module docs)
unsafe impl Sync for TripleBuffer {}

impl TripleBuffer {
    /// Allocates three `width x height` buffers.
    ///
    /// A zero-sized surface is allowed; frames cannot begin until a resize.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Oversized`] above [`MAX_PIXELS`].
    pub fn new(width: usize, height: usize) -> SyncResult<Arc<Self>> {
        Ok(Arc::new(Self {
            storage: RwLock::new(Storage::allocate(width, height)?),
            roles: RwLock::new(Roles {
                active: 0,
                complete: 1,
                published: 2,
                frame_count: 0,
                last_taken: None,
            }),
            producer_taken: AtomicBool::new(false),
            consumer_taken: AtomicBool::new(false),
        }))
    }

    /// Reallocates all three buffers, zero-filled.
    ///
    /// Blocks until no frame is being written or viewed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Oversized`] above [`MAX_PIXELS`]; the old buffers
    /// are kept in that case.
    pub fn resize(&self, width: usize, height: usize) -> SyncResult<()> {
        let fresh = Storage::allocate(width, height)?;
        let mut storage = self.storage.write();
        *storage = fresh;
        self.roles.write().last_taken = None;
        tracing::info!("Frame buffers resized to {}x{}", width, height);
        Ok(())
    }

    /// Current `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        let storage = self.storage.read();
        (storage.width, storage.height)
    }

    /// Frames published so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.roles.read().frame_count
    }

    /// Current role assignment.
    #[must_use]
    pub fn roles(&self) -> RoleSnapshot {
        let roles = self.roles.read();
        RoleSnapshot {
            active: roles.active,
            complete: roles.complete,
            published: roles.published,
            frame_count: roles.frame_count,
        }
    }

    /// Takes the single producer handle.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ProducerTaken`] while another producer is alive.
    pub fn producer(self: &Arc<Self>) -> SyncResult<FrameProducer> {
        if self.producer_taken.swap(true, Ordering::AcqRel) {
            return Err(SyncError::ProducerTaken);
        }
        Ok(FrameProducer {
            buffer: Arc::clone(self),
        })
    }

    /// Takes the single consumer handle.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConsumerTaken`] while another consumer is alive.
    pub fn consumer(self: &Arc<Self>) -> SyncResult<FrameConsumer> {
        if self.consumer_taken.swap(true, Ordering::AcqRel) {
            return Err(SyncError::ConsumerTaken);
        }
        Ok(FrameConsumer {
            buffer: Arc::clone(self),
        })
    }
}

/// Exclusive write side of a [`TripleBuffer`].
pub struct FrameProducer {
    buffer: Arc<TripleBuffer>,
}

impl FrameProducer {
    /// Starts painting the active buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unallocated`] on a zero-sized surface.
    pub fn begin(&mut self) -> SyncResult<WriteFrame<'_>> {
        let storage = self.buffer.storage.read();
        if !storage.is_allocated() {
            return Err(SyncError::Unallocated {
                width: storage.width,
                height: storage.height,
            });
        }
        let index = self.buffer.roles.read().active;
        Ok(WriteFrame {
            storage,
            roles: &self.buffer.roles,
            index,
        })
    }

    /// The shared buffer.
    #[must_use]
    pub fn buffer(&self) -> &Arc<TripleBuffer> {
        &self.buffer
    }
}

impl Drop for FrameProducer {
    fn drop(&mut self) {
        self.buffer.producer_taken.store(false, Ordering::Release);
    }
}

/// The active buffer, open for painting.
///
/// Dropping it without [`publish`](Self::publish) discards the frame.
pub struct WriteFrame<'a> {
    storage: RwLockReadGuard<'a, Storage>,
    roles: &'a RwLock<Roles>,
    index: usize,
}

impl WriteFrame<'_> {
    /// Surface width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.storage.width
    }

    /// Surface height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.storage.height
    }

    /// Index of the buffer being written.
    #[inline]
    #[must_use]
    pub const fn buffer_index(&self) -> usize {
        self.index
    }

    /// Mutable pixels of the active buffer.
    ///
    /// Must not be used while column writers from this frame are alive.
    #[must_use]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        // SAFETY: the active store is only reachable through this frame
        unsafe { self.storage.stores[self.index].as_mut_slice() }
    }

    /// Paints every pixel with one color.
    pub fn fill(&mut self, color: u32) {
        self.pixels_mut().fill(color);
    }

    /// Creates a writer restricted to a range of columns.
    ///
    /// The range is clamped to the surface width.
    ///
    /// # Safety
    ///
    /// - Ranges of writers alive at the same time must not overlap.
    /// - Every writer must be dropped before this frame is published,
    ///   dropped, or used through [`pixels_mut`](Self::pixels_mut).
    #[must_use]
    pub unsafe fn column_writer(&self, columns: Range<usize>) -> ColumnWriter {
        let end = columns.end.min(self.width());
        let start = columns.start.min(end);
        ColumnWriter {
            pixels: self.storage.stores[self.index].as_mut_ptr(),
            width: self.width(),
            height: self.height(),
            columns: start..end,
        }
    }

    /// Finishes the frame: `active <-> complete`, counter + 1.
    ///
    /// Returns the new frame count.
    pub fn publish(self) -> u64 {
        let mut roles = self.roles.write();
        let finished = roles.active;
        roles.active = roles.complete;
        roles.complete = finished;
        roles.frame_count += 1;
        roles.frame_count
    }
}

/// Write access to a column range of the active buffer.
///
/// Sent to a render worker for one frame.
pub struct ColumnWriter {
    pixels: *mut u32,
    width: usize,
    height: usize,
    columns: Range<usize>,
}

// SAFETY: a writer only touches its own disjoint columns (see `column_writer`)
unsafe impl Send for ColumnWriter {}

impl ColumnWriter {
    /// Columns this writer may paint.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> Range<usize> {
        self.columns.clone()
    }

    /// Surface width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Surface height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Paints rows `[top, bottom)` of column `x`.
    ///
    /// Columns outside this writer's range are ignored and rows are clamped
    /// to the surface.
    #[inline]
    pub fn draw_vline(&mut self, x: usize, top: usize, bottom: usize, color: u32) {
        if !self.columns.contains(&x) {
            return;
        }
        let bottom = bottom.min(self.height);
        for y in top..bottom {
            // SAFETY: x is in this writer's exclusive range, y < height
            unsafe { self.pixels.add(y * self.width + x).write(color) };
        }
    }
}

/// Exclusive read side of a [`TripleBuffer`].
pub struct FrameConsumer {
    buffer: Arc<TripleBuffer>,
}

impl FrameConsumer {
    /// Returns the newest finished frame.
    ///
    /// If nothing was published since the last call, the same buffer is
    /// returned and no role changes. The view borrows the consumer, so it is
    /// gone before the next call.
    pub fn take_frame(&mut self) -> FrameView<'_> {
        let storage = self.buffer.storage.read();
        let (index, frame_count) = {
            let mut roles = self.buffer.roles.write();
            if roles.last_taken != Some(roles.frame_count) {
                let fresh = roles.complete;
                roles.complete = roles.published;
                roles.published = fresh;
                roles.last_taken = Some(roles.frame_count);
            }
            (roles.published, roles.frame_count)
        };
        FrameView {
            storage,
            index,
            frame_count,
        }
    }

    /// The shared buffer.
    #[must_use]
    pub fn buffer(&self) -> &Arc<TripleBuffer> {
        &self.buffer
    }
}

impl Drop for FrameConsumer {
    fn drop(&mut self) {
        self.buffer.consumer_taken.store(false, Ordering::Release);
    }
}

/// Read-only view of the published buffer.
///
/// Packed RGBA, row-major, `width * height` pixels.
pub struct FrameView<'a> {
    storage: RwLockReadGuard<'a, Storage>,
    index: usize,
    frame_count: u64,
}

impl FrameView<'_> {
    /// Surface width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.storage.width
    }

    /// Surface height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.storage.height
    }

    /// Index of the published buffer.
    #[inline]
    #[must_use]
    pub const fn buffer_index(&self) -> usize {
        self.index
    }

    /// Frame counter when this view was taken.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Deref for FrameView<'_> {
    type Target = [u32];

    #[inline]
    fn deref(&self) -> &[u32] {
        // SAFETY: the producer never writes the published store
        unsafe { self.storage.stores[self.index].as_slice() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    fn render(producer: &mut FrameProducer, color: u32) -> u64 {
        let mut frame = producer.begin().unwrap();
        frame.fill(color);
        frame.publish()
    }

    #[test]
    fn test_creation() {
        let frames = TripleBuffer::new(8, 4).unwrap();
        assert_eq!(frames.dimensions(), (8, 4));
        assert_eq!(frames.frame_count(), 0);
        let roles = frames.roles();
        assert_ne!(roles.active, roles.complete);
        assert_ne!(roles.active, roles.published);
        assert_ne!(roles.complete, roles.published);
    }

    #[test]
    fn test_zero_surface_cannot_begin() {
        let frames = TripleBuffer::new(0, 0).unwrap();
        let mut producer = frames.producer().unwrap();
        assert_eq!(
            producer.begin().err(),
            Some(SyncError::Unallocated {
                width: 0,
                height: 0
            })
        );

        frames.resize(2, 2).unwrap();
        assert!(producer.begin().is_ok());
    }

    #[test]
    fn test_oversized_rejected() {
        assert!(matches!(
            TripleBuffer::new(usize::MAX, 2),
            Err(SyncError::Oversized { .. })
        ));

        let frames = TripleBuffer::new(4, 4).unwrap();
        assert!(frames.resize(MAX_PIXELS, 2).is_err());
        assert_eq!(frames.dimensions(), (4, 4));
    }

    #[test]
    fn test_single_producer_and_consumer() {
        let frames = TripleBuffer::new(2, 2).unwrap();

        let producer = frames.producer().unwrap();
        assert_eq!(frames.producer().err(), Some(SyncError::ProducerTaken));
        drop(producer);
        assert!(frames.producer().is_ok());

        let _consumer = frames.consumer().unwrap();
        assert_eq!(frames.consumer().err(), Some(SyncError::ConsumerTaken));
    }

    #[test]
    fn test_n_publishes_advance_counter_by_n() {
        let frames = TripleBuffer::new(4, 4).unwrap();
        let mut producer = frames.producer().unwrap();
        for n in 1..=10 {
            assert_eq!(render(&mut producer, n as u32), n);
        }
        assert_eq!(frames.frame_count(), 10);
    }

    #[test]
    fn test_discarded_frame_does_not_count() {
        let frames = TripleBuffer::new(4, 4).unwrap();
        let mut producer = frames.producer().unwrap();
        {
            let mut frame = producer.begin().unwrap();
            frame.fill(7);
        }
        assert_eq!(frames.frame_count(), 0);
    }

    #[test]
    fn test_take_twice_returns_same_buffer() {
        let frames = TripleBuffer::new(4, 4).unwrap();
        let mut producer = frames.producer().unwrap();
        let mut consumer = frames.consumer().unwrap();

        render(&mut producer, 0xaabb_ccdd);

        let (first_index, first_pixels) = {
            let view = consumer.take_frame();
            (view.buffer_index(), view.to_vec())
        };
        let roles_after_first = frames.roles();

        let view = consumer.take_frame();
        assert_eq!(view.buffer_index(), first_index);
        assert_eq!(&*view, first_pixels.as_slice());
        assert!(view.iter().all(|&p| p == 0xaabb_ccdd));
        drop(view);
        assert_eq!(frames.roles(), roles_after_first);
    }

    #[test]
    fn test_consumer_sees_newest_frame() {
        let frames = TripleBuffer::new(3, 3).unwrap();
        let mut producer = frames.producer().unwrap();
        let mut consumer = frames.consumer().unwrap();

        render(&mut producer, 1);
        render(&mut producer, 2);
        render(&mut producer, 3);

        let view = consumer.take_frame();
        assert_eq!(view.frame_count(), 3);
        assert!(view.iter().all(|&p| p == 3));
    }

    #[test]
    fn test_producer_never_writes_published_buffer() {
        let frames = TripleBuffer::new(2, 2).unwrap();
        let mut producer = frames.producer().unwrap();
        let mut consumer = frames.consumer().unwrap();

        for n in 0..20u32 {
            // Skip some takes so the producer runs ahead
            if n % 3 != 0 {
                let _ = consumer.take_frame();
            }
            let published = frames.roles().published;
            let frame = producer.begin().unwrap();
            assert_ne!(frame.buffer_index(), published);
            frame.publish();
        }
    }

    #[test]
    fn test_column_writers_paint_disjoint_ranges() {
        let frames = TripleBuffer::new(4, 3).unwrap();
        let mut producer = frames.producer().unwrap();
        let mut consumer = frames.consumer().unwrap();

        let mut frame = producer.begin().unwrap();
        frame.fill(0);
        // SAFETY: ranges are disjoint and both writers are joined before publish
        let (mut left, mut right) = unsafe { (frame.column_writer(0..2), frame.column_writer(2..9)) };
        assert_eq!(right.columns(), 2..4);

        let handle = thread::spawn(move || {
            for x in right.columns() {
                right.draw_vline(x, 1, 100, 2);
            }
            // Outside the range, ignored
            right.draw_vline(0, 0, 3, 99);
        });
        for x in left.columns() {
            left.draw_vline(x, 0, 1, 1);
        }
        handle.join().unwrap();
        drop(left);
        frame.publish();

        let view = consumer.take_frame();
        assert_eq!(
            view.to_vec(),
            vec![
                1u32, 1, 0, 0, //
                0, 0, 2, 2, //
                0, 0, 2, 2, //
            ]
        );
    }

    #[test]
    fn test_resize_zeroes_buffers() {
        let frames = TripleBuffer::new(2, 2).unwrap();
        let mut producer = frames.producer().unwrap();
        let mut consumer = frames.consumer().unwrap();
        render(&mut producer, 5);

        frames.resize(3, 1).unwrap();
        let view = consumer.take_frame();
        assert_eq!((view.width(), view.height()), (3, 1));
        assert_eq!(view.to_vec(), vec![0u32; 3]);
    }

    #[test]
    fn test_resize_waits_for_open_view() {
        let frames = TripleBuffer::new(2, 2).unwrap();
        let mut consumer = frames.consumer().unwrap();
        let resized = Arc::new(AtomicBool::new(false));

        let view = consumer.take_frame();
        let handle = {
            let frames = Arc::clone(&frames);
            let resized = Arc::clone(&resized);
            thread::spawn(move || {
                frames.resize(8, 8).unwrap();
                resized.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!resized.load(Ordering::SeqCst));
        assert_eq!(view.len(), 4);
        drop(view);

        handle.join().unwrap();
        assert!(resized.load(Ordering::SeqCst));
        assert_eq!(frames.dimensions(), (8, 8));
    }
}

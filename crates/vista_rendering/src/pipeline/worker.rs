//! Render worker threads and their command protocol.
//!
//! ```text
//! orchestrator ── Command::Render ──▶ worker      (bounded(1))
//! orchestrator ◀── Ack::Done ──────── worker      (bounded(1))
//! ```
//!
//! At most one command is in flight per worker. The worker drops its column
//! writer before acknowledging, so after every ack is in the frame can be
//! published.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};
use vista_core::ColumnWriter;
use vista_procedural::TileSampler;

use super::stats::WorkerReport;
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::raymarch::ColumnRayMarcher;

/// Orchestrator to worker.
pub(crate) enum Command {
    /// Paint the writer's columns from this camera.
    Render {
        /// Pose snapshot for the frame.
        camera: Camera,
        /// Exclusive column range of the active buffer.
        writer: ColumnWriter,
    },
    /// Exit the worker loop.
    Stop,
}

/// Worker to orchestrator.
#[derive(Debug)]
pub(crate) enum Ack {
    /// Columns painted.
    Done(WorkerReport),
    /// The command was not carried out.
    Rejected {
        /// Why.
        reason: String,
    },
}

/// Orchestrator side of one worker.
pub(crate) struct WorkerHandle {
    index: usize,
    commands: Sender<Command>,
    acks: Receiver<Ack>,
    thread: Option<JoinHandle<()>>,
    pending: bool,
}

impl WorkerHandle {
    pub(crate) fn spawn<M>(index: usize, map: Arc<M>, marcher: ColumnRayMarcher) -> RenderResult<Self>
    where
        M: TileSampler + ?Sized + 'static,
    {
        let (command_tx, command_rx) = bounded(1);
        let (ack_tx, ack_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name(format!("vista-worker-{index}"))
            .spawn(move || worker_loop(index, &*map, marcher, &command_rx, &ack_tx))
            .map_err(|source| RenderError::WorkerSpawn { index, source })?;

        Ok(Self {
            index,
            commands: command_tx,
            acks: ack_rx,
            thread: Some(thread),
            pending: false,
        })
    }

    #[inline]
    pub(crate) const fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub(crate) const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Sends a render command.
    pub(crate) fn dispatch(&mut self, camera: Camera, writer: ColumnWriter) -> RenderResult<()> {
        if self.pending {
            return Err(RenderError::Busy(self.index));
        }
        self.commands
            .send(Command::Render { camera, writer })
            .map_err(|_| RenderError::WorkerDisconnected(self.index))?;
        self.pending = true;
        Ok(())
    }

    /// Blocks for the acknowledgement of the pending command.
    pub(crate) fn wait(&mut self) -> RenderResult<Ack> {
        let ack = self
            .acks
            .recv()
            .map_err(|_| RenderError::WorkerDisconnected(self.index));
        self.pending = false;
        ack
    }

    /// Sends `Stop` and joins the thread.
    pub(crate) fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.commands.send(Command::Stop);
        if thread.join().is_err() {
            tracing::warn!("Render worker {} panicked", self.index);
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop<M>(
    index: usize,
    map: &M,
    marcher: ColumnRayMarcher,
    commands: &Receiver<Command>,
    acks: &Sender<Ack>,
) where
    M: TileSampler + ?Sized,
{
    let mut hidden = Vec::new();

    while let Ok(command) = commands.recv() {
        let Command::Render { camera, mut writer } = command else {
            break;
        };

        let columns = writer.columns();
        let ack = if columns.is_empty() {
            Ack::Rejected {
                reason: "empty column range".into(),
            }
        } else {
            let start = Instant::now();
            let marched = panic::catch_unwind(AssertUnwindSafe(|| {
                marcher.march(map, &camera, &mut writer, &mut hidden)
            }));
            match marched {
                Ok(march) => Ack::Done(WorkerReport {
                    index,
                    columns,
                    march,
                    elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
                }),
                Err(_) => Ack::Rejected {
                    reason: format!("marching columns {columns:?} panicked"),
                },
            }
        };
        drop(writer);

        if acks.send(ack).is_err() {
            break;
        }
    }

    tracing::debug!("Render worker {} stopped", index);
}

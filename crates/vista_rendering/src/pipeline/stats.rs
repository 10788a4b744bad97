//! Frame and worker statistics.

use std::ops::Range;

use crate::raymarch::MarchStats;

/// What one worker did for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    /// Worker index.
    pub index: usize,
    /// Columns painted.
    pub columns: Range<usize>,
    /// Marcher counters.
    pub march: MarchStats,
    /// Wall time spent marching, in milliseconds.
    pub elapsed_ms: f64,
}

/// Outcome of one published frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Frame counter after publication.
    pub frame_number: u64,
    /// Sky fill to publish, in milliseconds.
    pub render_ms: f64,
    /// Reports from workers that finished.
    pub workers: Vec<WorkerReport>,
    /// Workers that rejected their command.
    pub rejected: usize,
}

impl FrameReport {
    /// Frames per second at this frame's render time.
    #[must_use]
    pub fn fps(&self) -> f64 {
        if self.render_ms > 0.0 {
            1000.0 / self.render_ms
        } else {
            0.0
        }
    }

    /// Marcher counters summed over all workers.
    #[must_use]
    pub fn march_totals(&self) -> MarchStats {
        let mut totals = MarchStats::default();
        for worker in &self.workers {
            totals.merge(&worker.march);
        }
        totals
    }

    /// Returns true if the frame came in under `budget_ms`.
    #[must_use]
    pub fn within_budget(&self, budget_ms: f64) -> bool {
        self.render_ms <= budget_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps() {
        let report = FrameReport {
            render_ms: 20.0,
            ..FrameReport::default()
        };
        assert!((report.fps() - 50.0).abs() < 1e-12);
        assert_eq!(FrameReport::default().fps(), 0.0);
    }

    #[test]
    fn test_march_totals() {
        let worker = |index, samples| WorkerReport {
            index,
            columns: 0..1,
            march: MarchStats {
                slices: 10,
                samples,
                spans: 1,
            },
            elapsed_ms: 1.0,
        };
        let report = FrameReport {
            workers: vec![worker(0, 5), worker(1, 7)],
            ..FrameReport::default()
        };
        assert_eq!(
            report.march_totals(),
            MarchStats {
                slices: 10,
                samples: 12,
                spans: 2,
            }
        );
    }
}

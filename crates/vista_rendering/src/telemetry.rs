//! Render-time telemetry.
//!
//! The render loop reports each frame's render time to a [`MetricsSink`].
//! [`SampleLog`] is the in-process sink: an append-only list of samples
//! with a running summary.

use parking_lot::Mutex;

/// Receives per-frame timings.
pub trait MetricsSink: Send + Sync {
    /// Records one frame's render time in milliseconds.
    fn record_render_time(&self, ms: f64);
}

/// Summary over every recorded sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TelemetrySummary {
    /// Samples recorded.
    pub count: usize,
    /// Mean render time.
    pub average_ms: f64,
    /// Slowest render time.
    pub worst_ms: f64,
    /// Most recent render time.
    pub last_ms: f64,
}

#[derive(Default)]
struct LogState {
    samples: Vec<f64>,
    total_ms: f64,
    worst_ms: f64,
}

/// Append-only render time log.
#[derive(Default)]
pub struct SampleLog {
    state: Mutex<LogState>,
}

impl SampleLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every sample, oldest first.
    #[must_use]
    pub fn samples(&self) -> Vec<f64> {
        self.state.lock().samples.clone()
    }

    /// Running summary.
    #[must_use]
    pub fn summary(&self) -> TelemetrySummary {
        let state = self.state.lock();
        let count = state.samples.len();
        TelemetrySummary {
            count,
            average_ms: if count == 0 {
                0.0
            } else {
                state.total_ms / count as f64
            },
            worst_ms: state.worst_ms,
            last_ms: state.samples.last().copied().unwrap_or(0.0),
        }
    }
}

impl MetricsSink for SampleLog {
    fn record_render_time(&self, ms: f64) {
        let mut state = self.state.lock();
        state.samples.push(ms);
        state.total_ms += ms;
        state.worst_ms = state.worst_ms.max(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        assert_eq!(SampleLog::new().summary(), TelemetrySummary::default());
    }

    #[test]
    fn test_summary_tracks_samples() {
        let log = SampleLog::new();
        for ms in [4.0, 10.0, 6.0] {
            log.record_render_time(ms);
        }
        let summary = log.summary();
        assert_eq!(summary.count, 3);
        assert!((summary.average_ms - 20.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.worst_ms, 10.0);
        assert_eq!(summary.last_ms, 6.0);
        assert_eq!(log.samples(), vec![4.0, 10.0, 6.0]);
    }

    #[test]
    fn test_sink_is_object_safe() {
        let log = std::sync::Arc::new(SampleLog::new());
        let sink: std::sync::Arc<dyn MetricsSink> = log.clone();
        sink.record_render_time(1.5);
        assert_eq!(log.summary().count, 1);
    }
}

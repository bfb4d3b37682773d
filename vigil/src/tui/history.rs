//! Rolling history for the drill-down trend graphs.
//!
//! Bounded, in-memory, per-session: one ring buffer per metric for the one
//! drilled-down process, filled once per refresh tick and cleared when the
//! drill-down exits.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::metrics::snapshot::ProcessRecord;

pub const DEFAULT_CAPACITY: usize = 60;

/// Fixed-capacity FIFO of metric samples, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }
}

/// Per-tick recorder for the drilled-down process.
///
/// Rendering runs more often than the sampler publishes, so appends are
/// gated by wall-clock elapsed against the refresh interval rather than by
/// render calls.
#[derive(Debug)]
pub struct DetailHistory {
    pub cpu: HistoryBuffer,
    pub memory: HistoryBuffer,
    pub network: HistoryBuffer,
    last_sample: Instant,
    target_missing: bool,
}

impl DetailHistory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cpu: HistoryBuffer::new(capacity),
            memory: HistoryBuffer::new(capacity),
            network: HistoryBuffer::new(capacity),
            last_sample: Instant::now(),
            target_missing: false,
        }
    }

    /// Reset buffers and the missing flag; used on every drill-down
    /// transition, entering and leaving alike.
    pub fn clear(&mut self) {
        self.cpu.clear();
        self.memory.clear();
        self.network.clear();
        self.target_missing = false;
    }

    /// Stamp the sample clock, starting the first gating interval.
    pub fn mark(&mut self, now: Instant) {
        self.last_sample = now;
    }

    /// Record one sample for the drilled process, at most once per
    /// `interval`. A `None` record means the pid left the snapshot:
    /// recording stops until the next drill-down.
    pub fn record(&mut self, record: Option<&ProcessRecord>, interval: Duration, now: Instant) {
        if self.target_missing {
            return;
        }
        let Some(record) = record else {
            self.target_missing = true;
            return;
        };
        if now.duration_since(self.last_sample) < interval {
            return;
        }

        #[allow(clippy::cast_precision_loss)]
        {
            self.cpu.push(record.cpu_percent);
            self.memory.push(record.memory_kb as f64);
            self.network.push(record.net_delta as f64);
        }
        self.last_sample = now;
    }

    #[must_use]
    pub fn target_missing(&self) -> bool {
        self.target_missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pid;

    fn record(cpu: f64) -> ProcessRecord {
        ProcessRecord {
            pid: Pid(1),
            name: "x".to_string(),
            memory_kb: 100,
            cpu_percent: cpu,
            net_delta: 10,
            elapsed_secs: 1,
            command: String::new(),
        }
    }

    #[test]
    fn test_buffer_keeps_newest_capacity_samples_oldest_first() {
        let mut buffer = HistoryBuffer::new(60);
        for i in 0..70 {
            buffer.push(f64::from(i));
        }
        assert_eq!(buffer.len(), 60);
        let samples: Vec<f64> = buffer.iter().collect();
        assert_eq!(samples[0], 10.0);
        assert_eq!(samples[59], 69.0);
    }

    #[test]
    fn test_record_gated_by_interval() {
        let interval = Duration::from_millis(500);
        let mut history = DetailHistory::new(60);
        let start = Instant::now();
        history.mark(start);

        // Renders arriving faster than the refresh interval
        history.record(Some(&record(1.0)), interval, start + Duration::from_millis(100));
        history.record(Some(&record(2.0)), interval, start + Duration::from_millis(400));
        assert!(history.cpu.is_empty());

        history.record(Some(&record(3.0)), interval, start + Duration::from_millis(600));
        assert_eq!(history.cpu.len(), 1);
        assert_eq!(history.cpu.iter().next(), Some(3.0));

        // Gate restarts from the accepted sample
        history.record(Some(&record(4.0)), interval, start + Duration::from_millis(700));
        assert_eq!(history.cpu.len(), 1);
    }

    #[test]
    fn test_missing_target_stops_recording() {
        let interval = Duration::from_millis(1);
        let mut history = DetailHistory::new(60);
        let start = Instant::now();
        history.mark(start);

        history.record(Some(&record(1.0)), interval, start + Duration::from_millis(10));
        assert_eq!(history.cpu.len(), 1);

        history.record(None, interval, start + Duration::from_millis(20));
        assert!(history.target_missing());

        // Even a reappearing record is ignored until the next drill-down
        history.record(Some(&record(2.0)), interval, start + Duration::from_millis(30));
        assert_eq!(history.cpu.len(), 1);
    }

    #[test]
    fn test_clear_resets_buffers_and_missing_flag() {
        let mut history = DetailHistory::new(60);
        let start = Instant::now();
        history.mark(start);
        history.record(Some(&record(1.0)), Duration::ZERO, start + Duration::from_millis(1));
        history.record(None, Duration::ZERO, start + Duration::from_millis(2));
        assert!(history.target_missing());

        history.clear();
        assert!(history.cpu.is_empty());
        assert!(history.memory.is_empty());
        assert!(history.network.is_empty());
        assert!(!history.target_missing());
    }
}

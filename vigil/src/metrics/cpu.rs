//! CPU utilization estimation from cumulative counters.
//!
//! A single `/proc/stat` reading has no utilization meaning; two readings
//! separated by a known wall-clock interval do. [`estimate`] turns a pair of
//! [`HostCounterSample`]s into percentages for the aggregate `"cpu"` label
//! and for each `"cpuN"` core label. A non-positive total delta (counter
//! anomaly, interval too short) yields `None`, never a false zero.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::domain::CounterError;

/// Cumulative CPU-time-by-mode counters for one label, in clock ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuTimes {
    /// Total elapsed ticks. Guest time is already folded into user/nice by
    /// the kernel, so it is not summed again.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Idle ticks; iowait counts as idle.
    #[must_use]
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// One full reading of all CPU labels at one instant.
#[derive(Debug, Clone)]
pub struct HostCounterSample {
    pub taken_at: Instant,
    pub labels: BTreeMap<String, CpuTimes>,
}

impl HostCounterSample {
    #[must_use]
    pub fn new(labels: BTreeMap<String, CpuTimes>) -> Self {
        Self { taken_at: Instant::now(), labels }
    }
}

/// Source of raw cumulative CPU counters, keyed by label (`"cpu"`, `"cpu0"`, ...).
pub trait HostCounterSource: Send {
    /// # Errors
    /// Returns an error if the underlying counter file cannot be read or
    /// carries no aggregate line. The sampler treats this as an undefined
    /// utilization for the tick, not as a fatal condition.
    fn read_cpu_counters(&mut self) -> Result<BTreeMap<String, CpuTimes>, CounterError>;
}

/// `/proc/stat` implementation of [`HostCounterSource`].
pub struct ProcStat {
    path: PathBuf,
}

impl ProcStat {
    #[must_use]
    pub fn new() -> Self {
        Self { path: PathBuf::from("/proc/stat") }
    }

    /// Read from an alternate stat file (tests).
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcStat {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCounterSource for ProcStat {
    fn read_cpu_counters(&mut self) -> Result<BTreeMap<String, CpuTimes>, CounterError> {
        let content = fs::read_to_string(&self.path)?;
        parse_cpu_counters(&content)
    }
}

/// Parse the `cpu*` lines of a `/proc/stat` style document.
///
/// Kernels older than 2.6.33 emit fewer than ten numeric fields; missing
/// trailing fields read as zero.
///
/// # Errors
/// Returns [`CounterError::MissingAggregate`] when no `cpu ` line is present
/// and [`CounterError::Malformed`] when a cpu line has unparseable or too few
/// numeric fields.
pub fn parse_cpu_counters(content: &str) -> Result<BTreeMap<String, CpuTimes>, CounterError> {
    let mut labels = BTreeMap::new();

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else { continue };
        if !label.starts_with("cpu") {
            continue;
        }

        let mut values = [0u64; 10];
        let mut parsed = 0;
        for slot in &mut values {
            match fields.next() {
                Some(raw) => {
                    *slot = raw
                        .parse()
                        .map_err(|_| CounterError::Malformed(line.to_string()))?;
                    parsed += 1;
                }
                None => break,
            }
        }
        // user, nice, system, idle at minimum
        if parsed < 4 {
            return Err(CounterError::Malformed(line.to_string()));
        }

        labels.insert(
            label.to_string(),
            CpuTimes {
                user: values[0],
                nice: values[1],
                system: values[2],
                idle: values[3],
                iowait: values[4],
                irq: values[5],
                softirq: values[6],
                steal: values[7],
                guest: values[8],
                guest_nice: values[9],
            },
        );
    }

    if !labels.contains_key("cpu") {
        return Err(CounterError::MissingAggregate);
    }
    Ok(labels)
}

/// Utilization percentage between two readings of the same label.
///
/// Returns `None` when the total delta is non-positive; callers must not
/// plot that as zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn utilization(first: &CpuTimes, second: &CpuTimes) -> Option<f64> {
    let total_diff = i128::from(second.total()) - i128::from(first.total());
    if total_diff <= 0 {
        return None;
    }
    let idle_diff = i128::from(second.idle_total()) - i128::from(first.idle_total());
    Some(100.0 * (total_diff - idle_diff) as f64 / total_diff as f64)
}

/// Derived utilization for one tick: the aggregate plus each logical core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuUtilization {
    /// Aggregate `"cpu"` label; `None` when undefined for this tick.
    pub overall: Option<f64>,
    /// Per-core readings ordered by core index; `None` entries are cores
    /// whose counters were anomalous or absent from the first sample.
    pub per_core: Vec<Option<f64>>,
}

impl CpuUtilization {
    /// Core count as observed from the per-core labels.
    #[must_use]
    pub fn core_count(&self) -> usize {
        self.per_core.len()
    }
}

/// Estimate utilization for every label present in the second sample.
///
/// Core count derives from the distinct `cpuN` labels observed; a label that
/// appears in only one of the two samples reads as undefined.
#[must_use]
pub fn estimate(first: &HostCounterSample, second: &HostCounterSample) -> CpuUtilization {
    let overall = match (first.labels.get("cpu"), second.labels.get("cpu")) {
        (Some(a), Some(b)) => utilization(a, b),
        _ => None,
    };

    // BTreeMap orders "cpu10" before "cpu2"; order by the numeric index instead.
    let mut cores: Vec<(usize, Option<f64>)> = second
        .labels
        .iter()
        .filter_map(|(label, times)| {
            let index: usize = label.strip_prefix("cpu")?.parse().ok()?;
            let value = first.labels.get(label).and_then(|prev| utilization(prev, times));
            Some((index, value))
        })
        .collect();
    cores.sort_unstable_by_key(|(index, _)| *index);

    CpuUtilization { overall, per_core: cores.into_iter().map(|(_, value)| value).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(user: u64, system: u64, idle: u64, iowait: u64) -> CpuTimes {
        CpuTimes { user, system, idle, iowait, ..CpuTimes::default() }
    }

    #[test]
    fn test_utilization_basic() {
        let first = times(100, 50, 800, 0);
        let second = times(150, 100, 850, 0);
        // 100 busy ticks out of 150 total
        let value = utilization(&first, &second).unwrap();
        assert!((value - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_utilization_iowait_counts_as_idle() {
        let first = times(100, 0, 100, 100);
        let second = times(100, 0, 150, 150);
        // All elapsed ticks were idle or iowait
        assert_eq!(utilization(&first, &second), Some(0.0));
    }

    #[test]
    fn test_utilization_undefined_on_non_positive_total_diff() {
        let sample = times(100, 50, 800, 0);
        assert_eq!(utilization(&sample, &sample), None);

        // Counter went backwards (reset anomaly)
        let earlier = times(50, 20, 400, 0);
        assert_eq!(utilization(&sample, &earlier), None);
    }

    #[test]
    fn test_utilization_stays_in_bounds() {
        let first = times(0, 0, 0, 0);
        for idle in [0u64, 25, 50, 100] {
            let second = times(100 - idle, 0, idle, 0);
            let value = utilization(&first, &second).unwrap();
            assert!((0.0..=100.0).contains(&value), "out of bounds: {value}");
        }
    }

    #[test]
    fn test_parse_cpu_counters() {
        let content = "\
cpu  100 5 50 800 20 3 2 1 0 0
cpu0 60 3 30 400 10 2 1 1 0 0
cpu1 40 2 20 400 10 1 1 0 0 0
intr 12345
ctxt 67890
";
        let labels = parse_cpu_counters(content).unwrap();
        assert_eq!(labels.len(), 3);
        let aggregate = labels["cpu"];
        assert_eq!(aggregate.user, 100);
        assert_eq!(aggregate.iowait, 20);
        assert_eq!(aggregate.total(), 981);
        assert_eq!(aggregate.idle_total(), 820);
    }

    #[test]
    fn test_parse_tolerates_short_lines() {
        // Pre-2.6.33 format: no steal/guest fields
        let labels = parse_cpu_counters("cpu 10 0 5 100 2 1 1\n").unwrap();
        assert_eq!(labels["cpu"].steal, 0);
        assert_eq!(labels["cpu"].guest_nice, 0);
    }

    #[test]
    fn test_parse_rejects_missing_aggregate() {
        assert!(matches!(
            parse_cpu_counters("cpu0 1 2 3 4\n"),
            Err(CounterError::MissingAggregate)
        ));
    }

    #[test]
    fn test_parse_rejects_garbage_fields() {
        assert!(matches!(
            parse_cpu_counters("cpu 1 2 x 4\n"),
            Err(CounterError::Malformed(_))
        ));
    }

    #[test]
    fn test_estimate_orders_cores_numerically() {
        let mut first = BTreeMap::new();
        let mut second = BTreeMap::new();
        first.insert("cpu".to_string(), times(0, 0, 100, 0));
        second.insert("cpu".to_string(), times(100, 0, 100, 0));
        for (index, busy) in [(0u32, 10u64), (1, 20), (2, 30), (10, 40)] {
            first.insert(format!("cpu{index}"), times(0, 0, 100, 0));
            // 100 elapsed ticks, `busy` of them busy
            second.insert(format!("cpu{index}"), times(busy, 0, 200 - busy, 0));
        }

        let result =
            estimate(&HostCounterSample::new(first), &HostCounterSample::new(second));
        assert_eq!(result.core_count(), 4);
        // cpu10 must come last despite sorting before "cpu2" lexicographically
        let values: Vec<f64> = result.per_core.iter().map(|v| v.unwrap()).collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(result.overall, Some(100.0));
    }

    #[test]
    fn test_estimate_label_missing_from_first_sample_is_undefined() {
        let mut first = BTreeMap::new();
        let mut second = BTreeMap::new();
        first.insert("cpu".to_string(), times(0, 0, 100, 0));
        second.insert("cpu".to_string(), times(50, 0, 150, 0));
        // A core that was offline during the first read
        second.insert("cpu0".to_string(), times(50, 0, 150, 0));

        let result =
            estimate(&HostCounterSample::new(first), &HostCounterSample::new(second));
        assert_eq!(result.per_core, vec![None]);
        assert!(result.overall.is_some());
    }
}

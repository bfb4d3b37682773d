//! Background sampling loop.
//!
//! A dedicated thread that periodically refreshes the shared snapshot:
//! provider refresh, per-process network deltas, a double CPU counter read
//! separated by a short probe pause, then an atomic publish and a redraw
//! signal. A failed provider tick publishes an empty snapshot and the loop
//! keeps running; no single bad tick terminates it.
//!
//! Cancellation is cooperative: both the period wait and the probe pause
//! are waits on the stop channel, so [`SamplerHandle::stop`] interrupts
//! them immediately instead of timing out.

use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use crate::metrics::cpu::{estimate, HostCounterSample, HostCounterSource};
use crate::metrics::net::{ByteProxySource, NetworkDeltaTracker};
use crate::metrics::provider::{read_memory_info, MetricsProvider};
use crate::metrics::snapshot::{HostMetrics, ProcessRecord, SharedSnapshot, Snapshot};

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Tick period.
    pub period: Duration,
    /// Pause between the two CPU counter probes within one tick.
    pub probe_pause: Duration,
    /// Root for host-level readings (`meminfo`).
    pub proc_root: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(500),
            probe_pause: Duration::from_millis(100),
            proc_root: PathBuf::from("/proc"),
        }
    }
}

/// Handle to the running sampler thread.
pub struct SamplerHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Interrupt the sampler's current wait. After this returns the loop
    /// publishes no further snapshots.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    /// Wait for the sampler thread to finish. Call after [`stop`].
    ///
    /// [`stop`]: SamplerHandle::stop
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Everything the sampler reads from; owned by the loop for its lifetime.
pub struct SamplerSources {
    pub provider: Box<dyn MetricsProvider>,
    pub counters: Box<dyn HostCounterSource>,
    pub bytes: Box<dyn ByteProxySource>,
    pub tracker: NetworkDeltaTracker,
}

/// Spawn the sampling loop on its own thread.
///
/// Each published snapshot is followed by a non-blocking redraw signal on
/// `redraw_tx`; a full channel means a redraw is already pending and the
/// signal is dropped.
#[must_use]
pub fn spawn(
    sources: SamplerSources,
    shared: SharedSnapshot,
    redraw_tx: Sender<()>,
    config: SamplerConfig,
) -> SamplerHandle {
    let (stop_tx, stop_rx) = bounded(1);
    let thread = std::thread::spawn(move || {
        run_loop(sources, &shared, &redraw_tx, &config, &stop_rx);
        debug!("sampler loop finished");
    });
    SamplerHandle { stop_tx, thread: Some(thread) }
}

fn run_loop(
    mut sources: SamplerSources,
    shared: &SharedSnapshot,
    redraw_tx: &Sender<()>,
    config: &SamplerConfig,
    stop_rx: &Receiver<()>,
) {
    loop {
        let Some(snapshot) = take_snapshot(&mut sources, config, stop_rx) else {
            break; // stop arrived mid-tick; publish nothing further
        };
        shared.publish(snapshot);
        let _ = redraw_tx.try_send(());

        match stop_rx.recv_timeout(config.period) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// One tick. `None` means the stop signal arrived during the probe pause.
fn take_snapshot(
    sources: &mut SamplerSources,
    config: &SamplerConfig,
    stop_rx: &Receiver<()>,
) -> Option<Snapshot> {
    let raw = sources.provider.refresh();
    if raw.is_empty() {
        warn!("metrics provider returned no processes; publishing empty snapshot");
        return Some(Snapshot::default());
    }

    let first = read_counters(sources.counters.as_mut());

    // Two time-separated reads are needed for a rate; the pause stays
    // interruptible so shutdown latency is not coupled to it.
    match stop_rx.recv_timeout(config.probe_pause) {
        Err(RecvTimeoutError::Timeout) => {}
        Ok(()) | Err(RecvTimeoutError::Disconnected) => return None,
    }

    let second = read_counters(sources.counters.as_mut());
    let cpu = match (&first, &second) {
        (Some(a), Some(b)) => estimate(a, b),
        _ => crate::metrics::cpu::CpuUtilization::default(),
    };

    let processes: Vec<ProcessRecord> = raw
        .into_iter()
        .map(|record| {
            let current = sources.bytes.cumulative_bytes(record.pid);
            let net_delta = sources.tracker.observe(record.pid, current);
            ProcessRecord {
                pid: record.pid,
                name: record.name,
                memory_kb: record.memory_kb,
                cpu_percent: record.cpu_percent,
                net_delta,
                elapsed_secs: record.elapsed_secs,
                command: record.command,
            }
        })
        .collect();

    let memory = read_memory_info(&config.proc_root).unwrap_or_default();
    let host = HostMetrics {
        cpu,
        mem_total_kb: memory.total_kb,
        mem_available_kb: memory.available_kb,
        process_count: processes.len(),
    };

    Some(Snapshot { processes, host })
}

fn read_counters(source: &mut dyn HostCounterSource) -> Option<HostCounterSample> {
    match source.read_cpu_counters() {
        Ok(labels) => Some(HostCounterSample::new(labels)),
        Err(e) => {
            warn!("cpu counter read failed: {e}");
            None
        }
    }
}

//! Shared process snapshot.
//!
//! One immutable, full-list reading of process and host metrics per tick.
//! The sampler owns writing; the view layer copies out under the lock and
//! computes projections on its copy, so no code holds the lock across a
//! render or a blocking OS call.

use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::Pid;
use crate::metrics::cpu::CpuUtilization;

/// Point-in-time record for one process.
///
/// The pid is the only stable join key across snapshots; every other field
/// is point-in-time. Records are built fresh each tick and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub name: String,
    /// Resident memory, KB.
    pub memory_kb: u64,
    /// May exceed 100 on multi-core hosts.
    pub cpu_percent: f64,
    /// Bytes since the previous sample.
    pub net_delta: u64,
    /// Elapsed running time, seconds.
    pub elapsed_secs: u64,
    pub command: String,
}

/// Host-level aggregates published alongside the process list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostMetrics {
    pub cpu: CpuUtilization,
    pub mem_total_kb: u64,
    pub mem_available_kb: u64,
    pub process_count: usize,
}

impl HostMetrics {
    #[must_use]
    pub fn mem_used_kb(&self) -> u64 {
        self.mem_total_kb.saturating_sub(self.mem_available_kb)
    }
}

/// One full reading taken at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub processes: Vec<ProcessRecord>,
    pub host: HostMetrics,
}

impl Snapshot {
    #[must_use]
    pub fn find(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.processes.iter().find(|record| record.pid == pid)
    }
}

/// The single mutex-guarded snapshot shared between sampler and view.
#[derive(Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<Snapshot>>,
}

impl SharedSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the published snapshot. Sampler-side only.
    pub fn publish(&self, snapshot: Snapshot) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Copy out the current snapshot, waiting for the lock.
    #[must_use]
    pub fn copy(&self) -> Snapshot {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Copy out without blocking. `None` under contention; the caller keeps
    /// working with its previous copy instead of stalling input handling.
    #[must_use]
    pub fn try_copy(&self) -> Option<Snapshot> {
        self.inner.try_lock().ok().map(|guard| guard.clone())
    }

    #[cfg(test)]
    pub(crate) fn lock_for_test(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.inner.lock().unwrap()
    }
}

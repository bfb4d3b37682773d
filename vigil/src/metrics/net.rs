//! Per-process network delta tracking.
//!
//! Cumulative byte-proxy readings become per-refresh deltas here. The
//! tracker is the only place rate state lives across snapshots, so it is
//! constructed once and handed to the sampler explicitly; there is no
//! process-wide singleton.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::domain::Pid;

/// Converts cumulative per-process byte counters into per-refresh deltas.
///
/// Keyed by pid; entries are never evicted. A pid reused by a new process
/// inherits the old baseline and reports one inflated delta on the tick it
/// first appears.
#[derive(Debug, Default)]
pub struct NetworkDeltaTracker {
    last_seen: HashMap<Pid, u64>,
}

impl NetworkDeltaTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta since the previous observation for this pid.
    ///
    /// A decrease reads as a counter reset: the delta is the new absolute
    /// value, never negative. The first observation of a pid reports the
    /// full current value. State updates unconditionally on every call.
    pub fn observe(&mut self, pid: Pid, current: u64) -> u64 {
        let last = self.last_seen.get(&pid).copied().unwrap_or(0);
        let delta = if current >= last { current - last } else { current };
        self.last_seen.insert(pid, current);
        delta
    }

    #[must_use]
    pub fn tracked_pids(&self) -> usize {
        self.last_seen.len()
    }
}

/// Source of the raw cumulative byte-proxy value for one process.
pub trait ByteProxySource: Send {
    /// Current cumulative reading; unreadable processes read as zero.
    fn cumulative_bytes(&self, pid: Pid) -> u64;
}

/// `/proc/<pid>/fd` + `/proc/<pid>/io` implementation of [`ByteProxySource`].
///
/// A process with no open sockets reads as zero; otherwise the proxy is
/// `(read_bytes + write_bytes) / 1024` from the io accounting file.
pub struct ProcIo {
    root: PathBuf,
}

impl ProcIo {
    #[must_use]
    pub fn new() -> Self {
        Self { root: PathBuf::from("/proc") }
    }

    /// Read from an alternate proc root (tests).
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn has_socket_fd(&self, pid: Pid) -> bool {
        let fd_dir = self.root.join(pid.0.to_string()).join("fd");
        let Ok(entries) = fs::read_dir(fd_dir) else { return false };
        entries.filter_map(Result::ok).any(|entry| {
            fs::read_link(entry.path())
                .map(|target| target.to_string_lossy().starts_with("socket:"))
                .unwrap_or(false)
        })
    }
}

impl Default for ProcIo {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteProxySource for ProcIo {
    fn cumulative_bytes(&self, pid: Pid) -> u64 {
        if !self.has_socket_fd(pid) {
            return 0;
        }

        let io_path = self.root.join(pid.0.to_string()).join("io");
        let Ok(content) = fs::read_to_string(io_path) else { return 0 };

        let mut read_bytes = 0u64;
        let mut write_bytes = 0u64;
        for line in content.lines() {
            if let Some(value) = line.strip_prefix("read_bytes: ") {
                read_bytes = value.trim().parse().unwrap_or(0);
            } else if let Some(value) = line.strip_prefix("write_bytes: ") {
                write_bytes = value.trim().parse().unwrap_or(0);
            }
        }
        (read_bytes + write_bytes) / 1024
    }
}

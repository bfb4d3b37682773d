//! Metrics provider boundary.
//!
//! [`MetricsProvider`] is the opaque source of raw per-process records. It
//! is a blocking call with unspecified latency; errors are signaled by
//! returning an empty list, never by unwinding across the sampler boundary.
//!
//! [`ProcProvider`] is the production implementation: it walks a `/proc`
//! tree (configurable root, so tests can point it at a synthetic one) and
//! derives per-process CPU percent from utime+stime deltas against its own
//! previous refresh.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::warn;

use crate::domain::{Pid, ProviderError};

/// Raw per-process reading, one per live process per refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProcess {
    pub pid: Pid,
    pub name: String,
    /// Resident memory, KB.
    pub memory_kb: u64,
    /// Provider-computed CPU percent.
    pub cpu_percent: f64,
    /// Seconds since the process started.
    pub elapsed_secs: u64,
    /// May be empty for kernel threads.
    pub command: String,
}

/// On-demand source of the current full process list.
pub trait MetricsProvider: Send {
    /// Must be safe to call repeatedly. A failed read yields an empty list.
    fn refresh(&mut self) -> Vec<RawProcess>;
}

/// Host memory reading from `/proc/meminfo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub available_kb: u64,
}

#[must_use]
pub fn read_memory_info(root: &Path) -> Option<MemoryInfo> {
    let content = fs::read_to_string(root.join("meminfo")).ok()?;
    parse_meminfo(&content)
}

/// Parse `MemTotal` and `MemAvailable` out of a meminfo document.
#[must_use]
pub fn parse_meminfo(content: &str) -> Option<MemoryInfo> {
    let mut total_kb = None;
    let mut available_kb = None;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total_kb = rest.trim().trim_end_matches(" kB").trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available_kb = rest.trim().trim_end_matches(" kB").trim().parse().ok();
        }
    }
    Some(MemoryInfo { total_kb: total_kb?, available_kb: available_kb? })
}

/// Kernel clock ticks per second, for converting stat file tick counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn clock_ticks_per_sec() -> f64 {
    // SAFETY: sysconf with a constant name has no memory effects
    #[allow(unsafe_code)]
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as f64
    } else {
        100.0
    }
}

/// Page size in KB, for converting statm resident pages.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn page_size_kb() -> u64 {
    // SAFETY: sysconf with a constant name has no memory effects
    #[allow(unsafe_code)]
    let bytes = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if bytes > 0 {
        bytes as u64 / 1024
    } else {
        4
    }
}

/// `/proc` implementation of [`MetricsProvider`].
pub struct ProcProvider {
    root: PathBuf,
    page_kb: u64,
    ticks_per_sec: f64,
    /// pid -> (cumulative utime+stime ticks, when observed)
    prev_cpu: HashMap<Pid, (u64, Instant)>,
}

impl ProcProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::at("/proc")
    }

    /// Walk an alternate proc root (tests).
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_kb: page_size_kb(),
            ticks_per_sec: clock_ticks_per_sec(),
            prev_cpu: HashMap::new(),
        }
    }

    fn read_process(&self, pid: Pid, uptime_secs: f64) -> Result<(RawProcess, u64), ProviderError> {
        let dir = self.root.join(pid.0.to_string());

        let name = fs::read_to_string(dir.join("comm"))?.trim().to_string();

        let statm = fs::read_to_string(dir.join("statm"))?;
        let resident_pages: u64 = statm
            .split_whitespace()
            .nth(1)
            .and_then(|field| field.parse().ok())
            .ok_or_else(|| ProviderError::Malformed {
                path: dir.join("statm").display().to_string(),
                field: "resident",
            })?;

        let stat = fs::read_to_string(dir.join("stat"))?;
        let (cpu_ticks, start_ticks) =
            parse_stat_counters(&stat).ok_or_else(|| ProviderError::Malformed {
                path: dir.join("stat").display().to_string(),
                field: "utime/stime/starttime",
            })?;

        let command = fs::read(dir.join("cmdline"))
            .map(|bytes| {
                String::from_utf8_lossy(&bytes).replace('\0', " ").trim().to_string()
            })
            .unwrap_or_default();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let elapsed_secs =
            (uptime_secs - start_ticks as f64 / self.ticks_per_sec).max(0.0) as u64;

        let record = RawProcess {
            pid,
            name,
            memory_kb: resident_pages * self.page_kb,
            cpu_percent: 0.0, // filled from prev_cpu by the caller
            elapsed_secs,
            command,
        };
        Ok((record, cpu_ticks))
    }

    fn cpu_percent_for(&self, pid: Pid, cpu_ticks: u64, now: Instant) -> f64 {
        let Some(&(prev_ticks, prev_at)) = self.prev_cpu.get(&pid) else { return 0.0 };
        let wall_secs = now.duration_since(prev_at).as_secs_f64();
        if wall_secs <= 0.0 || cpu_ticks < prev_ticks {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let busy_secs = (cpu_ticks - prev_ticks) as f64 / self.ticks_per_sec;
        100.0 * busy_secs / wall_secs
    }

    fn read_uptime(&self) -> Option<f64> {
        let content = fs::read_to_string(self.root.join("uptime")).ok()?;
        content.split_whitespace().next()?.parse().ok()
    }
}

impl Default for ProcProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for ProcProvider {
    fn refresh(&mut self) -> Vec<RawProcess> {
        let Some(uptime_secs) = self.read_uptime() else {
            warn!("cannot read uptime under {}", self.root.display());
            return Vec::new();
        };
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot enumerate {}: {e}", self.root.display());
                return Vec::new();
            }
        };

        let now = Instant::now();
        let mut next_cpu = HashMap::new();
        let mut records = Vec::new();

        for entry in entries.filter_map(Result::ok) {
            let Ok(pid) = entry.file_name().to_string_lossy().parse::<i32>() else {
                continue;
            };
            let pid = Pid(pid);
            // A process may exit between read_dir and the file reads
            let Ok((mut record, cpu_ticks)) = self.read_process(pid, uptime_secs) else {
                continue;
            };
            record.cpu_percent = self.cpu_percent_for(pid, cpu_ticks, now);
            next_cpu.insert(pid, (cpu_ticks, now));
            records.push(record);
        }

        self.prev_cpu = next_cpu;
        records
    }
}

/// Extract `(utime + stime, starttime)` in ticks from a `/proc/<pid>/stat`
/// document. The comm field may contain spaces and parentheses, so parsing
/// starts after the last `)`.
#[must_use]
pub fn parse_stat_counters(stat: &str) -> Option<(u64, u64)> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // rest starts at field 3 (state); utime=14, stime=15, starttime=22
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    let starttime: u64 = fields.get(19)?.parse().ok()?;
    Some((utime + stime, starttime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STAT_TAIL: &str = "S 1 42 42 0 -1 4194304 100 0 0 0 {utime} {stime} 0 0 20 0 1 0 {start} 10240000 256 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0";

    fn stat_line(pid: i32, comm: &str, utime: u64, stime: u64, start: u64) -> String {
        let tail = STAT_TAIL
            .replace("{utime}", &utime.to_string())
            .replace("{stime}", &stime.to_string())
            .replace("{start}", &start.to_string());
        format!("{pid} ({comm}) {tail}")
    }

    fn write_process(
        root: &Path,
        pid: i32,
        comm: &str,
        resident_pages: u64,
        utime: u64,
        start: u64,
        cmdline: &[u8],
    ) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
        fs::write(dir.join("statm"), format!("2000 {resident_pages} 300 10 0 500 0\n")).unwrap();
        fs::write(dir.join("stat"), stat_line(pid, comm, utime, 0, start)).unwrap();
        let mut cmdline_file = fs::File::create(dir.join("cmdline")).unwrap();
        cmdline_file.write_all(cmdline).unwrap();
    }

    #[test]
    fn test_parse_stat_counters() {
        let line = stat_line(42, "some app (weird)", 120, 0, 5000);
        assert_eq!(parse_stat_counters(&line), Some((120, 5000)));
    }

    #[test]
    fn test_parse_stat_counters_rejects_truncated_line() {
        assert_eq!(parse_stat_counters("42 (x) S 1 42"), None);
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16316412 kB\nMemFree:         523724 kB\nMemAvailable:   9333852 kB\n";
        let info = parse_meminfo(content).unwrap();
        assert_eq!(info.total_kb, 16_316_412);
        assert_eq!(info.available_kb, 9_333_852);
    }

    #[test]
    fn test_parse_meminfo_missing_fields() {
        assert_eq!(parse_meminfo("MemFree: 1 kB\n"), None);
    }

    #[test]
    fn test_refresh_reads_synthetic_proc_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("uptime"), "1000.00 4000.00\n").unwrap();
        write_process(root, 100, "chrome", 5000, 50, 0, b"/opt/chrome\0--headless\0");
        write_process(root, 200, "kthreadd", 0, 0, 0, b"");
        // Non-numeric entries are skipped
        fs::create_dir_all(root.join("sys")).unwrap();

        let mut provider = ProcProvider::at(root);
        let mut records = provider.refresh();
        records.sort_by_key(|record| record.pid);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pid, Pid(100));
        assert_eq!(records[0].name, "chrome");
        assert_eq!(records[0].memory_kb, 5000 * page_size_kb());
        assert_eq!(records[0].command, "/opt/chrome --headless");
        assert_eq!(records[0].elapsed_secs, 1000);
        assert_eq!(records[1].command, "");
    }

    #[test]
    fn test_refresh_returns_empty_without_uptime() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = ProcProvider::at(dir.path());
        assert!(provider.refresh().is_empty());
    }

    #[test]
    fn test_cpu_percent_needs_two_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("uptime"), "1000.00 4000.00\n").unwrap();
        write_process(root, 100, "worker", 10, 0, 0, b"worker\0");

        let mut provider = ProcProvider::at(root);
        let first = provider.refresh();
        assert_eq!(first[0].cpu_percent, 0.0);

        // Burn some ticks between refreshes
        fs::write(root.join("100").join("stat"), stat_line(100, "worker", 500, 0, 0)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = provider.refresh();
        assert!(second[0].cpu_percent > 0.0);
    }
}

//! Metrics core: sampling, derived rates, shared snapshot
//!
//! - `provider`: the opaque process-list source (`/proc` in production)
//! - `cpu`: cumulative counter pairs -> instantaneous utilization
//! - `net`: cumulative byte proxies -> per-refresh deltas
//! - `snapshot`: the mutex-guarded snapshot shared with the view layer
//! - `sampler`: the periodic background loop tying the above together

pub mod cpu;
pub mod net;
pub mod provider;
pub mod sampler;
pub mod snapshot;

// Re-export common types
pub use cpu::{CpuUtilization, HostCounterSource, ProcStat};
pub use net::{ByteProxySource, NetworkDeltaTracker, ProcIo};
pub use provider::{MetricsProvider, ProcProvider, RawProcess};
pub use sampler::{SamplerConfig, SamplerHandle, SamplerSources};
pub use snapshot::{HostMetrics, ProcessRecord, SharedSnapshot, Snapshot};

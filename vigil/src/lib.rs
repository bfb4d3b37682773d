//! # vigil - Live Process Dashboard Core
//!
//! vigil is an interactive terminal dashboard that lists operating-system
//! processes and aggregate host metrics and lets an operator sort, filter,
//! inspect and terminate processes in real time.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Raw OS counters                         │
//! │        /proc/<pid>/*         /proc/stat   /proc/meminfo     │
//! └───────────────┬─────────────────────────────────────────────┘
//!                 │ blocking reads
//!                 ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Sampler thread (metrics)                    │
//! │   provider refresh ──► net deltas ──► cpu estimation        │
//! │                         │                                   │
//! │                         ▼                                   │
//! │                 SharedSnapshot (mutex)                      │
//! └───────────────┬─────────────────────────────────────────────┘
//!                 │ copy-out + redraw signal
//!                 ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               Foreground thread (tui)                       │
//! │   projection ──► render        input ──► view state         │
//! │        │                                  │                 │
//! │        ▼                                  ▼                 │
//! │   drill-down history               kill(2) / advisor        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`metrics`]: sampling loop, derived rates, shared snapshot
//!   - `provider`: opaque process-list source (`/proc` in production)
//!   - `cpu`: cumulative counter pairs to instantaneous utilization
//!   - `net`: cumulative byte proxies to per-refresh deltas
//!   - `sampler`: the periodic background loop
//!
//! - [`tui`]: terminal UI and the interaction state machine
//!   - `table`: pure projection (sort/filter/selection clamp) + hit regions
//!   - `input`: event routing and kill mediation
//!   - `history`: bounded ring buffers for the drill-down graphs
//!
//! - [`signals`]: kill(2) boundary
//!
//! - [`advisor`]: payload construction and non-blocking polling for the
//!   external AI recommendation call
//!
//! - [`cli`]: command-line argument parsing
//!
//! - [`domain`]: core domain types (Pid) and error enums
//!
//! ## Concurrency Model
//!
//! Two threads of control: the background sampler (periodic, long-lived)
//! and the foreground render/input loop. The shared snapshot is the only
//! resource between them; the sampler locks only to publish, the foreground
//! locks only to copy out, and falls back to its previous copy under
//! contention so input handling never stalls. Shutdown sets a stop signal
//! that interrupts the sampler's wait immediately, then joins it.

// Expose modules for testing
pub mod advisor;
pub mod cli;
pub mod domain;
pub mod metrics;
pub mod signals;
pub mod tui;

//! # vigil - Main Entry Point
//!
//! Wires the sampler thread, the shared snapshot, and the foreground TUI
//! together, then tears them down in order on exit: UI first, then stop and
//! join the sampler.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::bounded;

use vigil::cli::Args;
use vigil::metrics::{
    NetworkDeltaTracker, ProcIo, ProcProvider, ProcStat, SamplerConfig, SamplerSources,
    SharedSnapshot,
};
use vigil::signals::LibcSignals;
use vigil::tui;

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!("vigil v{}", env!("CARGO_PKG_VERSION"));
        println!("refresh: {}ms", args.refresh);
    }

    let sampler_config = SamplerConfig {
        period: Duration::from_millis(args.refresh),
        probe_pause: Duration::from_millis(args.probe_pause),
        ..SamplerConfig::default()
    };

    let shared = SharedSnapshot::new();
    let (redraw_tx, redraw_rx) = bounded(1);
    let sources = SamplerSources {
        provider: Box::new(ProcProvider::new()),
        counters: Box::new(ProcStat::new()),
        bytes: Box::new(ProcIo::new()),
        tracker: NetworkDeltaTracker::new(),
    };
    let sampler = vigil::metrics::sampler::spawn(
        sources,
        shared.clone(),
        redraw_tx,
        sampler_config,
    );

    // Advisor tasks run on this runtime; the external recommendation
    // endpoint is wired in by deployments that have one
    let runtime = tokio::runtime::Runtime::new()?;
    let ui_config = tui::UiConfig {
        refresh: Duration::from_millis(args.refresh),
        history_capacity: args.history,
    };
    let result = tui::run(
        &shared,
        &redraw_rx,
        LibcSignals,
        None,
        runtime.handle(),
        &ui_config,
    );

    // The sampler's wait is interrupted immediately, then joined before
    // final teardown
    sampler.stop();
    sampler.join();

    result
}

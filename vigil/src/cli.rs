//! CLI argument definitions

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "vigil",
    about = "Live process and host metrics in an interactive terminal table",
    after_help = "\
EXAMPLES:
    vigil                         Default 500ms refresh
    vigil --refresh 1000          Slower refresh, lighter sampling
    vigil --history 120           Two minutes of drill-down history"
)]
pub struct Args {
    /// Sampling refresh period in milliseconds
    #[arg(long, default_value = "500", value_name = "MS")]
    pub refresh: u64,

    /// Pause between the two CPU counter probes, in milliseconds
    #[arg(long, default_value = "100", value_name = "MS")]
    pub probe_pause: u64,

    /// Samples retained per drill-down trend graph
    #[arg(long, default_value = "60", value_name = "N")]
    pub history: usize,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

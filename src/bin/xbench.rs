use std::path::PathBuf;
use std::process;

use clap::Parser;

use xsort::bench::{BenchConfig, run_experiments};
use xsort::common::size::parse_size;

#[derive(Parser)]
#[command(
    name = "xbench",
    about = "Time external mergesort and quicksort across input sizes and emit CSV results"
)]
struct Cli {
    /// Main-memory budget in megabytes
    #[arg(value_name = "MEM_MB")]
    mem_mb: Option<u64>,

    /// Block size B in bytes; accepts K/M/G suffixes
    #[arg(short = 'B', long = "block-size", value_name = "SIZE", default_value = "4K")]
    block_size: String,

    /// Trials per input size
    #[arg(long, value_name = "N", default_value_t = 5)]
    trials: u32,

    /// Input sizes as comma-separated multiples of M (default 4,8,...,60)
    #[arg(long, value_name = "MULT", value_delimiter = ',')]
    sizes: Option<Vec<u64>>,

    /// Directory receiving the CSV result files
    #[arg(long = "out-dir", value_name = "DIR", default_value = "graphs")]
    out_dir: String,

    /// Directory for generated inputs and sort outputs
    #[arg(long = "work-dir", value_name = "DIR", default_value = ".")]
    work_dir: String,

    /// Base seed for reproducible inputs and pivots
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let block_bytes = parse_size(&cli.block_size).unwrap_or_else(|e| {
        eprintln!("xbench: invalid block size: {}", e);
        process::exit(2);
    });

    let mut config = BenchConfig {
        block_bytes: block_bytes as usize,
        out_dir: PathBuf::from(cli.out_dir),
        work_dir: PathBuf::from(cli.work_dir),
        trials: cli.trials,
        seed: cli.seed,
        quiet: cli.quiet,
        ..BenchConfig::default()
    };
    if let Some(mem_mb) = cli.mem_mb {
        config.mem_bytes = (mem_mb as usize) * 1024 * 1024;
    }
    if let Some(sizes) = cli.sizes {
        config.multipliers = sizes;
    }

    if let Err(e) = run_experiments(&config) {
        eprintln!("xbench: {}", e);
        process::exit(1);
    }
}

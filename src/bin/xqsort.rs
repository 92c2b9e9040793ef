use std::fs;
use std::path::Path;
use std::process;
use std::time::Instant;

use clap::Parser;

use xsort::common::io::verify_sorted;
use xsort::common::size::parse_size;
use xsort::quicksort::QuickSorter;

#[derive(Parser)]
#[command(
    name = "xqsort",
    about = "Sort a binary file of 64-bit keys with an external a-way quicksort"
)]
struct Cli {
    /// Input file of little-endian 64-bit keys
    input: String,

    /// Sorted output file
    output: String,

    /// Block size B in bytes; accepts K/M/G suffixes
    #[arg(short = 'B', long = "block-size", value_name = "SIZE", default_value = "4K")]
    block_size: String,

    /// Main-memory budget M in bytes; accepts K/M/G suffixes
    #[arg(short = 'M', long = "memory", value_name = "SIZE", default_value = "50M")]
    memory: String,

    /// Number of partitions a per level, in [2, B/8]
    #[arg(short = 'a', long = "arity", value_name = "N", default_value_t = 8)]
    arity: usize,

    /// Sort only the first N bytes of the input (default: whole file)
    #[arg(long, value_name = "N")]
    bytes: Option<u64>,

    /// Fixed seed for the pivot RNG
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Re-read the output and confirm it is sorted
    #[arg(long)]
    verify: bool,

    /// Suppress the timing summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let block_bytes = parse_size(&cli.block_size).unwrap_or_else(|e| {
        eprintln!("xqsort: invalid block size: {}", e);
        process::exit(2);
    });
    let mem_bytes = parse_size(&cli.memory).unwrap_or_else(|e| {
        eprintln!("xqsort: invalid memory budget: {}", e);
        process::exit(2);
    });

    let n_bytes = match cli.bytes {
        Some(n) => n,
        None => match fs::metadata(&cli.input) {
            Ok(meta) => meta.len(),
            Err(e) => {
                eprintln!("xqsort: {}: {}", cli.input, e);
                process::exit(1);
            }
        },
    };

    let sorter = match cli.seed {
        Some(seed) => QuickSorter::with_seed(block_bytes as usize, mem_bytes as usize, cli.arity, seed),
        None => QuickSorter::new(block_bytes as usize, mem_bytes as usize, cli.arity),
    };
    let mut sorter = match sorter {
        Ok(s) => s,
        Err(e) => {
            eprintln!("xqsort: {}", e);
            process::exit(2);
        }
    };

    let start = Instant::now();
    if let Err(e) = sorter.sort(Path::new(&cli.input), Path::new(&cli.output), n_bytes) {
        eprintln!("xqsort: {}", e);
        process::exit(1);
    }
    let elapsed = start.elapsed().as_secs_f64();

    if !cli.quiet {
        eprintln!(
            "xqsort: {} keys in {:.3}s, {} block I/Os",
            n_bytes / 8,
            elapsed,
            sorter.io_count()
        );
    }

    if cli.verify {
        match verify_sorted(Path::new(&cli.output)) {
            Ok(true) => {}
            Ok(false) => {
                eprintln!("xqsort: output is not sorted");
                process::exit(1);
            }
            Err(e) => {
                eprintln!("xqsort: verify failed: {}", e);
                process::exit(1);
            }
        }
    }
}

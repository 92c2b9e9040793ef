use std::path::Path;
use std::process;

use clap::Parser;

use xsort::common::size::parse_size;
use xsort::generator::{GenConfig, generate_keys_file};

#[derive(Parser)]
#[command(name = "xgen", about = "Generate a random binary file of 64-bit keys")]
struct Cli {
    /// Output file
    file: String,

    /// Bytes to generate; accepts K/M/G suffixes (powers of two)
    #[arg(short = 's', long = "size", value_name = "SIZE")]
    size: String,

    /// Fixed RNG seed for reproducible output
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Size of the fill-and-write chunk
    #[arg(long, value_name = "SIZE", default_value = "1M")]
    chunk: String,
}

fn main() {
    let cli = Cli::parse();

    let n_bytes = parse_size(&cli.size).unwrap_or_else(|e| {
        eprintln!("xgen: invalid size: {}", e);
        process::exit(2);
    });
    let chunk_bytes = parse_size(&cli.chunk).unwrap_or_else(|e| {
        eprintln!("xgen: invalid chunk size: {}", e);
        process::exit(2);
    });

    let config = GenConfig {
        n_bytes,
        chunk_bytes: chunk_bytes as usize,
        seed: cli.seed,
    };

    if let Err(e) = generate_keys_file(Path::new(&cli.file), &config) {
        eprintln!("xgen: {}", e);
        process::exit(1);
    }
}

/// Experiment harness: times both external sorters and counts their block
/// transfers across a range of input sizes, then emits per-size means as
/// CSV for plotting.
///
/// For each size `N = multiplier * M` and each trial the harness generates a
/// fresh random input, runs mergesort and quicksort on it, checks both
/// outputs are actually sorted, and deletes every file it created. The
/// mergesort fan-out is chosen up front by ternary search over a reference
/// input of the smallest experimental size.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::arity::find_best_arity;
use crate::common::io::verify_sorted;
use crate::error::SortError;
use crate::generator::{GenConfig, generate_keys_file};
use crate::mergesort::MergeSorter;
use crate::quicksort::QuickSorter;

/// Harness configuration. Defaults mirror the reference experiment: 4KB
/// blocks, a 50MB memory budget, sizes 4M..60M in steps of 4M, five trials
/// per size, results under `graphs/`.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub block_bytes: usize,
    pub mem_bytes: usize,
    /// Input sizes as multiples of the memory budget.
    pub multipliers: Vec<u64>,
    pub trials: u32,
    /// Directory receiving the four CSV files (created if missing).
    pub out_dir: PathBuf,
    /// Directory for generated inputs and sort outputs.
    pub work_dir: PathBuf,
    /// Base seed for input generation and pivot sampling; `None` draws from
    /// the OS per trial.
    pub seed: Option<u64>,
    pub quiet: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            block_bytes: 4096,
            mem_bytes: 50 * 1024 * 1024,
            multipliers: (4..=60).step_by(4).collect(),
            trials: 5,
            out_dir: PathBuf::from("graphs"),
            work_dir: PathBuf::from("."),
            seed: None,
            quiet: false,
        }
    }
}

/// Per-size means over all trials.
#[derive(Debug, Clone)]
pub struct SizeSummary {
    pub multiplier: u64,
    pub merge_secs: f64,
    pub merge_io: f64,
    pub quick_secs: f64,
    pub quick_io: f64,
}

/// Elapsed seconds and block transfers of a single sort run.
#[derive(Debug, Clone, Copy)]
struct TrialResult {
    secs: f64,
    io: u64,
}

/// Run the full experiment and write the four CSV files. Returns the
/// per-size summaries in multiplier order.
pub fn run_experiments(config: &BenchConfig) -> Result<Vec<SizeSummary>, SortError> {
    fs::create_dir_all(&config.out_dir)?;
    fs::create_dir_all(&config.work_dir)?;

    let arity = pick_arity(config)?;
    if !config.quiet {
        eprintln!("xbench: using mergesort arity {}", arity);
    }

    let mut summaries = Vec::with_capacity(config.multipliers.len());
    for &multiplier in &config.multipliers {
        let n_bytes = multiplier * config.mem_bytes as u64;
        let mut merge_secs = 0.0;
        let mut merge_io = 0u64;
        let mut quick_secs = 0.0;
        let mut quick_io = 0u64;

        for trial in 0..config.trials {
            if !config.quiet {
                eprintln!(
                    "xbench: size {}M, trial {}/{}",
                    multiplier,
                    trial + 1,
                    config.trials
                );
            }

            let input = config
                .work_dir
                .join(format!("data_{}m_{}.bin", multiplier, trial));
            let merge_out = config
                .work_dir
                .join(format!("sorted_merge_{}m_{}.bin", multiplier, trial));
            let quick_out = config
                .work_dir
                .join(format!("sorted_quick_{}m_{}.bin", multiplier, trial));

            let trial_seed = derive_seed(config.seed, multiplier, trial);
            generate_keys_file(
                &input,
                &GenConfig {
                    n_bytes,
                    seed: trial_seed,
                    ..GenConfig::default()
                },
            )?;

            let merge = run_mergesort(config, arity, &input, &merge_out, n_bytes)?;
            check_output(config, &merge_out, "mergesort")?;
            merge_secs += merge.secs;
            merge_io += merge.io;

            let quick = run_quicksort(config, arity, trial_seed, &input, &quick_out, n_bytes)?;
            check_output(config, &quick_out, "quicksort")?;
            quick_secs += quick.secs;
            quick_io += quick.io;

            fs::remove_file(&input)?;
            fs::remove_file(&merge_out)?;
            fs::remove_file(&quick_out)?;
        }

        let trials = config.trials as f64;
        let summary = SizeSummary {
            multiplier,
            merge_secs: merge_secs / trials,
            merge_io: merge_io as f64 / trials,
            quick_secs: quick_secs / trials,
            quick_io: quick_io as f64 / trials,
        };
        if !config.quiet {
            eprintln!(
                "xbench: size {}M means: mergesort {:.3}s / {:.0} I/Os, quicksort {:.3}s / {:.0} I/Os",
                summary.multiplier,
                summary.merge_secs,
                summary.merge_io,
                summary.quick_secs,
                summary.quick_io
            );
        }
        summaries.push(summary);
    }

    write_results(&config.out_dir, &summaries)?;
    Ok(summaries)
}

/// Ternary-search the mergesort arity over a reference input of the
/// smallest experimental size.
fn pick_arity(config: &BenchConfig) -> Result<usize, SortError> {
    let reference_mult = config.multipliers.first().copied().unwrap_or(4);
    let ref_bytes = reference_mult * config.mem_bytes as u64;
    let ref_path = config.work_dir.join("reference.bin");

    if !config.quiet {
        eprintln!(
            "xbench: searching best arity on a {}M reference input",
            reference_mult
        );
    }

    generate_keys_file(
        &ref_path,
        &GenConfig {
            n_bytes: ref_bytes,
            seed: config.seed,
            ..GenConfig::default()
        },
    )?;
    let arity = find_best_arity(&ref_path, ref_bytes, config.block_bytes, config.mem_bytes);
    fs::remove_file(&ref_path)?;
    arity
}

fn run_mergesort(
    config: &BenchConfig,
    arity: usize,
    input: &Path,
    output: &Path,
    n_bytes: u64,
) -> Result<TrialResult, SortError> {
    let mut sorter = MergeSorter::new(config.block_bytes, config.mem_bytes, arity)?;
    let start = Instant::now();
    sorter.sort(input, output, n_bytes)?;
    Ok(TrialResult {
        secs: start.elapsed().as_secs_f64(),
        io: sorter.io_count(),
    })
}

fn run_quicksort(
    config: &BenchConfig,
    arity: usize,
    trial_seed: Option<u64>,
    input: &Path,
    output: &Path,
    n_bytes: u64,
) -> Result<TrialResult, SortError> {
    let mut sorter = match trial_seed {
        Some(seed) => QuickSorter::with_seed(config.block_bytes, config.mem_bytes, arity, seed)?,
        None => QuickSorter::new(config.block_bytes, config.mem_bytes, arity)?,
    };
    let start = Instant::now();
    sorter.sort(input, output, n_bytes)?;
    Ok(TrialResult {
        secs: start.elapsed().as_secs_f64(),
        io: sorter.io_count(),
    })
}

/// A sort that produced an unsorted file is a bug, not a measurement; warn
/// loudly but keep the run going so a long experiment is not wasted.
fn check_output(config: &BenchConfig, output: &Path, which: &str) -> Result<(), SortError> {
    if !verify_sorted(output)? && !config.quiet {
        eprintln!(
            "xbench: WARNING: {} output {} is not sorted",
            which,
            output.display()
        );
    }
    Ok(())
}

/// Distinct deterministic seed per (size, trial) when a base seed is given.
pub(crate) fn derive_seed(base: Option<u64>, multiplier: u64, trial: u32) -> Option<u64> {
    base.map(|s| {
        s.wrapping_mul(0x9E3779B97F4A7C15)
            .wrapping_add(multiplier << 16)
            .wrapping_add(trial as u64)
    })
}

/// Emit the four result files, one `multiplier,value` row per size, no
/// header.
pub(crate) fn write_results(out_dir: &Path, summaries: &[SizeSummary]) -> Result<(), SortError> {
    write_csv(&out_dir.join("mergesort_time.csv"), summaries, |s| {
        format!("{:.6}", s.merge_secs)
    })?;
    write_csv(&out_dir.join("mergesort_io.csv"), summaries, |s| {
        format!("{}", s.merge_io)
    })?;
    write_csv(&out_dir.join("quicksort_time.csv"), summaries, |s| {
        format!("{:.6}", s.quick_secs)
    })?;
    write_csv(&out_dir.join("quicksort_io.csv"), summaries, |s| {
        format!("{}", s.quick_io)
    })?;
    Ok(())
}

fn write_csv(
    path: &Path,
    summaries: &[SizeSummary],
    value: impl Fn(&SizeSummary) -> String,
) -> Result<(), SortError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(io::Error::other)?;
    for summary in summaries {
        writer
            .write_record([summary.multiplier.to_string(), value(summary)])
            .map_err(io::Error::other)?;
    }
    writer.flush()?;
    Ok(())
}

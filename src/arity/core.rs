/// Arity selection for the external mergesort.
///
/// The I/O count of a mergesort over a fixed input is treated as a unimodal
/// function of the fan-out `a` on `[2, B/8]`: a small `a` means many
/// recursion levels, a large `a` means wide but shallow merges, and the
/// measured block-transfer count trades the two off. The search below
/// exploits that shape; `linear_scan_arity` is the exhaustive reference the
/// test suite compares against for small blocks.
use std::fs;
use std::path::{Path, PathBuf};

use crate::block::validate_config;
use crate::error::SortError;
use crate::mergesort::MergeSorter;

/// Find the arity in `[2, B/8]` minimizing the mergesort I/O count for the
/// given input, by integer ternary search with an exhaustive finish once the
/// interval shrinks to at most 5 candidates.
///
/// Every probe is a full mergesort of `n_bytes` from `input` into a scratch
/// file next to it; the scratch is removed before returning. Fails if the
/// block holds fewer than two keys (no valid arity exists).
pub fn find_best_arity(
    input: &Path,
    n_bytes: u64,
    block_bytes: usize,
    mem_bytes: usize,
) -> Result<usize, SortError> {
    let keys_per_block = validate_config(block_bytes, mem_bytes, 2)?;
    let scratch = scratch_path(input);
    let mut sorter = MergeSorter::new(block_bytes, mem_bytes, 2)?;

    let mut lo = 2usize;
    let mut hi = keys_per_block;
    while hi - lo > 4 {
        let m1 = lo + (hi - lo) / 3;
        let m2 = hi - (hi - lo) / 3;

        let f1 = measure(&mut sorter, m1, input, &scratch, n_bytes)?;
        let f2 = measure(&mut sorter, m2, input, &scratch, n_bytes)?;

        if f1 < f2 {
            hi = m2;
        } else {
            lo = m1;
        }
    }

    let mut best = lo;
    let mut best_io = u64::MAX;
    for arity in lo..=hi {
        let io = measure(&mut sorter, arity, input, &scratch, n_bytes)?;
        if io < best_io {
            best_io = io;
            best = arity;
        }
    }

    fs::remove_file(&scratch)?;
    Ok(best)
}

/// Exhaustive argmin of the mergesort I/O count over every arity in
/// `[2, B/8]`. Costs one full sort per candidate; intended for small blocks
/// and for validating the ternary search.
pub fn linear_scan_arity(
    input: &Path,
    n_bytes: u64,
    block_bytes: usize,
    mem_bytes: usize,
) -> Result<usize, SortError> {
    let keys_per_block = validate_config(block_bytes, mem_bytes, 2)?;
    let scratch = scratch_path(input);
    let mut sorter = MergeSorter::new(block_bytes, mem_bytes, 2)?;

    let mut best = 2;
    let mut best_io = u64::MAX;
    for arity in 2..=keys_per_block {
        let io = measure(&mut sorter, arity, input, &scratch, n_bytes)?;
        if io < best_io {
            best_io = io;
            best = arity;
        }
    }

    fs::remove_file(&scratch)?;
    Ok(best)
}

/// One probe of the objective: reconfigure the shared sorter, clear its
/// counter and buffer, run the full sort, read the counter.
fn measure(
    sorter: &mut MergeSorter,
    arity: usize,
    input: &Path,
    scratch: &Path,
    n_bytes: u64,
) -> Result<u64, SortError> {
    sorter.set_arity(arity)?;
    sorter.reset_io_count();
    sorter.clear_buffer();
    sorter.sort(input, scratch, n_bytes)?;
    Ok(sorter.io_count())
}

fn scratch_path(input: &Path) -> PathBuf {
    PathBuf::from(format!("{}.scan", input.display()))
}

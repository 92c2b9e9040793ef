/// External quicksort for binary files of 64-bit keys.
///
/// Each level samples `a - 1` pivots from one random block, distributes the
/// range into `a` partition files in a single block-by-block scan, sorts the
/// partitions recursively, and concatenates them. Ranges that fit in the
/// memory budget are sorted in one in-memory pass.
///
/// Pivot quality is not guaranteed: when a partition pass makes no progress
/// (every key lands in a single partition), that partition is handed to an
/// external mergesort with the same configuration, so uniform inputs
/// terminate instead of recursing forever.
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::block::{BlockIo, KEY_BYTES, validate_arity, validate_config};
use crate::error::SortError;
use crate::mergesort::MergeSorter;

/// External quicksort instance.
///
/// Owns a reusable block buffer, the I/O counter and the pivot RNG; RNG
/// state is per-instance, never process-global. Not reentrant.
#[derive(Debug)]
pub struct QuickSorter {
    block_bytes: usize,
    mem_bytes: usize,
    arity: usize,
    io: BlockIo,
    buf: Vec<i64>,
    tmp_seq: u64,
    rng: Xoshiro256PlusPlus,
}

impl QuickSorter {
    /// Create a sorter for block size `block_bytes` (B), memory budget
    /// `mem_bytes` (M) and partition count `arity` (a), with an OS-seeded
    /// pivot RNG. Configuration rules match `MergeSorter::new`.
    pub fn new(block_bytes: usize, mem_bytes: usize, arity: usize) -> Result<Self, SortError> {
        Self::with_rng(block_bytes, mem_bytes, arity, Xoshiro256PlusPlus::from_os_rng())
    }

    /// Like `new`, but with a fixed pivot-RNG seed for reproducible runs.
    pub fn with_seed(
        block_bytes: usize,
        mem_bytes: usize,
        arity: usize,
        seed: u64,
    ) -> Result<Self, SortError> {
        Self::with_rng(
            block_bytes,
            mem_bytes,
            arity,
            Xoshiro256PlusPlus::seed_from_u64(seed),
        )
    }

    fn with_rng(
        block_bytes: usize,
        mem_bytes: usize,
        arity: usize,
        rng: Xoshiro256PlusPlus,
    ) -> Result<Self, SortError> {
        let keys_per_block = validate_config(block_bytes, mem_bytes, arity)?;
        Ok(Self {
            block_bytes,
            mem_bytes,
            arity,
            io: BlockIo::new(block_bytes),
            buf: Vec::with_capacity(keys_per_block),
            tmp_seq: 0,
            rng,
        })
    }

    /// Sort the first `n_bytes` of `input` into `output`. Same contract as
    /// `MergeSorter::sort`: multiset preserved, non-decreasing order, exact
    /// length, temps removed on success and left behind on error.
    pub fn sort(&mut self, input: &Path, output: &Path, n_bytes: u64) -> Result<(), SortError> {
        let n_keys = n_bytes / KEY_BYTES as u64;
        self.tmp_seq = 0;
        self.sort_range(input, output, n_keys)
    }

    /// Block transfers since the last reset.
    pub fn io_count(&self) -> u64 {
        self.io.io_count()
    }

    /// Zero the transfer counter.
    pub fn reset_io_count(&mut self) {
        self.io.reset();
    }

    /// Change the partition count for subsequent sorts.
    pub fn set_arity(&mut self, arity: usize) -> Result<(), SortError> {
        validate_arity(arity, self.io.keys_per_block())?;
        self.arity = arity;
        Ok(())
    }

    /// Discard any state left in the reusable block buffer.
    pub fn clear_buffer(&mut self) {
        self.buf.clear();
    }

    fn sort_range(&mut self, input: &Path, output: &Path, n_keys: u64) -> Result<(), SortError> {
        if n_keys.saturating_mul(KEY_BYTES as u64) <= self.mem_bytes as u64 {
            self.sort_in_memory(input, output, n_keys)?;
            return Ok(());
        }

        let pivots = self.select_pivots(input, n_keys)?;
        let parts = self.partition(input, output, n_keys, &pivots)?;

        // Zero-progress detection: a single partition holding the whole
        // range means the pivots cannot split it (e.g. all keys equal).
        // Hand that partition to mergesort instead of recursing.
        let non_empty = parts.iter().filter(|(_, len)| *len > 0).count();
        let degenerate = non_empty == 1 && parts.iter().any(|(_, len)| *len == n_keys);

        let mut sorted = Vec::with_capacity(non_empty);
        for (path, len) in &parts {
            if *len == 0 {
                continue;
            }
            let dst = self.next_temp(output, "sorted");
            if degenerate {
                let mut fallback = MergeSorter::new(self.block_bytes, self.mem_bytes, self.arity)?;
                fallback.sort(path, &dst, len * KEY_BYTES as u64)?;
                self.io.add(fallback.io_count());
            } else {
                self.sort_range(path, &dst, *len)?;
            }
            sorted.push((dst, *len));
        }

        self.concatenate(&sorted, output)?;

        for (path, _) in &parts {
            fs::remove_file(path)?;
        }
        for (path, _) in &sorted {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Base case, identical in cost to the mergesort one: one read and one
    /// write per block of the range.
    fn sort_in_memory(&mut self, input: &Path, output: &Path, n_keys: u64) -> Result<(), SortError> {
        let keys_per_block = self.io.keys_per_block();
        let mut data: Vec<i64> = Vec::with_capacity(n_keys as usize);

        if n_keys > 0 {
            let mut src = File::open(input)?;
            let mut index = 0u64;
            while (data.len() as u64) < n_keys {
                let got = self.io.read_block(&mut src, index, &mut self.buf)?;
                if got == 0 {
                    break;
                }
                let remaining = (n_keys - data.len() as u64) as usize;
                data.extend_from_slice(&self.buf[..got.min(remaining)]);
                index += 1;
            }
            data.sort_unstable();
        }

        let mut out = File::create(output)?;
        for (index, chunk) in data.chunks(keys_per_block).enumerate() {
            self.io.write_block(&mut out, index as u64, chunk)?;
        }
        Ok(())
    }

    /// Sample the pivots for one partition level: read a uniformly random
    /// block of the range (one transfer), draw `a - 1` distinct positions
    /// from it without replacement (all of them if the block holds fewer),
    /// and return the chosen keys sorted ascending.
    fn select_pivots(&mut self, input: &Path, n_keys: u64) -> Result<Vec<i64>, SortError> {
        let keys_per_block = self.io.keys_per_block() as u64;
        let num_blocks = n_keys.div_ceil(keys_per_block);
        let block_index = self.rng.random_range(0..num_blocks);

        let mut src = File::open(input)?;
        self.io.read_block(&mut src, block_index, &mut self.buf)?;

        // The last block of the range may extend past `n_keys` when the
        // range is a prefix of a larger file; clip to the range.
        let in_range = (n_keys - block_index * keys_per_block).min(self.buf.len() as u64) as usize;
        let sample_len = (self.arity - 1).min(in_range);

        let mut pivots: Vec<i64> = index::sample(&mut self.rng, in_range, sample_len)
            .into_iter()
            .map(|i| self.buf[i])
            .collect();
        pivots.sort_unstable();
        Ok(pivots)
    }

    /// One block-by-block scan of the range, appending every key to the
    /// partition chosen by binary search over the pivots. Partition `j`
    /// receives keys `x` with `pivots[j-1] <= x < pivots[j]`; the last
    /// partition takes everything at or above the top pivot. Each partition
    /// has a buffer of `b` keys flushed as it fills, plus one final partial
    /// flush.
    fn partition(
        &mut self,
        input: &Path,
        output: &Path,
        n_keys: u64,
        pivots: &[i64],
    ) -> Result<Vec<(PathBuf, u64)>, SortError> {
        let keys_per_block = self.io.keys_per_block();

        let mut parts: Vec<(PathBuf, u64)> = Vec::with_capacity(self.arity);
        let mut files = Vec::with_capacity(self.arity);
        for _ in 0..self.arity {
            let path = self.next_temp(output, "part");
            files.push(File::create(&path)?);
            parts.push((path, 0));
        }
        let mut out_bufs: Vec<Vec<i64>> = (0..self.arity)
            .map(|_| Vec::with_capacity(keys_per_block))
            .collect();

        let mut src = File::open(input)?;
        let mut read = 0u64;
        while read < n_keys {
            let want = keys_per_block.min((n_keys - read) as usize);
            let got = self.io.read_seq(&mut src, &mut self.buf, want)?;
            if got == 0 {
                break;
            }
            for idx in 0..got {
                let key = self.buf[idx];
                let j = pivots.partition_point(|&p| p <= key);
                out_bufs[j].push(key);
                if out_bufs[j].len() == keys_per_block {
                    self.io.append(&mut files[j], &out_bufs[j])?;
                    parts[j].1 += keys_per_block as u64;
                    out_bufs[j].clear();
                }
            }
            read += got as u64;
        }

        for j in 0..self.arity {
            if !out_bufs[j].is_empty() {
                self.io.append(&mut files[j], &out_bufs[j])?;
                parts[j].1 += out_bufs[j].len() as u64;
            }
        }

        Ok(parts)
    }

    /// Copy the sorted partitions into `output` in pivot order, block by
    /// block. Both the read and the write of each chunk are transfers, as in
    /// the split pass.
    fn concatenate(&mut self, sorted: &[(PathBuf, u64)], output: &Path) -> Result<(), SortError> {
        let keys_per_block = self.io.keys_per_block() as u64;
        let mut out = File::create(output)?;

        for (path, len) in sorted {
            let mut src = File::open(path)?;
            let mut remaining = *len;
            while remaining > 0 {
                let want = keys_per_block.min(remaining) as usize;
                let got = self.io.read_seq(&mut src, &mut self.buf, want)?;
                if got == 0 {
                    break;
                }
                self.io.append(&mut out, &self.buf[..got])?;
                remaining -= got as u64;
            }
        }
        Ok(())
    }

    fn next_temp(&mut self, output: &Path, kind: &str) -> PathBuf {
        let seq = self.tmp_seq;
        self.tmp_seq += 1;
        PathBuf::from(format!("{}.{}{}", output.display(), kind, seq))
    }
}

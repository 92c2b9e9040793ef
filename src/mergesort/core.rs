/// External a-way mergesort for binary files of 64-bit keys.
///
/// The input is recursively split into `a` contiguous runs on disk, each run
/// sorted, and the sorted runs combined with an a-way merge. Ranges that fit
/// into the memory budget are sorted in one in-memory pass. All disk access
/// goes through the block layer, so `io_count` reports exactly the number of
/// block transfers a sort performed.
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::block::{BlockIo, KEY_BYTES, validate_arity, validate_config};
use crate::error::SortError;

/// External mergesort instance.
///
/// Owns a reusable block buffer and the I/O counter. Not reentrant: one
/// instance services one sort call at a time, and two instances must not
/// share files.
#[derive(Debug)]
pub struct MergeSorter {
    mem_bytes: usize,
    arity: usize,
    io: BlockIo,
    buf: Vec<i64>,
    tmp_seq: u64,
}

/// One open sorted run during the merge phase.
struct RunStream {
    file: File,
    buf: Vec<i64>,
    pos: usize,
}

impl MergeSorter {
    /// Create a sorter for block size `block_bytes` (B), memory budget
    /// `mem_bytes` (M) and fan-out `arity` (a). Rejects a block size that is
    /// not a positive multiple of 8, a memory budget smaller than one block,
    /// and an arity outside `[2, B/8]`.
    pub fn new(block_bytes: usize, mem_bytes: usize, arity: usize) -> Result<Self, SortError> {
        let keys_per_block = validate_config(block_bytes, mem_bytes, arity)?;
        Ok(Self {
            mem_bytes,
            arity,
            io: BlockIo::new(block_bytes),
            buf: Vec::with_capacity(keys_per_block),
            tmp_seq: 0,
        })
    }

    /// Sort the first `n_bytes` of `input` into `output`.
    ///
    /// On success `output` holds the same multiset of keys in non-decreasing
    /// order and is exactly `n_bytes` long (rounded down to a whole number
    /// of keys). Temporary files are created next to `output` and removed
    /// before returning; on error they are left behind.
    pub fn sort(&mut self, input: &Path, output: &Path, n_bytes: u64) -> Result<(), SortError> {
        // A byte count that is not a multiple of 8 is truncated to the
        // largest whole number of keys.
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

    /// Change the fan-out for subsequent sorts (revalidated against B/8).
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

        let runs = self.split_into_runs(input, output, n_keys)?;

        let mut sorted = Vec::with_capacity(runs.len());
        for (path, len) in &runs {
            let dst = self.next_temp(output, "sorted");
            self.sort_range(path, &dst, *len)?;
            sorted.push(dst);
        }

        self.merge_runs(&sorted, output)?;

        // All run files are closed by now; remove everything this level made.
        for (path, _) in &runs {
            fs::remove_file(path)?;
        }
        for path in &sorted {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Base case: the range fits in the memory budget. Read it in block
    /// chunks, sort with the standard in-memory sort, write it back in block
    /// chunks. Costs exactly one read and one write per block of the range.
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

    /// Divide the first `n_keys` of `input` into exactly `arity` contiguous
    /// temp files: `ceil(n/a)` keys each, the last taking the remainder
    /// (trailing files are empty when `n < a * ceil(n/a)` leaves nothing).
    /// Every read and every write of the copy is one block transfer.
    fn split_into_runs(
        &mut self,
        input: &Path,
        output: &Path,
        n_keys: u64,
    ) -> Result<Vec<(PathBuf, u64)>, SortError> {
        let keys_per_block = self.io.keys_per_block() as u64;
        let chunk = n_keys.div_ceil(self.arity as u64);
        let mut src = File::open(input)?;

        let mut runs = Vec::with_capacity(self.arity);
        for j in 0..self.arity as u64 {
            let start = (j * chunk).min(n_keys);
            let end = ((j + 1) * chunk).min(n_keys);
            let len = end - start;

            let path = self.next_temp(output, "temp");
            let mut dst = File::create(&path)?;

            // The source cursor advances run by run, so each block-sized
            // read picks up exactly where the previous run ended.
            let mut copied = 0u64;
            while copied < len {
                let want = keys_per_block.min(len - copied) as usize;
                let got = self.io.read_seq(&mut src, &mut self.buf, want)?;
                if got == 0 {
                    break;
                }
                self.io.append(&mut dst, &self.buf[..got])?;
                copied += got as u64;
            }
            runs.push((path, len));
        }
        Ok(runs)
    }

    /// a-way merge of sorted runs into `output`.
    ///
    /// One input buffer of `b` keys per run plus one output buffer, with the
    /// current head of every live run in a min-heap. Refilling an exhausted
    /// buffer is one transfer; flushing a full (or final partial) output
    /// buffer is one transfer.
    fn merge_runs(&mut self, runs: &[PathBuf], output: &Path) -> Result<(), SortError> {
        let keys_per_block = self.io.keys_per_block();

        let mut streams = Vec::with_capacity(runs.len());
        for path in runs {
            let mut file = File::open(path)?;
            let mut buf = Vec::with_capacity(keys_per_block);
            self.io.read_seq(&mut file, &mut buf, keys_per_block)?;
            streams.push(RunStream { file, buf, pos: 0 });
        }

        let mut heap: BinaryHeap<Reverse<(i64, usize)>> = BinaryHeap::with_capacity(streams.len());
        for (i, stream) in streams.iter().enumerate() {
            if !stream.buf.is_empty() {
                heap.push(Reverse((stream.buf[0], i)));
            }
        }

        let mut out = File::create(output)?;
        let mut out_buf: Vec<i64> = Vec::with_capacity(keys_per_block);

        while let Some(Reverse((key, i))) = heap.pop() {
            out_buf.push(key);
            if out_buf.len() == keys_per_block {
                self.io.append(&mut out, &out_buf)?;
                out_buf.clear();
            }

            let stream = &mut streams[i];
            stream.pos += 1;
            if stream.pos >= stream.buf.len() {
                let got = self
                    .io
                    .read_seq(&mut stream.file, &mut stream.buf, keys_per_block)?;
                stream.pos = 0;
                if got == 0 {
                    continue; // run exhausted
                }
            }
            heap.push(Reverse((stream.buf[stream.pos], i)));
        }

        if !out_buf.is_empty() {
            self.io.append(&mut out, &out_buf)?;
        }
        Ok(())
    }

    /// Next temp-file name: output path plus `.{kind}{K}` with `K` from the
    /// per-invocation counter, so names never collide within a sort.
    fn next_temp(&mut self, output: &Path, kind: &str) -> PathBuf {
        let seq = self.tmp_seq;
        self.tmp_seq += 1;
        PathBuf::from(format!("{}.{}{}", output.display(), kind, seq))
    }
}

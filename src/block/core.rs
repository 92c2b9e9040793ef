/// Block-structured file I/O with transfer accounting.
///
/// Every read and write moves at most one block of `B` bytes and bumps the
/// counter by exactly one, so the counter measures external-memory block
/// transfers, which is the cost metric the sorters optimize for.
///
/// Keys are signed 64-bit integers stored little-endian, concatenated with
/// no delimiters or headers. Files are little-endian regardless of host.
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::SortError;

/// Bytes per key in the on-disk format.
pub const KEY_BYTES: usize = 8;

/// Validate a `(block, memory, arity)` sorter configuration.
///
/// Returns the number of keys per block on success. The block size must be a
/// positive multiple of 8; the memory budget must hold at least one block;
/// the arity must lie in `[2, keys_per_block]`.
pub fn validate_config(
    block_bytes: usize,
    mem_bytes: usize,
    arity: usize,
) -> Result<usize, SortError> {
    if block_bytes == 0 || block_bytes % KEY_BYTES != 0 {
        return Err(SortError::InvalidBlockSize(block_bytes));
    }
    if mem_bytes < block_bytes {
        return Err(SortError::InvalidMemory {
            mem: mem_bytes,
            block: block_bytes,
        });
    }
    let keys_per_block = block_bytes / KEY_BYTES;
    validate_arity(arity, keys_per_block)?;
    Ok(keys_per_block)
}

/// Validate an arity against the keys-per-block bound.
pub fn validate_arity(arity: usize, keys_per_block: usize) -> Result<(), SortError> {
    if arity < 2 || arity > keys_per_block {
        return Err(SortError::InvalidArity {
            arity,
            max: keys_per_block,
        });
    }
    Ok(())
}

/// Block reader/writer with a monotonic I/O counter.
///
/// Owns a byte scratch buffer of one block so that key encoding and decoding
/// never reallocates. Not reentrant: a `BlockIo` belongs to exactly one
/// sorter instance and must not be shared.
#[derive(Debug)]
pub struct BlockIo {
    block_bytes: usize,
    scratch: Vec<u8>,
    ios: u64,
}

impl BlockIo {
    pub fn new(block_bytes: usize) -> Self {
        Self {
            block_bytes,
            scratch: vec![0u8; block_bytes],
            ios: 0,
        }
    }

    /// Keys per block, `b = B / 8`.
    #[inline]
    pub fn keys_per_block(&self) -> usize {
        self.block_bytes / KEY_BYTES
    }

    /// Number of block transfers since the last reset.
    #[inline]
    pub fn io_count(&self) -> u64 {
        self.ios
    }

    /// Zero the transfer counter.
    pub fn reset(&mut self) {
        self.ios = 0;
    }

    /// Fold another counter's total into this one (used when a sort
    /// delegates a subrange to a different sorter).
    pub fn add(&mut self, n: u64) {
        self.ios += n;
    }

    /// Read the block at logical index `index` (byte offset `index * B`)
    /// into `buf`, replacing its contents. Returns the number of keys
    /// actually read, which is short at end-of-file. One transfer.
    pub fn read_block(
        &mut self,
        file: &mut File,
        index: u64,
        buf: &mut Vec<i64>,
    ) -> io::Result<usize> {
        file.seek(SeekFrom::Start(index * self.block_bytes as u64))?;
        self.read_at_cursor(file, buf, self.keys_per_block())
    }

    /// Read up to `max_keys` keys at the current file cursor, replacing the
    /// contents of `buf`. `max_keys` must not exceed the block size. Returns
    /// the number of keys read. One transfer.
    pub fn read_seq(
        &mut self,
        file: &mut File,
        buf: &mut Vec<i64>,
        max_keys: usize,
    ) -> io::Result<usize> {
        debug_assert!(max_keys <= self.keys_per_block());
        self.read_at_cursor(file, buf, max_keys)
    }

    fn read_at_cursor(
        &mut self,
        file: &mut File,
        buf: &mut Vec<i64>,
        max_keys: usize,
    ) -> io::Result<usize> {
        let want = max_keys * KEY_BYTES;
        let got = read_full(file, &mut self.scratch[..want])?;
        self.ios += 1;

        // A trailing partial key (file length not a multiple of 8) is
        // silently dropped.
        buf.clear();
        buf.extend(
            self.scratch[..got]
                .chunks_exact(KEY_BYTES)
                .map(|c| i64::from_le_bytes(c.try_into().unwrap())),
        );
        Ok(buf.len())
    }

    /// Write `keys` (at most one block) at logical index `index`. One
    /// transfer.
    pub fn write_block(&mut self, file: &mut File, index: u64, keys: &[i64]) -> io::Result<()> {
        file.seek(SeekFrom::Start(index * self.block_bytes as u64))?;
        self.write_at_cursor(file, keys)
    }

    /// Write `keys` (at most one block) at the current file cursor, with no
    /// index seek. Used for sequential writers and partial tails. One
    /// transfer.
    pub fn append(&mut self, file: &mut File, keys: &[i64]) -> io::Result<()> {
        self.write_at_cursor(file, keys)
    }

    fn write_at_cursor(&mut self, file: &mut File, keys: &[i64]) -> io::Result<()> {
        debug_assert!(keys.len() <= self.keys_per_block());
        let n = keys.len() * KEY_BYTES;
        for (i, key) in keys.iter().enumerate() {
            self.scratch[i * KEY_BYTES..(i + 1) * KEY_BYTES].copy_from_slice(&key.to_le_bytes());
        }
        file.write_all(&self.scratch[..n])?;
        self.ios += 1;
        Ok(())
    }
}

/// Read as many bytes as possible into `buf`, retrying on interrupted and
/// partial reads. Returns the number of bytes read (0 means EOF).
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use memmap2::Mmap;

/// Threshold above which we use mmap instead of buffered read.
/// mmap has overhead from page table setup; for small files buffered read wins.
const MMAP_THRESHOLD: u64 = 64 * 1024; // 64KB

/// Buffer size for the streaming sortedness check.
const VERIFY_BUF_BYTES: usize = 1024 * 1024; // 1MB

/// Read a whole key file into memory, choosing mmap for large files and a
/// plain read for small ones. Keys are decoded little-endian; a trailing
/// partial key (file length not a multiple of 8) is dropped.
pub fn read_keys(path: &Path) -> io::Result<Vec<i64>> {
    let metadata = std::fs::metadata(path)?;

    if metadata.len() >= MMAP_THRESHOLD {
        let file = File::open(path)?;
        // SAFETY: read-only mapping; the file must not be truncated while the
        // mapping is alive. We decode and drop immediately.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(decode_keys(&mmap))
    } else {
        let bytes = std::fs::read(path)?;
        Ok(decode_keys(&bytes))
    }
}

fn decode_keys(bytes: &[u8]) -> Vec<i64> {
    bytes
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

/// Check that a key file is in non-decreasing order, streaming in 1MB
/// chunks so arbitrarily large files can be verified in constant memory.
pub fn verify_sorted(path: &Path) -> io::Result<bool> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(VERIFY_BUF_BYTES, file);
    let mut chunk = vec![0u8; VERIFY_BUF_BYTES];
    let mut prev = i64::MIN;

    loop {
        let n = read_full(&mut reader, &mut chunk)?;
        if n == 0 {
            break;
        }
        for c in chunk[..n].chunks_exact(8) {
            let key = i64::from_le_bytes(c.try_into().unwrap());
            if key < prev {
                return Ok(false);
            }
            prev = key;
        }
        if n < chunk.len() {
            break;
        }
    }
    Ok(true)
}

/// Read as many bytes as possible into `buf`, retrying on partial reads.
/// Returns the number of bytes actually read (less than `buf.len()` at EOF).
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

/// Random binary input generation.
///
/// Produces files of little-endian 64-bit keys drawn uniformly from the full
/// `i64` range, filling an in-memory chunk from the PRNG and writing it out
/// until the requested size is reached.
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::block::KEY_BYTES;

/// Default generation chunk: 1MB of keys per fill-and-write pass.
const DEFAULT_CHUNK_BYTES: usize = 1024 * 1024;

/// Configuration for `generate_keys_file`.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Bytes to generate; truncated down to a whole number of keys.
    pub n_bytes: u64,
    /// Size of the fill-and-write chunk.
    pub chunk_bytes: usize,
    /// Fixed seed for bit-reproducible output; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            n_bytes: 0,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            seed: None,
        }
    }
}

/// Write `config.n_bytes` of uniformly random keys to `path`, truncating any
/// existing file. A fixed seed yields identical bytes on every run.
pub fn generate_keys_file(path: &Path, config: &GenConfig) -> io::Result<()> {
    let chunk_keys = (config.chunk_bytes / KEY_BYTES).max(1);
    let n_keys = config.n_bytes / KEY_BYTES as u64;

    let mut rng = match config.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_os_rng(),
    };

    let mut file = File::create(path)?;
    let mut chunk = vec![0u8; chunk_keys * KEY_BYTES];
    let mut written = 0u64;

    while written < n_keys {
        let take = chunk_keys.min((n_keys - written) as usize);
        for i in 0..take {
            let key: i64 = rng.random();
            chunk[i * KEY_BYTES..(i + 1) * KEY_BYTES].copy_from_slice(&key.to_le_bytes());
        }
        file.write_all(&chunk[..take * KEY_BYTES])?;
        written += take as u64;
    }
    Ok(())
}

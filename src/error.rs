use std::io;

use thiserror::Error;

/// Errors surfaced by the sorters and the experiment harness.
///
/// Configuration variants are rejected at construction (or on
/// `set_arity`); any I/O failure mid-sort is fatal to the enclosing
/// sort and leaves temporary files behind for inspection.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("block size must be a positive multiple of 8 bytes, got {0}")]
    InvalidBlockSize(usize),

    #[error("arity must be in [2, {max}] (keys per block), got {arity}")]
    InvalidArity { arity: usize, max: usize },

    #[error("memory budget of {mem} bytes cannot hold a single block of {block} bytes")]
    InvalidMemory { mem: usize, block: usize },
}

pub type SortResult<T> = Result<T, SortError>;

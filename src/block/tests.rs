use super::*;
use std::fs::{self, File};
use std::path::Path;

use crate::error::SortError;

// ---- Helper functions ----

/// Encode keys as the on-disk little-endian format.
fn keys_to_bytes(keys: &[i64]) -> Vec<u8> {
    keys.iter().flat_map(|k| k.to_le_bytes()).collect()
}

/// Create a key file with the given contents and return nothing; the caller
/// owns the path.
fn write_keys(path: &Path, keys: &[i64]) {
    fs::write(path, keys_to_bytes(keys)).unwrap();
}

/// Decode a whole key file.
fn read_keys_raw(path: &Path) -> Vec<i64> {
    fs::read(path)
        .unwrap()
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

// ---- Unit tests for validate_config ----

#[test]
fn test_validate_config_ok() {
    assert_eq!(validate_config(32, 128, 2).unwrap(), 4);
    assert_eq!(validate_config(4096, 1 << 20, 8).unwrap(), 512);
    // arity equal to keys per block is the upper bound
    assert_eq!(validate_config(32, 128, 4).unwrap(), 4);
}

#[test]
fn test_validate_config_bad_block_size() {
    assert!(matches!(
        validate_config(0, 128, 2),
        Err(SortError::InvalidBlockSize(0))
    ));
    assert!(matches!(
        validate_config(30, 128, 2),
        Err(SortError::InvalidBlockSize(30))
    ));
}

#[test]
fn test_validate_config_bad_arity() {
    assert!(matches!(
        validate_config(32, 128, 1),
        Err(SortError::InvalidArity { arity: 1, max: 4 })
    ));
    assert!(matches!(
        validate_config(32, 128, 0),
        Err(SortError::InvalidArity { arity: 0, max: 4 })
    ));
    assert!(matches!(
        validate_config(32, 128, 5),
        Err(SortError::InvalidArity { arity: 5, max: 4 })
    ));
}

#[test]
fn test_validate_config_memory_too_small() {
    assert!(matches!(
        validate_config(32, 31, 2),
        Err(SortError::InvalidMemory { mem: 31, block: 32 })
    ));
}

// ---- Block reads ----

#[test]
fn test_read_block_full_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.bin");
    write_keys(&path, &[10, 20, 30, 40, 50, 60, 70, 80]);

    let mut io = BlockIo::new(32); // 4 keys per block
    let mut file = File::open(&path).unwrap();
    let mut buf = Vec::new();

    assert_eq!(io.read_block(&mut file, 0, &mut buf).unwrap(), 4);
    assert_eq!(buf, vec![10, 20, 30, 40]);

    assert_eq!(io.read_block(&mut file, 1, &mut buf).unwrap(), 4);
    assert_eq!(buf, vec![50, 60, 70, 80]);
}

#[test]
fn test_read_block_short_at_eof() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.bin");
    write_keys(&path, &[1, 2, 3, 4, 5, 6]);

    let mut io = BlockIo::new(32);
    let mut file = File::open(&path).unwrap();
    let mut buf = Vec::new();

    // Second block only holds two keys
    assert_eq!(io.read_block(&mut file, 1, &mut buf).unwrap(), 2);
    assert_eq!(buf, vec![5, 6]);

    // Reading past the end yields zero keys but still counts a transfer
    assert_eq!(io.read_block(&mut file, 2, &mut buf).unwrap(), 0);
    assert!(buf.is_empty());
    assert_eq!(io.io_count(), 2);
}

#[test]
fn test_read_block_random_access() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.bin");
    let keys: Vec<i64> = (0..16).collect();
    write_keys(&path, &keys);

    let mut io = BlockIo::new(32);
    let mut file = File::open(&path).unwrap();
    let mut buf = Vec::new();

    // Blocks can be read out of order; each seek targets index * B
    io.read_block(&mut file, 3, &mut buf).unwrap();
    assert_eq!(buf, vec![12, 13, 14, 15]);
    io.read_block(&mut file, 0, &mut buf).unwrap();
    assert_eq!(buf, vec![0, 1, 2, 3]);
}

#[test]
fn test_read_drops_partial_trailing_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.bin");
    let mut bytes = keys_to_bytes(&[7, 8]);
    bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]); // 3 stray bytes
    fs::write(&path, bytes).unwrap();

    let mut io = BlockIo::new(64);
    let mut file = File::open(&path).unwrap();
    let mut buf = Vec::new();

    assert_eq!(io.read_block(&mut file, 0, &mut buf).unwrap(), 2);
    assert_eq!(buf, vec![7, 8]);
}

#[test]
fn test_read_seq_advances_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.bin");
    write_keys(&path, &[1, 2, 3, 4, 5]);

    let mut io = BlockIo::new(32);
    let mut file = File::open(&path).unwrap();
    let mut buf = Vec::new();

    assert_eq!(io.read_seq(&mut file, &mut buf, 2).unwrap(), 2);
    assert_eq!(buf, vec![1, 2]);
    assert_eq!(io.read_seq(&mut file, &mut buf, 2).unwrap(), 2);
    assert_eq!(buf, vec![3, 4]);
    assert_eq!(io.read_seq(&mut file, &mut buf, 2).unwrap(), 1);
    assert_eq!(buf, vec![5]);
    assert_eq!(io.io_count(), 3);
}

// ---- Block writes ----

#[test]
fn test_write_block_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");

    let mut io = BlockIo::new(32);
    {
        let mut file = File::create(&path).unwrap();
        io.write_block(&mut file, 0, &[4, 3, 2, 1]).unwrap();
        io.write_block(&mut file, 1, &[8, 7]).unwrap();
    }

    assert_eq!(read_keys_raw(&path), vec![4, 3, 2, 1, 8, 7]);
    assert_eq!(io.io_count(), 2);
}

#[test]
fn test_write_block_offset_is_index_times_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");

    let mut io = BlockIo::new(32);
    {
        let mut file = File::create(&path).unwrap();
        // Writing block 1 first leaves a 32-byte hole for block 0
        io.write_block(&mut file, 1, &[9, 9, 9, 9]).unwrap();
        io.write_block(&mut file, 0, &[1, 2, 3, 4]).unwrap();
    }

    assert_eq!(read_keys_raw(&path), vec![1, 2, 3, 4, 9, 9, 9, 9]);
}

#[test]
fn test_append_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");

    let mut io = BlockIo::new(32);
    {
        let mut file = File::create(&path).unwrap();
        io.append(&mut file, &[1, 2, 3, 4]).unwrap();
        io.append(&mut file, &[5, 6]).unwrap(); // partial tail, no seek
    }

    assert_eq!(read_keys_raw(&path), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(io.io_count(), 2);
}

// ---- Counter behavior ----

#[test]
fn test_counter_reset_and_add() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.bin");
    write_keys(&path, &[1, 2, 3, 4]);

    let mut io = BlockIo::new(32);
    let mut file = File::open(&path).unwrap();
    let mut buf = Vec::new();

    io.read_block(&mut file, 0, &mut buf).unwrap();
    assert_eq!(io.io_count(), 1);

    io.reset();
    assert_eq!(io.io_count(), 0);

    io.add(7);
    assert_eq!(io.io_count(), 7);
}

#[test]
fn test_keys_per_block() {
    assert_eq!(BlockIo::new(32).keys_per_block(), 4);
    assert_eq!(BlockIo::new(4096).keys_per_block(), 512);
}

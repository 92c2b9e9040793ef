use super::*;
use std::fs;
use std::path::Path;

// ---- Helper functions ----

/// A harness configuration small enough for tests: 32-byte blocks, a
/// 128-byte memory budget, two sizes, two trials.
fn tiny_config(root: &Path) -> BenchConfig {
    BenchConfig {
        block_bytes: 32,
        mem_bytes: 128,
        multipliers: vec![2, 4],
        trials: 2,
        out_dir: root.join("graphs"),
        work_dir: root.join("work"),
        seed: Some(99),
        quiet: true,
    }
}

/// Parse a two-column CSV file into (multiplier, value) rows.
fn read_rows(path: &Path) -> Vec<(u64, f64)> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let (m, v) = line.split_once(',').unwrap();
            (m.parse().unwrap(), v.parse().unwrap())
        })
        .collect()
}

// ---- Full harness runs ----

#[test]
fn test_run_writes_all_four_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = tiny_config(dir.path());

    let summaries = run_experiments(&config).unwrap();
    assert_eq!(summaries.len(), 2);

    for name in [
        "mergesort_time.csv",
        "mergesort_io.csv",
        "quicksort_time.csv",
        "quicksort_io.csv",
    ] {
        let rows = read_rows(&config.out_dir.join(name));
        assert_eq!(rows.len(), 2, "{} should have one row per size", name);
        assert_eq!(rows[0].0, 2);
        assert_eq!(rows[1].0, 4);
    }
}

#[test]
fn test_io_means_meet_lower_bound() {
    let dir = tempfile::tempdir().unwrap();
    let config = tiny_config(dir.path());

    let summaries = run_experiments(&config).unwrap();
    for summary in &summaries {
        let n_bytes = summary.multiplier * config.mem_bytes as u64;
        let floor = (2 * n_bytes.div_ceil(config.block_bytes as u64)) as f64;
        assert!(
            summary.merge_io >= floor,
            "mergesort mean {} below floor {}",
            summary.merge_io,
            floor
        );
        assert!(
            summary.quick_io >= floor,
            "quicksort mean {} below floor {}",
            summary.quick_io,
            floor
        );
        assert!(summary.merge_secs >= 0.0);
        assert!(summary.quick_secs >= 0.0);
    }
}

#[test]
fn test_work_dir_left_clean() {
    let dir = tempfile::tempdir().unwrap();
    let config = tiny_config(dir.path());

    run_experiments(&config).unwrap();

    // Inputs, outputs, the reference file and all sort temps are deleted
    let leftovers: Vec<String> = fs::read_dir(&config.work_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
}

#[test]
fn test_seeded_runs_reproduce_io_means() {
    let dir1 = tempfile::tempdir().unwrap();
    let dir2 = tempfile::tempdir().unwrap();

    let first = run_experiments(&tiny_config(dir1.path())).unwrap();
    let second = run_experiments(&tiny_config(dir2.path())).unwrap();

    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.merge_io, b.merge_io);
        assert_eq!(a.quick_io, b.quick_io);
    }
}

#[test]
fn test_single_size_single_trial() {
    let dir = tempfile::tempdir().unwrap();
    let config = BenchConfig {
        multipliers: vec![3],
        trials: 1,
        ..tiny_config(dir.path())
    };

    let summaries = run_experiments(&config).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].multiplier, 3);

    let rows = read_rows(&config.out_dir.join("mergesort_io.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, 3);
}

// ---- Seed derivation ----

#[test]
fn test_derive_seed_distinct_per_trial_and_size() {
    let a = derive_seed(Some(1), 4, 0);
    let b = derive_seed(Some(1), 4, 1);
    let c = derive_seed(Some(1), 8, 0);
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
}

#[test]
fn test_derive_seed_none_stays_none() {
    assert_eq!(derive_seed(None, 4, 0), None);
}

// ---- CSV writing ----

#[test]
fn test_write_results_format() {
    let dir = tempfile::tempdir().unwrap();
    let summaries = vec![
        SizeSummary {
            multiplier: 4,
            merge_secs: 0.25,
            merge_io: 100.0,
            quick_secs: 0.5,
            quick_io: 150.5,
        },
        SizeSummary {
            multiplier: 8,
            merge_secs: 1.0,
            merge_io: 300.0,
            quick_secs: 2.0,
            quick_io: 400.0,
        },
    ];

    write_results(dir.path(), &summaries).unwrap();

    let time = fs::read_to_string(dir.path().join("mergesort_time.csv")).unwrap();
    assert_eq!(time, "4,0.250000\n8,1.000000\n");

    let io = fs::read_to_string(dir.path().join("quicksort_io.csv")).unwrap();
    assert_eq!(io, "4,150.5\n8,400\n");
}

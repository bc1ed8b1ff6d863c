//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use slimip::pipeline::{Dataset, INTERCEPT_NAME};

/// Intercept plus one feature that separates the classes on its own
///
/// `X = [[1,1],[1,2],[1,-1],[1,-2]]`, `Y = [1,1,-1,-1]`
pub fn scenario_dataset() -> Dataset {
    Dataset::new(
        vec![
            vec![1.0, 1.0],
            vec![1.0, 2.0],
            vec![1.0, -1.0],
            vec![1.0, -2.0],
        ],
        vec![1.0, 1.0, -1.0, -1.0],
        vec![INTERCEPT_NAME.to_string(), "x".to_string()],
        Some("y".to_string()),
        None,
    )
    .unwrap()
}

/// Intercept plus features `a`, `b` and `c`, for tests that change coefficient flags
pub fn three_feature_dataset() -> Dataset {
    Dataset::new(
        vec![
            vec![1.0, 1.0, 0.0, 2.0],
            vec![1.0, 2.0, 1.0, -1.0],
            vec![1.0, -1.0, 0.0, 1.0],
            vec![1.0, -2.0, 1.0, 0.0],
        ],
        vec![1.0, 1.0, -1.0, -1.0],
        vec![
            INTERCEPT_NAME.to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
        ],
        None,
        None,
    )
    .unwrap()
}

/// The scenario data as CSV, outcome coded 0/1
pub const SCENARIO_CSV: &str = "y,x\n1,1\n1,2\n0,-1\n0,-2\n";

/// Random dataset with an intercept, small integer features and both classes
pub fn random_dataset(rng: &mut StdRng, n_samples: usize, n_features: usize) -> Dataset {
    let mut names = vec![INTERCEPT_NAME.to_string()];
    names.extend((0..n_features).map(|j| format!("x{}", j)));

    let rows: Vec<Vec<f64>> = (0..n_samples)
        .map(|_| {
            let mut row = vec![1.0];
            row.extend((0..n_features).map(|_| rng.gen_range(-3..=3) as f64));
            row
        })
        .collect();
    // first two samples fix one of each class
    let y: Vec<f64> = (0..n_samples)
        .map(|i| match i {
            0 => 1.0,
            1 => -1.0,
            _ if rng.gen_bool(0.5) => 1.0,
            _ => -1.0,
        })
        .collect();

    Dataset::new(rows, y, names, None, None).unwrap()
}

/// Random coefficient vector inside `[-bound, bound]` with roughly half zeros
pub fn random_rho(rng: &mut StdRng, len: usize, bound: i64) -> Vec<f64> {
    (0..len)
        .map(|_| {
            if rng.gen_bool(0.5) {
                0.0
            } else {
                rng.gen_range(-bound..=bound) as f64
            }
        })
        .collect()
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Write `contents` to `name` inside a fresh temp dir
pub fn write_temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

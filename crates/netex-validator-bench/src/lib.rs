//! Synthetic NetEX dataset generator and benchmark utilities.
//!
//! This crate provides deterministic generation of structurally valid (or
//! deliberately flawed) NetEX datasets, for benchmarking and correctness
//! testing of `netex-validator-core` under load.

use std::path::PathBuf;

pub mod correctness;
pub mod generator;

pub use generator::{GeneratorConfig, NetexDataset, SizeTier, generate_dataset};

/// Returns the path where the huge-tier dataset fixture (a ZIP archive of
/// a common file plus one file per line) is stored on disk.
///
/// The file lives under `target/bench-fixtures/huge.netex.zip` so it is
/// automatically gitignored and shared between the generator binary and
/// the benchmark harness.
pub fn huge_fixture_path() -> PathBuf {
    huge_fixtures_dir().join("huge.netex.zip")
}

fn huge_fixtures_dir() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest
        .join("..")
        .join("..")
        .join("target")
        .join("bench-fixtures")
}

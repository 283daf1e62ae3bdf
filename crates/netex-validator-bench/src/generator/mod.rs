//! Synthetic NetEX dataset generator.
//!
//! Produces a common file plus one file per line, matching the shape
//! [`netex_validator_core::orchestrator::DatasetEntry`] expects, with
//! structurally valid cross-references by default and knobs to inject the
//! defects the rule registry and id repository detect.

pub mod identifiers;
mod line_builder;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Configuration for the dataset generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Organizational prefix used for every generated id.
    pub codespace: String,
    pub num_lines: usize,
    pub num_routes_per_line: usize,
    pub num_journey_patterns_per_route: usize,
    pub num_service_journeys_per_pattern: usize,
    pub num_stop_points: usize,
    pub num_operators: usize,
    /// Fraction (0.0-1.0) of `*Ref` attributes that point at an id no file
    /// in the dataset declares, exercising `UNRESOLVED-REFERENCE`.
    pub dangling_ref_rate: f64,
    /// Fraction (0.0-1.0) of line ids deliberately re-declared in a second
    /// file, exercising `DUPLICATE-ID`.
    pub duplicate_id_rate: f64,
}

/// Predefined size tiers for benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// A handful of lines, one file each plus a small common file.
    Small,
    /// Dozens of lines.
    Medium,
    /// Hundreds of lines.
    Large,
    /// Thousands of lines — stresses the dataset orchestrator's
    /// concurrency and the cache's byte-budget eviction.
    XLarge,
}

impl SizeTier {
    /// Returns the default `GeneratorConfig` for this size tier.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        let (lines, routes, patterns, journeys, stops, operators) = match self {
            Self::Small => (5, 1, 2, 3, 20, 2),
            Self::Medium => (50, 1, 3, 5, 200, 8),
            Self::Large => (500, 1, 3, 8, 2000, 20),
            Self::XLarge => (2500, 1, 4, 10, 10_000, 50),
        };
        GeneratorConfig {
            seed,
            codespace: "BENCH".to_owned(),
            num_lines: lines,
            num_routes_per_line: routes,
            num_journey_patterns_per_route: patterns,
            num_service_journeys_per_pattern: journeys,
            num_stop_points: stops,
            num_operators: operators,
            dangling_ref_rate: 0.0,
            duplicate_id_rate: 0.0,
        }
    }
}

/// A generated dataset, ready to pass to
/// [`netex_validator_core::orchestrator::Orchestrator::run`] or zip up for
/// [`netex_validator_core::validate_zip`].
#[derive(Debug, Clone)]
pub struct NetexDataset {
    /// `(file_name, bytes)` pairs; the first entry is always the common
    /// file (`_common.xml`).
    pub entries: Vec<(String, Vec<u8>)>,
}

impl NetexDataset {
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|(_, bytes)| bytes.len()).sum()
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }
}

/// Generates a dataset from the given configuration.
///
/// All randomness is deterministic, seeded from `config.seed`.
pub fn generate_dataset(config: &GeneratorConfig) -> NetexDataset {
    let mut rng = StdRng::seed_from_u64(config.seed);
    line_builder::build(config, &mut rng)
}

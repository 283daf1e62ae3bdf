//! Tests that generated datasets validate cleanly (or, when configured to
//! be flawed, surface the expected findings) across all size tiers and
//! seeds.
#![allow(clippy::expect_used)]

use netex_validator_bench::correctness;
use netex_validator_bench::{SizeTier, generate_dataset};
use netex_validator_core::ValidationOptions;
use netex_validator_core::orchestrator::{CancellationToken, Orchestrator};

fn offline_options() -> ValidationOptions {
    let mut options = ValidationOptions::default();
    options.codespace = "BENCH".to_owned();
    options.allow_schema_network = false;
    options.skip_schema = true;
    options.validation_cache.enabled = false;
    options
}

fn assert_clean(config: &netex_validator_bench::GeneratorConfig, label: &str) {
    let dataset = generate_dataset(config);
    let entry_count = dataset.entries.len();
    let orchestrator = Orchestrator::new();
    let report = orchestrator.run(dataset.entries, &offline_options(), "BENCH", &CancellationToken::new());

    correctness::check_all_files_processed(&report, entry_count).expect(label);
    let result = correctness::check_clean_dataset_has_no_errors(&report);
    assert!(result.is_ok(), "{label}: {result:?}");
}

#[test]
fn generated_small_is_clean_across_seeds() {
    for seed in [42, 123, 999, 7777, 54321] {
        assert_clean(&SizeTier::Small.config(seed), &format!("Small/seed={seed}"));
    }
}

#[test]
fn generated_medium_is_clean_across_seeds() {
    for seed in [42, 123, 999] {
        assert_clean(&SizeTier::Medium.config(seed), &format!("Medium/seed={seed}"));
    }
}

#[test]
fn generated_large_is_clean() {
    assert_clean(&SizeTier::Large.config(42), "Large/seed=42");
}

#[test]
fn generation_is_deterministic() {
    let config = SizeTier::Small.config(42);
    let a = generate_dataset(&config);
    let b = generate_dataset(&config);
    assert_eq!(a.entries, b.entries, "same seed must produce identical output");
}

#[test]
fn different_seeds_produce_different_files() {
    let a = generate_dataset(&SizeTier::Small.config(42));
    let b = generate_dataset(&SizeTier::Small.config(43));
    assert_ne!(a.entries, b.entries, "different seeds must produce different output");
}

#[test]
fn dangling_ref_rate_surfaces_unresolved_references() {
    let mut config = SizeTier::Small.config(42);
    config.dangling_ref_rate = 1.0;
    let dataset = generate_dataset(&config);

    let orchestrator = Orchestrator::new();
    let report = orchestrator.run(dataset.entries, &offline_options(), "BENCH", &CancellationToken::new());
    correctness::check_dangling_refs_are_reported(&report).expect("dangling refs reported");
}

#[test]
fn duplicate_id_rate_surfaces_duplicate_ids() {
    let mut config = SizeTier::Small.config(42);
    config.duplicate_id_rate = 1.0;
    let dataset = generate_dataset(&config);

    let orchestrator = Orchestrator::new();
    let report = orchestrator.run(dataset.entries, &offline_options(), "BENCH", &CancellationToken::new());
    correctness::check_duplicate_ids_are_reported(&report).expect("duplicate ids reported");
}

mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn generated_small_datasets_always_validate_clean(seed in 0u64..10_000) {
            let config = SizeTier::Small.config(seed);
            let dataset = generate_dataset(&config);
            let entry_count = dataset.entries.len();
            let orchestrator = Orchestrator::new();
            let report = orchestrator.run(dataset.entries, &offline_options(), "BENCH", &CancellationToken::new());
            prop_assert!(correctness::check_all_files_processed(&report, entry_count).is_ok());
            prop_assert!(correctness::check_clean_dataset_has_no_errors(&report).is_ok());
        }

        #[test]
        fn generation_is_deterministic_across_seeds(seed in 0u64..10_000) {
            let config = SizeTier::Small.config(seed);
            let a = generate_dataset(&config);
            let b = generate_dataset(&config);
            prop_assert_eq!(a.entries, b.entries);
        }
    }
}

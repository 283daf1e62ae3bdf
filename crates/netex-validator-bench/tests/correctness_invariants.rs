//! Post-run invariant tests using generated data at more than hand-written-
//! fixture scale: report order stability, cache transparency, and id
//! repository harvesting under concurrency.
#![allow(clippy::expect_used)]

use netex_validator_bench::correctness;
use netex_validator_bench::{SizeTier, generate_dataset};
use netex_validator_core::ValidationOptions;
use netex_validator_core::orchestrator::{CancellationToken, Orchestrator};

fn medium_dataset() -> netex_validator_bench::NetexDataset {
    generate_dataset(&SizeTier::Medium.config(42))
}

fn options(cache_enabled: bool) -> ValidationOptions {
    let mut options = ValidationOptions::default();
    options.codespace = "BENCH".to_owned();
    options.allow_schema_network = false;
    options.skip_schema = true;
    options.validation_cache.enabled = cache_enabled;
    options
}

#[test]
fn report_entry_order_is_stable_across_identical_runs() {
    let dataset = medium_dataset();
    let options = options(false);

    let first = Orchestrator::new().run(dataset.entries.clone(), &options, "BENCH", &CancellationToken::new());
    let second = Orchestrator::new().run(dataset.entries, &options, "BENCH", &CancellationToken::new());

    correctness::check_reports_are_order_stable(&first, &second).expect("order stable");
}

#[test]
fn cache_enabled_run_matches_cache_disabled_run() {
    let dataset = medium_dataset();

    let uncached = Orchestrator::new().run(dataset.entries.clone(), &options(false), "BENCH", &CancellationToken::new());
    let cached = Orchestrator::new().run(dataset.entries, &options(true), "BENCH", &CancellationToken::new());

    correctness::check_reports_are_order_stable(&uncached, &cached)
        .expect("caching must not change the set or order of findings");
}

#[test]
fn all_files_in_a_large_dataset_are_processed() {
    let dataset = generate_dataset(&SizeTier::Large.config(7));
    let expected = dataset.entries.len();
    let report = Orchestrator::new().run(dataset.entries, &options(false), "BENCH", &CancellationToken::new());
    correctness::check_all_files_processed(&report, expected).expect("all files processed");
}

#[test]
fn concurrent_runs_over_the_same_dataset_agree() {
    let dataset = generate_dataset(&SizeTier::Large.config(7));
    let mut options = options(false);
    options.concurrent_files = 8;

    let a = Orchestrator::new().run(dataset.entries.clone(), &options, "BENCH", &CancellationToken::new());
    let b = Orchestrator::new().run(dataset.entries, &options, "BENCH", &CancellationToken::new());

    correctness::check_reports_are_order_stable(&a, &b).expect("concurrency must not affect ordering");
}

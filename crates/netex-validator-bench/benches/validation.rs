//! End-to-end dataset validation throughput across size tiers, comparing
//! the cost of the schema and rule-evaluation phases toggled on and off.
#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use netex_validator_bench::{SizeTier, generate_dataset};
use netex_validator_core::ValidationOptions;
use netex_validator_core::orchestrator::{CancellationToken, Orchestrator};

fn offline_options(skip_schema: bool, skip_xpath_rules: bool) -> ValidationOptions {
    let mut options = ValidationOptions::default();
    options.codespace = "BENCH".to_owned();
    options.allow_schema_network = false;
    options.skip_schema = skip_schema;
    options.skip_xpath_rules = skip_xpath_rules;
    options.validation_cache.enabled = false;
    options
}

fn bench_validate_dataset(c: &mut Criterion) {
    let mut group = c.benchmark_group("orchestrator/run");
    group.sample_size(10);

    for (name, tier) in [
        ("S", SizeTier::Small),
        ("M", SizeTier::Medium),
        ("L", SizeTier::Large),
    ] {
        let dataset = generate_dataset(&tier.config(42));
        let bytes = dataset.total_bytes() as u64;

        for (variant, skip_schema, skip_xpath_rules) in [
            ("rules_only", true, false),
            ("schema_and_rules", false, false),
        ] {
            group.throughput(Throughput::Bytes(bytes));
            let options = offline_options(skip_schema, skip_xpath_rules);
            group.bench_with_input(BenchmarkId::new(variant, name), &dataset.entries, |b, entries| {
                b.iter(|| {
                    let orchestrator = Orchestrator::new();
                    let _ = orchestrator.run(entries.clone(), &options, "BENCH", &CancellationToken::new());
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_validate_dataset);
criterion_main!(benches);

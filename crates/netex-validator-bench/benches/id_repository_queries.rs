//! Id-repository cross-file query throughput: harvesting ids/references at
//! generation scale, then running `duplicate_ids` and `validate_references`
//! over the fully-populated repository.
#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use netex_validator_bench::{SizeTier, generate_dataset};
use netex_validator_core::id_repository::IdRepository;

fn populated_repo(lines: usize, seed: u64) -> (IdRepository, usize) {
    let mut config = SizeTier::Medium.config(seed);
    config.num_lines = lines;
    let dataset = generate_dataset(&config);

    let repo = IdRepository::new();
    let mut ids_registered = 0;
    for (file_name, bytes) in &dataset.entries {
        if file_name.starts_with('_') {
            repo.mark_common(file_name);
        }
        let tree = netex_validator_core::xml::parse(bytes, u64::MAX).expect("parses");
        if let Some(root) = tree.root() {
            harvest(&tree, root, file_name, &repo, &mut ids_registered);
        }
    }
    (repo, ids_registered)
}

fn harvest(
    tree: &netex_validator_core::xml::XmlTree,
    node: netex_validator_core::xml::NodeRef,
    file_name: &str,
    repo: &IdRepository,
    count: &mut usize,
) {
    if let Some(element) = tree.get(node) {
        if let Some(id) = element.attr("id") {
            let version = element.attr("version").unwrap_or("1");
            let _ = repo.add_id(id, version, file_name, Some(element.local_name.as_str()));
            *count += 1;
        }
        if let Some(reference) = element.attr("ref") {
            let version = element.attr("version").unwrap_or("1");
            repo.add_reference(reference, version, file_name);
        }
        for &child in tree.children(node) {
            harvest(tree, child, file_name, repo, count);
        }
    }
}

fn bench_duplicate_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("id_repository/duplicate_ids");

    for (name, lines) in [("S", 5), ("M", 50), ("L", 500)] {
        let (repo, ids_registered) = populated_repo(lines, 1);
        group.throughput(Throughput::Elements(ids_registered as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &repo, |b, repo| {
            b.iter(|| {
                let _ = repo.duplicate_ids();
            });
        });
    }
    group.finish();
}

fn bench_validate_references(c: &mut Criterion) {
    let mut group = c.benchmark_group("id_repository/validate_references");

    for (name, lines) in [("S", 5), ("M", 50), ("L", 500)] {
        let (repo, ids_registered) = populated_repo(lines, 1);
        group.throughput(Throughput::Elements(ids_registered as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &repo, |b, repo| {
            b.iter(|| {
                let _ = repo.validate_references(&[]);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_duplicate_ids, bench_validate_references);
criterion_main!(benches);

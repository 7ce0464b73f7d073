#[macro_use]
extern crate criterion;

use std::{collections::BTreeMap, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use grovedb_incremental_merkle_tree::{
    MemLayerCache, SequentialWorkHasher, Tree, TreeConfig, ValidatorConfig, validate_proof,
};

/// 32-byte leaf value holding `i` as little endian.
fn leaf(i: u64) -> [u8; 32] {
    let mut value = [0u8; 32];
    value[..8].copy_from_slice(&i.to_le_bytes());
    value
}

fn prepare_tree(config: TreeConfig, count: u64) -> Tree {
    let mut tree = Tree::new(config);
    for i in 0..count {
        tree.add(&leaf(i));
    }
    tree
}

fn bench(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("tree insertion");
        let inputs = [10_000u64, 100_000, 1_000_000];
        for input in inputs.iter() {
            group.bench_with_input(BenchmarkId::new("leaves", input), input, |b, &size| {
                b.iter(|| prepare_tree(TreeConfig::default(), size));
            });
        }
    }

    c.bench_function("tree insertion sequential work", |b| {
        let config =
            TreeConfig::default().with_leaf_hasher(Arc::new(SequentialWorkHasher::new()));
        b.iter(|| prepare_tree(config.clone(), 100_000));
    });

    c.bench_function("tree insertion cached", |b| {
        b.iter(|| {
            let mut cache = MemLayerCache::new();
            let mut tree = Tree::default();
            for i in 0..100_000 {
                tree.add_cached(&leaf(i), &mut cache).expect("cache append");
            }
            cache
        });
    });

    c.bench_function("tree root", |b| {
        let tree = prepare_tree(TreeConfig::default(), 1_000_001);
        b.iter(|| tree.root().expect("root"));
    });

    c.bench_function("tree verify", |b| {
        let proven: Vec<u64> = (0..16).map(|i| i * 62_501).collect();
        let config = TreeConfig::default().with_leaves_to_prove(proven.iter().copied());
        let tree = prepare_tree(config.clone(), 1_000_000);
        let (root, proof) = tree.root_and_proof().expect("root and proof");
        let leaves: BTreeMap<u64, Vec<u8>> =
            proven.iter().map(|i| (*i, leaf(*i).to_vec())).collect();
        let validator = ValidatorConfig::from(&config);
        b.iter(|| {
            let valid = validate_proof(&root, &leaves, &proof, &validator).expect("validate");
            assert!(valid);
        });
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);

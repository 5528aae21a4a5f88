//! Performance benchmarks for Merkle tree construction.
//!
//! Run with: `cargo bench --bench merkle`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use shadow_atlas::{BoundaryKind, MerkleLeafInput, TestHashOracle, TreeConfiguration, TreeDepth};
use shadow_atlas::merkle::tree::MerkleTree;

fn leaves(n: usize) -> Vec<MerkleLeafInput> {
    (0..n)
        .map(|i| MerkleLeafInput {
            id: format!("addr{i}"),
            boundary_kind: BoundaryKind::StateLower,
            geometry_hash: format!("geom{i}"),
            authority_level: 5,
            source: None,
        })
        .collect()
}

/// Tree build time at fixed depth 18, growing leaf counts.
fn bench_build_by_leaf_count(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let oracle = TestHashOracle::default();
    let config = TreeConfiguration { depth: TreeDepth::D18, batch_size: 64 };

    let mut group = c.benchmark_group("build_by_leaf_count");
    for leaf_count in [16, 256, 4096] {
        let inputs = leaves(leaf_count);

        group.throughput(Throughput::Elements(leaf_count as u64));
        group.bench_with_input(
            BenchmarkId::new("leaves", leaf_count),
            &inputs,
            |b, inputs| {
                b.iter(|| rt.block_on(MerkleTree::build(black_box(inputs), config, &oracle)).unwrap())
            },
        );
    }
    group.finish();
}

/// Tree build time at a fixed leaf count, across every supported depth.
fn bench_build_by_depth(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let oracle = TestHashOracle::default();
    let inputs = leaves(256);

    let mut group = c.benchmark_group("build_by_depth");
    for depth in [TreeDepth::D18, TreeDepth::D20, TreeDepth::D22, TreeDepth::D24] {
        let config = TreeConfiguration { depth, batch_size: 64 };

        group.bench_with_input(
            BenchmarkId::new("depth", depth.as_u32()),
            &inputs,
            |b, inputs| {
                b.iter(|| rt.block_on(MerkleTree::build(black_box(inputs), config, &oracle)).unwrap())
            },
        );
    }
    group.finish();
}

/// Proof generation overhead once a tree is built.
fn bench_generate_proof(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let oracle = TestHashOracle::default();
    let config = TreeConfiguration { depth: TreeDepth::D20, batch_size: 64 };
    let inputs = leaves(1000);
    let tree = rt.block_on(MerkleTree::build(&inputs, config, &oracle)).unwrap();

    c.bench_function("generate_proof", |b| {
        b.iter(|| tree.generate_proof(black_box("addr500")).unwrap())
    });
}

criterion_group!(
    benches,
    bench_build_by_leaf_count,
    bench_build_by_depth,
    bench_generate_proof,
);
criterion_main!(benches);

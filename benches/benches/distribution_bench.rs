//! # Distribution Benchmarks
//!
//! Mede a distribuição de canais e as consultas à matriz de qualidade
//! em função do tamanho da rede.
//!
//! Run: `cargo bench --bench distribution_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qns_core::{NetworkConfig, NetworkNode, NodeId, Position, TopologyGraph};
use qns_entanglement::ChannelDistributor;

fn grid_nodes(count: usize) -> Vec<NetworkNode> {
    (0..count)
        .map(|i| {
            NetworkNode::new(
                (i + 1) as u64,
                Position::new((i % 10) as f64, (i / 10) as f64, 0.0),
                4,
            )
        })
        .collect()
}

fn populated(nodes: &[NetworkNode]) -> TopologyGraph {
    let distributor = ChannelDistributor::new(NetworkConfig::default());
    let mut graph = TopologyGraph::new();
    for node in nodes {
        graph.add_node(node.clone()).unwrap();
    }
    for channel in distributor.distribute(nodes).unwrap() {
        graph.add_channel(channel).unwrap();
    }
    graph
}

/// Benchmark da distribuição completa (n(n−1)/2 canais)
fn bench_distribute(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribute");
    let distributor = ChannelDistributor::new(NetworkConfig::default());

    for size in [4usize, 16, 32] {
        let nodes = grid_nodes(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &nodes, |b, nodes| {
            b.iter(|| black_box(distributor.distribute(nodes).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark das consultas de fidelidade e vizinhança
fn bench_quality_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("quality_matrix");

    let nodes = grid_nodes(32);
    let graph = populated(&nodes);

    group.bench_function("fidelity_lookup", |b| {
        b.iter(|| black_box(graph.fidelity(NodeId(3), NodeId(17))))
    });

    group.bench_function("neighbors", |b| {
        b.iter(|| black_box(graph.neighbors(NodeId(7))))
    });

    group.bench_function("snapshot", |b| b.iter(|| black_box(graph.snapshot())));

    group.finish();
}

criterion_group!(benches, bench_distribute, bench_quality_matrix);
criterion_main!(benches);

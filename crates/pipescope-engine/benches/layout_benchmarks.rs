//! Benchmarks for forest layout and highlight derivation
//!
//! Graphs are generated as balanced trees plus a standalone row and a
//! sprinkling of cross-reference edges.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pipescope_core::{Column, Edge, LayoutConfig, Node};
use pipescope_engine::{derive_highlight, layout, layout_with_adjacency, SelectionState};
use pipescope_graph::Adjacency;

/// Generate `trees` trees of the given fan-out and depth, plus standalone nodes
fn generate_forest(trees: usize, fan_out: usize, depth: usize) -> (Vec<Node>, Vec<Edge>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for t in 0..trees {
        let root = format!("tree_{}.root", t);
        nodes.push(Node::table(root.clone(), format!("root_{}", t)));

        let mut frontier = vec![root];
        for level in 0..depth {
            let mut next = Vec::new();
            for parent in &frontier {
                for c in 0..fan_out {
                    let id = format!("{}.{}_{}", parent, level, c);
                    let columns = (0..(c % 12))
                        .map(|i| Column::new(format!("col_{}", i), "String"))
                        .collect();
                    nodes.push(Node::view(id.clone(), format!("v{}", c), parent.clone()).with_columns(columns));
                    edges.push(Edge::structural(parent.clone(), id.clone()));
                    next.push(id);
                }
            }
            frontier = next;
        }
    }

    for s in 0..trees {
        nodes.push(Node::table(format!("standalone_{}", s), format!("standalone_{}", s)));
    }

    // Cross references between the first node of each tree
    for t in 1..trees {
        edges.push(Edge::cross_reference(format!("tree_{}.root", t - 1), format!("tree_{}.root", t)));
    }

    (nodes, edges)
}

/// Benchmark: full layout (adjacency + placement)
fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();

    for trees in [10, 50, 200].iter() {
        let (nodes, edges) = generate_forest(*trees, 3, 3);

        group.bench_with_input(BenchmarkId::from_parameter(nodes.len()), trees, |b, _| {
            b.iter(|| black_box(layout(&nodes, &edges, &config)));
        });
    }

    group.finish();
}

/// Benchmark: placement only, with adjacency built once
fn bench_layout_prebuilt_adjacency(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_prebuilt_adjacency");
    let config = LayoutConfig::default();

    // Deep chains stress the width memo
    for depth in [4, 6, 8].iter() {
        let (nodes, edges) = generate_forest(4, 2, *depth);
        let adjacency = Adjacency::build(&nodes, &edges);

        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, _| {
            b.iter(|| black_box(layout_with_adjacency(&nodes, &adjacency, &config)));
        });
    }

    group.finish();
}

/// Benchmark: recomputing the highlight after a click
fn bench_highlight(c: &mut Criterion) {
    let (nodes, edges) = generate_forest(200, 3, 3);
    let adjacency = Adjacency::build(&nodes, &edges);
    let state = SelectionState::Selected("tree_100.root".to_string());

    c.bench_function("derive_highlight", |b| {
        b.iter(|| black_box(derive_highlight(&state, &adjacency, &nodes, &edges)));
    });
}

criterion_group!(benches, bench_layout, bench_layout_prebuilt_adjacency, bench_highlight);
criterion_main!(benches);

//! Deep operation benchmarks: hash, copy and equality on shared DAGs.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use planlayer::lqp::nodes::{ColumnDefinition, JoinNode, LimitNode, StoredTableNode};
use planlayer::lqp::{lqp_deep_copy, lqp_deep_equals, lqp_hash, LqpNodeRef};
use planlayer::DataType;
use std::sync::Arc;
use std::time::Duration;

/// Each level joins the level below with itself: `depth + 1` nodes but
/// `2^depth` root-to-leaf paths.
fn ladder(depth: usize) -> LqpNodeRef {
    let mut node = StoredTableNode::make(
        "t",
        vec![ColumnDefinition::new("a", DataType::Int64, false)],
    );
    for _ in 0..depth {
        node = JoinNode::cross(Arc::clone(&node), Arc::clone(&node));
    }
    node
}

/// A chain without sharing, for comparison
fn chain(length: usize) -> LqpNodeRef {
    let mut node = StoredTableNode::make(
        "t",
        vec![ColumnDefinition::new("a", DataType::Int64, false)],
    );
    for i in 0..length {
        node = LimitNode::make(i as u64, node);
    }
    node
}

fn bench_deep_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_hash");
    for depth in [16usize, 64, 256] {
        let plan = ladder(depth);
        group.bench_with_input(BenchmarkId::new("ladder", depth), &plan, |b, plan| {
            b.iter(|| lqp_hash(plan));
        });
        let plan = chain(depth);
        group.bench_with_input(BenchmarkId::new("chain", depth), &plan, |b, plan| {
            b.iter(|| lqp_hash(plan));
        });
    }
    group.finish();
}

fn bench_deep_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_copy");
    for depth in [16usize, 64, 256] {
        let plan = ladder(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &plan, |b, plan| {
            b.iter(|| lqp_deep_copy(plan));
        });
    }
    group.finish();
}

fn bench_deep_equals(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_equals");
    for depth in [16usize, 64, 256] {
        let plan = ladder(depth);
        let copy = lqp_deep_copy(&plan);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| lqp_deep_equals(&plan, &copy));
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_deep_hash, bench_deep_copy, bench_deep_equals
}
criterion_main!(benches);

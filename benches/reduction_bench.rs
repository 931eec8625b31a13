//! Criterion micro-benchmarks for the fan-out reduction path.
//!
//! These benchmarks measure:
//! - Pure reduction of partition outcomes under each policy
//! - Coordinator dispatch of no-op partition operations
//! - Stats aggregation across partitions
//!
//! Run with: `cargo bench --bench reduction_bench`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use partition_admin::admin::{
    AdminOperation, FanOutCoordinator, PartitionOutcome, PartitionedTopicStats, ReductionPolicy,
    SubscriptionStats, TopicStats, reduce,
};
use partition_admin::error::AdminError;
use partition_admin::metadata::PartitionedTopicMetadata;
use partition_admin::topic_name::TopicName;

const PARTITION_COUNTS: [u32; 4] = [1, 16, 128, 1024];

/// Every third partition fails with the kind the policy tolerates.
fn outcomes(policy: ReductionPolicy, partitions: u32) -> Vec<PartitionOutcome<()>> {
    (0..partitions)
        .map(|i| {
            if i % 3 != 0 {
                return PartitionOutcome::ok(i, ());
            }
            let err = match policy {
                ReductionPolicy::AllMustSucceed => AdminError::internal("down"),
                ReductionPolicy::ToleratedNotFound => AdminError::not_found("missing"),
                ReductionPolicy::FailOnlyIfAllFail => AdminError::precondition_failed("busy"),
                ReductionPolicy::ConflictTolerant => AdminError::conflict("exists"),
            };
            PartitionOutcome::err(i, err)
        })
        .collect()
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");

    for policy in [
        ReductionPolicy::AllMustSucceed,
        ReductionPolicy::ToleratedNotFound,
        ReductionPolicy::FailOnlyIfAllFail,
        ReductionPolicy::ConflictTolerant,
    ] {
        for &partitions in &PARTITION_COUNTS {
            let input = outcomes(policy, partitions);
            group.throughput(Throughput::Elements(u64::from(partitions)));
            group.bench_with_input(
                BenchmarkId::new(policy.as_str(), partitions),
                &input,
                |b, input| b.iter(|| black_box(reduce(policy, input.clone()))),
            );
        }
    }

    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let topic = TopicName::persistent("public", "default", "bench").expect("valid topic name");
    let coordinator = FanOutCoordinator::new();

    for &partitions in &PARTITION_COUNTS {
        group.throughput(Throughput::Elements(u64::from(partitions)));
        group.bench_with_input(
            BenchmarkId::new("noop", partitions),
            &partitions,
            |b, &partitions| {
                b.to_async(&runtime).iter(|| async {
                    let aggregate = coordinator
                        .fan_out(
                            AdminOperation::ResetCursor,
                            ReductionPolicy::FailOnlyIfAllFail,
                            &topic,
                            0..partitions,
                            |p| async move { Ok::<_, AdminError>(p.partition_index()) },
                        )
                        .await;
                    black_box(aggregate)
                })
            },
        );
    }

    group.finish();
}

fn bench_stats_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats_aggregate");
    let topic = TopicName::persistent("public", "default", "bench").expect("valid topic name");

    let mut partition_stats = TopicStats::default();
    partition_stats.msg_in_counter = 1_000;
    for sub in ["billing", "audit", "search"] {
        partition_stats.subscriptions.insert(
            sub.to_string(),
            SubscriptionStats {
                msg_backlog: 50,
                consumers: 2,
                ..Default::default()
            },
        );
    }

    for &partitions in &PARTITION_COUNTS {
        let input: Vec<_> = (0..partitions)
            .map(|i| PartitionOutcome::ok(i, partition_stats.clone()))
            .collect();
        group.throughput(Throughput::Elements(u64::from(partitions)));
        for per_partition in [false, true] {
            let id = if per_partition { "per_partition" } else { "totals" };
            group.bench_with_input(BenchmarkId::new(id, partitions), &input, |b, input| {
                b.iter(|| {
                    let mut stats =
                        PartitionedTopicStats::new(PartitionedTopicMetadata::new(partitions));
                    stats.aggregate(&topic, input.clone(), per_partition);
                    black_box(stats)
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_reduce, bench_fan_out, bench_stats_aggregate);
criterion_main!(benches);

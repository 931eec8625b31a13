//! Integration tests for fan-out reduction through the admin handler.
//!
//! Each test scripts a `MockCluster` with per-partition failures and checks
//! the logical outcome produced under the operation's reduction policy.

use std::sync::Arc;
use std::time::Duration;

use partition_admin::admin::{
    AdminConfig, AdminOperation, MockCluster, MockOp, PartitionOutcome, PartitionedTopicAdmin,
    PolicyTable, ReductionPolicy, reduce,
};
use partition_admin::error::{AdminError, ErrorKind};
use partition_admin::metadata::InMemoryMetadataStore;
use partition_admin::topic_name::TopicName;
use partition_admin::types::{CursorTarget, MessageId};

fn topic() -> TopicName {
    TopicName::persistent("public", "default", "orders").unwrap()
}

async fn setup(config: AdminConfig) -> (Arc<MockCluster>, PartitionedTopicAdmin) {
    let cluster = Arc::new(MockCluster::new());
    let admin = PartitionedTopicAdmin::new(
        config,
        Arc::new(InMemoryMetadataStore::new()),
        cluster.clone(),
        cluster.clone(),
    );
    (cluster, admin)
}

/// Partitioned topic with metadata only; no physical partitions exist.
async fn metadata_only(partitions: u32) -> (Arc<MockCluster>, PartitionedTopicAdmin) {
    let (cluster, admin) = setup(AdminConfig::default().with_create_partitions_on_create(false)).await;
    admin.create_partitioned(&topic(), partitions).await.unwrap();
    assert_eq!(cluster.topic_count().await, 0);
    (cluster, admin)
}

/// Partitioned topic whose partitions all carry subscription `sub`.
async fn with_subscription(partitions: u32) -> (Arc<MockCluster>, PartitionedTopicAdmin) {
    let (cluster, admin) = setup(AdminConfig::default()).await;
    admin.create_partitioned(&topic(), partitions).await.unwrap();
    admin
        .create_subscription(&topic(), "sub", MessageId::LATEST, false)
        .await
        .unwrap();
    (cluster, admin)
}

// ============================================================================
// ToleratedNotFound
// ============================================================================

#[tokio::test]
async fn test_unload_with_every_partition_missing_succeeds() {
    let (cluster, admin) = metadata_only(3).await;

    admin.unload(&topic()).await.unwrap();
    assert_eq!(cluster.calls(MockOp::UnloadTopic).await, 3);
}

#[tokio::test]
async fn test_unload_surfaces_non_not_found_error() {
    let (cluster, admin) = setup(AdminConfig::default()).await;
    admin.create_partitioned(&topic(), 3).await.unwrap();
    cluster
        .fail(
            MockOp::UnloadTopic,
            &topic().partition(1),
            AdminError::internal("bundle owner unreachable"),
        )
        .await;

    let err = admin.unload(&topic()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.message(), "bundle owner unreachable");
}

#[tokio::test]
async fn test_delete_partitioned_tolerates_missing_partitions() {
    let (cluster, admin) = setup(AdminConfig::default().with_create_partitions_on_create(false)).await;
    admin.create_partitioned(&topic(), 3).await.unwrap();
    cluster.add_topic(&topic().partition(0)).await;

    admin.delete_partitioned(&topic(), false).await.unwrap();
    assert!(!cluster.has_topic(&topic().partition(0)).await);
    assert_eq!(
        admin.get_partitioned_metadata(&topic()).await.unwrap().partitions,
        0
    );
}

// ============================================================================
// AllMustSucceed
// ============================================================================

#[tokio::test]
async fn test_skip_all_fails_when_every_partition_fails() {
    let (cluster, admin) = with_subscription(3).await;
    for i in 0..3 {
        cluster
            .fail(
                MockOp::SkipAllMessages,
                &topic().partition(i),
                AdminError::precondition_failed("cursor is fenced"),
            )
            .await;
    }

    let err = admin.skip_all_messages(&topic(), "sub").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_skip_all_reports_lowest_failing_partition() {
    let (cluster, admin) = with_subscription(4).await;
    // The higher index completes first.
    cluster
        .set_delay(&topic().partition(1), Duration::from_millis(50))
        .await;
    cluster
        .fail(
            MockOp::SkipAllMessages,
            &topic().partition(1),
            AdminError::internal("p1"),
        )
        .await;
    cluster
        .fail(
            MockOp::SkipAllMessages,
            &topic().partition(3),
            AdminError::internal("p3"),
        )
        .await;

    let err = admin.skip_all_messages(&topic(), "sub").await.unwrap_err();
    assert_eq!(err.message(), "p1");
}

#[tokio::test]
async fn test_failure_waits_for_every_partition() {
    let (cluster, admin) = with_subscription(3).await;
    cluster
        .fail(
            MockOp::SkipAllMessages,
            &topic().partition(0),
            AdminError::internal("fast failure"),
        )
        .await;
    cluster
        .set_delay(&topic().partition(2), Duration::from_millis(50))
        .await;
    cluster.set_backlog(&topic().partition(2), "sub", 7).await;

    assert!(admin.skip_all_messages(&topic(), "sub").await.is_err());

    // The slow partition completed before the logical result was produced.
    let sub = cluster
        .subscription(&topic().partition(2), "sub")
        .await
        .unwrap();
    assert_eq!(sub.backlog, 0);
    assert_eq!(cluster.calls(MockOp::SkipAllMessages).await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_partitions_are_dispatched_concurrently() {
    const PARTITIONS: u32 = 8;
    let delay = Duration::from_millis(100);

    let (cluster, admin) = with_subscription(PARTITIONS).await;
    for i in 0..PARTITIONS {
        cluster.set_delay(&topic().partition(i), delay).await;
    }

    let start = tokio::time::Instant::now();
    admin.skip_all_messages(&topic(), "sub").await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(cluster.calls(MockOp::SkipAllMessages).await, PARTITIONS as usize);
    assert!(elapsed >= delay, "finished before any partition: {elapsed:?}");
    assert!(elapsed < delay * 2, "partitions ran one after another: {elapsed:?}");
}

#[tokio::test]
async fn test_panicking_partition_is_internal_error() {
    let (cluster, admin) = with_subscription(2).await;
    cluster
        .panic_on(MockOp::SkipAllMessages, &topic().partition(1))
        .await;

    let err = admin.skip_all_messages(&topic(), "sub").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.message(), "Partition task panicked");
}

// ============================================================================
// FailOnlyIfAllFail
// ============================================================================

#[tokio::test]
async fn test_reset_cursor_succeeds_with_one_partition_busy() {
    let (cluster, admin) = with_subscription(4).await;
    cluster
        .fail(
            MockOp::ResetCursor,
            &topic().partition(2),
            AdminError::precondition_failed("consumer connected"),
        )
        .await;

    admin
        .reset_cursor(&topic(), "sub", CursorTarget::Timestamp(1_000))
        .await
        .unwrap();

    let reset = cluster
        .subscription(&topic().partition(0), "sub")
        .await
        .unwrap();
    assert_eq!(reset.cursor, Some(CursorTarget::Timestamp(1_000)));
}

#[tokio::test]
async fn test_reset_cursor_fails_when_every_partition_busy() {
    let (cluster, admin) = with_subscription(4).await;
    for i in 0..4 {
        cluster
            .fail(
                MockOp::ResetCursor,
                &topic().partition(i),
                AdminError::precondition_failed("consumer connected"),
            )
            .await;
    }

    let err = admin
        .reset_cursor(&topic(), "sub", CursorTarget::Timestamp(1_000))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_reset_cursor_other_error_is_fatal() {
    let (cluster, admin) = with_subscription(4).await;
    cluster
        .fail(
            MockOp::ResetCursor,
            &topic().partition(3),
            AdminError::internal("ledger closed"),
        )
        .await;

    let err = admin
        .reset_cursor(&topic(), "sub", CursorTarget::Timestamp(1_000))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

// ============================================================================
// ConflictTolerant
// ============================================================================

#[tokio::test]
async fn test_create_subscription_conflict_on_every_partition() {
    let (cluster, admin) = setup(AdminConfig::default()).await;
    admin.create_partitioned(&topic(), 3).await.unwrap();
    for i in 0..3 {
        cluster.add_subscription(&topic().partition(i), "sub").await;
    }

    let err = admin
        .create_subscription(&topic(), "sub", MessageId::LATEST, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_create_subscription_fills_missing_partition() {
    let (cluster, admin) = setup(AdminConfig::default()).await;
    admin.create_partitioned(&topic(), 3).await.unwrap();
    cluster.add_subscription(&topic().partition(0), "sub").await;
    cluster.add_subscription(&topic().partition(1), "sub").await;

    admin
        .create_subscription(&topic(), "sub", MessageId::EARLIEST, true)
        .await
        .unwrap();

    let created = cluster
        .subscription(&topic().partition(2), "sub")
        .await
        .unwrap();
    assert_eq!(created.start, Some(MessageId::EARLIEST));
    assert!(created.replicated);
}

// ============================================================================
// Policy overrides
// ============================================================================

#[tokio::test]
async fn test_policy_override_changes_reduction() {
    let policies = PolicyTable::new().with(AdminOperation::ResetCursor, ReductionPolicy::AllMustSucceed);
    let (cluster, admin) = setup(AdminConfig::default().with_policies(policies)).await;
    admin.create_partitioned(&topic(), 4).await.unwrap();
    admin
        .create_subscription(&topic(), "sub", MessageId::LATEST, false)
        .await
        .unwrap();
    cluster
        .fail(
            MockOp::ResetCursor,
            &topic().partition(2),
            AdminError::precondition_failed("consumer connected"),
        )
        .await;

    let err = admin
        .reset_cursor(&topic(), "sub", CursorTarget::Timestamp(1_000))
        .await
        .unwrap_err();
    assert!(err.is_precondition_failed());
}

// ============================================================================
// Pure reduction
// ============================================================================

#[test]
fn test_reduce_does_not_depend_on_observation_order() {
    let forward = vec![
        PartitionOutcome::ok(0, 1u32),
        PartitionOutcome::err(1, AdminError::conflict("exists")),
        PartitionOutcome::ok(2, 3u32),
    ];
    let mut backward = forward.clone();
    backward.reverse();

    for policy in [
        ReductionPolicy::AllMustSucceed,
        ReductionPolicy::ConflictTolerant,
    ] {
        let a = reduce(policy, forward.clone());
        let b = reduce(policy, backward.clone());
        assert_eq!(a.is_success(), b.is_success());
        assert_eq!(a.values, b.values);
        assert_eq!(a.tolerated, b.tolerated);
    }
}

#[test]
fn test_reduce_empty_is_success() {
    let outcome = reduce::<()>(ReductionPolicy::FailOnlyIfAllFail, Vec::new());
    assert!(outcome.is_success());
    assert_eq!(outcome.partitions, 0);
}

//! Integration tests for partitioned stats aggregation.

use std::sync::Arc;

use partition_admin::admin::{
    AdminConfig, CursorInternalStats, MockCluster, MockOp, PartitionedTopicAdmin,
    TopicInternalStats, TopicStats,
};
use partition_admin::error::{AdminError, ErrorKind};
use partition_admin::metadata::InMemoryMetadataStore;
use partition_admin::topic_name::TopicName;
use partition_admin::types::MessageId;

fn topic() -> TopicName {
    TopicName::persistent("public", "default", "orders").unwrap()
}

fn admin_for(cluster: &Arc<MockCluster>, config: AdminConfig) -> PartitionedTopicAdmin {
    PartitionedTopicAdmin::new(
        config,
        Arc::new(InMemoryMetadataStore::new()),
        cluster.clone(),
        cluster.clone(),
    )
}

fn counters(msg_in: u64, storage: u64) -> TopicStats {
    let mut stats = TopicStats::default();
    stats.msg_rate_in = msg_in as f64;
    stats.msg_in_counter = msg_in;
    stats.storage_size = storage;
    stats
}

/// Four partitions with `billing` backlogs [10, 20, 0, 100].
async fn four_partitions() -> (Arc<MockCluster>, PartitionedTopicAdmin) {
    let cluster = Arc::new(MockCluster::new());
    let admin = admin_for(&cluster, AdminConfig::default());
    admin.create_partitioned(&topic(), 4).await.unwrap();
    admin
        .create_subscription(&topic(), "billing", MessageId::EARLIEST, false)
        .await
        .unwrap();
    for (i, backlog) in [10, 20, 0, 100].into_iter().enumerate() {
        cluster
            .set_backlog(&topic().partition(i as u32), "billing", backlog)
            .await;
    }
    (cluster, admin)
}

#[tokio::test]
async fn test_backlog_sums_reachable_partitions() {
    let (cluster, admin) = four_partitions().await;
    cluster
        .fail(
            MockOp::GetStats,
            &topic().partition(3),
            AdminError::internal("broker unreachable"),
        )
        .await;

    let stats = admin.get_stats(&topic(), false, false).await.unwrap();
    assert_eq!(stats.metadata.partitions, 4);
    assert_eq!(stats.aggregate.subscriptions["billing"].msg_backlog, 30);
    assert_eq!(stats.aggregate.subscription_backlog(), 30);
    assert!(stats.partitions.is_empty());
}

#[tokio::test]
async fn test_counters_summed_across_partitions() {
    let (cluster, admin) = four_partitions().await;
    for i in 0..4 {
        cluster
            .set_stats(&topic().partition(i), counters(u64::from(i) + 1, 1_000))
            .await;
    }

    let stats = admin.get_stats(&topic(), false, true).await.unwrap();
    assert_eq!(stats.aggregate.msg_in_counter, 1 + 2 + 3 + 4);
    assert_eq!(stats.aggregate.msg_rate_in, 10.0);
    assert_eq!(stats.aggregate.storage_size, 4_000);
    assert_eq!(stats.aggregate.subscriptions["billing"].msg_backlog, 130);
}

#[tokio::test]
async fn test_per_partition_keyed_by_physical_name() {
    let (cluster, admin) = four_partitions().await;
    cluster
        .fail(
            MockOp::GetStats,
            &topic().partition(1),
            AdminError::internal("broker unreachable"),
        )
        .await;

    let stats = admin.get_stats(&topic(), true, false).await.unwrap();
    let keys: Vec<&String> = stats.partitions.keys().collect();
    assert_eq!(
        keys,
        vec![
            &topic().partition(0).to_string(),
            &topic().partition(2).to_string(),
            &topic().partition(3).to_string(),
        ]
    );
    assert_eq!(
        stats.partitions[&topic().partition(3).to_string()].subscriptions["billing"].msg_backlog,
        100
    );
}

#[tokio::test]
async fn test_per_partition_with_no_reachable_partition() {
    let cluster = Arc::new(MockCluster::new());
    let admin = admin_for(
        &cluster,
        AdminConfig::default().with_create_partitions_on_create(false),
    );
    admin.create_partitioned(&topic(), 2).await.unwrap();

    let stats = admin.get_stats(&topic(), true, false).await.unwrap();
    assert_eq!(stats.partitions.len(), 1);
    assert!(stats.partitions.contains_key(&topic().to_string()));
    assert_eq!(stats.aggregate.msg_in_counter, 0);
}

#[tokio::test]
async fn test_stats_of_non_partitioned_topic() {
    let cluster = Arc::new(MockCluster::new());
    let admin = admin_for(&cluster, AdminConfig::default());
    cluster.add_topic(&topic()).await;

    let err = admin.get_stats(&topic(), false, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Partitioned Topic not found");
}

#[tokio::test]
async fn test_stats_json_flattens_aggregate() {
    let (_cluster, admin) = four_partitions().await;
    let stats = admin.get_stats(&topic(), false, false).await.unwrap();

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["metadata"]["partitions"], 4);
    assert!(json.get("msgRateIn").is_some());
    assert_eq!(json["subscriptions"]["billing"]["msgBacklog"], 130);
}

// ============================================================================
// Internal stats
// ============================================================================

#[tokio::test]
async fn test_internal_stats_skip_failed_partitions() {
    let (cluster, admin) = four_partitions().await;
    let mut internal = TopicInternalStats::default();
    internal.number_of_entries = 42;
    internal.cursors.insert(
        "billing".to_string(),
        CursorInternalStats {
            mark_delete_position: "3:14".to_string(),
            read_position: "3:15".to_string(),
            messages_consumed_counter: 15,
        },
    );
    cluster
        .set_internal_stats(&topic().partition(0), internal.clone())
        .await;
    cluster
        .fail(
            MockOp::GetInternalStats,
            &topic().partition(2),
            AdminError::internal("ledger closed"),
        )
        .await;

    let stats = admin.get_internal_stats(&topic()).await.unwrap();
    assert_eq!(stats.metadata.partitions, 4);
    assert_eq!(stats.partitions.len(), 3);
    assert_eq!(stats.partitions[&topic().partition(0).to_string()], internal);
    assert!(!stats.partitions.contains_key(&topic().partition(2).to_string()));
}

#[tokio::test]
async fn test_internal_stats_without_partitions() {
    let cluster = Arc::new(MockCluster::new());
    let admin = admin_for(
        &cluster,
        AdminConfig::default().with_create_partitions_on_create(false),
    );
    admin.create_partitioned(&topic(), 2).await.unwrap();

    let err = admin.get_internal_stats(&topic()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Internal topics have not been generated yet");
}

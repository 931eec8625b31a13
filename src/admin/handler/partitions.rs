//! Partition-count lifecycle: create, grow, delete.
//!
//! The partition count record moves `Absent -> Created(k) -> Created(k')`
//! with `k' > k`. Updates are compare-and-set against the version read at
//! the start of the request; a mismatch is a `Conflict` and is not retried.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::PartitionedTopicAdmin;
use crate::admin::metrics;
use crate::admin::policy::AdminOperation;
use crate::admin::traits::PartitionClient;
use crate::admin::validation::{validate_partition_update, validate_partitioned_create};
use crate::error::{AdminError, AdminResult, ErrorKind};
use crate::metadata::{PartitionedTopicMetadata, StoreError};
use crate::topic_name::TopicName;
use crate::types::MessageId;

/// Partitioned topics are addressed by their logical name only.
fn require_logical_name(topic: &TopicName) -> AdminResult<()> {
    if topic.is_partition() {
        return Err(AdminError::not_acceptable(format!(
            "{topic} is a partition name; use the partitioned topic name instead"
        )));
    }
    Ok(())
}

fn validate_partition_count(admin: &PartitionedTopicAdmin, partitions: u32) -> AdminResult<()> {
    if partitions == 0 {
        return Err(AdminError::not_acceptable(
            "Number of partitions should be more than 0",
        ));
    }
    let max = admin.config.max_partitions_per_topic;
    if max > 0 && partitions > max {
        return Err(AdminError::not_acceptable(format!(
            "Number of partitions should be less than or equal to {max}"
        )));
    }
    Ok(())
}

pub(super) async fn create_partitioned(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    partitions: u32,
) -> AdminResult<()> {
    require_logical_name(topic)?;
    validate_partition_count(admin, partitions)?;

    let existing = admin
        .lister
        .list_topics(topic.namespace(), topic.domain())
        .await?;
    if existing.iter().any(|t| t == topic) {
        warn!(topic = %topic, "Non-partitioned topic with the same name already exists");
        return Err(AdminError::conflict("This topic already exists"));
    }
    validate_partitioned_create(topic, &existing)?;

    match admin
        .store
        .create_partitioned(topic, PartitionedTopicMetadata::new(partitions))
        .await
    {
        Ok(_) => {}
        Err(StoreError::AlreadyExists(_)) => {
            metrics::record_partition_count_update("create", "conflict");
            warn!(topic = %topic, "Partitioned topic already exists");
            return Err(AdminError::conflict("Partitioned topic already exists"));
        }
        Err(e) => {
            metrics::record_partition_count_update("create", "error");
            error!(topic = %topic, error = %e, "Failed to create partitioned topic");
            return Err(e.into());
        }
    }

    metrics::record_partition_count_update("create", "success");
    info!(topic = %topic, partitions, "Created partitioned topic");

    if admin.config.create_partitions_on_create {
        create_partitions_best_effort(admin, topic, 0..partitions).await;
    }

    Ok(())
}

/// Create physical partitions, logging failures without failing the request.
async fn create_partitions_best_effort(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    partitions: Range<u32>,
) {
    let client = admin.client.clone();
    let outcomes = admin
        .coordinator
        .dispatch(topic, partitions, move |p| {
            let client = client.clone();
            async move { client.create_topic(&p).await }
        })
        .await;

    for outcome in outcomes {
        if let Err(e) = outcome.result {
            warn!(
                topic = %topic,
                partition = outcome.partition_index,
                error = %e,
                "Failed to create partition, it will be created on first use"
            );
        }
    }
}

pub(super) async fn update_partitioned(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    partitions: u32,
    local_only: bool,
) -> AdminResult<PartitionedTopicMetadata> {
    require_logical_name(topic)?;
    validate_partition_count(admin, partitions)?;

    let current = match admin.store.get_partitioned(topic).await? {
        Some(current) if current.value.is_partitioned() => current,
        _ => return Err(AdminError::conflict("Topic is not partitioned topic")),
    };
    let old = current.value.partitions;
    if partitions <= old {
        return Err(AdminError::conflict(format!(
            "Number of partitions must be more than existing {old}"
        )));
    }

    let clusters = replication_clusters(admin, topic).await?;
    if let Some(clusters) = &clusters
        && !clusters.contains(&admin.config.cluster_name)
    {
        warn!(
            topic = %topic,
            cluster = %admin.config.cluster_name,
            "Local cluster is not part of replicate cluster list"
        );
        return Err(AdminError::forbidden(
            "Local cluster is not part of replicate cluster list",
        ));
    }

    if !local_only {
        let existing = admin
            .lister
            .list_topics(topic.namespace(), topic.domain())
            .await?;
        validate_partition_update(topic, old, partitions, &existing)?;

        if let Some(clusters) = &clusters {
            update_peer_clusters(admin, topic, partitions, clusters).await?;
        }
    }

    propagate_subscriptions(admin, topic, old, partitions).await?;

    let metadata = PartitionedTopicMetadata::new(partitions);
    match admin
        .store
        .cas_partitioned(topic, metadata, current.version)
        .await
    {
        Ok(version) => {
            metrics::record_partition_count_update("update", "success");
            info!(topic = %topic, old, new = partitions, version = %version, "Updated partition count");
            if admin.config.create_partitions_on_create {
                create_partitions_best_effort(admin, topic, old..partitions).await;
            }
            Ok(metadata)
        }
        Err(StoreError::NotFound(_)) => {
            metrics::record_partition_count_update("update", "not_found");
            Err(AdminError::not_found("Partitioned topic does not exist"))
        }
        Err(e) => {
            let err = AdminError::from(e);
            metrics::record_partition_count_update("update", err.kind().as_metric_label());
            warn!(topic = %topic, error = %err, "Failed to update partition count");
            Err(err)
        }
    }
}

async fn replication_clusters(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<Option<BTreeSet<String>>> {
    match &admin.replication {
        Some(resolver) => resolver.replication_clusters(topic.namespace()).await,
        None => Ok(None),
    }
}

/// Apply the new count in every peer cluster before the local one.
async fn update_peer_clusters(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    partitions: u32,
    clusters: &BTreeSet<String>,
) -> AdminResult<()> {
    let Some(resolver) = &admin.replication else {
        return Ok(());
    };

    let peers: Vec<&String> = clusters
        .iter()
        .filter(|c| **c != admin.config.cluster_name)
        .collect();

    let results = join_all(
        peers
            .iter()
            .map(|cluster| resolver.update_partitions_in_cluster(cluster, topic, partitions)),
    )
    .await;

    for (cluster, result) in peers.iter().zip(results) {
        if let Err(e) = result {
            error!(topic = %topic, cluster = %cluster, error = %e, "Failed to update partitions in peer cluster");
            return Err(e);
        }
        debug!(topic = %topic, cluster = %cluster, partitions, "Updated partitions in peer cluster");
    }
    Ok(())
}

/// Recreate partition 0's subscriptions on partitions `[old, new)`.
async fn propagate_subscriptions(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    old: u32,
    new: u32,
) -> AdminResult<()> {
    let subscriptions = match admin.client.get_subscriptions(&topic.partition(0)).await {
        Ok(subscriptions) => subscriptions,
        Err(e) if e.is_not_found() => {
            debug!(topic = %topic, "First partition does not exist, no subscriptions to recreate");
            return Ok(());
        }
        Err(e) => {
            warn!(topic = %topic, error = %e, "Failed to list subscriptions of first partition");
            return Err(e);
        }
    };
    if subscriptions.is_empty() {
        return Ok(());
    }

    let client = admin.client.clone();
    let subscriptions = Arc::new(subscriptions);
    let aggregate = admin
        .fan_out(
            AdminOperation::PropagateSubscriptions,
            topic,
            old..new,
            move |p| {
                let client = client.clone();
                let subscriptions = subscriptions.clone();
                async move { create_subscriptions_on(client.as_ref(), &p, &subscriptions).await }
            },
        )
        .await;

    match aggregate.into_unit() {
        Ok(()) => Ok(()),
        // Every new partition already carries the subscriptions.
        Err(e) if e.kind() == ErrorKind::Conflict => Ok(()),
        Err(e) => {
            warn!(topic = %topic, error = %e, "Failed to create subscriptions on new partitions");
            Err(e)
        }
    }
}

/// Create every subscription on one partition.
///
/// Fails with `Conflict` only when every subscription already existed.
async fn create_subscriptions_on(
    client: &dyn PartitionClient,
    partition: &TopicName,
    subscriptions: &[String],
) -> AdminResult<()> {
    let mut created = 0usize;
    let mut conflict = None;
    for subscription in subscriptions {
        match client
            .create_subscription(partition, subscription, MessageId::LATEST, false)
            .await
        {
            Ok(()) => created += 1,
            Err(e) if e.is_conflict() => conflict = Some(e),
            Err(e) => return Err(e),
        }
    }
    match conflict {
        Some(e) if created == 0 => Err(e),
        _ => Ok(()),
    }
}

pub(super) async fn delete_partitioned(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    force: bool,
) -> AdminResult<()> {
    require_logical_name(topic)?;

    let current = match admin.store.get_partitioned(topic).await? {
        Some(current) if current.value.is_partitioned() => current,
        _ => return Err(AdminError::not_found("Partitioned topic does not exist")),
    };
    let partitions = current.value.partitions;

    let client = admin.client.clone();
    let aggregate = admin
        .fan_out(
            AdminOperation::DeletePartitionedTopic,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                async move { client.delete_topic(&p, force).await }
            },
        )
        .await;

    if let Err(e) = aggregate.into_unit() {
        metrics::record_partition_count_update("delete", e.kind().as_metric_label());
        return Err(match e.kind() {
            ErrorKind::PreconditionFailed => {
                AdminError::precondition_failed("Topic has active producers/subscriptions")
            }
            _ => e,
        });
    }

    match admin
        .store
        .delete_partitioned(topic, Some(current.version))
        .await
    {
        Ok(()) => {
            metrics::record_partition_count_update("delete", "success");
            info!(topic = %topic, partitions, "Deleted partitioned topic");
            Ok(())
        }
        Err(StoreError::NotFound(_)) => {
            metrics::record_partition_count_update("delete", "not_found");
            Err(AdminError::not_found("Partitioned topic does not exist"))
        }
        Err(e) => {
            let err = AdminError::from(e);
            metrics::record_partition_count_update("delete", err.kind().as_metric_label());
            error!(topic = %topic, error = %err, "Failed to delete partitioned topic metadata");
            Err(err)
        }
    }
}

pub(super) async fn get_partitioned_metadata(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<PartitionedTopicMetadata> {
    Ok(PartitionedTopicMetadata::new(
        admin.partition_count(topic).await?,
    ))
}

pub(super) async fn create_missed_partitions(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<()> {
    require_logical_name(topic)?;

    let partitions = admin.partition_count(topic).await?;
    if partitions == 0 {
        return Err(AdminError::not_found("Partitioned topic does not exist"));
    }

    let client = admin.client.clone();
    admin
        .fan_out(
            AdminOperation::CreateMissedPartitions,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                async move { client.create_topic(&p).await }
            },
        )
        .await
        .into_unit()?;

    info!(topic = %topic, partitions, "Created missed partitions");
    Ok(())
}

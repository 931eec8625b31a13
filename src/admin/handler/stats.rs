//! Partitioned stats reads.
//!
//! Both reads are best-effort: partitions that fail are left out, and only
//! an empty result is an error.

use tracing::{debug, warn};

use super::PartitionedTopicAdmin;
use crate::admin::stats::{PartitionedTopicInternalStats, PartitionedTopicStats, TopicStats};
use crate::error::{AdminError, AdminResult};
use crate::metadata::PartitionedTopicMetadata;
use crate::topic_name::TopicName;

const NOT_GENERATED: &str = "Internal topics have not been generated yet";

async fn require_partitioned(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<PartitionedTopicMetadata> {
    match admin.partition_count(topic).await? {
        0 => Err(AdminError::not_found("Partitioned Topic not found")),
        n => Ok(PartitionedTopicMetadata::new(n)),
    }
}

pub(super) async fn get_stats(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    per_partition: bool,
    precise_backlog: bool,
) -> AdminResult<PartitionedTopicStats> {
    let metadata = require_partitioned(admin, topic).await?;

    let client = admin.client.clone();
    let outcomes = admin
        .coordinator
        .dispatch(topic, 0..metadata.partitions, move |p| {
            let client = client.clone();
            async move { client.get_stats(&p, precise_backlog).await }
        })
        .await;

    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            debug!(
                topic = %topic,
                partition = outcome.partition_index,
                error = %e,
                "Skipping partition in stats aggregation"
            );
        }
    }

    let mut stats = PartitionedTopicStats::new(metadata);
    let contributed = stats.aggregate(topic, outcomes, per_partition);
    if contributed < metadata.partitions as usize {
        warn!(
            topic = %topic,
            contributed,
            partitions = metadata.partitions,
            "Partial stats for partitioned topic"
        );
    }

    if per_partition && stats.partitions.is_empty() {
        if admin.store.partitioned_exists(topic).await? {
            stats
                .partitions
                .insert(topic.to_string(), TopicStats::default());
        } else {
            return Err(AdminError::not_found(NOT_GENERATED));
        }
    }

    Ok(stats)
}

pub(super) async fn get_internal_stats(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<PartitionedTopicInternalStats> {
    let metadata = require_partitioned(admin, topic).await?;

    let client = admin.client.clone();
    let outcomes = admin
        .coordinator
        .dispatch(topic, 0..metadata.partitions, move |p| {
            let client = client.clone();
            async move { client.get_internal_stats(&p).await }
        })
        .await;

    let mut stats = PartitionedTopicInternalStats::new(metadata);
    stats.collect(topic, outcomes);
    if stats.partitions.is_empty() {
        return Err(AdminError::not_found(NOT_GENERATED));
    }
    Ok(stats)
}

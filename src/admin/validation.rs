//! Naming rules between partitioned and non-partitioned topics.
//!
//! A namespace may hold a partitioned topic `t` (backed by `t-partition-i`)
//! next to plain topics. These rules keep the two from colliding. They
//! operate on a listing of existing names and report collisions as
//! `Conflict`. Names whose suffix after the marker is not numeric never
//! collide.
//!
//! # Rules
//!
//! 1. **Create partitioned `base`**: rejected if any existing local name is
//!    `base-partition-<k>` for any `k`.
//! 2. **Create non-partitioned `base-partition-<k>`**: rejected if `base` is
//!    not partitioned, or if `k >= partitions`.
//! 3. **Grow `base` from `old` to `new`**: rejected if any existing name is
//!    `base-partition-<k>` with `old <= k <= new`.

use tracing::warn;

use super::metrics;
use crate::error::{AdminError, AdminResult};
use crate::metadata::PartitionedTopicMetadata;
use crate::topic_name::{NameSuffixRecord, TopicName};

/// Rule label for metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    CreatePartitioned,
    CreateNonPartitioned,
    UpdatePartitions,
}

impl NamingRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingRule::CreatePartitioned => "create_partitioned",
            NamingRule::CreateNonPartitioned => "create_non_partitioned",
            NamingRule::UpdatePartitions => "update_partitions",
        }
    }
}

fn reject(rule: NamingRule, topic: &TopicName, existing: &str, msg: String) -> AdminError {
    metrics::record_validation_rejection(rule.as_str());
    warn!(rule = rule.as_str(), topic = %topic, existing, "Topic name rejected");
    AdminError::conflict(msg)
}

/// Existing names that carry `base`'s partition marker, with their suffix.
fn partition_like<'a>(
    base: &'a str,
    existing: &'a [TopicName],
) -> impl Iterator<Item = (&'a TopicName, u64)> + 'a {
    existing.iter().filter_map(move |t| {
        NameSuffixRecord::parse(t.local_name())
            .filter(|r| r.base_name == base)
            .map(|r| (t, r.numeric_suffix))
    })
}

/// Rule 1: creating partitioned topic `topic`.
pub fn validate_partitioned_create(topic: &TopicName, existing: &[TopicName]) -> AdminResult<()> {
    let base = topic.local_name();
    if let Some((found, _)) = partition_like(base, existing)
        .find(|(t, _)| t.domain() == topic.domain() && t.namespace() == topic.namespace())
    {
        return Err(reject(
            NamingRule::CreatePartitioned,
            topic,
            found.local_name(),
            format!(
                "{} is not allowed: an existing topic {} collides with its partition names",
                topic, found
            ),
        ));
    }
    Ok(())
}

/// Rule 2: creating non-partitioned topic `topic`.
///
/// `owner` is the metadata of the partitioned topic named by `topic`'s base
/// (`partitions == 0` when absent). Names without a numeric suffix pass.
pub fn validate_non_partitioned_create(
    topic: &TopicName,
    owner: Option<PartitionedTopicMetadata>,
) -> AdminResult<()> {
    let (Some(suffix), Some(owner)) = (NameSuffixRecord::parse(topic.local_name()), owner) else {
        return Ok(());
    };
    let index = suffix.numeric_suffix;

    if owner.partitions == 0 {
        return Err(reject(
            NamingRule::CreateNonPartitioned,
            topic,
            topic.local_name(),
            format!(
                "{} is not allowed: {} is not a partitioned topic",
                topic,
                suffix.base_name
            ),
        ));
    }

    if index >= u64::from(owner.partitions) {
        return Err(reject(
            NamingRule::CreateNonPartitioned,
            topic,
            topic.local_name(),
            format!(
                "{} is not allowed: partition index {} is out of range for {} with {} partitions",
                topic,
                index,
                suffix.base_name,
                owner.partitions
            ),
        ));
    }

    Ok(())
}

/// Rule 3: growing `topic` from `old` to `new` partitions.
pub fn validate_partition_update(
    topic: &TopicName,
    old: u32,
    new: u32,
    existing: &[TopicName],
) -> AdminResult<()> {
    let range = u64::from(old)..=u64::from(new);
    if let Some((found, _)) = partition_like(topic.local_name(), existing).find(|(t, k)| {
        t.domain() == topic.domain() && t.namespace() == topic.namespace() && range.contains(k)
    }) {
        return Err(reject(
            NamingRule::UpdatePartitions,
            topic,
            found.local_name(),
            format!(
                "Number of partitions of {} cannot be updated to {}: existing topic {} would collide",
                topic, new, found
            ),
        ));
    }
    Ok(())
}

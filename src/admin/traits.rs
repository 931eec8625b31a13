//! Collaborator traits consumed by the admin layer.
//!
//! The admin layer never touches brokers or storage directly. Physical work
//! goes through these seams:
//!
//! - [`PartitionClient`]: one operation against one physical topic
//! - [`TopicLister`]: names of existing topics in a namespace
//! - [`ReplicationResolver`]: replication clusters and peer-cluster updates
//!
//! All implementations must be `Send + Sync`; partition operations are
//! invoked concurrently from spawned tasks.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::stats::{TopicInternalStats, TopicStats};
use crate::error::AdminResult;
use crate::topic_name::{NamespaceName, TopicDomain, TopicName};
use crate::types::{CursorTarget, MessageId};

// ============================================================================
// Partition Operations
// ============================================================================

/// Executes one operation against one physical topic.
///
/// Errors are typed [`AdminError`](crate::error::AdminError)s; the admin
/// layer reduces them across partitions and never surfaces them one by one.
#[async_trait]
pub trait PartitionClient: Send + Sync {
    /// Create the physical topic. Creating an existing topic succeeds.
    async fn create_topic(&self, topic: &TopicName) -> AdminResult<()>;

    /// Delete the physical topic. Fails with `PreconditionFailed` when it has
    /// active producers or subscriptions and `force` is not set.
    async fn delete_topic(&self, topic: &TopicName, force: bool) -> AdminResult<()>;

    /// Release ownership of the topic so it is reloaded elsewhere.
    async fn unload_topic(&self, topic: &TopicName) -> AdminResult<()>;

    /// Seal the topic against further writes and return its last position.
    async fn terminate_topic(&self, topic: &TopicName) -> AdminResult<MessageId>;

    async fn get_subscriptions(&self, topic: &TopicName) -> AdminResult<Vec<String>>;

    /// Create a durable subscription starting at `start`.
    ///
    /// Fails with `Conflict` if it already exists.
    async fn create_subscription(
        &self,
        topic: &TopicName,
        subscription: &str,
        start: MessageId,
        replicated: bool,
    ) -> AdminResult<()>;

    async fn delete_subscription(&self, topic: &TopicName, subscription: &str) -> AdminResult<()>;

    async fn skip_all_messages(&self, topic: &TopicName, subscription: &str) -> AdminResult<()>;

    async fn skip_messages(
        &self,
        topic: &TopicName,
        subscription: &str,
        count: u64,
    ) -> AdminResult<()>;

    async fn expire_messages(
        &self,
        topic: &TopicName,
        subscription: &str,
        expire_time_secs: u64,
    ) -> AdminResult<()>;

    async fn expire_messages_all_subscriptions(
        &self,
        topic: &TopicName,
        expire_time_secs: u64,
    ) -> AdminResult<()>;

    async fn reset_cursor(
        &self,
        topic: &TopicName,
        subscription: &str,
        target: CursorTarget,
    ) -> AdminResult<()>;

    async fn get_stats(&self, topic: &TopicName, precise_backlog: bool) -> AdminResult<TopicStats>;

    async fn get_internal_stats(&self, topic: &TopicName) -> AdminResult<TopicInternalStats>;
}

// ============================================================================
// Namespace Listing
// ============================================================================

/// Lists existing physical and non-partitioned topics.
#[async_trait]
pub trait TopicLister: Send + Sync {
    async fn list_topics(
        &self,
        namespace: &NamespaceName,
        domain: TopicDomain,
    ) -> AdminResult<Vec<TopicName>>;
}

// ============================================================================
// Replication
// ============================================================================

/// Cross-cluster replication view of a namespace.
#[async_trait]
pub trait ReplicationResolver: Send + Sync {
    /// Clusters a namespace replicates to, or `None` if it is not replicated.
    async fn replication_clusters(
        &self,
        namespace: &NamespaceName,
    ) -> AdminResult<Option<BTreeSet<String>>>;

    /// Apply a partition count update in a peer cluster, local-only there.
    async fn update_partitions_in_cluster(
        &self,
        cluster: &str,
        topic: &TopicName,
        partitions: u32,
    ) -> AdminResult<()>;
}

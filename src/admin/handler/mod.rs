//! Admin request handling for partitioned topics.
//!
//! This module is split into several submodules by request category:
//! - `partitions` - Partitioned topic create, update, delete and metadata
//! - `subscriptions` - Subscription and cursor management
//! - `topics` - Non-partitioned create, unload, terminate and topic listings
//! - `permissions` - Topic-level permission grants
//! - `stats` - Aggregated and internal stats
//!
//! Every request addressed to a physical partition name, or to a logical
//! name whose partition count is 0, runs directly against that topic.
//! Requests addressed to a partitioned topic are fanned out to every
//! partition and reduced under the policy configured for the operation.

mod partitions;
mod permissions;
mod stats;
mod subscriptions;
mod topics;

use std::collections::BTreeSet;
use std::future::Future;
use std::ops::Range;
use std::sync::Arc;

use tracing::info;

use super::config::AdminConfig;
use super::fanout::{AggregateOutcome, FanOutCoordinator};
use super::policy::AdminOperation;
use super::stats::{PartitionedTopicInternalStats, PartitionedTopicStats};
use super::traits::{PartitionClient, ReplicationResolver, TopicLister};
use crate::error::{AdminError, AdminResult};
use crate::metadata::{
    AuthAction, MetadataStore, NamespacePolicies, PartitionedTopicMetadata, RolePermissions,
};
use crate::topic_name::{NamespaceName, TopicDomain, TopicName};
use crate::types::{CursorTarget, ExpireTarget, MessageId};

/// Where a request on a topic name executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    /// Directly against the named topic.
    Single,
    /// Fanned out to this many partitions.
    Partitioned(u32),
}

/// Admin control layer for partitioned topics.
///
/// This handler uses:
/// - a [`MetadataStore`] for partition counts (versioned, compare-and-set)
///   and namespace policies
/// - a [`PartitionClient`] for every physical operation
/// - a [`TopicLister`] for naming validation
/// - an optional [`ReplicationResolver`] for replicated namespaces
pub struct PartitionedTopicAdmin {
    pub(crate) config: AdminConfig,
    pub(crate) store: Arc<dyn MetadataStore>,
    pub(crate) client: Arc<dyn PartitionClient>,
    pub(crate) lister: Arc<dyn TopicLister>,
    pub(crate) replication: Option<Arc<dyn ReplicationResolver>>,
    pub(crate) coordinator: FanOutCoordinator,
}

impl PartitionedTopicAdmin {
    pub fn new(
        config: AdminConfig,
        store: Arc<dyn MetadataStore>,
        client: Arc<dyn PartitionClient>,
        lister: Arc<dyn TopicLister>,
    ) -> Self {
        info!(
            cluster = %config.cluster_name,
            max_partitions_per_topic = config.max_partitions_per_topic,
            create_partitions_on_create = config.create_partitions_on_create,
            custom_policies = config.policies.has_overrides(),
            "Partitioned topic admin initialized"
        );
        Self {
            config,
            store,
            client,
            lister,
            replication: None,
            coordinator: FanOutCoordinator::new(),
        }
    }

    /// Attach a replication resolver for replicated namespaces.
    pub fn with_replication(mut self, resolver: Arc<dyn ReplicationResolver>) -> Self {
        self.replication = Some(resolver);
        self
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    // ========================================================================
    // Partition-count lifecycle
    // ========================================================================

    /// Create a partitioned topic with `partitions` partitions.
    pub async fn create_partitioned(&self, topic: &TopicName, partitions: u32) -> AdminResult<()> {
        partitions::create_partitioned(self, topic, partitions).await
    }

    /// Grow a partitioned topic to `partitions`.
    ///
    /// With `local_only == false` the update is first applied in every peer
    /// cluster of a replicated namespace. Once the new count is stored, the
    /// added partitions are created when eager creation is enabled.
    pub async fn update_partitioned(
        &self,
        topic: &TopicName,
        partitions: u32,
        local_only: bool,
    ) -> AdminResult<PartitionedTopicMetadata> {
        partitions::update_partitioned(self, topic, partitions, local_only).await
    }

    /// Delete every partition, then the partition count record.
    pub async fn delete_partitioned(&self, topic: &TopicName, force: bool) -> AdminResult<()> {
        partitions::delete_partitioned(self, topic, force).await
    }

    /// Partition count of `topic`; `{partitions: 0}` when not partitioned.
    pub async fn get_partitioned_metadata(
        &self,
        topic: &TopicName,
    ) -> AdminResult<PartitionedTopicMetadata> {
        partitions::get_partitioned_metadata(self, topic).await
    }

    /// Create any physical partition that does not exist yet.
    pub async fn create_missed_partitions(&self, topic: &TopicName) -> AdminResult<()> {
        partitions::create_missed_partitions(self, topic).await
    }

    // ========================================================================
    // Topics
    // ========================================================================

    pub async fn create_non_partitioned(&self, topic: &TopicName) -> AdminResult<()> {
        topics::create_non_partitioned(self, topic).await
    }

    pub async fn unload(&self, topic: &TopicName) -> AdminResult<()> {
        topics::unload(self, topic).await
    }

    /// Seal a non-partitioned topic or a single partition.
    pub async fn terminate(&self, topic: &TopicName) -> AdminResult<MessageId> {
        topics::terminate(self, topic).await
    }

    /// Physical and non-partitioned topics of a namespace, sorted.
    pub async fn list_topics(
        &self,
        namespace: &NamespaceName,
        domain: TopicDomain,
    ) -> AdminResult<Vec<TopicName>> {
        topics::list_topics(self, namespace, domain).await
    }

    /// Logical names of the partitioned topics of a namespace, sorted.
    pub async fn list_partitioned_topics(
        &self,
        namespace: &NamespaceName,
        domain: TopicDomain,
    ) -> AdminResult<Vec<TopicName>> {
        topics::list_partitioned_topics(self, namespace, domain).await
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    /// Namespace-level roles merged with the roles granted on `topic`.
    pub async fn get_permissions(&self, topic: &TopicName) -> AdminResult<RolePermissions> {
        permissions::get_permissions(self, topic).await
    }

    /// Grant `actions` to `role` on every partition and on `topic` itself.
    pub async fn grant_permissions(
        &self,
        topic: &TopicName,
        role: &str,
        actions: BTreeSet<AuthAction>,
    ) -> AdminResult<()> {
        permissions::grant_permissions(self, topic, role, actions).await
    }

    /// Revoke the topic-level grant of `role` on every partition and on `topic`.
    pub async fn revoke_permissions(&self, topic: &TopicName, role: &str) -> AdminResult<()> {
        permissions::revoke_permissions(self, topic, role).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub async fn list_subscriptions(&self, topic: &TopicName) -> AdminResult<Vec<String>> {
        subscriptions::list_subscriptions(self, topic).await
    }

    pub async fn create_subscription(
        &self,
        topic: &TopicName,
        subscription: &str,
        start: MessageId,
        replicated: bool,
    ) -> AdminResult<()> {
        subscriptions::create_subscription(self, topic, subscription, start, replicated).await
    }

    pub async fn delete_subscription(&self, topic: &TopicName, subscription: &str) -> AdminResult<()> {
        subscriptions::delete_subscription(self, topic, subscription).await
    }

    pub async fn skip_all_messages(&self, topic: &TopicName, subscription: &str) -> AdminResult<()> {
        subscriptions::skip_all_messages(self, topic, subscription).await
    }

    pub async fn skip_messages(
        &self,
        topic: &TopicName,
        subscription: &str,
        count: u64,
    ) -> AdminResult<()> {
        subscriptions::skip_messages(self, topic, subscription, count).await
    }

    pub async fn expire_messages(
        &self,
        topic: &TopicName,
        target: ExpireTarget,
        expire_time_secs: u64,
    ) -> AdminResult<()> {
        subscriptions::expire_messages(self, topic, target, expire_time_secs).await
    }

    pub async fn reset_cursor(
        &self,
        topic: &TopicName,
        subscription: &str,
        target: CursorTarget,
    ) -> AdminResult<()> {
        subscriptions::reset_cursor(self, topic, subscription, target).await
    }

    // ========================================================================
    // Stats
    // ========================================================================

    pub async fn get_stats(
        &self,
        topic: &TopicName,
        per_partition: bool,
        precise_backlog: bool,
    ) -> AdminResult<PartitionedTopicStats> {
        stats::get_stats(self, topic, per_partition, precise_backlog).await
    }

    pub async fn get_internal_stats(
        &self,
        topic: &TopicName,
    ) -> AdminResult<PartitionedTopicInternalStats> {
        stats::get_internal_stats(self, topic).await
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// Partition count of a logical topic; 0 for partition names.
    pub(crate) async fn partition_count(&self, topic: &TopicName) -> AdminResult<u32> {
        if topic.is_partition() {
            return Ok(0);
        }
        Ok(self
            .store
            .get_partitioned(topic)
            .await?
            .map_or(0, |r| r.value.partitions))
    }

    /// Policies of `namespace`, or `NotFound` when it does not exist.
    pub(crate) async fn require_namespace(
        &self,
        namespace: &NamespaceName,
    ) -> AdminResult<NamespacePolicies> {
        self.store
            .get_policies(namespace)
            .await?
            .ok_or_else(|| AdminError::not_found("Namespace does not exist"))
    }

    pub(crate) async fn dispatch_mode(&self, topic: &TopicName) -> AdminResult<Dispatch> {
        match self.partition_count(topic).await? {
            0 => Ok(Dispatch::Single),
            n => Ok(Dispatch::Partitioned(n)),
        }
    }

    /// Fan `op` out over `indices` under the configured policy for `operation`.
    pub(crate) async fn fan_out<T, F, Fut>(
        &self,
        operation: AdminOperation,
        topic: &TopicName,
        indices: Range<u32>,
        op: F,
    ) -> AggregateOutcome<T>
    where
        T: Send + 'static,
        F: Fn(TopicName) -> Fut,
        Fut: Future<Output = AdminResult<T>> + Send + 'static,
    {
        let policy = self.config.policies.policy_for(operation);
        self.coordinator
            .fan_out(operation, policy, topic, indices, op)
            .await
    }
}

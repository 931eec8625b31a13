//! In-memory scripted cluster for testing.
//!
//! Implements every collaborator trait of the admin layer against plain
//! in-memory maps, with per-topic error injection and latency so partial
//! failure can be reproduced deterministically.
//!
//! # Usage
//!
//! This module is available when the `test-utilities` feature is enabled,
//! or during unit tests:
//!
//! ```toml
//! [dev-dependencies]
//! partition-admin = { path = ".", features = ["test-utilities"] }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::stats::{SubscriptionStats, TopicInternalStats, TopicStats};
use super::traits::{PartitionClient, ReplicationResolver, TopicLister};
use crate::error::{AdminError, AdminResult};
use crate::topic_name::{NamespaceName, TopicDomain, TopicName};
use crate::types::{CursorTarget, MessageId};

/// Physical operations the mock can fail or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    CreateTopic,
    DeleteTopic,
    UnloadTopic,
    TerminateTopic,
    GetSubscriptions,
    CreateSubscription,
    DeleteSubscription,
    SkipAllMessages,
    SkipMessages,
    ExpireMessages,
    ExpireMessagesAllSubscriptions,
    ResetCursor,
    GetStats,
    GetInternalStats,
}

/// Subscription state for testing.
#[derive(Debug, Clone, Default)]
pub struct MockSubscription {
    pub backlog: u64,
    pub consumers: u32,
    pub start: Option<MessageId>,
    pub replicated: bool,
    pub cursor: Option<CursorTarget>,
}

/// Physical topic state for testing.
#[derive(Debug, Clone, Default)]
pub struct MockTopic {
    pub producers: u32,
    pub subscriptions: BTreeMap<String, MockSubscription>,
    pub stats: TopicStats,
    pub internal_stats: TopicInternalStats,
    pub terminated: bool,
}

#[derive(Debug, Default)]
struct MockState {
    topics: HashMap<TopicName, MockTopic>,
    failures: HashMap<(MockOp, TopicName), AdminError>,
    delays: HashMap<TopicName, Duration>,
    calls: HashMap<MockOp, usize>,
    replication: HashMap<NamespaceName, BTreeSet<String>>,
    peer_failures: HashMap<String, AdminError>,
    peer_updates: Vec<(String, TopicName, u32)>,
    panic_on: Option<(MockOp, TopicName)>,
}

/// Scripted cluster implementing [`PartitionClient`], [`TopicLister`] and
/// [`ReplicationResolver`].
#[derive(Debug, Default)]
pub struct MockCluster {
    state: RwLock<MockState>,
}

fn topic_not_found() -> AdminError {
    AdminError::not_found("Topic not found")
}

fn subscription_not_found() -> AdminError {
    AdminError::not_found("Subscription not found")
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Scripting
    // ========================================================================

    /// Create a physical topic if absent.
    pub async fn add_topic(&self, topic: &TopicName) {
        self.state
            .write()
            .await
            .topics
            .entry(topic.clone())
            .or_default();
    }

    /// Create every partition of `topic` from `0..partitions`.
    pub async fn add_partitions(&self, topic: &TopicName, partitions: u32) {
        for i in 0..partitions {
            self.add_topic(&topic.partition(i)).await;
        }
    }

    /// Add a subscription, creating the topic if needed.
    pub async fn add_subscription(&self, topic: &TopicName, subscription: &str) {
        self.state
            .write()
            .await
            .topics
            .entry(topic.clone())
            .or_default()
            .subscriptions
            .entry(subscription.to_string())
            .or_default();
    }

    pub async fn set_consumers(&self, topic: &TopicName, subscription: &str, consumers: u32) {
        let mut state = self.state.write().await;
        if let Some(sub) = state
            .topics
            .get_mut(topic)
            .and_then(|t| t.subscriptions.get_mut(subscription))
        {
            sub.consumers = consumers;
        }
    }

    pub async fn set_backlog(&self, topic: &TopicName, subscription: &str, backlog: u64) {
        let mut state = self.state.write().await;
        if let Some(sub) = state
            .topics
            .get_mut(topic)
            .and_then(|t| t.subscriptions.get_mut(subscription))
        {
            sub.backlog = backlog;
        }
    }

    pub async fn set_producers(&self, topic: &TopicName, producers: u32) {
        if let Some(t) = self.state.write().await.topics.get_mut(topic) {
            t.producers = producers;
        }
    }

    /// Replace the base stats of a topic; subscriptions are filled from state.
    pub async fn set_stats(&self, topic: &TopicName, stats: TopicStats) {
        if let Some(t) = self.state.write().await.topics.get_mut(topic) {
            t.stats = stats;
        }
    }

    pub async fn set_internal_stats(&self, topic: &TopicName, stats: TopicInternalStats) {
        if let Some(t) = self.state.write().await.topics.get_mut(topic) {
            t.internal_stats = stats;
        }
    }

    /// Fail `op` on `topic` with `error` until cleared.
    pub async fn fail(&self, op: MockOp, topic: &TopicName, error: AdminError) {
        self.state
            .write()
            .await
            .failures
            .insert((op, topic.clone()), error);
    }

    /// Panic inside `op` on `topic`.
    pub async fn panic_on(&self, op: MockOp, topic: &TopicName) {
        self.state.write().await.panic_on = Some((op, topic.clone()));
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.failures.clear();
        state.panic_on = None;
    }

    /// Delay every operation on `topic`.
    pub async fn set_delay(&self, topic: &TopicName, delay: Duration) {
        self.state.write().await.delays.insert(topic.clone(), delay);
    }

    pub async fn set_replication_clusters(&self, namespace: &NamespaceName, clusters: &[&str]) {
        self.state.write().await.replication.insert(
            namespace.clone(),
            clusters.iter().map(|c| c.to_string()).collect(),
        );
    }

    pub async fn fail_peer(&self, cluster: &str, error: AdminError) {
        self.state
            .write()
            .await
            .peer_failures
            .insert(cluster.to_string(), error);
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub async fn has_topic(&self, topic: &TopicName) -> bool {
        self.state.read().await.topics.contains_key(topic)
    }

    pub async fn topic_count(&self) -> usize {
        self.state.read().await.topics.len()
    }

    pub async fn topic(&self, topic: &TopicName) -> Option<MockTopic> {
        self.state.read().await.topics.get(topic).cloned()
    }

    pub async fn subscription(&self, topic: &TopicName, subscription: &str) -> Option<MockSubscription> {
        self.state
            .read()
            .await
            .topics
            .get(topic)
            .and_then(|t| t.subscriptions.get(subscription).cloned())
    }

    /// Number of times `op` was invoked.
    pub async fn calls(&self, op: MockOp) -> usize {
        self.state
            .read()
            .await
            .calls
            .get(&op)
            .copied()
            .unwrap_or_default()
    }

    /// Peer-cluster updates as `(cluster, topic, partitions)`.
    pub async fn peer_updates(&self) -> Vec<(String, TopicName, u32)> {
        self.state.read().await.peer_updates.clone()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Count the call, apply latency, then surface any injected failure.
    async fn enter(&self, op: MockOp, topic: &TopicName) -> AdminResult<()> {
        let (delay, failure, panic) = {
            let mut state = self.state.write().await;
            *state.calls.entry(op).or_default() += 1;
            (
                state.delays.get(topic).copied(),
                state.failures.get(&(op, topic.clone())).cloned(),
                state.panic_on.as_ref() == Some(&(op, topic.clone())),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if panic {
            panic!("injected panic in {:?} on {}", op, topic);
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn with_subscription<R>(
        &self,
        topic: &TopicName,
        subscription: &str,
        f: impl FnOnce(&mut MockSubscription) -> R,
    ) -> AdminResult<R> {
        let mut state = self.state.write().await;
        let t = state.topics.get_mut(topic).ok_or_else(topic_not_found)?;
        let sub = t
            .subscriptions
            .get_mut(subscription)
            .ok_or_else(subscription_not_found)?;
        Ok(f(sub))
    }
}

#[async_trait]
impl PartitionClient for MockCluster {
    async fn create_topic(&self, topic: &TopicName) -> AdminResult<()> {
        self.enter(MockOp::CreateTopic, topic).await?;
        self.add_topic(topic).await;
        Ok(())
    }

    async fn delete_topic(&self, topic: &TopicName, force: bool) -> AdminResult<()> {
        self.enter(MockOp::DeleteTopic, topic).await?;
        let mut state = self.state.write().await;
        let t = state.topics.get(topic).ok_or_else(topic_not_found)?;
        let busy = t.producers > 0 || t.subscriptions.values().any(|s| s.consumers > 0);
        if busy && !force {
            return Err(AdminError::precondition_failed(
                "Topic has active producers/subscriptions",
            ));
        }
        state.topics.remove(topic);
        Ok(())
    }

    async fn unload_topic(&self, topic: &TopicName) -> AdminResult<()> {
        self.enter(MockOp::UnloadTopic, topic).await?;
        if self.has_topic(topic).await {
            Ok(())
        } else {
            Err(topic_not_found())
        }
    }

    async fn terminate_topic(&self, topic: &TopicName) -> AdminResult<MessageId> {
        self.enter(MockOp::TerminateTopic, topic).await?;
        let mut state = self.state.write().await;
        let t = state.topics.get_mut(topic).ok_or_else(topic_not_found)?;
        t.terminated = true;
        let entries = t.internal_stats.number_of_entries as i64;
        Ok(MessageId::new(0, entries - 1))
    }

    async fn get_subscriptions(&self, topic: &TopicName) -> AdminResult<Vec<String>> {
        self.enter(MockOp::GetSubscriptions, topic).await?;
        let state = self.state.read().await;
        let t = state.topics.get(topic).ok_or_else(topic_not_found)?;
        Ok(t.subscriptions.keys().cloned().collect())
    }

    async fn create_subscription(
        &self,
        topic: &TopicName,
        subscription: &str,
        start: MessageId,
        replicated: bool,
    ) -> AdminResult<()> {
        self.enter(MockOp::CreateSubscription, topic).await?;
        let mut state = self.state.write().await;
        // Creating a subscription loads the topic, as a broker would.
        let t = state.topics.entry(topic.clone()).or_default();
        if t.subscriptions.contains_key(subscription) {
            return Err(AdminError::conflict("Subscription already exists for topic"));
        }
        t.subscriptions.insert(
            subscription.to_string(),
            MockSubscription {
                start: Some(start),
                replicated,
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn delete_subscription(&self, topic: &TopicName, subscription: &str) -> AdminResult<()> {
        self.enter(MockOp::DeleteSubscription, topic).await?;
        let mut state = self.state.write().await;
        let t = state.topics.get_mut(topic).ok_or_else(topic_not_found)?;
        let sub = t
            .subscriptions
            .get(subscription)
            .ok_or_else(subscription_not_found)?;
        if sub.consumers > 0 {
            return Err(AdminError::precondition_failed(
                "Subscription has active connected consumers",
            ));
        }
        t.subscriptions.remove(subscription);
        Ok(())
    }

    async fn skip_all_messages(&self, topic: &TopicName, subscription: &str) -> AdminResult<()> {
        self.enter(MockOp::SkipAllMessages, topic).await?;
        self.with_subscription(topic, subscription, |s| s.backlog = 0)
            .await
    }

    async fn skip_messages(
        &self,
        topic: &TopicName,
        subscription: &str,
        count: u64,
    ) -> AdminResult<()> {
        self.enter(MockOp::SkipMessages, topic).await?;
        self.with_subscription(topic, subscription, |s| {
            s.backlog = s.backlog.saturating_sub(count)
        })
        .await
    }

    async fn expire_messages(
        &self,
        topic: &TopicName,
        subscription: &str,
        _expire_time_secs: u64,
    ) -> AdminResult<()> {
        self.enter(MockOp::ExpireMessages, topic).await?;
        self.with_subscription(topic, subscription, |s| s.backlog = 0)
            .await
    }

    async fn expire_messages_all_subscriptions(
        &self,
        topic: &TopicName,
        _expire_time_secs: u64,
    ) -> AdminResult<()> {
        self.enter(MockOp::ExpireMessagesAllSubscriptions, topic)
            .await?;
        let mut state = self.state.write().await;
        let t = state.topics.get_mut(topic).ok_or_else(topic_not_found)?;
        for sub in t.subscriptions.values_mut() {
            sub.backlog = 0;
        }
        Ok(())
    }

    async fn reset_cursor(
        &self,
        topic: &TopicName,
        subscription: &str,
        target: CursorTarget,
    ) -> AdminResult<()> {
        self.enter(MockOp::ResetCursor, topic).await?;
        self.with_subscription(topic, subscription, |s| s.cursor = Some(target))
            .await
    }

    async fn get_stats(&self, topic: &TopicName, _precise_backlog: bool) -> AdminResult<TopicStats> {
        self.enter(MockOp::GetStats, topic).await?;
        let state = self.state.read().await;
        let t = state.topics.get(topic).ok_or_else(topic_not_found)?;
        let mut stats = t.stats.clone();
        for (name, sub) in &t.subscriptions {
            stats.subscriptions.insert(
                name.clone(),
                SubscriptionStats {
                    msg_backlog: sub.backlog,
                    consumers: sub.consumers,
                    ..Default::default()
                },
            );
        }
        Ok(stats)
    }

    async fn get_internal_stats(&self, topic: &TopicName) -> AdminResult<TopicInternalStats> {
        self.enter(MockOp::GetInternalStats, topic).await?;
        let state = self.state.read().await;
        let t = state.topics.get(topic).ok_or_else(topic_not_found)?;
        Ok(t.internal_stats.clone())
    }
}

#[async_trait]
impl TopicLister for MockCluster {
    async fn list_topics(
        &self,
        namespace: &NamespaceName,
        domain: TopicDomain,
    ) -> AdminResult<Vec<TopicName>> {
        let state = self.state.read().await;
        let mut topics: Vec<TopicName> = state
            .topics
            .keys()
            .filter(|t| t.namespace() == namespace && t.domain() == domain)
            .cloned()
            .collect();
        topics.sort();
        Ok(topics)
    }
}

#[async_trait]
impl ReplicationResolver for MockCluster {
    async fn replication_clusters(
        &self,
        namespace: &NamespaceName,
    ) -> AdminResult<Option<BTreeSet<String>>> {
        Ok(self.state.read().await.replication.get(namespace).cloned())
    }

    async fn update_partitions_in_cluster(
        &self,
        cluster: &str,
        topic: &TopicName,
        partitions: u32,
    ) -> AdminResult<()> {
        let mut state = self.state.write().await;
        if let Some(e) = state.peer_failures.get(cluster) {
            return Err(e.clone());
        }
        state
            .peer_updates
            .push((cluster.to_string(), topic.clone(), partitions));
        Ok(())
    }
}

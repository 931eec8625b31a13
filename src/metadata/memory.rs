//! In-memory metadata store.
//!
//! Records are stored as JSON bytes with a version per path. Each mutation
//! holds the `DashMap` shard lock for its key, which makes compare-and-set
//! atomic per record and permission changes atomic per namespace.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::paths::{namespace_domain_path, namespace_policies_path, partitioned_topic_path};
use super::{
    AuthAction, MetadataStore, NamespacePolicies, PartitionedTopicMetadata, StoreError,
    StoreResult, Version, Versioned,
};
use crate::topic_name::{NamespaceName, TopicDomain, TopicName};

#[derive(Debug, Clone)]
struct StoredNode {
    data: Vec<u8>,
    version: Version,
}

/// `MetadataStore` kept entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    nodes: DashMap<String, StoredNode>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create the policies record of a namespace.
    pub fn create_namespace(
        &self,
        namespace: &NamespaceName,
        policies: NamespacePolicies,
    ) -> StoreResult<Version> {
        let data = serde_json::to_vec(&policies)?;
        match self.nodes.entry(namespace_policies_path(namespace)) {
            Entry::Occupied(e) => Err(StoreError::AlreadyExists(e.key().clone())),
            Entry::Vacant(e) => {
                let version = Version::new(0);
                debug!(path = %e.key(), "Created namespace policies");
                e.insert(StoredNode { data, version });
                Ok(version)
            }
        }
    }

    fn decode<T: DeserializeOwned>(path: &str, node: &StoredNode) -> StoreResult<Versioned<T>> {
        let value: T = serde_json::from_slice(&node.data)
            .map_err(|e| StoreError::Serde(format!("{path}: {e}")))?;
        Ok(Versioned {
            value,
            version: node.version,
        })
    }

    /// Read-modify-write the policies of `namespace` under its shard lock.
    fn update_policies<R>(
        &self,
        namespace: &NamespaceName,
        f: impl FnOnce(&mut NamespacePolicies) -> R,
    ) -> StoreResult<R> {
        match self.nodes.entry(namespace_policies_path(namespace)) {
            Entry::Vacant(e) => Err(StoreError::NotFound(e.key().clone())),
            Entry::Occupied(mut e) => {
                let mut current: Versioned<NamespacePolicies> = Self::decode(e.key(), e.get())?;
                let result = f(&mut current.value);
                let data = serde_json::to_vec(&current.value)?;
                let version = current.version.next();
                debug!(path = %e.key(), version = %version, "Updated namespace policies");
                e.insert(StoredNode { data, version });
                Ok(result)
            }
        }
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get_partitioned(
        &self,
        topic: &TopicName,
    ) -> StoreResult<Option<Versioned<PartitionedTopicMetadata>>> {
        let path = partitioned_topic_path(topic);
        match self.nodes.get(&path) {
            Some(node) => Self::decode(&path, &node).map(Some),
            None => Ok(None),
        }
    }

    async fn create_partitioned(
        &self,
        topic: &TopicName,
        metadata: PartitionedTopicMetadata,
    ) -> StoreResult<Version> {
        let path = partitioned_topic_path(topic);
        let data = serde_json::to_vec(&metadata)?;
        match self.nodes.entry(path) {
            Entry::Occupied(e) => Err(StoreError::AlreadyExists(e.key().clone())),
            Entry::Vacant(e) => {
                let version = Version::new(0);
                debug!(path = %e.key(), partitions = metadata.partitions, "Created metadata record");
                e.insert(StoredNode { data, version });
                Ok(version)
            }
        }
    }

    async fn cas_partitioned(
        &self,
        topic: &TopicName,
        metadata: PartitionedTopicMetadata,
        expected: Version,
    ) -> StoreResult<Version> {
        let path = partitioned_topic_path(topic);
        let data = serde_json::to_vec(&metadata)?;
        match self.nodes.entry(path) {
            Entry::Vacant(e) => Err(StoreError::NotFound(e.key().clone())),
            Entry::Occupied(mut e) => {
                let actual = e.get().version;
                if actual != expected {
                    return Err(StoreError::BadVersion {
                        path: e.key().clone(),
                        expected,
                        actual,
                    });
                }
                let version = actual.next();
                debug!(path = %e.key(), partitions = metadata.partitions, version = %version, "Updated metadata record");
                e.insert(StoredNode { data, version });
                Ok(version)
            }
        }
    }

    async fn delete_partitioned(
        &self,
        topic: &TopicName,
        expected: Option<Version>,
    ) -> StoreResult<()> {
        let path = partitioned_topic_path(topic);
        match self.nodes.entry(path) {
            Entry::Vacant(e) => Err(StoreError::NotFound(e.key().clone())),
            Entry::Occupied(e) => {
                if let Some(expected) = expected
                    && e.get().version != expected
                {
                    return Err(StoreError::BadVersion {
                        path: e.key().clone(),
                        expected,
                        actual: e.get().version,
                    });
                }
                debug!(path = %e.key(), "Deleted metadata record");
                e.remove();
                Ok(())
            }
        }
    }

    async fn list_partitioned(
        &self,
        namespace: &NamespaceName,
        domain: TopicDomain,
    ) -> StoreResult<Vec<TopicName>> {
        let prefix = format!("{}/", namespace_domain_path(namespace, domain));
        let mut topics = self
            .nodes
            .iter()
            .filter_map(|node| node.key().strip_prefix(&prefix).map(str::to_string))
            .map(|local_name| {
                TopicName::new(domain, namespace.clone(), local_name)
                    .map_err(|e| StoreError::Serde(e.to_string()))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        topics.sort();
        Ok(topics)
    }

    async fn get_policies(&self, namespace: &NamespaceName) -> StoreResult<Option<NamespacePolicies>> {
        let path = namespace_policies_path(namespace);
        match self.nodes.get(&path) {
            Some(node) => Self::decode(&path, &node).map(|v: Versioned<_>| Some(v.value)),
            None => Ok(None),
        }
    }

    async fn grant_topic_permission(
        &self,
        topic: &TopicName,
        role: &str,
        actions: &BTreeSet<AuthAction>,
    ) -> StoreResult<()> {
        let key = topic.to_string();
        self.update_policies(topic.namespace(), |policies| {
            policies.grant_topic(&key, role, actions.clone())
        })
    }

    async fn revoke_topic_permission(&self, topic: &TopicName, role: &str) -> StoreResult<bool> {
        let key = topic.to_string();
        self.update_policies(topic.namespace(), |policies| {
            policies.revoke_topic(&key, role)
        })
    }
}

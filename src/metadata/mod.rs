//! Versioned partition metadata and namespace policies.
//!
//! Every partitioned topic owns one record holding its partition count. The
//! record is created once and afterwards only mutated through
//! compare-and-set against the [`Version`] observed on read; a version
//! mismatch is reported as [`StoreError::BadVersion`] and is never retried
//! here.
//!
//! # Module Organization
//!
//! - [`paths`]: metadata path layout for partitioned topic and policy records
//! - [`policies`]: namespace policies and topic permissions
//! - [`memory`]: in-memory [`MetadataStore`] backed by `DashMap`

pub mod memory;
pub mod paths;
pub mod policies;

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topic_name::{NamespaceName, TopicDomain, TopicName};

pub use memory::InMemoryMetadataStore;
pub use policies::{AuthAction, NamespacePolicies, RolePermissions};

/// Result type for metadata store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Node does not exist: {0}")]
    NotFound(String),

    #[error("Node already exists: {0}")]
    AlreadyExists(String),

    #[error("Bad version for {path}: expected {expected}, actual {actual}")]
    BadVersion {
        path: String,
        expected: Version,
        actual: Version,
    },

    #[error("Serialization error: {0}")]
    Serde(String),

    #[error("Metadata store error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e.to_string())
    }
}

/// Partition count record of a logical topic.
///
/// `partitions == 0` means the topic is not partitioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionedTopicMetadata {
    pub partitions: u32,
}

impl PartitionedTopicMetadata {
    pub const fn new(partitions: u32) -> Self {
        Self { partitions }
    }

    #[inline]
    pub fn is_partitioned(&self) -> bool {
        self.partitions > 0
    }
}

/// Opaque record version used for compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version(i64);

impl Version {
    pub const fn new(v: i64) -> Self {
        Self(v)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

/// Versioned store of partitioned topic records and namespace policies.
///
/// Implementations must make `cas_partitioned` and `delete_partitioned`
/// atomic per record, and permission changes atomic per namespace.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the record for a logical topic, if it exists.
    async fn get_partitioned(
        &self,
        topic: &TopicName,
    ) -> StoreResult<Option<Versioned<PartitionedTopicMetadata>>>;

    /// Create the record. Fails with `AlreadyExists` if one is present.
    async fn create_partitioned(
        &self,
        topic: &TopicName,
        metadata: PartitionedTopicMetadata,
    ) -> StoreResult<Version>;

    /// Overwrite the record if its current version equals `expected`.
    ///
    /// Returns the new version. Fails with `BadVersion` on mismatch and
    /// `NotFound` if the record is gone.
    async fn cas_partitioned(
        &self,
        topic: &TopicName,
        metadata: PartitionedTopicMetadata,
        expected: Version,
    ) -> StoreResult<Version>;

    /// Delete the record, optionally only at `expected` version.
    async fn delete_partitioned(
        &self,
        topic: &TopicName,
        expected: Option<Version>,
    ) -> StoreResult<()>;

    /// Whether a record exists for the logical topic.
    async fn partitioned_exists(&self, topic: &TopicName) -> StoreResult<bool> {
        Ok(self.get_partitioned(topic).await?.is_some())
    }

    /// Logical topics of a namespace and domain that have a record.
    async fn list_partitioned(
        &self,
        namespace: &NamespaceName,
        domain: TopicDomain,
    ) -> StoreResult<Vec<TopicName>>;

    /// Read the policies of a namespace; `None` when the namespace does not exist.
    async fn get_policies(&self, namespace: &NamespaceName) -> StoreResult<Option<NamespacePolicies>>;

    /// Set the actions of `role` on `topic`. Fails with `NotFound` when the
    /// namespace does not exist.
    async fn grant_topic_permission(
        &self,
        topic: &TopicName,
        role: &str,
        actions: &BTreeSet<AuthAction>,
    ) -> StoreResult<()>;

    /// Remove `role` from `topic`.
    ///
    /// Returns `false` when the role had no topic-level grant. Fails with
    /// `NotFound` when the namespace does not exist.
    async fn revoke_topic_permission(&self, topic: &TopicName, role: &str) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json_shape() {
        let json = serde_json::to_string(&PartitionedTopicMetadata::new(4)).unwrap();
        assert_eq!(json, r#"{"partitions":4}"#);
    }

    #[test]
    fn test_version_next() {
        assert_eq!(Version::new(3).next(), Version::new(4));
        assert!(Version::new(1) < Version::new(2));
    }

    #[test]
    fn test_not_partitioned() {
        assert!(!PartitionedTopicMetadata::default().is_partitioned());
        assert!(PartitionedTopicMetadata::new(1).is_partitioned());
    }
}

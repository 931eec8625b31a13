//! # Partition Admin
//! Admin control layer for partitioned pub/sub topics.
//!
//! A partitioned topic is a logical topic whose data is spread over `N`
//! physical partitions. This crate owns the logical side: the partition
//! count record, the naming rules that keep partition names unambiguous,
//! and the fan-out of admin operations to every partition with a
//! configurable rule for combining per-partition results.
//!
//! # Goals
//! - Easy to understand code
//! - Leverage best in class libraries such as [Tokio](https://tokio.rs/)
//! - Be a building block for broker admin services
//!
//! ## Getting started
//! Implement [`PartitionClient`](admin::PartitionClient) and
//! [`TopicLister`](admin::TopicLister) against your broker, pick a
//! [`MetadataStore`](metadata::MetadataStore), and build a
//! [`PartitionedTopicAdmin`](admin::PartitionedTopicAdmin):
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use partition_admin::prelude::*;
//!
//! async fn run(
//!     client: Arc<dyn PartitionClient>,
//!     lister: Arc<dyn TopicLister>,
//! ) -> AdminResult<()> {
//!     let admin = PartitionedTopicAdmin::new(
//!         AdminConfig::default().with_cluster_name("east"),
//!         Arc::new(InMemoryMetadataStore::new()),
//!         client,
//!         lister,
//!     );
//!
//!     let topic = TopicName::persistent("public", "default", "orders")?;
//!     admin.create_partitioned(&topic, 4).await?;
//!     admin.create_subscription(&topic, "billing", MessageId::LATEST, false).await?;
//!     admin.update_partitioned(&topic, 8, false).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod admin;
pub mod constants;
pub mod error;
pub mod metadata;
pub mod telemetry;
pub mod topic_name;
pub mod types;

pub mod prelude {
    //! Main export of admin structures.
    pub use crate::admin::{
        AdminConfig, AdminOperation, AggregateOutcome, FanOutCoordinator, PartitionClient,
        PartitionedTopicAdmin, PartitionedTopicInternalStats, PartitionedTopicStats, PolicyTable,
        ReductionPolicy, ReplicationResolver, TopicLister, TopicStats,
    };
    pub use crate::error::{AdminError, AdminResult, ErrorKind};
    pub use crate::metadata::{
        AuthAction, InMemoryMetadataStore, MetadataStore, NamespacePolicies, PartitionedTopicMetadata,
    };
    pub use crate::topic_name::{NamespaceName, TopicDomain, TopicName};
    pub use crate::types::{CursorTarget, ExpireTarget, MessageId};
}

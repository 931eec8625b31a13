//! Admin control layer for partitioned topics.
//!
//! A partitioned topic is a logical topic backed by `N` physical partitions
//! named `<base>-partition-<i>`. This module provides:
//!
//! - [`PartitionedTopicAdmin`] - the request handler
//! - [`FanOutCoordinator`] - concurrent per-partition dispatch and reduction
//! - [`ReductionPolicy`] / [`PolicyTable`] - how partition outcomes combine
//! - [`validation`] - the naming rules that keep partition names unambiguous
//! - [`stats`] - aggregated partitioned stats
//!
//! Physical work goes through the [`PartitionClient`], [`TopicLister`] and
//! [`ReplicationResolver`] traits so the layer can be driven by any broker.

pub mod config;
pub mod fanout;
pub mod handler;
pub mod metrics;
pub mod policy;
pub mod stats;
pub mod traits;
pub mod validation;

#[cfg(any(test, feature = "test-utilities"))]
pub mod mock;

pub use config::AdminConfig;
pub use fanout::{
    AggregateOutcome, FanOutCoordinator, PartitionOutcome, ReductionPolicy, ReductionState, reduce,
};
pub use handler::PartitionedTopicAdmin;
pub use policy::{AdminOperation, PolicyTable};
pub use stats::{
    CursorInternalStats, PartitionedTopicInternalStats, PartitionedTopicStats, PublisherStats,
    ReplicatorStats, SubscriptionStats, TopicInternalStats, TopicStats,
};
pub use traits::{PartitionClient, ReplicationResolver, TopicLister};

#[cfg(any(test, feature = "test-utilities"))]
pub use mock::{MockCluster, MockOp, MockSubscription, MockTopic};

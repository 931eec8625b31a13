//! Centralized naming and configuration constants.
//!
//! # Categories
//!
//! - **Naming Constants**: topic name layout and the partition suffix marker
//! - **Limit Constants**: identifier length limits
//! - **Default Constants**: defaults used by [`AdminConfig`](crate::admin::AdminConfig)

// =============================================================================
// Naming Constants
// =============================================================================

/// Marker that separates a logical topic's local name from a partition index.
///
/// Physical partition `i` of logical topic `orders` is named `orders-partition-i`.
pub const PARTITIONED_TOPIC_SUFFIX: &str = "-partition-";

/// Separator between the domain and the rest of a fully qualified topic name.
pub const DOMAIN_SEPARATOR: &str = "://";

/// Domain name of persistent topics.
pub const PERSISTENT_DOMAIN: &str = "persistent";

/// Domain name of non-persistent topics.
pub const NON_PERSISTENT_DOMAIN: &str = "non-persistent";

// =============================================================================
// Limit Constants
// =============================================================================

/// Maximum length of a tenant, namespace or topic local name.
pub const MAX_NAME_LENGTH: usize = 249;

// =============================================================================
// Default Constants
// =============================================================================

/// Default name of the local cluster.
pub const DEFAULT_CLUSTER_NAME: &str = "standalone";

/// Default upper bound on partitions per topic (`0` means unlimited).
pub const DEFAULT_MAX_PARTITIONS_PER_TOPIC: u32 = 0;

/// Whether physical partitions are created eagerly when a partitioned topic is created.
pub const DEFAULT_CREATE_PARTITIONS_ON_CREATE: bool = true;

/// Root of the metadata path namespace used for partitioned topic records.
pub const PARTITIONED_TOPIC_PATH_ROOT: &str = "/admin/partitioned-topics";

/// Root of the metadata path namespace used for namespace policy records.
pub const POLICIES_PATH_ROOT: &str = "/admin/policies";

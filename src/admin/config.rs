//! Admin layer configuration.

use crate::constants::{
    DEFAULT_CLUSTER_NAME, DEFAULT_CREATE_PARTITIONS_ON_CREATE, DEFAULT_MAX_PARTITIONS_PER_TOPIC,
};

use super::policy::PolicyTable;

/// Configuration of [`PartitionedTopicAdmin`](super::PartitionedTopicAdmin).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    /// Name of the local cluster, checked against replication cluster lists.
    pub cluster_name: String,

    /// Upper bound on partitions per topic. `0` disables the check.
    pub max_partitions_per_topic: u32,

    /// Create physical partitions right after the metadata record.
    ///
    /// Failures are logged only; partitions are also created lazily on first
    /// use, and `create_missed_partitions` can fill gaps later.
    pub create_partitions_on_create: bool,

    /// Reduction policy per fan-out operation.
    pub policies: PolicyTable,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            max_partitions_per_topic: DEFAULT_MAX_PARTITIONS_PER_TOPIC,
            create_partitions_on_create: DEFAULT_CREATE_PARTITIONS_ON_CREATE,
            policies: PolicyTable::default(),
        }
    }
}

impl AdminConfig {
    /// Builder method to set the local cluster name.
    pub fn with_cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = name.into();
        self
    }

    /// Builder method to set the partition limit.
    pub fn with_max_partitions_per_topic(mut self, max: u32) -> Self {
        self.max_partitions_per_topic = max;
        self
    }

    /// Builder method to toggle eager partition creation.
    pub fn with_create_partitions_on_create(mut self, enabled: bool) -> Self {
        self.create_partitions_on_create = enabled;
        self
    }

    /// Builder method to replace the policy table.
    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    /// Validate the configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.cluster_name.trim().is_empty() {
            errors.push("cluster_name must not be empty".to_string());
        }

        if self.cluster_name.contains(char::is_whitespace) {
            errors.push(format!(
                "cluster_name ({:?}) must not contain whitespace",
                self.cluster_name
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate configuration and panic with a detailed message if invalid.
    pub fn validate_or_panic(&self) {
        if let Err(errors) = self.validate() {
            eprintln!("=== Configuration Validation Failed ===");
            for (i, error) in errors.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, error);
            }
            eprintln!("========================================");
            panic!("Invalid configuration - {} error(s) found", errors.len());
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CLUSTER_NAME`: Local cluster name (default: standalone)
    /// - `MAX_PARTITIONS_PER_TOPIC`: Partition limit, 0 for none (default: 0)
    /// - `CREATE_PARTITIONS_ON_CREATE`: Eager partition creation (default: true)
    /// - `POLICY_OVERRIDES`: `operation=policy` pairs separated by commas
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let defaults = Self::default();

        let cluster_name =
            std::env::var("CLUSTER_NAME").unwrap_or_else(|_| defaults.cluster_name.clone());

        let max_partitions_per_topic: u32 = match std::env::var("MAX_PARTITIONS_PER_TOPIC") {
            Ok(v) => v
                .parse()
                .map_err(|e| format!("Invalid MAX_PARTITIONS_PER_TOPIC: {}", e))?,
            Err(_) => defaults.max_partitions_per_topic,
        };

        let create_partitions_on_create = std::env::var("CREATE_PARTITIONS_ON_CREATE")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(defaults.create_partitions_on_create);

        let policies = match std::env::var("POLICY_OVERRIDES") {
            Ok(spec) => PolicyTable::parse_overrides(&spec)
                .map_err(|errors| format!("Invalid POLICY_OVERRIDES: {}", errors.join("; ")))?,
            Err(_) => defaults.policies,
        };

        let config = Self {
            cluster_name,
            max_partitions_per_topic,
            create_partitions_on_create,
            policies,
        };

        config
            .validate()
            .map_err(|errors| format!("Invalid admin configuration: {}", errors.join("; ")))?;

        Ok(config)
    }
}

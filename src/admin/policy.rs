//! Operation → reduction policy table.
//!
//! The coordinator never decides how partial failure is interpreted; callers
//! look the policy up here. The defaults can be overridden per operation
//! through [`AdminConfig`](super::AdminConfig).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::fanout::ReductionPolicy;

/// Fan-out operations of the admin layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdminOperation {
    DeletePartitionedTopic,
    UnloadTopic,
    ListSubscriptions,
    DeleteSubscription,
    SkipAllMessages,
    ExpireMessages,
    ExpireMessagesAllSubscriptions,
    ResetCursor,
    CreateSubscription,
    PropagateSubscriptions,
    CreateMissedPartitions,
    GrantPermissions,
    RevokePermissions,
}

impl AdminOperation {
    pub const ALL: [AdminOperation; 13] = [
        AdminOperation::DeletePartitionedTopic,
        AdminOperation::UnloadTopic,
        AdminOperation::ListSubscriptions,
        AdminOperation::DeleteSubscription,
        AdminOperation::SkipAllMessages,
        AdminOperation::ExpireMessages,
        AdminOperation::ExpireMessagesAllSubscriptions,
        AdminOperation::ResetCursor,
        AdminOperation::CreateSubscription,
        AdminOperation::PropagateSubscriptions,
        AdminOperation::CreateMissedPartitions,
        AdminOperation::GrantPermissions,
        AdminOperation::RevokePermissions,
    ];

    /// Stable snake_case name, used in configuration and as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminOperation::DeletePartitionedTopic => "delete_partitioned_topic",
            AdminOperation::UnloadTopic => "unload_topic",
            AdminOperation::ListSubscriptions => "list_subscriptions",
            AdminOperation::DeleteSubscription => "delete_subscription",
            AdminOperation::SkipAllMessages => "skip_all_messages",
            AdminOperation::ExpireMessages => "expire_messages",
            AdminOperation::ExpireMessagesAllSubscriptions => "expire_messages_all_subscriptions",
            AdminOperation::ResetCursor => "reset_cursor",
            AdminOperation::CreateSubscription => "create_subscription",
            AdminOperation::PropagateSubscriptions => "propagate_subscriptions",
            AdminOperation::CreateMissedPartitions => "create_missed_partitions",
            AdminOperation::GrantPermissions => "grant_permissions",
            AdminOperation::RevokePermissions => "revoke_permissions",
        }
    }

    /// Policy applied when no override is configured.
    pub fn default_policy(&self) -> ReductionPolicy {
        match self {
            AdminOperation::DeletePartitionedTopic | AdminOperation::UnloadTopic => {
                ReductionPolicy::ToleratedNotFound
            }
            AdminOperation::ListSubscriptions
            | AdminOperation::DeleteSubscription
            | AdminOperation::SkipAllMessages
            | AdminOperation::ExpireMessages
            | AdminOperation::ExpireMessagesAllSubscriptions
            | AdminOperation::CreateMissedPartitions
            | AdminOperation::GrantPermissions
            | AdminOperation::RevokePermissions => ReductionPolicy::AllMustSucceed,
            AdminOperation::ResetCursor => ReductionPolicy::FailOnlyIfAllFail,
            AdminOperation::CreateSubscription | AdminOperation::PropagateSubscriptions => {
                ReductionPolicy::ConflictTolerant
            }
        }
    }
}

impl fmt::Display for AdminOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AdminOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| format!("Unknown admin operation '{s}'"))
    }
}

/// Operation → policy mapping with per-operation overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    overrides: HashMap<AdminOperation, ReductionPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The policy for `operation`.
    pub fn policy_for(&self, operation: AdminOperation) -> ReductionPolicy {
        self.overrides
            .get(&operation)
            .copied()
            .unwrap_or_else(|| operation.default_policy())
    }

    /// Override the policy of one operation.
    pub fn set(&mut self, operation: AdminOperation, policy: ReductionPolicy) {
        self.overrides.insert(operation, policy);
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, operation: AdminOperation, policy: ReductionPolicy) -> Self {
        self.set(operation, policy);
        self
    }

    /// Whether any override is configured.
    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// Parse `operation=policy[,operation=policy...]`.
    ///
    /// Collects every malformed entry instead of stopping at the first.
    pub fn parse_overrides(spec: &str) -> Result<Self, Vec<String>> {
        let mut table = Self::new();
        let mut errors = Vec::new();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((op, policy)) = entry.split_once('=') else {
                errors.push(format!("Malformed policy override '{entry}', expected op=policy"));
                continue;
            };
            match (op.parse::<AdminOperation>(), policy.parse::<ReductionPolicy>()) {
                (Ok(op), Ok(policy)) => table.set(op, policy),
                (Err(e), _) | (_, Err(e)) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(table)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = PolicyTable::default();
        assert_eq!(
            table.policy_for(AdminOperation::DeletePartitionedTopic),
            ReductionPolicy::ToleratedNotFound
        );
        assert_eq!(
            table.policy_for(AdminOperation::UnloadTopic),
            ReductionPolicy::ToleratedNotFound
        );
        assert_eq!(
            table.policy_for(AdminOperation::ResetCursor),
            ReductionPolicy::FailOnlyIfAllFail
        );
        assert_eq!(
            table.policy_for(AdminOperation::CreateSubscription),
            ReductionPolicy::ConflictTolerant
        );
        assert_eq!(
            table.policy_for(AdminOperation::PropagateSubscriptions),
            ReductionPolicy::ConflictTolerant
        );
        for op in [
            AdminOperation::ListSubscriptions,
            AdminOperation::DeleteSubscription,
            AdminOperation::SkipAllMessages,
            AdminOperation::ExpireMessages,
            AdminOperation::ExpireMessagesAllSubscriptions,
            AdminOperation::CreateMissedPartitions,
            AdminOperation::GrantPermissions,
            AdminOperation::RevokePermissions,
        ] {
            assert_eq!(table.policy_for(op), ReductionPolicy::AllMustSucceed, "{op}");
        }
    }

    #[test]
    fn test_override() {
        let table = PolicyTable::new().with(
            AdminOperation::UnloadTopic,
            ReductionPolicy::AllMustSucceed,
        );
        assert_eq!(
            table.policy_for(AdminOperation::UnloadTopic),
            ReductionPolicy::AllMustSucceed
        );
        assert_eq!(
            table.policy_for(AdminOperation::DeletePartitionedTopic),
            ReductionPolicy::ToleratedNotFound
        );
    }

    #[test]
    fn test_parse_overrides() {
        let table =
            PolicyTable::parse_overrides("unload_topic=all_must_succeed, reset-cursor=conflict_tolerant")
                .unwrap();
        assert_eq!(
            table.policy_for(AdminOperation::UnloadTopic),
            ReductionPolicy::AllMustSucceed
        );
        assert_eq!(
            table.policy_for(AdminOperation::ResetCursor),
            ReductionPolicy::ConflictTolerant
        );
    }

    #[test]
    fn test_parse_overrides_collects_errors() {
        let errors = PolicyTable::parse_overrides("bogus=all_must_succeed,unload_topic,reset_cursor=nope")
            .unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in AdminOperation::ALL {
            assert_eq!(op.as_str().parse::<AdminOperation>().unwrap(), op);
        }
    }
}

//! Topic-level permissions.
//!
//! Grants and revocations on a partitioned topic are applied to every
//! partition first, then to the logical name.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::PartitionedTopicAdmin;
use crate::admin::policy::AdminOperation;
use crate::error::{AdminError, AdminResult, ErrorKind};
use crate::metadata::{AuthAction, RolePermissions};
use crate::topic_name::TopicName;

fn namespace_error(e: AdminError) -> AdminError {
    match e.kind() {
        ErrorKind::NotFound => AdminError::not_found("Namespace does not exist"),
        _ => e,
    }
}

fn not_set_at_topic_level() -> AdminError {
    AdminError::precondition_failed("Permissions are not set at the topic level")
}

pub(super) async fn get_permissions(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<RolePermissions> {
    let policies = admin.require_namespace(topic.namespace()).await?;
    Ok(policies.effective_permissions(&topic.to_string()))
}

pub(super) async fn grant_permissions(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    role: &str,
    actions: BTreeSet<AuthAction>,
) -> AdminResult<()> {
    let partitions = admin.partition_count(topic).await?;
    let actions = Arc::new(actions);

    if partitions > 0 {
        let store = admin.store.clone();
        let shared_role: Arc<str> = Arc::from(role);
        let shared_actions = actions.clone();
        admin
            .fan_out(
                AdminOperation::GrantPermissions,
                topic,
                0..partitions,
                move |p| {
                    let store = store.clone();
                    let role = shared_role.clone();
                    let actions = shared_actions.clone();
                    async move {
                        store
                            .grant_topic_permission(&p, &role, &actions)
                            .await
                            .map_err(AdminError::from)
                    }
                },
            )
            .await
            .into_unit()
            .map_err(|e| {
                warn!(topic = %topic, role, error = %e, "Failed to grant permissions on partitions");
                namespace_error(e)
            })?;
    }

    admin
        .store
        .grant_topic_permission(topic, role, &actions)
        .await
        .map_err(|e| namespace_error(e.into()))?;

    info!(topic = %topic, role, actions = ?actions, partitions, "Granted permissions");
    Ok(())
}

pub(super) async fn revoke_permissions(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    role: &str,
) -> AdminResult<()> {
    let partitions = admin.partition_count(topic).await?;

    if partitions > 0 {
        let store = admin.store.clone();
        let shared_role: Arc<str> = Arc::from(role);
        admin
            .fan_out(
                AdminOperation::RevokePermissions,
                topic,
                0..partitions,
                move |p| {
                    let store = store.clone();
                    let role = shared_role.clone();
                    async move {
                        match store.revoke_topic_permission(&p, &role).await {
                            Ok(true) => Ok(()),
                            Ok(false) => Err(not_set_at_topic_level()),
                            Err(e) => Err(AdminError::from(e)),
                        }
                    }
                },
            )
            .await
            .into_unit()
            .map_err(|e| {
                warn!(topic = %topic, role, error = %e, "Failed to revoke permissions on partitions");
                namespace_error(e)
            })?;
    }

    let revoked = admin
        .store
        .revoke_topic_permission(topic, role)
        .await
        .map_err(|e| namespace_error(e.into()))?;
    if !revoked {
        warn!(topic = %topic, role, "Permissions are not set at the topic level");
        return Err(not_set_at_topic_level());
    }

    info!(topic = %topic, role, partitions, "Revoked permissions");
    Ok(())
}

//! Subscription and cursor management.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::{Dispatch, PartitionedTopicAdmin};
use crate::admin::policy::AdminOperation;
use crate::error::{AdminError, AdminResult, ErrorKind};
use crate::topic_name::TopicName;
use crate::types::{CursorTarget, ExpireTarget, MessageId};

/// Re-message `NotFound` and `PreconditionFailed` reduced from partitions.
fn subscription_error(e: AdminError, busy_message: Option<&str>) -> AdminError {
    match (e.kind(), busy_message) {
        (ErrorKind::NotFound, _) => AdminError::not_found("Subscription not found"),
        (ErrorKind::PreconditionFailed, Some(msg)) => AdminError::precondition_failed(msg),
        _ => e,
    }
}

pub(super) async fn list_subscriptions(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<Vec<String>> {
    let partitions = match admin.dispatch_mode(topic).await? {
        Dispatch::Single => return admin.client.get_subscriptions(topic).await,
        Dispatch::Partitioned(n) => n,
    };

    let client = admin.client.clone();
    let values = admin
        .fan_out(
            AdminOperation::ListSubscriptions,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                async move { client.get_subscriptions(&p).await }
            },
        )
        .await
        .into_result()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                AdminError::not_found("Internal topics have not been generated yet")
            }
            _ => e,
        })?;

    let merged: BTreeSet<String> = values.into_values().flatten().collect();
    Ok(merged.into_iter().collect())
}

pub(super) async fn create_subscription(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    subscription: &str,
    start: MessageId,
    replicated: bool,
) -> AdminResult<()> {
    let partitions = match admin.dispatch_mode(topic).await? {
        Dispatch::Single => {
            admin
                .client
                .create_subscription(topic, subscription, start, replicated)
                .await?;
            info!(topic = %topic, subscription, start = %start, "Created subscription");
            return Ok(());
        }
        Dispatch::Partitioned(n) => n,
    };

    let client = admin.client.clone();
    let sub = subscription.to_string();
    let aggregate = admin
        .fan_out(
            AdminOperation::CreateSubscription,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                let sub = sub.clone();
                async move { client.create_subscription(&p, &sub, start, replicated).await }
            },
        )
        .await;

    if !aggregate.tolerated.is_empty() && aggregate.is_success() {
        debug!(
            topic = %topic,
            subscription,
            existing = aggregate.tolerated.len(),
            "Subscription already existed on some partitions"
        );
    }
    aggregate.into_unit()?;
    info!(topic = %topic, subscription, start = %start, partitions, "Created subscription");
    Ok(())
}

pub(super) async fn delete_subscription(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    subscription: &str,
) -> AdminResult<()> {
    let partitions = match admin.dispatch_mode(topic).await? {
        Dispatch::Single => {
            admin.client.delete_subscription(topic, subscription).await?;
            info!(topic = %topic, subscription, "Deleted subscription");
            return Ok(());
        }
        Dispatch::Partitioned(n) => n,
    };

    let client = admin.client.clone();
    let sub = subscription.to_string();
    admin
        .fan_out(
            AdminOperation::DeleteSubscription,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                let sub = sub.clone();
                async move { client.delete_subscription(&p, &sub).await }
            },
        )
        .await
        .into_unit()
        .map_err(|e| {
            subscription_error(e, Some("Subscription has active connected consumers"))
        })?;

    info!(topic = %topic, subscription, partitions, "Deleted subscription");
    Ok(())
}

pub(super) async fn skip_all_messages(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    subscription: &str,
) -> AdminResult<()> {
    let partitions = match admin.dispatch_mode(topic).await? {
        Dispatch::Single => {
            admin.client.skip_all_messages(topic, subscription).await?;
            info!(topic = %topic, subscription, "Cleared backlog");
            return Ok(());
        }
        Dispatch::Partitioned(n) => n,
    };

    let client = admin.client.clone();
    let sub = subscription.to_string();
    admin
        .fan_out(
            AdminOperation::SkipAllMessages,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                let sub = sub.clone();
                async move { client.skip_all_messages(&p, &sub).await }
            },
        )
        .await
        .into_unit()
        .map_err(|e| subscription_error(e, None))?;

    info!(topic = %topic, subscription, partitions, "Cleared backlog");
    Ok(())
}

pub(super) async fn skip_messages(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    subscription: &str,
    count: u64,
) -> AdminResult<()> {
    if admin.dispatch_mode(topic).await? != Dispatch::Single {
        return Err(AdminError::method_not_allowed(
            "Skip messages on a partitioned topic is not allowed",
        ));
    }
    admin
        .client
        .skip_messages(topic, subscription, count)
        .await?;
    info!(topic = %topic, subscription, count, "Skipped messages");
    Ok(())
}

pub(super) async fn expire_messages(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    target: ExpireTarget,
    expire_time_secs: u64,
) -> AdminResult<()> {
    if !topic.is_persistent() {
        return Err(AdminError::method_not_allowed(
            "Expire messages on a non-persistent topic is not allowed",
        ));
    }

    let partitions = match admin.dispatch_mode(topic).await? {
        Dispatch::Single => {
            match &target {
                ExpireTarget::Subscription(sub) => {
                    admin
                        .client
                        .expire_messages(topic, sub, expire_time_secs)
                        .await?
                }
                ExpireTarget::AllSubscriptions => {
                    admin
                        .client
                        .expire_messages_all_subscriptions(topic, expire_time_secs)
                        .await?
                }
            }
            info!(topic = %topic, expiry = ?target, expire_time_secs, "Expired messages");
            return Ok(());
        }
        Dispatch::Partitioned(n) => n,
    };

    let client = admin.client.clone();
    let aggregate = match target.clone() {
        ExpireTarget::Subscription(sub) => {
            admin
                .fan_out(
                    AdminOperation::ExpireMessages,
                    topic,
                    0..partitions,
                    move |p| {
                        let client = client.clone();
                        let sub = sub.clone();
                        async move { client.expire_messages(&p, &sub, expire_time_secs).await }
                    },
                )
                .await
        }
        ExpireTarget::AllSubscriptions => {
            admin
                .fan_out(
                    AdminOperation::ExpireMessagesAllSubscriptions,
                    topic,
                    0..partitions,
                    move |p| {
                        let client = client.clone();
                        async move {
                            client
                                .expire_messages_all_subscriptions(&p, expire_time_secs)
                                .await
                        }
                    },
                )
                .await
        }
    };

    aggregate.into_unit().map_err(|e| match target {
        ExpireTarget::Subscription(_) => subscription_error(e, None),
        ExpireTarget::AllSubscriptions => e,
    })?;

    info!(topic = %topic, expire_time_secs, partitions, "Expired messages");
    Ok(())
}

pub(super) async fn reset_cursor(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
    subscription: &str,
    target: CursorTarget,
) -> AdminResult<()> {
    let partitions = match admin.dispatch_mode(topic).await? {
        Dispatch::Single => {
            admin
                .client
                .reset_cursor(topic, subscription, target)
                .await?;
            info!(topic = %topic, subscription, cursor = ?target, "Reset cursor");
            return Ok(());
        }
        Dispatch::Partitioned(n) => n,
    };

    if matches!(target, CursorTarget::Position(_)) {
        return Err(AdminError::method_not_allowed(
            "Reset-cursor at position is not allowed for partitioned-topic",
        ));
    }

    let client = admin.client.clone();
    let sub = subscription.to_string();
    let aggregate = admin
        .fan_out(
            AdminOperation::ResetCursor,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                let sub = sub.clone();
                async move { client.reset_cursor(&p, &sub, target).await }
            },
        )
        .await;

    if let Some(e) = &aggregate.error {
        warn!(topic = %topic, subscription, cursor = ?target, error = %e, "Failed to reset cursor");
    }
    aggregate.into_unit()?;
    info!(topic = %topic, subscription, cursor = ?target, partitions, "Reset cursor");
    Ok(())
}

//! Non-partitioned topic creation, unload and termination, plus namespace
//! topic listings.

use tracing::info;

use super::{Dispatch, PartitionedTopicAdmin};
use crate::admin::policy::AdminOperation;
use crate::admin::validation::validate_non_partitioned_create;
use crate::error::{AdminError, AdminResult};
use crate::metadata::PartitionedTopicMetadata;
use crate::topic_name::{NameSuffixRecord, NamespaceName, TopicDomain, TopicName};
use crate::types::MessageId;

pub(super) async fn create_non_partitioned(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<()> {
    match NameSuffixRecord::parse(topic.local_name()) {
        Some(suffix) => {
            let owner = topic.with_local_name(&suffix.base_name)?;
            let owner_meta = admin
                .store
                .get_partitioned(&owner)
                .await?
                .map_or_else(PartitionedTopicMetadata::default, |r| r.value);
            validate_non_partitioned_create(topic, Some(owner_meta))?;
        }
        None => {
            if admin.partition_count(topic).await? > 0 {
                return Err(AdminError::conflict("This topic already exists"));
            }
        }
    }

    admin.client.create_topic(topic).await?;
    info!(topic = %topic, "Created non-partitioned topic");
    Ok(())
}

pub(super) async fn unload(admin: &PartitionedTopicAdmin, topic: &TopicName) -> AdminResult<()> {
    let partitions = match admin.dispatch_mode(topic).await? {
        Dispatch::Single => {
            admin.client.unload_topic(topic).await?;
            info!(topic = %topic, "Unloaded topic");
            return Ok(());
        }
        Dispatch::Partitioned(n) => n,
    };

    let client = admin.client.clone();
    admin
        .fan_out(
            AdminOperation::UnloadTopic,
            topic,
            0..partitions,
            move |p| {
                let client = client.clone();
                async move { client.unload_topic(&p).await }
            },
        )
        .await
        .into_unit()?;

    info!(topic = %topic, partitions, "Unloaded partitioned topic");
    Ok(())
}

pub(super) async fn terminate(
    admin: &PartitionedTopicAdmin,
    topic: &TopicName,
) -> AdminResult<MessageId> {
    if admin.dispatch_mode(topic).await? != Dispatch::Single {
        return Err(AdminError::method_not_allowed(
            "Termination of a partitioned topic is not allowed",
        ));
    }
    let last = admin.client.terminate_topic(topic).await?;
    info!(topic = %topic, last_message_id = %last, "Terminated topic");
    Ok(last)
}

pub(super) async fn list_topics(
    admin: &PartitionedTopicAdmin,
    namespace: &NamespaceName,
    domain: TopicDomain,
) -> AdminResult<Vec<TopicName>> {
    admin.require_namespace(namespace).await?;
    let mut topics = admin.lister.list_topics(namespace, domain).await?;
    topics.sort();
    Ok(topics)
}

pub(super) async fn list_partitioned_topics(
    admin: &PartitionedTopicAdmin,
    namespace: &NamespaceName,
    domain: TopicDomain,
) -> AdminResult<Vec<TopicName>> {
    admin.require_namespace(namespace).await?;
    Ok(admin.store.list_partitioned(namespace, domain).await?)
}

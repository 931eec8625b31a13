//! Metadata path layout.
//!
//! Partitioned topic records live at:
//! `/admin/partitioned-topics/{tenant}/{namespace}/{domain}/{local_name}`
//!
//! Namespace policies live at `/admin/policies/{tenant}/{namespace}`.
//!
//! Records are always keyed by the *logical* topic; a partition name maps to
//! the path of the topic that owns it.

use crate::constants::{PARTITIONED_TOPIC_PATH_ROOT, POLICIES_PATH_ROOT};
use crate::topic_name::{NamespaceName, TopicDomain, TopicName};

/// Path of the partition count record for `topic`.
pub fn partitioned_topic_path(topic: &TopicName) -> String {
    let logical = topic.partitioned_topic_name();
    format!(
        "{}/{}",
        namespace_domain_path(logical.namespace(), logical.domain()),
        logical.local_name()
    )
}

/// Prefix under which every record of a namespace and domain lives.
pub fn namespace_domain_path(namespace: &NamespaceName, domain: TopicDomain) -> String {
    format!(
        "{}/{}/{}/{}",
        PARTITIONED_TOPIC_PATH_ROOT,
        namespace.tenant(),
        namespace.namespace(),
        domain
    )
}

/// Path of the policies record of a namespace.
pub fn namespace_policies_path(namespace: &NamespaceName) -> String {
    format!(
        "{}/{}/{}",
        POLICIES_PATH_ROOT,
        namespace.tenant(),
        namespace.namespace()
    )
}

//! Topic identities and partition naming.
//!
//! A fully qualified topic name has the form
//! `{domain}://{tenant}/{namespace}/{local_name}`. A logical partitioned topic
//! `orders` is backed by physical topics `orders-partition-0` ..
//! `orders-partition-{N-1}`; the suffix is recognised on the *last*
//! occurrence of [`PARTITIONED_TOPIC_SUFFIX`] and only when it is all digits.
//!
//! # Identifier Rules
//!
//! Tenant, namespace and local names must:
//! - Not be empty
//! - Be at most 249 characters
//! - Contain only ASCII alphanumeric characters and `-`, `_`, `.`, `=`, `:`
//! - Not be "." or ".."
//! - Not start with a hyphen

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DOMAIN_SEPARATOR, MAX_NAME_LENGTH, NON_PERSISTENT_DOMAIN, PARTITIONED_TOPIC_SUFFIX,
    PERSISTENT_DOMAIN,
};
use crate::error::{AdminError, AdminResult};

/// Storage domain of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TopicDomain {
    Persistent,
    NonPersistent,
}

impl TopicDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicDomain::Persistent => PERSISTENT_DOMAIN,
            TopicDomain::NonPersistent => NON_PERSISTENT_DOMAIN,
        }
    }
}

impl fmt::Display for TopicDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicDomain {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PERSISTENT_DOMAIN => Ok(TopicDomain::Persistent),
            NON_PERSISTENT_DOMAIN => Ok(TopicDomain::NonPersistent),
            other => Err(AdminError::not_acceptable(format!(
                "Invalid topic domain '{other}'. Valid values: persistent, non-persistent"
            ))),
        }
    }
}

/// A `tenant/namespace` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceName {
    tenant: String,
    namespace: String,
}

impl NamespaceName {
    pub fn new(tenant: impl Into<String>, namespace: impl Into<String>) -> AdminResult<Self> {
        let tenant = tenant.into();
        let namespace = namespace.into();
        validate_identifier(&tenant, "Tenant")?;
        validate_identifier(&namespace, "Namespace")?;
        Ok(Self { tenant, namespace })
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.namespace)
    }
}

/// Base name and numeric suffix of a local name carrying the partition marker.
///
/// Derived on demand from listings; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSuffixRecord {
    pub base_name: String,
    pub numeric_suffix: u64,
}

impl NameSuffixRecord {
    /// Split `local_name` at the last partition marker.
    ///
    /// Returns `None` when the marker is absent, the base is empty, or the
    /// suffix is not a non-empty run of ASCII digits that fits in a `u64`.
    pub fn parse(local_name: &str) -> Option<Self> {
        let idx = local_name.rfind(PARTITIONED_TOPIC_SUFFIX)?;
        let base = &local_name[..idx];
        let suffix = &local_name[idx + PARTITIONED_TOPIC_SUFFIX.len()..];
        if base.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let numeric_suffix = suffix.parse::<u64>().ok()?;
        Some(Self {
            base_name: base.to_string(),
            numeric_suffix,
        })
    }
}

/// Identity of a logical topic or of one of its physical partitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicName {
    domain: TopicDomain,
    namespace: NamespaceName,
    local_name: String,
    partition_index: Option<u32>,
}

impl TopicName {
    /// Build and validate a topic name.
    ///
    /// A local name ending in `-partition-<digits>` yields a partition identity.
    pub fn new(
        domain: TopicDomain,
        namespace: NamespaceName,
        local_name: impl Into<String>,
    ) -> AdminResult<Self> {
        let local_name = local_name.into();
        validate_identifier(&local_name, "Topic name")?;
        let partition_index = NameSuffixRecord::parse(&local_name)
            .and_then(|r| u32::try_from(r.numeric_suffix).ok());
        Ok(Self {
            domain,
            namespace,
            local_name,
            partition_index,
        })
    }

    /// Shorthand for a persistent topic.
    pub fn persistent(tenant: &str, namespace: &str, local_name: &str) -> AdminResult<Self> {
        Self::new(
            TopicDomain::Persistent,
            NamespaceName::new(tenant, namespace)?,
            local_name,
        )
    }

    /// Shorthand for a non-persistent topic.
    pub fn non_persistent(tenant: &str, namespace: &str, local_name: &str) -> AdminResult<Self> {
        Self::new(
            TopicDomain::NonPersistent,
            NamespaceName::new(tenant, namespace)?,
            local_name,
        )
    }

    /// Parse `domain://tenant/namespace/local_name`.
    pub fn parse(name: &str) -> AdminResult<Self> {
        let (domain, rest) = name.split_once(DOMAIN_SEPARATOR).ok_or_else(|| {
            AdminError::not_acceptable(format!("Invalid topic name '{name}': missing domain"))
        })?;
        let domain: TopicDomain = domain.parse()?;

        let mut parts = rest.splitn(3, '/');
        let (Some(tenant), Some(namespace), Some(local_name)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(AdminError::not_acceptable(format!(
                "Invalid topic name '{name}': expected domain://tenant/namespace/topic"
            )));
        };

        Self::new(domain, NamespaceName::new(tenant, namespace)?, local_name)
    }

    pub fn domain(&self) -> TopicDomain {
        self.domain
    }

    pub fn namespace(&self) -> &NamespaceName {
        &self.namespace
    }

    /// The local name as given, including any partition suffix.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.domain == TopicDomain::Persistent
    }

    #[inline]
    pub fn is_partition(&self) -> bool {
        self.partition_index.is_some()
    }

    pub fn partition_index(&self) -> Option<u32> {
        self.partition_index
    }

    /// Local name of the owning logical topic.
    pub fn base_name(&self) -> &str {
        match self.partition_index {
            Some(_) => self
                .local_name
                .rfind(PARTITIONED_TOPIC_SUFFIX)
                .map_or(self.local_name.as_str(), |idx| &self.local_name[..idx]),
            None => &self.local_name,
        }
    }

    /// Physical partition `index` of the logical topic this name belongs to.
    pub fn partition(&self, index: u32) -> TopicName {
        TopicName {
            domain: self.domain,
            namespace: self.namespace.clone(),
            local_name: format!("{}{}{}", self.base_name(), PARTITIONED_TOPIC_SUFFIX, index),
            partition_index: Some(index),
        }
    }

    /// The logical topic owning this name; `self` when not a partition.
    pub fn partitioned_topic_name(&self) -> TopicName {
        if !self.is_partition() {
            return self.clone();
        }
        TopicName {
            domain: self.domain,
            namespace: self.namespace.clone(),
            local_name: self.base_name().to_string(),
            partition_index: None,
        }
    }

    /// Replace the local name, keeping domain and namespace.
    pub fn with_local_name(&self, local_name: &str) -> AdminResult<TopicName> {
        Self::new(self.domain, self.namespace.clone(), local_name)
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}/{}",
            self.domain, DOMAIN_SEPARATOR, self.namespace, self.local_name
        )
    }
}

impl FromStr for TopicName {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Core identifier validation shared by tenants, namespaces and topics.
pub fn validate_identifier(value: &str, field_name: &str) -> AdminResult<()> {
    if value.is_empty() {
        return Err(AdminError::not_acceptable(format!(
            "{field_name} cannot be empty"
        )));
    }

    if value.len() > MAX_NAME_LENGTH {
        return Err(AdminError::not_acceptable(format!(
            "{} '{}' is too long ({} chars, max {} chars)",
            field_name,
            truncate_for_display(value, 50),
            value.len(),
            MAX_NAME_LENGTH
        )));
    }

    if value == "." || value == ".." {
        return Err(AdminError::not_acceptable(format!(
            "{field_name} cannot be '.' or '..' (reserved names)"
        )));
    }

    if value.starts_with('-') {
        return Err(AdminError::not_acceptable(format!(
            "{} '{}' cannot start with a hyphen",
            field_name,
            truncate_for_display(value, 50)
        )));
    }

    for (i, c) in value.chars().enumerate() {
        let is_valid = c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '=' | ':');
        if !is_valid {
            return Err(AdminError::not_acceptable(format!(
                "Invalid character '{}' (U+{:04X}) in {} at position {}. \
                 Only ASCII letters, digits, '-', '_', '.', '=' and ':' are allowed.",
                c.escape_default(),
                c as u32,
                field_name,
                i
            )));
        }
    }

    Ok(())
}

fn truncate_for_display(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(local: &str) -> TopicName {
        TopicName::persistent("public", "default", local).unwrap()
    }

    #[test]
    fn test_parse_round_trip_display() {
        let t = TopicName::parse("persistent://public/default/orders").unwrap();
        assert_eq!(t.domain(), TopicDomain::Persistent);
        assert_eq!(t.namespace().tenant(), "public");
        assert_eq!(t.namespace().namespace(), "default");
        assert_eq!(t.local_name(), "orders");
        assert!(!t.is_partition());
        assert_eq!(t.to_string(), "persistent://public/default/orders");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!(TopicName::parse("public/default/orders").is_err());
        assert!(TopicName::parse("persistent://public/orders").is_err());
        assert!(TopicName::parse("bogus://public/default/orders").is_err());
    }

    #[test]
    fn test_partition_derivation() {
        let t = topic("orders");
        let p = t.partition(3);
        assert_eq!(p.local_name(), "orders-partition-3");
        assert_eq!(p.partition_index(), Some(3));
        assert!(p.is_partition());
        assert_eq!(p.partitioned_topic_name(), t);
    }

    #[test]
    fn test_partition_of_partition_uses_base() {
        let p = topic("orders-partition-1");
        assert_eq!(p.partition(4).local_name(), "orders-partition-4");
    }

    #[test]
    fn test_non_numeric_suffix_is_not_partition() {
        let t = topic("orders-partition-abc");
        assert!(!t.is_partition());
        assert_eq!(t.base_name(), "orders-partition-abc");
    }

    #[test]
    fn test_suffix_uses_last_marker() {
        let r = NameSuffixRecord::parse("a-partition-1-partition-7").unwrap();
        assert_eq!(r.base_name, "a-partition-1");
        assert_eq!(r.numeric_suffix, 7);
    }

    #[test]
    fn test_suffix_rejects_signs_and_empty() {
        assert!(NameSuffixRecord::parse("a-partition-").is_none());
        assert!(NameSuffixRecord::parse("a-partition--1").is_none());
        assert!(NameSuffixRecord::parse("a-partition-+1").is_none());
        assert!(NameSuffixRecord::parse("-partition-1").is_none());
        assert!(NameSuffixRecord::parse("plain").is_none());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("my-topic_v1.0", "Topic name").is_ok());
        assert!(validate_identifier("a=b:c", "Topic name").is_ok());
        assert!(validate_identifier("", "Topic name").is_err());
        assert!(validate_identifier(".", "Topic name").is_err());
        assert!(validate_identifier("..", "Topic name").is_err());
        assert!(validate_identifier("-x", "Topic name").is_err());
        assert!(validate_identifier("a/b", "Topic name").is_err());
        assert!(validate_identifier("a b", "Topic name").is_err());
        assert!(validate_identifier(&"a".repeat(MAX_NAME_LENGTH), "Topic name").is_ok());
        assert!(validate_identifier(&"a".repeat(MAX_NAME_LENGTH + 1), "Topic name").is_err());
    }

    #[test]
    fn test_invalid_identifier_is_not_acceptable() {
        let err = TopicName::persistent("public", "default", "bad/name").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotAcceptable);
    }
}

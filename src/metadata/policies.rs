//! Namespace policy records.
//!
//! A namespace owns one policies record. Only the authorization part is
//! modelled here: roles granted on the whole namespace, and roles granted
//! on individual topics keyed by the full topic name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Action a role may be authorized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Produce,
    Consume,
    Functions,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthAction::Produce => "produce",
            AuthAction::Consume => "consume",
            AuthAction::Functions => "functions",
        }
    }
}

impl fmt::Display for AuthAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role -> granted actions.
pub type RolePermissions = BTreeMap<String, BTreeSet<AuthAction>>;

/// Policies record of a namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespacePolicies {
    #[serde(default)]
    pub namespace_auth: RolePermissions,
    #[serde(default)]
    pub topic_auth: BTreeMap<String, RolePermissions>,
}

impl NamespacePolicies {
    /// Grant `role` on the whole namespace.
    pub fn with_namespace_role(
        mut self,
        role: impl Into<String>,
        actions: impl IntoIterator<Item = AuthAction>,
    ) -> Self {
        self.namespace_auth
            .insert(role.into(), actions.into_iter().collect());
        self
    }

    /// Replace the actions of `role` on `topic`.
    pub fn grant_topic(&mut self, topic: &str, role: &str, actions: BTreeSet<AuthAction>) {
        self.topic_auth
            .entry(topic.to_string())
            .or_default()
            .insert(role.to_string(), actions);
    }

    /// Remove `role` from `topic`. Returns `false` when it was not set there.
    pub fn revoke_topic(&mut self, topic: &str, role: &str) -> bool {
        self.topic_auth
            .get_mut(topic)
            .is_some_and(|roles| roles.remove(role).is_some())
    }

    /// Namespace roles merged with the roles granted on `topic`.
    ///
    /// A role present at both levels gets the union of its actions.
    pub fn effective_permissions(&self, topic: &str) -> RolePermissions {
        let mut permissions = self.namespace_auth.clone();
        if let Some(roles) = self.topic_auth.get(topic) {
            for (role, actions) in roles {
                permissions
                    .entry(role.clone())
                    .or_default()
                    .extend(actions.iter().copied());
            }
        }
        permissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "persistent://acme/prod/orders";

    #[test]
    fn test_effective_permissions_union() {
        let mut policies = NamespacePolicies::default()
            .with_namespace_role("ops", [AuthAction::Consume])
            .with_namespace_role("audit", [AuthAction::Consume]);
        policies.grant_topic(TOPIC, "ops", BTreeSet::from([AuthAction::Produce]));
        policies.grant_topic(TOPIC, "billing", BTreeSet::from([AuthAction::Produce]));

        let effective = policies.effective_permissions(TOPIC);
        assert_eq!(
            effective["ops"],
            BTreeSet::from([AuthAction::Produce, AuthAction::Consume])
        );
        assert_eq!(effective["audit"], BTreeSet::from([AuthAction::Consume]));
        assert_eq!(effective["billing"], BTreeSet::from([AuthAction::Produce]));

        let other = policies.effective_permissions("persistent://acme/prod/other");
        assert!(!other.contains_key("billing"));
    }

    #[test]
    fn test_revoke_only_topic_level() {
        let mut policies =
            NamespacePolicies::default().with_namespace_role("ops", [AuthAction::Consume]);
        assert!(!policies.revoke_topic(TOPIC, "ops"));

        policies.grant_topic(TOPIC, "ops", BTreeSet::from([AuthAction::Produce]));
        assert!(policies.revoke_topic(TOPIC, "ops"));
        assert!(!policies.revoke_topic(TOPIC, "ops"));
        assert!(policies.namespace_auth.contains_key("ops"));
    }

    #[test]
    fn test_json_shape() {
        let mut policies = NamespacePolicies::default();
        policies.grant_topic(TOPIC, "ops", BTreeSet::from([AuthAction::Produce]));
        let json = serde_json::to_value(&policies).unwrap();
        assert_eq!(json["topicAuth"][TOPIC]["ops"][0], "produce");
        assert!(json["namespaceAuth"].as_object().unwrap().is_empty());
    }
}

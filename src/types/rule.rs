//! Exclusion rules, before and after validation.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::names::NameSet;
use super::scope::{Scope, ScopeType};

/// One entry of a rule file, exactly as deserialized.
///
/// Every field is optional on input. Missing strings and lists default to
/// empty, a missing scope stays `None`; validation decides what that means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawExclusionRule {
    /// API group of the object. Empty for the core group.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_group: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    /// Object names. `*` is only accepted for Leases in `kube-node-lease`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Must be empty for `Cluster` scope and set for `Namespaced` scope.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// `Cluster` or `Namespaced`. `All` and `*` are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl RawExclusionRule {
    pub fn new(
        api_group: &str,
        api_version: &str,
        kind: &str,
        namespace: &str,
        names: &[&str],
        scope: Option<ScopeType>,
    ) -> Self {
        RawExclusionRule {
            api_group: api_group.to_string(),
            api_version: api_version.to_string(),
            name: names.iter().map(|n| n.to_string()).collect(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            scope: scope.map(|s| s.to_string()),
        }
    }
}

/// A rule that passed validation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExclusionRule {
    pub(crate) api_group: String,
    pub(crate) api_version: String,
    pub(crate) kind: String,
    pub(crate) namespace: String,
    pub(crate) names: NameSet,
    pub(crate) scope: Scope,
}

impl ExclusionRule {
    pub fn api_group(&self) -> &str {
        &self.api_group
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn names(&self) -> &NameSet {
        &self.names
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl Display for ExclusionRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let group = if self.api_group.is_empty() {
            "core"
        } else {
            self.api_group.as_str()
        };
        write!(
            f,
            "{}/{} {} {}/{} ({})",
            group, self.api_version, self.kind, self.namespace, self.names, self.scope
        )
    }
}

impl From<ExclusionRule> for RawExclusionRule {
    fn from(rule: ExclusionRule) -> Self {
        RawExclusionRule {
            api_group: rule.api_group,
            api_version: rule.api_version,
            name: rule.names.to_tokens(),
            kind: rule.kind,
            namespace: rule.namespace,
            scope: Some(ScopeType::from(rule.scope).to_string()),
        }
    }
}

//! Rejects exclusion rules that could exclude more than the control plane's
//! own bookkeeping objects.
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. a scope is set and is a known token,
//! 2. the scope is not `All`, and none of group, version, namespace or kind is
//!    the wildcard,
//! 3. a wildcard name is only used for Leases in `kube-node-lease`,
//! 4. `Cluster` scope has no namespace,
//! 5. `Namespaced` scope has a namespace.

use std::str::FromStr;

use tracing::error;

use crate::error::{ExclusionError, RuleRejection};
use crate::events::ExclusionEventSink;
use crate::types::{ExclusionRule, NameSet, RawExclusionRule, Scope, ScopeType, WILDCARD};

/// Node heartbeat leases: one per node, so names cannot be enumerated.
const NODE_LEASE_GROUP: &str = "coordination.k8s.io";
const NODE_LEASE_VERSION: &str = "v1";
const NODE_LEASE_KIND: &str = "Lease";
const NODE_LEASE_NAMESPACE: &str = "kube-node-lease";

fn name_wildcard_allowed(rule: &RawExclusionRule) -> bool {
    rule.api_group == NODE_LEASE_GROUP
        && rule.api_version == NODE_LEASE_VERSION
        && rule.kind == NODE_LEASE_KIND
        && rule.namespace == NODE_LEASE_NAMESPACE
}

fn wildcard_field(rule: &RawExclusionRule) -> Option<&'static str> {
    [
        ("apiGroup", &rule.api_group),
        ("apiVersion", &rule.api_version),
        ("namespace", &rule.namespace),
        ("kind", &rule.kind),
    ]
    .into_iter()
    .find_map(|(field, value)| (value == WILDCARD).then_some(field))
}

/// Validate one raw rule.
pub fn validate_rule(rule: &RawExclusionRule) -> Result<ExclusionRule, RuleRejection> {
    let token = rule.scope.as_deref().ok_or(RuleRejection::ScopeNotSet)?;
    let scope_type =
        ScopeType::from_str(token).map_err(|_| RuleRejection::UnknownScope(token.to_string()))?;

    let scope = match scope_type {
        ScopeType::All => return Err(RuleRejection::AllScopes),
        ScopeType::Cluster => Scope::Cluster,
        ScopeType::Namespaced => Scope::Namespaced,
    };
    if let Some(field) = wildcard_field(rule) {
        return Err(RuleRejection::WildcardField(field.to_string()));
    }

    if rule.name.iter().any(|n| n == WILDCARD) && !name_wildcard_allowed(rule) {
        return Err(RuleRejection::NameWildcardNotAllowed);
    }

    match scope {
        Scope::Cluster if !rule.namespace.is_empty() => {
            Err(RuleRejection::NamespaceWithClusterScope)
        }
        Scope::Namespaced if rule.namespace.is_empty() => {
            Err(RuleRejection::MissingNamespaceForNamespacedScope)
        }
        _ => Ok(ExclusionRule {
            api_group: rule.api_group.clone(),
            api_version: rule.api_version.clone(),
            kind: rule.kind.clone(),
            namespace: rule.namespace.clone(),
            names: rule.name.iter().cloned().collect::<NameSet>(),
            scope,
        }),
    }
}

/// Keep the rules that pass [`validate_rule`], in input order. Each rejected
/// rule is logged and reported to `sink`; it never stops the others.
pub fn filter_valid_rules(
    rules: &[RawExclusionRule],
    sink: &dyn ExclusionEventSink,
) -> Vec<ExclusionRule> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| match validate_rule(rule) {
            Ok(valid) => Some(valid),
            Err(reason) => {
                let err = ExclusionError::InvalidRule {
                    index,
                    reason: reason.clone(),
                };
                error!(
                    event = "ExclusionRules",
                    phase = "Validate",
                    index,
                    kind = rule.kind.as_str(),
                    namespace = rule.namespace.as_str(),
                    error = %err,
                    "skipping invalid webhook admission exclusion rule"
                );
                sink.on_rule_rejected(index, &reason);
                None
            }
        })
        .collect()
}

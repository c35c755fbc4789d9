use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while turning configuration into exclusion rules.
///
/// None of these ever escape the excluder: the loader substitutes the default
/// rules and the validator drops the offending rule. They are surfaced through
/// the tracing log and the [`ExclusionEventSink`](crate::ExclusionEventSink).
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExclusionError {
    #[error("failed to read exclusion rules file {path}: {message}")]
    ConfigRead { path: String, message: String },

    #[error("failed to parse exclusion rules file {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("invalid exclusion rule at index {index}: {reason}")]
    InvalidRule { index: usize, reason: RuleRejection },
}

/// Why a single raw rule was dropped during validation.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RuleRejection {
    #[error("scope not set")]
    ScopeNotSet,

    #[error("unrecognised scope {0:?}")]
    UnknownScope(String),

    #[error("wildcard not allowed for scope")]
    AllScopes,

    #[error("wildcard not allowed for {0}")]
    WildcardField(String),

    #[error("wildcard only allowed for name for Lease in kube-node-lease")]
    NameWildcardNotAllowed,

    #[error("cannot set namespace with Cluster scope")]
    NamespaceWithClusterScope,

    #[error("must set namespace with Namespaced scope")]
    MissingNamespaceForNamespacedScope,
}

impl From<serde_json::Error> for ExclusionError {
    fn from(err: serde_json::Error) -> Self {
        ExclusionError::ConfigParse {
            path: String::new(),
            message: err.to_string(),
        }
    }
}

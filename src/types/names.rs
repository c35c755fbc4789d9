//! Object name sets with a distinguished wildcard.

use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The wildcard token. Only meaningful inside a rule's `name` list.
pub const WILDCARD: &str = "*";

/// One entry of a rule's name list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamePattern {
    Exact(String),
    Any,
}

impl NamePattern {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(exact) => exact == name,
            NamePattern::Any => true,
        }
    }
}

impl From<&str> for NamePattern {
    fn from(token: &str) -> Self {
        if token == WILDCARD {
            NamePattern::Any
        } else {
            NamePattern::Exact(token.to_string())
        }
    }
}

impl From<String> for NamePattern {
    fn from(token: String) -> Self {
        if token == WILDCARD {
            NamePattern::Any
        } else {
            NamePattern::Exact(token)
        }
    }
}

impl Display for NamePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NamePattern::Exact(name) => write!(f, "{name}"),
            NamePattern::Any => write!(f, "{WILDCARD}"),
        }
    }
}

/// Ordered names of a validated rule. Order is kept for display and
/// round-tripping only; matching is set membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameSet(Vec<NamePattern>);

impl NameSet {
    pub fn new(patterns: Vec<NamePattern>) -> Self {
        NameSet(patterns)
    }

    /// True if `name` is listed exactly, or the set holds the wildcard.
    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|pattern| pattern.matches(name))
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.contains(&NamePattern::Any)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamePattern> {
        self.0.iter()
    }

    /// Render back to the configuration form.
    pub fn to_tokens(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl<S: Into<NamePattern>> FromIterator<S> for NameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        NameSet(iter.into_iter().map(Into::into).collect())
    }
}

impl Display for NameSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}]", self.0.iter().join(","))
    }
}

use strum_macros::{Display, EnumIter};

use crate::types::{Attributes, ExclusionRule, Scope};

/// A dimension a rule is compared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Dimension {
    Group,
    Version,
    Kind,
    Namespace,
    Name,
    Scope,
}

/// Scope of a request, derived from what it targets rather than trusted from
/// the caller: namespace objects and requests without a namespace are
/// cluster-scoped, everything else is namespaced.
pub fn request_scope(attrs: &dyn Attributes) -> Scope {
    if attrs.get_resource().is_namespaces() || attrs.get_namespace().is_empty() {
        Scope::Cluster
    } else {
        Scope::Namespaced
    }
}

pub(crate) fn group_matches(rule: &ExclusionRule, attrs: &dyn Attributes) -> bool {
    rule.api_group == attrs.get_resource().group
}

pub(crate) fn version_matches(rule: &ExclusionRule, attrs: &dyn Attributes) -> bool {
    rule.api_version == attrs.get_resource().version
}

pub(crate) fn kind_matches(rule: &ExclusionRule, attrs: &dyn Attributes) -> bool {
    rule.kind == attrs.get_kind().kind
}

pub(crate) fn namespace_matches(rule: &ExclusionRule, attrs: &dyn Attributes) -> bool {
    rule.namespace == attrs.get_namespace()
}

pub(crate) fn name_matches(rule: &ExclusionRule, attrs: &dyn Attributes) -> bool {
    rule.names.matches(attrs.get_name())
}

pub(crate) fn scope_matches(rule: &ExclusionRule, attrs: &dyn Attributes) -> bool {
    rule.scope == request_scope(attrs)
}

/// Tests one validated rule against one request. Pure and total.
#[derive(Clone, Copy)]
pub struct Matcher<'a> {
    rule: &'a ExclusionRule,
    attrs: &'a dyn Attributes,
}

impl<'a> Matcher<'a> {
    pub fn new(rule: &'a ExclusionRule, attrs: &'a dyn Attributes) -> Self {
        Self { rule, attrs }
    }

    pub fn dimension_matches(&self, dimension: Dimension) -> bool {
        let check = match dimension {
            Dimension::Group => group_matches,
            Dimension::Version => version_matches,
            Dimension::Kind => kind_matches,
            Dimension::Namespace => namespace_matches,
            Dimension::Name => name_matches,
            Dimension::Scope => scope_matches,
        };
        check(self.rule, self.attrs)
    }

    /// All dimensions hold.
    pub fn matches(&self) -> bool {
        self.first_mismatch().is_none()
    }

    /// The first dimension, in declaration order, that does not hold.
    pub fn first_mismatch(&self) -> Option<Dimension> {
        use strum::IntoEnumIterator;
        Dimension::iter().find(|d| !self.dimension_matches(*d))
    }
}

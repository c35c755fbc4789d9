//! Data model: exclusion rules and request attributes.
//!
//! A rule exists in two forms:
//! - [`RawExclusionRule`]: what a rule file (or the built-in defaults) says,
//!   with an optional free-form scope token and plain string names.
//! - [`ExclusionRule`]: what survived validation, with a closed [`Scope`] and
//!   a [`NameSet`] where the wildcard is [`NamePattern::Any`].

mod attributes;
mod names;
mod rule;
mod scope;

pub use attributes::{
    Attributes, GroupVersionKind, GroupVersionResource, Operation, RequestAttributes,
};
pub use names::{NamePattern, NameSet, WILDCARD};
pub use rule::{ExclusionRule, RawExclusionRule};
pub use scope::{Scope, ScopeType};

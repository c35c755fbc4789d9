//! Scope tokens as read from configuration, and the validated scope.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

/// Scope token as it appears in a rule file.
///
/// `All` (also spelled `*`) is only representable here; validation never lets
/// it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr)]
pub enum ScopeType {
    Cluster,
    Namespaced,
    #[strum(to_string = "All", serialize = "*")]
    #[serde(alias = "*")]
    All,
}

impl Display for ScopeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_ref())
    }
}

/// Scope of an accepted rule, and the derived scope of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Cluster,
    Namespaced,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", ScopeType::from(*self))
    }
}

impl From<Scope> for ScopeType {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Cluster => ScopeType::Cluster,
            Scope::Namespaced => ScopeType::Namespaced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use yare::parameterized;

    #[parameterized(
        cluster = { "Cluster", Some(ScopeType::Cluster) },
        namespaced = { "Namespaced", Some(ScopeType::Namespaced) },
        all = { "All", Some(ScopeType::All) },
        star = { "*", Some(ScopeType::All) },
        lowercase_is_not_a_scope = { "cluster", None },
        empty = { "", None },
    )]
    fn test_scope_tokens(token: &str, expected: Option<ScopeType>) {
        assert_eq!(ScopeType::from_str(token).ok(), expected);
    }

    #[test]
    fn test_validated_scope_display() {
        assert_eq!(Scope::Cluster.to_string(), "Cluster");
        assert_eq!(Scope::Namespaced.to_string(), "Namespaced");
    }
}

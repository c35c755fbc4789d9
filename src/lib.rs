// src/lib.rs
//! Exclusion rules that keep admission webhooks away from the objects the
//! control plane needs for its own leader election.
//!
//! A broken webhook that intercepts writes to the controller manager's or the
//! scheduler's Lease and Endpoints objects can stop either of them from ever
//! becoming leader again. [`CriticalPathExcluder::should_skip`] tells a webhook
//! dispatcher when a request targets such an object, so the webhook call can
//! be bypassed.
//!
//! ```rust
//! use critical_path_excluder::{
//!     ConfigLoader, ExcluderCell, Operation, RequestAttributes, RuleSource, WebhookExclusion,
//! };
//!
//! let excluder = ExcluderCell::new(ConfigLoader::new(RuleSource::Defaults));
//! let request = RequestAttributes::namespaced(
//!     "", "v1", "Endpoints", "endpoints", "kube-system", "kube-scheduler", Operation::Update,
//! );
//! assert!(excluder.should_skip(&request));
//! ```
pub use error::{ExclusionError, RuleRejection};
pub use events::{EventLog, ExclusionEvent, ExclusionEventSink, LoadStats, NoOpSink};
pub use excluder::{CriticalPathExcluder, ExcluderCell};
pub use loader::{
    ConfigLoader, EXCLUSION_RULES_FILE_ENV, LoadedRules, RuleOrigin, RuleSource, default_rules,
    parse_rules, read_rules_file, rules_file_schema,
};
pub use matcher::{Dimension, Matcher, request_scope};
pub use traits::WebhookExclusion;
pub use types::{
    Attributes, ExclusionRule, GroupVersionKind, GroupVersionResource, NamePattern, NameSet,
    Operation, RawExclusionRule, RequestAttributes, Scope, ScopeType, WILDCARD,
};
pub use validator::{filter_valid_rules, validate_rule};

mod error;
pub mod events;
mod excluder;
mod loader;
mod matcher;
mod traits;
mod types;
mod validator;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::loader::ConfigLoader;
use crate::matcher::Matcher;
use crate::traits::WebhookExclusion;
use crate::types::{Attributes, ExclusionRule};
use crate::validator::filter_valid_rules;

/// Holds the validated exclusion rules and decides, per request, whether
/// webhooks must be bypassed. Cloneable and thread-safe; the rules never
/// change after construction.
#[derive(Debug, Clone, Default)]
pub struct CriticalPathExcluder {
    rules: Arc<[ExclusionRule]>,
}

impl CriticalPathExcluder {
    /// Wrap already validated rules.
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// Load, validate and wrap the rules `loader` points at. Never fails.
    pub fn load(loader: &ConfigLoader) -> Self {
        let loaded = loader.load();
        let rules = filter_valid_rules(&loaded.rules, loader.sink().as_ref());
        info!(
            event = "ExclusionRules",
            phase = "Ready",
            origin = %loaded.origin,
            loaded = loaded.rules.len(),
            accepted = rules.len()
        );
        Self::new(rules)
    }

    /// Load the rules named by the environment, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::load(&ConfigLoader::from_env())
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// The first rule, in load order, that matches `attrs`.
    pub fn matching_rule(&self, attrs: &dyn Attributes) -> Option<(usize, &ExclusionRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| Matcher::new(rule, attrs).matches())
    }

    /// Whether webhooks must be skipped for this request.
    pub fn should_skip(&self, attrs: &dyn Attributes) -> bool {
        match self.matching_rule(attrs) {
            Some((index, rule)) => {
                debug!(
                    event = "ExclusionRules",
                    phase = "Skip",
                    index,
                    rule = %rule,
                    operation = %attrs.get_operation(),
                    namespace = attrs.get_namespace(),
                    name = attrs.get_name()
                );
                true
            }
            None => false,
        }
    }
}

impl WebhookExclusion for CriticalPathExcluder {
    fn should_skip(&self, attrs: &dyn Attributes) -> bool {
        CriticalPathExcluder::should_skip(self, attrs)
    }
}

/// One-time, lazily constructed [`CriticalPathExcluder`].
///
/// The first call to [`get`](Self::get) loads and validates the rules; callers
/// racing it block until that single construction finishes and then share its
/// result. Owned by whoever dispatches webhooks, not a global.
#[derive(Debug)]
pub struct ExcluderCell {
    loader: ConfigLoader,
    cell: OnceCell<CriticalPathExcluder>,
}

impl Default for ExcluderCell {
    fn default() -> Self {
        Self::new(ConfigLoader::from_env())
    }
}

impl ExcluderCell {
    pub fn new(loader: ConfigLoader) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> &CriticalPathExcluder {
        self.cell
            .get_or_init(|| CriticalPathExcluder::load(&self.loader))
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Drop the constructed excluder and build it again, as a fresh process
    /// start would.
    pub fn reinitialize(&mut self) -> &CriticalPathExcluder {
        self.cell = OnceCell::new();
        self.get()
    }

    /// Like [`reinitialize`](Self::reinitialize), with a different loader.
    pub fn reinitialize_with(&mut self, loader: ConfigLoader) -> &CriticalPathExcluder {
        self.loader = loader;
        self.reinitialize()
    }
}

impl WebhookExclusion for ExcluderCell {
    fn should_skip(&self, attrs: &dyn Attributes) -> bool {
        self.get().should_skip(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventLog, ExclusionEvent, NoOpSink};
    use crate::loader::{RuleSource, default_rules};
    use crate::types::{Operation, RawExclusionRule, RequestAttributes, ScopeType};
    use std::thread;

    fn excluder_from(raw: Vec<RawExclusionRule>) -> CriticalPathExcluder {
        CriticalPathExcluder::new(filter_valid_rules(&raw, &NoOpSink))
    }

    fn deployment_rule(name: &str) -> RawExclusionRule {
        RawExclusionRule::new(
            "apps",
            "v1",
            "Deployment",
            "ns",
            &[name],
            Some(ScopeType::Namespaced),
        )
    }

    fn config_map_rule(name: &str) -> RawExclusionRule {
        RawExclusionRule::new(
            "",
            "v1",
            "ConfigMap",
            "ns",
            &[name],
            Some(ScopeType::Namespaced),
        )
    }

    fn deployment_request() -> RequestAttributes {
        RequestAttributes::namespaced(
            "apps",
            "v1",
            "Deployment",
            "deployments",
            "ns",
            "testName",
            Operation::Create,
        )
    }

    #[yare::parameterized(
        matches_first_rule = { vec![deployment_rule("testName"), config_map_rule("mismatch")], Some(0) },
        matches_second_rule = { vec![config_map_rule("mismatch"), deployment_rule("testName")], Some(1) },
        matches_both_reports_first = { vec![deployment_rule("testName"), deployment_rule("testName")], Some(0) },
        matches_no_rule = { vec![config_map_rule("mismatch"), deployment_rule("mismatch")], None },
        no_rules = { vec![], None },
    )]
    fn test_should_skip(rules: Vec<RawExclusionRule>, expected_index: Option<usize>) {
        let excluder = excluder_from(rules);
        let request = deployment_request();
        assert_eq!(excluder.should_skip(&request), expected_index.is_some());
        assert_eq!(
            excluder.matching_rule(&request).map(|(index, _)| index),
            expected_index
        );
    }

    #[test]
    fn test_empty_excluder_never_skips() {
        let excluder = CriticalPathExcluder::default();
        assert!(excluder.rules().is_empty());
        assert!(!excluder.should_skip(&deployment_request()));
    }

    #[test]
    fn test_load_defaults() {
        let excluder = CriticalPathExcluder::load(&ConfigLoader::new(RuleSource::Defaults));
        assert_eq!(
            excluder.rules(),
            excluder_from(default_rules()).rules()
        );
    }

    #[test]
    fn test_cell_constructs_once_across_threads() {
        let log = Arc::new(EventLog::new());
        let cell = Arc::new(ExcluderCell::new(
            ConfigLoader::new(RuleSource::Defaults).with_sink(log.clone()),
        ));
        assert!(!cell.is_initialized());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    let request = RequestAttributes::namespaced(
                        "",
                        "v1",
                        "Endpoints",
                        "endpoints",
                        "kube-system",
                        "kube-scheduler",
                        Operation::Update,
                    );
                    assert!(cell.should_skip(&request));
                    Arc::as_ptr(&cell.get().rules) as *const u8 as usize
                })
            })
            .collect();

        let pointers: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(pointers.windows(2).all(|w| w[0] == w[1]));
        assert!(cell.is_initialized());

        let loads = log
            .events()
            .into_iter()
            .filter(|e| matches!(e, ExclusionEvent::RulesLoaded(_)))
            .count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn test_cell_reinitialize_with_new_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"apiGroup": "apps", "apiVersion": "v1", "kind": "Deployment",
                 "namespace": "ns", "name": ["testName"], "scope": "Namespaced"}]"#,
        )
        .unwrap();

        let mut cell = ExcluderCell::new(ConfigLoader::new(RuleSource::Defaults));
        assert!(!cell.should_skip(&deployment_request()));

        let excluder = cell.reinitialize_with(ConfigLoader::new(RuleSource::File(path)));
        assert_eq!(excluder.rules().len(), 1);
        assert!(cell.should_skip(&deployment_request()));
    }

    #[test]
    fn test_dispatcher_holds_trait_object() {
        let exclusion: Arc<dyn WebhookExclusion> =
            Arc::new(excluder_from(vec![deployment_rule("testName")]));
        assert!(exclusion.should_skip(&deployment_request()));
    }
}

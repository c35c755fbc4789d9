use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use utoipa::PartialSchema;

use crate::error::ExclusionError;
use crate::events::{ExclusionEventSink, LoadStats, noop_sink};
use crate::types::{RawExclusionRule, ScopeType};

/// Environment variable naming the exclusion rules file.
pub const EXCLUSION_RULES_FILE_ENV: &str = "EKS_PATCH_EXCLUSION_RULES_FILE";

const CONTROL_PLANE_COMPONENTS: &[&str] = &["kube-controller-manager", "kube-scheduler"];

/// The rules used when no file is configured or the file is unusable: the
/// leader election Lease and Endpoints of the controller manager and the
/// scheduler in `kube-system`.
pub fn default_rules() -> Vec<RawExclusionRule> {
    vec![
        RawExclusionRule::new(
            "coordination.k8s.io",
            "v1",
            "Lease",
            "kube-system",
            CONTROL_PLANE_COMPONENTS,
            Some(ScopeType::Namespaced),
        ),
        RawExclusionRule::new(
            "",
            "v1",
            "Endpoints",
            "kube-system",
            CONTROL_PLANE_COMPONENTS,
            Some(ScopeType::Namespaced),
        ),
    ]
}

/// Parse the contents of a rule file: a JSON array of rule objects.
///
/// Example:
/// ```rust
/// use critical_path_excluder::parse_rules;
/// let rules = parse_rules(r#"[{"apiGroup": "apps", "kind": "Deployment"}]"#).unwrap();
/// assert_eq!(rules[0].kind, "Deployment");
/// ```
pub fn parse_rules(text: &str) -> Result<Vec<RawExclusionRule>, ExclusionError> {
    Ok(serde_json::from_str(text)?)
}

/// Read and parse a rule file.
pub fn read_rules_file(path: &Path) -> Result<Vec<RawExclusionRule>, ExclusionError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|e| ExclusionError::ConfigRead {
        path: display.clone(),
        message: e.to_string(),
    })?;
    parse_rules(&text).map_err(|e| match e {
        ExclusionError::ConfigParse { message, .. } => ExclusionError::ConfigParse {
            path: display,
            message,
        },
        other => other,
    })
}

/// JSON schema of a single rule file entry.
pub fn rules_file_schema() -> serde_json::Value {
    serde_json::to_value(RawExclusionRule::schema()).unwrap_or_default()
}

/// Where exclusion rules should be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Defaults,
    File(PathBuf),
}

impl RuleSource {
    /// Resolve the source from [`EXCLUSION_RULES_FILE_ENV`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    /// Resolve the source through `lookup`, which plays the role of the
    /// process environment. Any value, even an empty one, designates a file.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(EXCLUSION_RULES_FILE_ENV) {
            Some(path) => RuleSource::File(PathBuf::from(path)),
            None => RuleSource::Defaults,
        }
    }
}

/// Where the loaded raw rules actually came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RuleOrigin {
    /// No file was configured.
    Defaults,
    /// The configured file was read and parsed.
    File(PathBuf),
    /// The configured file was unusable and the defaults were substituted.
    Fallback(PathBuf),
}

impl Display for RuleOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RuleOrigin::Defaults => write!(f, "defaults"),
            RuleOrigin::File(path) => write!(f, "file {}", path.display()),
            RuleOrigin::Fallback(path) => write!(f, "defaults (fallback from {})", path.display()),
        }
    }
}

/// Raw rules plus their origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRules {
    pub rules: Vec<RawExclusionRule>,
    pub origin: RuleOrigin,
}

/// Produces the raw, unvalidated rule sequence. Never fails.
#[derive(Clone)]
pub struct ConfigLoader {
    source: RuleSource,
    sink: Arc<dyn ExclusionEventSink>,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConfigLoader")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ConfigLoader {
    pub fn new(source: RuleSource) -> Self {
        Self {
            source,
            sink: noop_sink(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(RuleSource::from_env())
    }

    /// Route load and validation diagnostics to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ExclusionEventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    pub fn sink(&self) -> &Arc<dyn ExclusionEventSink> {
        &self.sink
    }

    /// Read the configured rules. A read or parse failure is logged and the
    /// defaults are returned instead.
    pub fn load(&self) -> LoadedRules {
        let loaded = match &self.source {
            RuleSource::Defaults => {
                info!(
                    event = "ExclusionRules",
                    phase = "Load",
                    env = EXCLUSION_RULES_FILE_ENV,
                    "no rules file configured, using default exclusion rules"
                );
                LoadedRules {
                    rules: default_rules(),
                    origin: RuleOrigin::Defaults,
                }
            }
            RuleSource::File(path) => match read_rules_file(path) {
                Ok(rules) => {
                    info!(
                        event = "ExclusionRules",
                        phase = "Load",
                        path = %path.display(),
                        count = rules.len(),
                        "loaded exclusion rules from file"
                    );
                    LoadedRules {
                        rules,
                        origin: RuleOrigin::File(path.clone()),
                    }
                }
                Err(err) => {
                    error!(
                        event = "ExclusionRules",
                        phase = "Load",
                        path = %path.display(),
                        error = %err,
                        "falling back to default exclusion rules"
                    );
                    self.sink.on_config_fallback(&err);
                    LoadedRules {
                        rules: default_rules(),
                        origin: RuleOrigin::Fallback(path.clone()),
                    }
                }
            },
        };

        self.sink.on_rules_loaded(&LoadStats {
            origin: loaded.origin.clone(),
            rule_count: loaded.rules.len(),
        });
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventLog, ExclusionEvent};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn rules_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_rules_protect_leader_election() {
        let rules = default_rules();
        assert_eq!(rules.len(), 2);
        for rule in &rules {
            assert_eq!(rule.namespace, "kube-system");
            assert_eq!(rule.name, vec!["kube-controller-manager", "kube-scheduler"]);
            assert_eq!(rule.scope.as_deref(), Some("Namespaced"));
        }
        assert_eq!(
            (rules[0].api_group.as_str(), rules[0].kind.as_str()),
            ("coordination.k8s.io", "Lease")
        );
        assert_eq!(
            (rules[1].api_group.as_str(), rules[1].kind.as_str()),
            ("", "Endpoints")
        );
    }

    #[test]
    fn test_source_from_lookup() {
        assert_eq!(RuleSource::from_lookup(|_| None), RuleSource::Defaults);
        assert_eq!(
            RuleSource::from_lookup(|key| {
                (key == EXCLUSION_RULES_FILE_ENV).then(|| "/etc/rules.json".to_string())
            }),
            RuleSource::File(PathBuf::from("/etc/rules.json"))
        );
    }

    #[test]
    fn test_load_defaults_when_unconfigured() {
        let log = Arc::new(EventLog::new());
        let loaded = ConfigLoader::new(RuleSource::Defaults)
            .with_sink(log.clone())
            .load();

        assert_eq!(loaded.rules, default_rules());
        assert_eq!(loaded.origin, RuleOrigin::Defaults);
        assert_eq!(
            log.events(),
            vec![ExclusionEvent::RulesLoaded(LoadStats {
                origin: RuleOrigin::Defaults,
                rule_count: 2,
            })]
        );
    }

    #[test]
    fn test_load_file_verbatim() {
        let file = rules_file(
            r#"[
                {"apiGroup": "apps", "apiVersion": "v1", "kind": "Deployment",
                 "namespace": "default", "name": ["my-deploy"], "scope": "Namespaced"},
                {"kind": "Lease", "scope": "All"}
            ]"#,
        );
        let loaded = ConfigLoader::new(RuleSource::File(file.path().to_path_buf())).load();

        assert_eq!(loaded.origin, RuleOrigin::File(file.path().to_path_buf()));
        assert_eq!(loaded.rules.len(), 2);
        assert_eq!(loaded.rules[0].name, vec!["my-deploy"]);
        assert_eq!(loaded.rules[1].scope.as_deref(), Some("All"));
    }

    #[test]
    fn test_load_empty_array_is_empty() {
        let file = rules_file("[]");
        let loaded = ConfigLoader::new(RuleSource::File(file.path().to_path_buf())).load();
        assert!(loaded.rules.is_empty());
        assert!(matches!(loaded.origin, RuleOrigin::File(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let log = Arc::new(EventLog::new());
        let loaded = ConfigLoader::new(RuleSource::File(path.clone()))
            .with_sink(log.clone())
            .load();

        assert_eq!(loaded.rules, default_rules());
        assert_eq!(loaded.origin, RuleOrigin::Fallback(path));
        let events = log.events();
        assert!(matches!(
            events[0],
            ExclusionEvent::ConfigFallback {
                error: ExclusionError::ConfigRead { .. }
            }
        ));
        assert!(matches!(events[1], ExclusionEvent::RulesLoaded(_)));
    }

    #[yare::parameterized(
        not_json = { "this is not json" },
        object_not_array = { r#"{"kind": "Lease"}"# },
        null = { "null" },
        wrong_field_type = { r#"[{"name": "kube-scheduler"}]"# },
        truncated = { r#"[{"kind": "Lease""# },
    )]
    fn test_unparsable_file_falls_back(contents: &str) {
        let file = rules_file(contents);
        let log = Arc::new(EventLog::new());
        let loaded = ConfigLoader::new(RuleSource::File(file.path().to_path_buf()))
            .with_sink(log.clone())
            .load();

        assert_eq!(loaded.rules, default_rules());
        assert!(matches!(loaded.origin, RuleOrigin::Fallback(_)));
        match &log.events()[0] {
            ExclusionEvent::ConfigFallback {
                error: ExclusionError::ConfigParse { path, .. },
            } => assert_eq!(path, &file.path().display().to_string()),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_rules_file_schema_lists_fields() {
        let schema = rules_file_schema();
        let properties = schema["properties"].as_object().unwrap();
        for field in ["apiGroup", "apiVersion", "kind", "namespace", "name", "scope"] {
            assert!(properties.contains_key(field), "missing {field}");
        }
    }
}

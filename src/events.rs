//! Diagnostics emitted while loading and validating exclusion rules.
//!
//! Everything reported here is also written to the `tracing` log. The sink
//! exists so callers can observe the same events without capturing global
//! log output: pass an implementation of [`ExclusionEventSink`] to the
//! [`ConfigLoader`](crate::ConfigLoader), or use [`EventLog`] to collect them.
//!
//! ```rust
//! use std::sync::Arc;
//! use critical_path_excluder::{ConfigLoader, CriticalPathExcluder, EventLog, RuleSource};
//!
//! let events = Arc::new(EventLog::default());
//! let loader = ConfigLoader::new(RuleSource::Defaults).with_sink(events.clone());
//! let excluder = CriticalPathExcluder::load(&loader);
//!
//! assert_eq!(excluder.rules().len(), 2);
//! assert_eq!(events.events().len(), 1);
//! ```

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::error::{ExclusionError, RuleRejection};
use crate::loader::RuleOrigin;

/// Outcome of reading the rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Where the raw rules came from.
    pub origin: RuleOrigin,
    /// Number of raw rules before validation.
    pub rule_count: usize,
}

/// Receives loader and validator diagnostics.
///
/// Called synchronously during construction of the excluder, never on the
/// `should_skip` path. Implementations must be thread-safe since a shared
/// loader may be used from several threads.
pub trait ExclusionEventSink: Send + Sync {
    /// Raw rules were produced, from a file or from the defaults.
    fn on_rules_loaded(&self, stats: &LoadStats);

    /// The configured rule file could not be read or parsed; defaults follow.
    fn on_config_fallback(&self, error: &ExclusionError);

    /// A single rule was dropped by validation.
    fn on_rule_rejected(&self, index: usize, reason: &RuleRejection);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl ExclusionEventSink for NoOpSink {
    fn on_rules_loaded(&self, _stats: &LoadStats) {}
    fn on_config_fallback(&self, _error: &ExclusionError) {}
    fn on_rule_rejected(&self, _index: usize, _reason: &RuleRejection) {}
}

pub(crate) fn noop_sink() -> Arc<dyn ExclusionEventSink> {
    Arc::new(NoOpSink)
}

/// A recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum ExclusionEvent {
    RulesLoaded(LoadStats),
    ConfigFallback { error: ExclusionError },
    RuleRejected { index: usize, reason: RuleRejection },
}

/// Sink that keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ExclusionEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ExclusionEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn rejections(&self) -> Vec<(usize, RuleRejection)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ExclusionEvent::RuleRejected { index, reason } => Some((index, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn push(&self, event: ExclusionEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl ExclusionEventSink for EventLog {
    fn on_rules_loaded(&self, stats: &LoadStats) {
        self.push(ExclusionEvent::RulesLoaded(stats.clone()));
    }

    fn on_config_fallback(&self, error: &ExclusionError) {
        self.push(ExclusionEvent::ConfigFallback {
            error: error.clone(),
        });
    }

    fn on_rule_rejected(&self, index: usize, reason: &RuleRejection) {
        self.push(ExclusionEvent::RuleRejected {
            index,
            reason: reason.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_json_snapshot;

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        log.on_rule_rejected(1, &RuleRejection::ScopeNotSet);
        log.on_rules_loaded(&LoadStats {
            origin: RuleOrigin::Defaults,
            rule_count: 2,
        });
        log.on_rule_rejected(4, &RuleRejection::AllScopes);

        assert_eq!(log.events().len(), 3);
        assert_eq!(
            log.rejections(),
            vec![(1, RuleRejection::ScopeNotSet), (4, RuleRejection::AllScopes)]
        );

        log.clear();
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = ExclusionEvent::RuleRejected {
            index: 0,
            reason: RuleRejection::NameWildcardNotAllowed,
        };
        assert_json_snapshot!(event, @r###"
        {
          "event": "RuleRejected",
          "index": 0,
          "reason": "NameWildcardNotAllowed"
        }
        "###);
    }

    #[test]
    fn test_noop_sink_accepts_everything() {
        let sink = NoOpSink;
        sink.on_config_fallback(&ExclusionError::ConfigRead {
            path: "/missing".to_string(),
            message: "not found".to_string(),
        });
        sink.on_rule_rejected(0, &RuleRejection::ScopeNotSet);
    }
}

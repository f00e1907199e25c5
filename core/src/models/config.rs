//! Analysis configuration.
//!
//! The core never reads configuration files; hosts hand in a structured
//! record which is deep-merged over the built-in defaults. Unknown fields
//! are ignored, unknown rule ids are skipped later by the rule factory.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AnalyzeError;
use super::finding::Severity;

/// Logging verbosity requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    #[default]
    Info,
    Warn,
    Debug,
}

/// Per-rule configuration. Extra keys are preserved so custom rules can
/// read their own options from the bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(flatten)]
    pub extra: FxHashMap<String, Value>,
}

fn default_true() -> bool {
    true
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: Severity::Warning,
            threshold: None,
            metric: None,
            extra: FxHashMap::default(),
        }
    }
}

impl RuleConfig {
    pub fn threshold_rule(metric: &str, threshold: f64, severity: Severity) -> Self {
        Self {
            enabled: true,
            severity,
            threshold: Some(threshold),
            metric: Some(metric.to_string()),
            extra: FxHashMap::default(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Settings consumed by the incremental path. `debounce_seconds` belongs to
/// the external watcher; the core carries it so one record configures both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncrementalConfig {
    pub enabled: bool,
    pub debounce_seconds: f64,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_seconds: 2.0,
        }
    }
}

/// Top-level analysis configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Glob patterns selecting files to analyze, relative to the project root.
    pub analyze_paths: Vec<String>,
    /// Glob patterns removed from the selection.
    pub exclude_paths: Vec<String>,
    /// Rule id -> rule options.
    pub rules: FxHashMap<String, RuleConfig>,
    pub incremental: IncrementalConfig,
    pub log_level: Option<LogLevel>,
    /// Legacy alias: `debugMode: true` means `logLevel: debug` when
    /// `logLevel` is unset.
    pub debug_mode: Option<bool>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let mut rules = FxHashMap::default();
        rules.insert(
            "function.complexity".to_string(),
            RuleConfig::threshold_rule("cyclomaticComplexity", 10.0, Severity::Warning),
        );
        rules.insert(
            "function.cognitive".to_string(),
            RuleConfig::threshold_rule("cognitiveComplexity", 15.0, Severity::Warning),
        );
        rules.insert(
            "file.lines".to_string(),
            RuleConfig::threshold_rule("linesOfCode", 500.0, Severity::Info).disabled(),
        );
        rules.insert(
            "module.circularDependency".to_string(),
            RuleConfig {
                severity: Severity::Error,
                ..RuleConfig::default()
            },
        );
        rules.insert(
            "syntax.error".to_string(),
            RuleConfig {
                severity: Severity::Error,
                threshold: Some(0.1),
                metric: Some("syntaxErrorRatio".to_string()),
                ..RuleConfig::default()
            },
        );

        Self {
            analyze_paths: vec![
                "**/*.ts".to_string(),
                "**/*.tsx".to_string(),
                "**/*.js".to_string(),
                "**/*.jsx".to_string(),
                "**/*.py".to_string(),
            ],
            exclude_paths: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/.git/**".to_string(),
            ],
            rules,
            incremental: IncrementalConfig::default(),
            log_level: None,
            debug_mode: None,
        }
    }
}

impl AnalysisConfig {
    /// Deep-merge a partial configuration record over the defaults.
    ///
    /// Objects merge key-by-key (so a host can override one rule's threshold
    /// without restating the rule set); every other value replaces.
    pub fn from_partial(partial: Value) -> Result<Self, AnalyzeError> {
        let mut base = serde_json::to_value(AnalysisConfig::default())?;
        deep_merge(&mut base, partial);
        serde_json::from_value(base).map_err(|e| AnalyzeError::Config {
            message: e.to_string(),
        })
    }

    /// The level logging should honor, resolving the `debugMode` alias.
    pub fn effective_log_level(&self) -> LogLevel {
        match self.log_level {
            Some(level) => level,
            None if self.debug_mode == Some(true) => LogLevel::Debug,
            None => LogLevel::Info,
        }
    }

    pub fn rule(&self, id: &str) -> Option<&RuleConfig> {
        self.rules.get(id)
    }
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

//! Rule engine: configuration-driven checks over file results and over the
//! whole project.
//!
//! A rule is any object with an id, a level, and the matching evaluate
//! method. The factory turns `(ruleId, RuleConfig)` pairs into instances;
//! ids it does not recognize are logged and skipped so stale configuration
//! entries cannot break an analysis.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::warn;

use crate::models::config::{AnalysisConfig, RuleConfig};
use crate::models::finding::{Finding, FindingKind, Severity, SourceLocation};
use crate::models::graph::DependencyGraph;
use crate::models::result::FileAnalysisResult;
use crate::services::graph_builder::build_graph;

/// Rule id reserved for the parser stage; the factory never instantiates it.
pub const SYNTAX_ERROR_RULE: &str = "syntax.error";

const CIRCULAR_DEPENDENCY_RULE: &str = "module.circularDependency";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLevel {
    File,
    Project,
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn level(&self) -> RuleLevel;

    fn evaluate_file(&self, _file: &FileAnalysisResult) -> Result<Vec<Finding>> {
        Ok(Vec::new())
    }

    fn evaluate_project(
        &self,
        _files: &[Arc<FileAnalysisResult>],
        _graph: Option<&DependencyGraph>,
    ) -> Result<Vec<Finding>> {
        Ok(Vec::new())
    }
}

/// Fires when a named file metric strictly exceeds its threshold.
pub struct MetricThresholdRule {
    id: String,
    metric: String,
    threshold: f64,
    severity: Severity,
}

impl Rule for MetricThresholdRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn level(&self) -> RuleLevel {
        RuleLevel::File
    }

    fn evaluate_file(&self, file: &FileAnalysisResult) -> Result<Vec<Finding>> {
        let Some(value) = file.metric(&self.metric) else {
            return Ok(Vec::new());
        };
        if value <= self.threshold {
            return Ok(Vec::new());
        }

        let finding = Finding::new(
            format!("{}.exceeded", self.id),
            FindingKind::Metric,
            format!(
                "{} is {value}, above the allowed {}",
                self.metric, self.threshold
            ),
            self.severity,
            SourceLocation::whole_file(),
        )
        .with_detail("metricName", self.metric.clone())
        .with_detail("value", value)
        .with_detail("threshold", self.threshold)
        .with_detail("filePath", file.file_path.clone());

        Ok(vec![finding])
    }
}

/// Reports one finding per dependency cycle in the project graph.
pub struct CircularDependencyRule {
    severity: Severity,
}

impl Rule for CircularDependencyRule {
    fn id(&self) -> &str {
        CIRCULAR_DEPENDENCY_RULE
    }

    fn level(&self) -> RuleLevel {
        RuleLevel::Project
    }

    fn evaluate_project(
        &self,
        files: &[Arc<FileAnalysisResult>],
        graph: Option<&DependencyGraph>,
    ) -> Result<Vec<Finding>> {
        // reconstruct from raw dependency lists when the caller has no graph
        let rebuilt;
        let graph = match graph {
            Some(graph) => graph,
            None => {
                rebuilt = build_graph(files);
                &rebuilt
            }
        };

        let findings = graph
            .circular_dependencies()
            .into_iter()
            .map(|cycle| {
                Finding::new(
                    CIRCULAR_DEPENDENCY_RULE,
                    FindingKind::Architecture,
                    format!("found cycle: {}", cycle.join(" -> ")),
                    self.severity,
                    SourceLocation::whole_file(),
                )
                .with_detail("filePath", cycle[0].clone())
                .with_detail("cycle", json!(cycle))
            })
            .collect();

        Ok(findings)
    }
}

/// Build a rule from its configuration entry, or `None` when the entry is
/// disabled or reserved.
pub fn build_rule(id: &str, config: &RuleConfig) -> Option<Box<dyn Rule>> {
    if !config.enabled {
        return None;
    }
    if id == SYNTAX_ERROR_RULE {
        // consumed by the per-file pipeline, not a dispatchable rule
        return None;
    }
    if let (Some(metric), Some(threshold)) = (config.metric.as_ref(), config.threshold) {
        return Some(Box::new(MetricThresholdRule {
            id: id.to_string(),
            metric: metric.clone(),
            threshold,
            severity: config.severity,
        }));
    }
    if id == CIRCULAR_DEPENDENCY_RULE {
        return Some(Box::new(CircularDependencyRule {
            severity: config.severity,
        }));
    }

    warn!("unknown rule type: {id}");
    None
}

/// Holds the instantiated rules and dispatches them in registration order.
pub struct RuleEngine {
    file_rules: Vec<Box<dyn Rule>>,
    project_rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let mut ids: Vec<&String> = config.rules.keys().collect();
        ids.sort();

        let mut file_rules = Vec::new();
        let mut project_rules = Vec::new();
        for id in ids {
            if let Some(rule) = build_rule(id, &config.rules[id]) {
                match rule.level() {
                    RuleLevel::File => file_rules.push(rule),
                    RuleLevel::Project => project_rules.push(rule),
                }
            }
        }

        Self {
            file_rules,
            project_rules,
        }
    }

    /// Run every file-level rule; a failing rule is logged and skipped.
    pub fn evaluate_file(&self, file: &FileAnalysisResult) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.file_rules {
            match rule.evaluate_file(file) {
                Ok(mut emitted) => findings.append(&mut emitted),
                Err(err) => warn!("rule {} failed on {}: {err}", rule.id(), file.file_path),
            }
        }
        findings
    }

    /// Run every project-level rule over the full result set.
    pub fn evaluate_project(
        &self,
        files: &[Arc<FileAnalysisResult>],
        graph: Option<&DependencyGraph>,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.project_rules {
            match rule.evaluate_project(files, graph) {
                Ok(mut emitted) => findings.append(&mut emitted),
                Err(err) => warn!("rule {} failed: {err}", rule.id()),
            }
        }
        findings
    }

    pub fn file_rule_count(&self) -> usize {
        self.file_rules.len()
    }

    pub fn project_rule_count(&self) -> usize {
        self.project_rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::unified::Language;
    use std::collections::BTreeMap;

    fn file_with_metric(path: &str, metric: &str, value: f64) -> FileAnalysisResult {
        let mut metrics = BTreeMap::new();
        metrics.insert(metric.to_string(), value);
        FileAnalysisResult {
            file_path: path.to_string(),
            language: Language::TypeScript,
            metrics,
            findings: vec![],
            dependencies: vec![],
        }
    }

    fn threshold_rule(id: &str, metric: &str, threshold: f64) -> Box<dyn Rule> {
        build_rule(
            id,
            &RuleConfig::threshold_rule(metric, threshold, Severity::Warning),
        )
        .unwrap()
    }

    #[test]
    fn threshold_rule_fires_only_above_threshold() {
        let rule = threshold_rule("function.complexity", "cyclomaticComplexity", 10.0);

        let below = file_with_metric("a.ts", "cyclomaticComplexity", 10.0);
        assert!(rule.evaluate_file(&below).unwrap().is_empty());

        let above = file_with_metric("a.ts", "cyclomaticComplexity", 15.0);
        let findings = rule.evaluate_file(&above).unwrap();
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.id, "function.complexity.exceeded");
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.details["metricName"], "cyclomaticComplexity");
        assert_eq!(finding.details["value"], 15.0);
        assert_eq!(finding.details["threshold"], 10.0);
        assert_eq!(finding.details["filePath"], "a.ts");
    }

    #[test]
    fn missing_metric_never_fires() {
        let rule = threshold_rule("function.complexity", "cyclomaticComplexity", 10.0);
        let file = file_with_metric("a.ts", "linesOfCode", 1000.0);
        assert!(rule.evaluate_file(&file).unwrap().is_empty());
    }

    #[test]
    fn disabled_rule_builds_nothing() {
        let config = RuleConfig::threshold_rule("cyclomaticComplexity", 10.0, Severity::Warning)
            .disabled();
        assert!(build_rule("function.complexity", &config).is_none());
    }

    #[test]
    fn unknown_rule_is_skipped() {
        assert!(build_rule("made.up.rule", &RuleConfig::default()).is_none());
    }

    #[test]
    fn circular_rule_rebuilds_graph_from_raw_dependencies() {
        let a = Arc::new(FileAnalysisResult {
            file_path: "/p/a.ts".to_string(),
            language: Language::TypeScript,
            metrics: BTreeMap::new(),
            findings: vec![],
            dependencies: vec!["./b".to_string()],
        });
        let b = Arc::new(FileAnalysisResult {
            file_path: "/p/b.ts".to_string(),
            language: Language::TypeScript,
            metrics: BTreeMap::new(),
            findings: vec![],
            dependencies: vec!["./a".to_string()],
        });

        let rule = build_rule(
            CIRCULAR_DEPENDENCY_RULE,
            &RuleConfig {
                severity: Severity::Error,
                ..RuleConfig::default()
            },
        )
        .unwrap();

        let findings = rule.evaluate_project(&[a, b], None).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].id, CIRCULAR_DEPENDENCY_RULE);
        assert_eq!(
            findings[0].message,
            "found cycle: /p/a.ts -> /p/b.ts -> /p/a.ts"
        );
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn engine_registers_default_rules_by_level() {
        let engine = RuleEngine::from_config(&AnalysisConfig::default());
        // function.complexity + function.cognitive (file.lines is disabled)
        assert_eq!(engine.file_rule_count(), 2);
        assert_eq!(engine.project_rule_count(), 1);
    }

    #[test]
    fn engine_accumulates_file_findings_in_order() {
        let mut config = AnalysisConfig::default();
        config.rules.insert(
            "file.lines".to_string(),
            RuleConfig::threshold_rule("linesOfCode", 1.0, Severity::Info),
        );
        let engine = RuleEngine::from_config(&config);

        let mut file = file_with_metric("a.ts", "cyclomaticComplexity", 99.0);
        file.metrics.insert("linesOfCode".to_string(), 10.0);
        let findings = engine.evaluate_file(&file);
        let ids: Vec<&str> = findings.iter().map(|f| f.id.as_str()).collect();
        // registration order is sorted rule id order
        assert_eq!(ids, vec!["file.lines.exceeded", "function.complexity.exceeded"]);
    }
}

//! Analysis result snapshots.
//!
//! Snapshots are immutable once returned. The incremental path shares
//! retained `FileAnalysisResult` values by `Arc` identity so consumers can
//! detect unchanged entries with `Arc::ptr_eq`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::finding::Finding;
use super::graph::DependencyGraph;
use super::unified::Language;

/// Canonical metric keys stored in `FileAnalysisResult::metrics`.
pub mod metric {
    pub const CYCLOMATIC_COMPLEXITY: &str = "cyclomaticComplexity";
    pub const COGNITIVE_COMPLEXITY: &str = "cognitiveComplexity";
    pub const MAINTAINABILITY_INDEX: &str = "maintainabilityIndex";
    pub const LINES_OF_CODE: &str = "linesOfCode";
    pub const HALSTEAD_VOLUME: &str = "halsteadVolume";
    pub const SYNTAX_ERROR_RATIO: &str = "syntaxErrorRatio";
    pub const FUNCTION_COUNT: &str = "functionCount";
    pub const CLASS_COUNT: &str = "classCount";
}

/// Everything the pipeline derived from a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysisResult {
    pub file_path: String,
    pub language: Language,
    /// Metric name -> value; `BTreeMap` keeps serialization deterministic.
    pub metrics: BTreeMap<String, f64>,
    pub findings: Vec<Finding>,
    /// Raw import specifiers exactly as written in the source.
    pub dependencies: Vec<String>,
}

impl FileAnalysisResult {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Stable key over path and derived content for consumers that track
    /// unchanged entries across snapshots without holding the `Arc`.
    pub fn cache_key(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.file_path.hash(&mut hasher);
        for (name, value) in &self.metrics {
            name.hash(&mut hasher);
            value.to_bits().hash(&mut hasher);
        }
        for dependency in &self.dependencies {
            dependency.hash(&mut hasher);
        }
        format!("fa:{:x}", hasher.finish())
    }
}

/// Afferent/efferent coupling and the derived stability score of one module.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityMetric {
    /// Afferent coupling: number of modules depending on this one.
    pub ca: usize,
    /// Efferent coupling: number of modules this one depends on.
    pub ce: usize,
    /// `ce / (ca + ce)`; `0` means maximally stable.
    pub stability: f64,
}

/// Aggregate statistics over a snapshot. Medians and percentiles, never
/// averages, so a single pathological file cannot hide in the mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub total_findings: usize,
    pub median_cyclomatic: f64,
    pub median_cognitive: f64,
    pub p90_cyclomatic: f64,
    pub p90_cognitive: f64,
    pub max_cyclomatic: f64,
    pub max_cognitive: f64,
    /// Up to ten files with the highest change-impact risk, descending.
    pub risk_hotspots: Vec<RiskHotspot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskHotspot {
    pub file_path: String,
    pub risk: f64,
}

impl AnalysisSummary {
    pub fn compute(
        files: &[Arc<FileAnalysisResult>],
        findings: &[Finding],
        risk_scores: &BTreeMap<String, f64>,
    ) -> Self {
        let mut cyclomatic: Vec<f64> = files
            .iter()
            .filter_map(|f| f.metric(metric::CYCLOMATIC_COMPLEXITY))
            .collect();
        let mut cognitive: Vec<f64> = files
            .iter()
            .filter_map(|f| f.metric(metric::COGNITIVE_COMPLEXITY))
            .collect();
        cyclomatic.sort_by(|a, b| a.total_cmp(b));
        cognitive.sort_by(|a, b| a.total_cmp(b));

        let mut hotspots: Vec<RiskHotspot> = risk_scores
            .iter()
            .filter(|(_, risk)| **risk > 0.0)
            .map(|(path, risk)| RiskHotspot {
                file_path: path.clone(),
                risk: *risk,
            })
            .collect();
        hotspots.sort_by(|a, b| b.risk.total_cmp(&a.risk).then(a.file_path.cmp(&b.file_path)));
        hotspots.truncate(10);

        Self {
            total_files: files.len(),
            total_findings: findings.len(),
            median_cyclomatic: median(&cyclomatic),
            median_cognitive: median(&cognitive),
            p90_cyclomatic: percentile_90(&cyclomatic),
            p90_cognitive: percentile_90(&cognitive),
            max_cyclomatic: cyclomatic.last().copied().unwrap_or(0.0),
            max_cognitive: cognitive.last().copied().unwrap_or(0.0),
            risk_hotspots: hotspots,
        }
    }
}

fn median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn percentile_90(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64) * 0.9) as usize;
    sorted.get(index).or(sorted.last()).copied().unwrap_or(0.0)
}

/// One immutable project-wide snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Root the analysis ran against; the incremental path re-analyzes from
    /// here when it has to fall back.
    pub root_path: PathBuf,
    pub files: Vec<Arc<FileAnalysisResult>>,
    /// Per-file findings in file order, then project-rule findings.
    pub findings: Vec<Finding>,
    pub graph: DependencyGraph,
    pub stability: BTreeMap<String, StabilityMetric>,
    pub risk_scores: BTreeMap<String, f64>,
    pub summary: AnalysisSummary,
}

impl AnalysisResult {
    pub fn file(&self, path: &str) -> Option<&Arc<FileAnalysisResult>> {
        self.files.iter().find(|f| f.file_path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::finding::{Finding, FindingKind, Severity, SourceLocation};

    fn file_result(path: &str, cyclomatic: f64, cognitive: f64) -> Arc<FileAnalysisResult> {
        let mut metrics = BTreeMap::new();
        metrics.insert(metric::CYCLOMATIC_COMPLEXITY.to_string(), cyclomatic);
        metrics.insert(metric::COGNITIVE_COMPLEXITY.to_string(), cognitive);
        Arc::new(FileAnalysisResult {
            file_path: path.to_string(),
            language: Language::TypeScript,
            metrics,
            findings: vec![],
            dependencies: vec![],
        })
    }

    #[test]
    fn summary_uses_median_not_average() {
        let files = vec![
            file_result("a.ts", 1.0, 1.0),
            file_result("b.ts", 2.0, 2.0),
            file_result("c.ts", 100.0, 50.0),
        ];
        let summary = AnalysisSummary::compute(&files, &[], &BTreeMap::new());
        assert_eq!(summary.median_cyclomatic, 2.0);
        assert_eq!(summary.max_cyclomatic, 100.0);
        assert_eq!(summary.total_files, 3);
    }

    #[test]
    fn summary_ranks_risk_hotspots_descending() {
        let mut risk = BTreeMap::new();
        risk.insert("a.ts".to_string(), 0.5);
        risk.insert("b.ts".to_string(), 2.5);
        risk.insert("c.ts".to_string(), 0.0);
        let summary = AnalysisSummary::compute(&[], &[], &risk);
        let paths: Vec<&str> = summary
            .risk_hotspots
            .iter()
            .map(|h| h.file_path.as_str())
            .collect();
        assert_eq!(paths, vec!["b.ts", "a.ts"]);
    }

    #[test]
    fn cache_key_tracks_content_changes() {
        let a = file_result("a.ts", 3.0, 4.0);
        let same = file_result("a.ts", 3.0, 4.0);
        let different = file_result("a.ts", 5.0, 4.0);
        let other_path = file_result("b.ts", 3.0, 4.0);

        assert_eq!(a.cache_key(), same.cache_key());
        assert_ne!(a.cache_key(), different.cache_key());
        assert_ne!(a.cache_key(), other_path.cache_key());
    }

    #[test]
    fn summary_counts_findings() {
        let findings = vec![Finding::new(
            "syntax.error",
            FindingKind::SyntaxError,
            "broken",
            Severity::Error,
            SourceLocation::whole_file(),
        )];
        let summary = AnalysisSummary::compute(&[], &findings, &BTreeMap::new());
        assert_eq!(summary.total_findings, 1);
    }
}

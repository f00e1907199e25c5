//! Analysis orchestrator.
//!
//! Drives the full pipeline (discover, parse, measure, extract, grade) and
//! the incremental path that re-analyzes only the 1-hop neighborhood of a
//! change set, retaining every untouched file result by identity.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::models::config::AnalysisConfig;
use crate::models::error::AnalyzeError;
use crate::models::finding::{Finding, FindingKind, SourceLocation};
use crate::models::graph::DependencyGraph;
use crate::models::result::{
    metric, AnalysisResult, AnalysisSummary, FileAnalysisResult,
};
use crate::services::file_discovery::FileDiscovery;
use crate::services::graph_builder::build_graph;
use crate::services::impact::{risk_scores, stability_metrics};
use crate::services::parser::{detect_language, SourceParser};
use crate::services::rules::{RuleEngine, SYNTAX_ERROR_RULE};
use crate::services::{complexity, maintainability, structure};

/// Entry point of the library. Construction is cheap; each analysis
/// invocation owns its parser, so one `Analyzer` may serve concurrent
/// invocations.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: Option<AnalysisConfig>) -> Self {
        Self {
            config: config.unwrap_or_default(),
        }
    }

    /// Construct from a partial configuration record, deep-merged over the
    /// defaults.
    pub fn from_partial(partial: Value) -> Result<Self, AnalyzeError> {
        Ok(Self {
            config: AnalysisConfig::from_partial(partial)?,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one file. Content is read from disk when not supplied.
    pub async fn analyze_file(
        &self,
        path: &Path,
        content: Option<&str>,
    ) -> Result<FileAnalysisResult, AnalyzeError> {
        let mut parser = SourceParser::new();
        let engine = RuleEngine::from_config(&self.config);
        match content {
            Some(content) => self.analyze_source(&mut parser, &engine, path, content),
            None => {
                let content = tokio::fs::read_to_string(path).await?;
                self.analyze_source(&mut parser, &engine, path, &content)
            }
        }
    }

    /// Full project analysis: enumerate, analyze every file, then derive
    /// graph, stability, risk and findings.
    pub async fn analyze_project(
        &self,
        root: &Path,
        extra_excludes: &[String],
    ) -> Result<AnalysisResult, AnalyzeError> {
        let root = root
            .canonicalize()
            .map_err(|_| AnalyzeError::InvalidPath {
                path: root.to_path_buf(),
            })?;

        let mut excludes = self.config.exclude_paths.clone();
        excludes.extend_from_slice(extra_excludes);
        let discovery = FileDiscovery::new(root.clone(), &self.config.analyze_paths, &excludes);
        let paths = discovery.discover()?;
        info!("analyzing {} files under {}", paths.len(), root.display());

        let mut parser = SourceParser::new();
        let engine = RuleEngine::from_config(&self.config);
        let mut files: Vec<Arc<FileAnalysisResult>> = Vec::with_capacity(paths.len());

        for path in paths {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(err) => {
                    warn!("skipping unreadable file {}: {err}", path.display());
                    continue;
                }
            };
            match self.analyze_source(&mut parser, &engine, &path, &content) {
                Ok(result) => files.push(Arc::new(result)),
                Err(err) => warn!("skipping {}: {err}", path.display()),
            }
        }

        Ok(self.finish_snapshot(root, files, &engine))
    }

    /// Incremental analysis: re-analyze the changed paths and their direct
    /// graph neighbors, keep everything else from the prior snapshot by
    /// identity, then recompute the derived state. Any internal failure
    /// falls back to a full re-analysis of the prior root.
    pub async fn analyze_files(
        &self,
        changed: &[PathBuf],
        prev: &AnalysisResult,
    ) -> Result<AnalysisResult, AnalyzeError> {
        match self.try_incremental(changed, prev).await {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("incremental analysis failed: {err}; falling back to full analysis");
                self.analyze_project(&prev.root_path, &[]).await
            }
        }
    }

    /// Build a dependency graph for an arbitrary result set.
    pub fn generate_dependency_graph(
        &self,
        files: &[Arc<FileAnalysisResult>],
    ) -> DependencyGraph {
        build_graph(files)
    }

    async fn try_incremental(
        &self,
        changed: &[PathBuf],
        prev: &AnalysisResult,
    ) -> Result<AnalysisResult, AnalyzeError> {
        let impacted = impacted_set(changed, prev);
        debug!("incremental impacted set: {} files", impacted.len());

        let mut files: Vec<Arc<FileAnalysisResult>> = prev
            .files
            .iter()
            .filter(|file| !impacted.contains(file.file_path.as_str()))
            .cloned()
            .collect();

        let mut parser = SourceParser::new();
        let engine = RuleEngine::from_config(&self.config);

        let mut to_analyze: Vec<&String> = impacted.iter().collect();
        to_analyze.sort();
        for path_str in to_analyze {
            let path = Path::new(path_str);
            if tokio::fs::metadata(path).await.is_err() {
                // deleted since the last snapshot; drop silently
                debug!("impacted file no longer exists: {path_str}");
                continue;
            }
            let content = tokio::fs::read_to_string(path).await?;
            match self.analyze_source(&mut parser, &engine, path, &content) {
                Ok(result) => files.push(Arc::new(result)),
                Err(err) => warn!("skipping {}: {err}", path.display()),
            }
        }

        files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(self.finish_snapshot(prev.root_path.clone(), files, &engine))
    }

    /// Per-file pipeline: parse, check syntax health, compute metrics and
    /// structures, apply file-level rules.
    fn analyze_source(
        &self,
        parser: &mut SourceParser,
        engine: &RuleEngine,
        path: &Path,
        content: &str,
    ) -> Result<FileAnalysisResult, AnalyzeError> {
        let language = detect_language(path);
        let parsed = parser.parse(content, language, Some(path))?;
        let file_path = path.to_string_lossy().into_owned();

        let mut findings: Vec<Finding> = Vec::new();
        let syntax_rule = self.config.rule(SYNTAX_ERROR_RULE);
        let syntax_threshold = syntax_rule.and_then(|r| r.threshold).unwrap_or(0.0);

        if parsed.has_errors {
            if let Some(rule) = syntax_rule.filter(|r| r.enabled) {
                findings.push(
                    Finding::new(
                        SYNTAX_ERROR_RULE,
                        FindingKind::SyntaxError,
                        format!(
                            "syntax errors in {:.1}% of nodes",
                            parsed.error_ratio * 100.0
                        ),
                        rule.severity,
                        SourceLocation::whole_file(),
                    )
                    .with_detail("metricName", metric::SYNTAX_ERROR_RATIO)
                    .with_detail("value", parsed.error_ratio)
                    .with_detail("threshold", syntax_threshold)
                    .with_detail("filePath", file_path.clone()),
                );

                if parsed.error_ratio > syntax_threshold {
                    // too broken to measure; report the syntax finding alone
                    let mut metrics = BTreeMap::new();
                    metrics.insert(metric::SYNTAX_ERROR_RATIO.to_string(), parsed.error_ratio);
                    return Ok(FileAnalysisResult {
                        file_path,
                        language,
                        metrics,
                        findings,
                        dependencies: Vec::new(),
                    });
                }
            }
        }

        let root = parsed.tree.root_node();
        let cyclomatic = complexity::cyclomatic_complexity(root, language) as f64;
        let cognitive = complexity::cognitive_complexity(root, language) as f64;
        let loc = maintainability::logical_lines(content);
        let halstead = maintainability::halstead(content);
        let mi = maintainability::maintainability_index(halstead.volume, cyclomatic, loc);

        let functions = structure::analyze_functions(root, content, language);
        let classes = structure::analyze_classes(root, content, language);
        let dependencies = structure::analyze_module_dependencies(root, content, language);

        let mut metrics = BTreeMap::new();
        metrics.insert(metric::CYCLOMATIC_COMPLEXITY.to_string(), cyclomatic);
        metrics.insert(metric::COGNITIVE_COMPLEXITY.to_string(), cognitive);
        metrics.insert(metric::MAINTAINABILITY_INDEX.to_string(), mi);
        metrics.insert(metric::LINES_OF_CODE.to_string(), loc as f64);
        metrics.insert(metric::HALSTEAD_VOLUME.to_string(), halstead.volume);
        metrics.insert(metric::SYNTAX_ERROR_RATIO.to_string(), parsed.error_ratio);
        metrics.insert(metric::FUNCTION_COUNT.to_string(), functions.len() as f64);
        metrics.insert(metric::CLASS_COUNT.to_string(), classes.len() as f64);

        let mut result = FileAnalysisResult {
            file_path,
            language,
            metrics,
            findings,
            dependencies,
        };
        let rule_findings = engine.evaluate_file(&result);
        result.findings.extend(rule_findings);
        Ok(result)
    }

    /// Derive graph, stability, risk, findings and summary from the final
    /// file list; shared by the full and incremental paths.
    fn finish_snapshot(
        &self,
        root_path: PathBuf,
        files: Vec<Arc<FileAnalysisResult>>,
        engine: &RuleEngine,
    ) -> AnalysisResult {
        let graph = build_graph(&files);
        let stability = stability_metrics(&graph);
        let risk = risk_scores(&graph, &stability);

        let mut findings: Vec<Finding> = files
            .iter()
            .flat_map(|file| file.findings.iter().cloned())
            .collect();
        findings.extend(engine.evaluate_project(&files, Some(&graph)));

        let summary = AnalysisSummary::compute(&files, &findings, &risk);

        AnalysisResult {
            root_path,
            files,
            findings,
            graph,
            stability,
            risk_scores: risk,
            summary,
        }
    }
}

/// Changed paths plus their direct predecessors and successors in the
/// prior graph. Strictly 1-hop; transitive closure is out of contract.
/// Relative change notifications are resolved against the prior root.
fn impacted_set(changed: &[PathBuf], prev: &AnalysisResult) -> FxHashSet<String> {
    let mut impacted = FxHashSet::default();
    for path in changed {
        let absolute = if path.is_absolute() {
            path.clone()
        } else {
            prev.root_path.join(path)
        };
        let key = absolute.to_string_lossy().into_owned();
        if let Some(node) = prev.graph.node(&key) {
            impacted.extend(node.imports.iter().cloned());
            impacted.extend(node.imported_by.iter().cloned());
        }
        impacted.insert(key);
    }
    impacted
}

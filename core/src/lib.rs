//! vigil — static code intelligence core.
//!
//! Parses TypeScript / JavaScript (and Python) sources into concrete syntax
//! trees, derives per-file complexity metrics, extracts structural entities,
//! builds a project-wide module dependency graph and computes architectural
//! health indicators together with rule-based findings. A prior snapshot
//! plus a change set drives incremental re-analysis of only the affected
//! 1-hop neighborhood.
//!
//! The crate is a library boundary only: argument parsing, configuration
//! file loading, report rendering and file watching are host concerns.

pub mod models;
pub mod services;

pub use models::config::{AnalysisConfig, IncrementalConfig, LogLevel, RuleConfig};
pub use models::error::AnalyzeError;
pub use models::finding::{Finding, FindingKind, Severity, SourceLocation};
pub use models::graph::{DependencyGraph, DependencyNode};
pub use models::result::{
    metric, AnalysisResult, AnalysisSummary, FileAnalysisResult, RiskHotspot, StabilityMetric,
};
pub use models::unified::{Language, UnifiedNode, UnifiedNodeKind};
pub use services::analyzer::Analyzer;

//! Finding and severity types shared by every rule and analyzer stage.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A region of source text, 1-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceLocation {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Location covering a whole file when nothing more precise is known.
    pub fn whole_file() -> Self {
        Self::new(1, 1, 1, 1)
    }
}

/// Report severity, ordered from most to least severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Broad categorization of what produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingKind {
    Metric,
    RuleViolation,
    CodeSmell,
    Architecture,
    SyntaxError,
}

/// A single observation: a metric exceedance, a dependency cycle, a syntax
/// error. The `details` bag carries rule-specific attributes; threshold rules
/// always populate `metricName`, `value`, `threshold` and `filePath`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Dotted identity, e.g. `complexity.cyclomatic.high`.
    pub id: String,
    pub kind: FindingKind,
    pub message: String,
    pub severity: Severity,
    pub location: SourceLocation,
    #[serde(default)]
    pub details: FxHashMap<String, Value>,
}

impl Finding {
    pub fn new(
        id: impl Into<String>,
        kind: FindingKind,
        message: impl Into<String>,
        severity: Severity,
        location: SourceLocation,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            message: message.into(),
            severity,
            location,
            details: FxHashMap::default(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_most_severe_first() {
        let mut severities = vec![Severity::Info, Severity::Error, Severity::Warning];
        severities.sort();
        assert_eq!(
            severities,
            vec![Severity::Error, Severity::Warning, Severity::Info]
        );
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
        let parsed: Severity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, Severity::Error);
    }

    #[test]
    fn finding_builder_accumulates_details() {
        let finding = Finding::new(
            "function.complexity.exceeded",
            FindingKind::Metric,
            "cyclomaticComplexity 15 exceeds threshold 10",
            Severity::Warning,
            SourceLocation::whole_file(),
        )
        .with_detail("metricName", "cyclomaticComplexity")
        .with_detail("value", 15.0)
        .with_detail("threshold", 10.0);

        assert_eq!(finding.details["metricName"], "cyclomaticComplexity");
        assert_eq!(finding.details["value"], 15.0);
    }
}

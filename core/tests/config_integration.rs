//! Configuration behavior exercised through full analyses.

use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;
use vigil::{Analyzer, LogLevel, Severity};

fn project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

fn branchy_source() -> String {
    let mut body = String::from("export function busy(n: number) {\n  let out = 0;\n");
    for i in 0..14 {
        body.push_str(&format!("  if (n > {i}) {{ out += {i}; }}\n"));
    }
    body.push_str("  return out;\n}\n");
    body
}

#[tokio::test]
async fn disabling_a_rule_suppresses_its_findings() {
    let (_dir, root) = project(&[("busy.ts", &branchy_source())]);
    let analyzer = Analyzer::from_partial(json!({
        "rules": {
            "function.complexity": { "enabled": false },
            "function.cognitive": { "enabled": false }
        }
    }))
    .unwrap();
    let result = analyzer.analyze_project(&root, &[]).await.unwrap();
    assert!(result.findings.is_empty());
}

#[tokio::test]
async fn severity_override_propagates_to_findings() {
    let (_dir, root) = project(&[("busy.ts", &branchy_source())]);
    let analyzer = Analyzer::from_partial(json!({
        "rules": {
            "function.complexity": { "severity": "error" },
            "function.cognitive": { "enabled": false }
        }
    }))
    .unwrap();
    let result = analyzer.analyze_project(&root, &[]).await.unwrap();
    let finding = result
        .findings
        .iter()
        .find(|f| f.id == "function.complexity.exceeded")
        .unwrap();
    assert_eq!(finding.severity, Severity::Error);
}

#[tokio::test]
async fn custom_threshold_rule_applies_to_any_metric() {
    let (_dir, root) = project(&[(
        "long.ts",
        &(0..40)
            .map(|i| format!("export const v{i} = {i};\n"))
            .collect::<String>(),
    )]);
    let analyzer = Analyzer::from_partial(json!({
        "rules": {
            "file.lines": { "enabled": true, "threshold": 30, "severity": "info" }
        }
    }))
    .unwrap();
    let result = analyzer.analyze_project(&root, &[]).await.unwrap();
    let finding = result
        .findings
        .iter()
        .find(|f| f.id == "file.lines.exceeded")
        .unwrap();
    assert_eq!(finding.severity, Severity::Info);
    assert_eq!(finding.details["metricName"], "linesOfCode");
    assert_eq!(finding.details["value"], 40.0);
}

#[tokio::test]
async fn unknown_rule_ids_are_tolerated() {
    let (_dir, root) = project(&[("a.ts", "export const a = 1;\n")]);
    let analyzer = Analyzer::from_partial(json!({
        "rules": {
            "experimental.notARule": { "enabled": true, "severity": "error" }
        }
    }))
    .unwrap();
    // analysis proceeds; the unknown id is logged and skipped
    let result = analyzer.analyze_project(&root, &[]).await.unwrap();
    assert_eq!(result.files.len(), 1);
    assert!(result.findings.is_empty());
}

#[tokio::test]
async fn analyze_paths_narrow_the_language_set() {
    let (_dir, root) = project(&[
        ("src/app.ts", "export const app = 1;\n"),
        ("scripts/tool.py", "VALUE = 1\n"),
    ]);
    let analyzer = Analyzer::from_partial(json!({ "analyzePaths": ["**/*.ts"] })).unwrap();
    let result = analyzer.analyze_project(&root, &[]).await.unwrap();
    assert_eq!(result.files.len(), 1);
    assert!(result.files[0].file_path.ends_with("app.ts"));
}

#[test]
fn log_level_resolution_follows_the_alias_rules() {
    let plain = Analyzer::from_partial(json!({})).unwrap();
    assert_eq!(plain.config().effective_log_level(), LogLevel::Info);

    let legacy = Analyzer::from_partial(json!({ "debugMode": true })).unwrap();
    assert_eq!(legacy.config().effective_log_level(), LogLevel::Debug);

    let explicit =
        Analyzer::from_partial(json!({ "debugMode": true, "logLevel": "silent" })).unwrap();
    assert_eq!(explicit.config().effective_log_level(), LogLevel::Silent);
}

#[tokio::test]
async fn circular_rule_severity_is_configurable() {
    let (_dir, root) = project(&[
        ("a.ts", "import './b';\n"),
        ("b.ts", "import './a';\n"),
    ]);
    let analyzer = Analyzer::from_partial(json!({
        "rules": { "module.circularDependency": { "severity": "warning" } }
    }))
    .unwrap();
    let result = analyzer.analyze_project(&root, &[]).await.unwrap();
    let finding = result
        .findings
        .iter()
        .find(|f| f.id == "module.circularDependency")
        .unwrap();
    assert_eq!(finding.severity, Severity::Warning);
}
